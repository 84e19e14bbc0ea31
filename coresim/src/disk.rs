//! Disk-head scheduling.
//!
//! Given the head position and a batch of pending track requests, each
//! policy decides a service order. The engine reports that order (the
//! `sequence`) and, separately, the `path` the head actually travels,
//! since the sweeping policies visit a disk boundary that no one asked
//! for. Movement is always measured along the path.
use crate::helpe::*;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Debug, Serialize)]
pub enum DiskPolicy {
    /// Requests in the order given
    Fcfs,
    /// Shortest seek time first
    Sstf,
    /// Elevator, up to the disk boundary and back
    Scan,
    /// Circular elevator, boundary to boundary
    #[value(name = "c-scan")]
    CScan,
    /// Elevator, turning at the last request
    Look,
    /// Circular elevator, jumping between extreme requests
    #[value(name = "c-look")]
    CLook,
}

impl DiskPolicy {
    pub const ALL: [DiskPolicy; 6] = [
        Self::Fcfs, Self::Sstf, Self::Scan, Self::CScan, Self::Look, Self::CLook,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Fcfs  => "FCFS",
            Self::Sstf  => "SSTF",
            Self::Scan  => "SCAN",
            Self::CScan => "C-SCAN",
            Self::Look  => "LOOK",
            Self::CLook => "C-LOOK",
        }
    }
}

impl FromStr for DiskPolicy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s.trim(), true)
            .map_err(|_| SimError::policy(s, "disk scheduling"))
    }
}

/// Initial travel direction of the sweeping policies.
#[derive(Copy, Clone, PartialEq, Eq, Hash, ValueEnum, Debug, Default, Serialize)]
pub enum Direction {
    /// Towards track 0
    Left,
    /// Towards the last track
    #[default]
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskMetrics {
    /// Requests served per track of movement.
    pub throughput: f64,
    /// Average movement per request.
    pub avg_seek:   f64,
    /// Longest single hop along the path.
    pub max_seek:   Track,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskOutcome {
    pub policy:     DiskPolicy,
    pub direction:  Direction,
    /// The head, then every request in service order.
    pub sequence:   Vec<Track>,
    /// Every point the head passes through, boundaries included.
    pub path:       Vec<Track>,
    pub movement:   Track,
    pub metrics:    DiskMetrics,
}

/// Checks the scenario and converts it to tracks.
fn gate(head: i64, requests: &[i64], disk_size: i64) -> Result<(Track, Vec<Track>, Track), SimError> {
    if disk_size <= 0 {
        return Err(SimError::invalid(format!("disk size must be positive, got {disk_size}")));
    }
    let in_range = |t: i64, what: &str| if t < 0 || t >= disk_size {
        Err(SimError::invalid(format!("{what} {t} is outside the disk (0-{})", disk_size - 1)))
    } else { Ok(t as Track) };
    let head = in_range(head, "head position")?;
    let requests = requests.iter()
        .map(|&r| in_range(r, "request"))
        .collect::<Result<Vec<Track>, SimError>>()?;

    Ok((head, requests, disk_size as Track))
}

/// Total head movement along `path`.
pub fn movement(path: &[Track]) -> Track {
    path.windows(2)
        .map(|w| w[0].abs_diff(w[1]))
        .sum()
}

/// Schedules `requests` from `head` on a disk of `disk_size` tracks.
/// `direction` is ignored by FCFS and SSTF.
pub fn seek(
    policy:     DiskPolicy,
    head:       i64,
    requests:   &[i64],
    disk_size:  i64,
    direction:  Direction,
) -> Result<DiskOutcome, SimError> {
    let (head, requests, size) = gate(head, requests, disk_size)?;
    debug!("{} from track {head}, {} requests, {direction:?}", policy.name(), requests.len());

    let (order, path) = match policy {
        DiskPolicy::Fcfs    => (requests.clone(), None),
        DiskPolicy::Sstf    => (shortest_seek(head, &requests), None),
        DiskPolicy::Look    => {
            let (near, far) = split(head, &requests, direction);
            (near.into_iter().chain(far.into_iter().rev()).collect(), None)
        },
        DiskPolicy::CLook   => {
            let (near, far) = split(head, &requests, direction);
            (near.into_iter().chain(far).collect(), None)
        },
        DiskPolicy::Scan    => {
            let (near, far) = split(head, &requests, direction);
            let mut path = vec![head];
            path.extend(&near);
            if !requests.is_empty() {
                turn_at(&mut path, boundary(direction, size));
            }
            path.extend(far.iter().rev());
            (near.into_iter().chain(far.into_iter().rev()).collect(), Some(path))
        },
        DiskPolicy::CScan   => {
            let (near, far) = split(head, &requests, direction);
            let mut path = vec![head];
            path.extend(&near);
            if !requests.is_empty() {
                turn_at(&mut path, boundary(direction, size));
            }
            if !far.is_empty() {
                let back = match direction {
                    Direction::Right    => Direction::Left,
                    Direction::Left     => Direction::Right,
                };
                turn_at(&mut path, boundary(back, size));
            }
            path.extend(&far);
            (near.into_iter().chain(far).collect(), Some(path))
        },
    };
    let sequence: Vec<Track> = std::iter::once(head).chain(order).collect();
    let path = path.unwrap_or_else(|| sequence.clone());
    debug_assert_eq!(sequence.len(), requests.len() + 1);

    let movement = movement(&path);
    let n = requests.len();
    let metrics = DiskMetrics {
        throughput: n as f64 / movement.max(1) as f64,
        avg_seek:   if n == 0 { 0.0 } else { movement as f64 / n as f64 },
        max_seek:   path.windows(2)
            .map(|w| w[0].abs_diff(w[1]))
            .max()
            .unwrap_or(0),
    };
    trace!("path: {}", path.iter().join(" -> "));

    Ok(DiskOutcome {
        policy,
        direction,
        sequence,
        path,
        movement,
        metrics,
    })
}

/// Runs every policy over the same batch, in parallel. Results come back
/// in [`DiskPolicy::ALL`] order.
pub fn seek_all(
    head:       i64,
    requests:   &[i64],
    disk_size:  i64,
    direction:  Direction,
) -> Vec<Result<DiskOutcome, SimError>> {
    DiskPolicy::ALL
        .par_iter()
        .map(|&policy| seek(policy, head, requests, disk_size, direction))
        .collect()
}

//---START SWEEP HELPERS
/// Greedy nearest request, ties to the lower track.
fn shortest_seek(head: Track, requests: &[Track]) -> Vec<Track> {
    let mut pending = requests.to_vec();
    let mut res = Vec::with_capacity(pending.len());
    let mut at = head;
    while let Some(i) = pending.iter().position_min_by_key(|&&t| (t.abs_diff(at), t)) {
        at = pending.swap_remove(i);
        res.push(at);
    }

    res
}

/// Splits requests into those met while travelling in `direction`
/// (sorted in travel order, the head's own track included) and the rest
/// (sorted in that same travel order).
fn split(head: Track, requests: &[Track], direction: Direction) -> (Vec<Track>, Vec<Track>) {
    let (near, far): (Vec<Track>, Vec<Track>) = match direction {
        Direction::Right    => requests.iter().partition(|&&t| t >= head),
        Direction::Left     => requests.iter().partition(|&&t| t <= head),
    };
    let travel = |mut v: Vec<Track>| {
        match direction {
            Direction::Right    => v.sort_unstable(),
            Direction::Left     => v.sort_unstable_by(|a, b| b.cmp(a)),
        }
        v
    };

    (travel(near), travel(far))
}

fn boundary(direction: Direction, size: Track) -> Track {
    match direction {
        Direction::Right    => size - 1,
        Direction::Left     => 0,
    }
}

/// Extends `path` to `t`, unless the head is already there.
fn turn_at(path: &mut Vec<Track>, t: Track) {
    if path.last() != Some(&t) {
        path.push(t);
    }
}
//---END SWEEP HELPERS

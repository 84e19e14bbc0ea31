//! Seeded random scenarios. Same seed, same scenario, on every machine.
use crate::helpe::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Bounds for generated process sets.
#[derive(Debug, Clone, Copy)]
pub struct ProcShape {
    pub count:          usize,
    /// Arrivals are drawn from `0..=max_arrival`.
    pub max_arrival:    Ticks,
    /// Bursts are drawn from `1..=max_burst`.
    pub max_burst:      Ticks,
    /// I/O bursts are drawn from `0..=max_io`.
    pub max_io:         Ticks,
    /// Priorities are drawn from `0..=max_priority`.
    pub max_priority:   i64,
}

impl Default for ProcShape {
    fn default() -> Self {
        Self {
            count:          8,
            max_arrival:    20,
            max_burst:      10,
            max_io:         3,
            max_priority:   5,
        }
    }
}

/// Random processes with ids 1..=count and multilevel classes in {0, 1}.
pub fn processes(shape: &ProcShape, seed: u64) -> ProcSet {
    let mut rng = StdRng::seed_from_u64(seed);
    (1..=shape.count)
        .map(|id| Process {
            id:         id as Pid,
            arrival:    rng.gen_range(0..=shape.max_arrival),
            burst:      rng.gen_range(1..=shape.max_burst.max(1)),
            io_burst:   rng.gen_range(0..=shape.max_io),
            priority:   rng.gen_range(0..=shape.max_priority),
            queue:      rng.gen_range(0..=1),
        })
        .collect()
}

/// `count` track requests on a disk of `disk_size` tracks.
pub fn requests(count: usize, disk_size: Track, seed: u64) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| rng.gen_range(0..disk_size.max(1)) as i64)
        .collect()
}

/// A reference string over pages `0..pages`. Half of the references
/// go to the lowest quarter of the pages, so that there is some locality
/// for the policies to exploit.
pub fn references(count: usize, pages: PageId, seed: u64) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let pages = pages.max(1);
    let hot = (pages / 4).max(1);
    (0..count)
        .map(|_| {
            let bound = if rng.gen_bool(0.5) { hot } else { pages };
            rng.gen_range(0..bound) as i64
        })
        .collect()
}

/// Positive sizes in `1..=max_size`.
pub fn sizes(count: usize, max_size: usize, seed: u64) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| rng.gen_range(1..=max_size.max(1)) as i64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_scenario() {
        let shape = ProcShape::default();
        assert_eq!(processes(&shape, 7), processes(&shape, 7));
        assert_eq!(requests(10, 200, 7), requests(10, 200, 7));
        assert_eq!(references(30, 8, 7), references(30, 8, 7));
    }

    #[test]
    fn generated_sets_pass_the_gatekeeper() {
        let shape = ProcShape { count: 50, ..ProcShape::default() };
        let set = processes(&shape, 42);
        assert!(check(&set).is_ok());
        assert!(set.iter().all(|p| p.burst >= 1 && p.queue <= 1 && p.arrival <= 20));
        assert!(requests(100, 50, 1).iter().all(|&t| (0..50).contains(&t)));
        assert!(sizes(100, 9, 1).iter().all(|&s| (1..=9).contains(&s)));
    }
}

use crate::helpe::*;

pub use crate::process::ProcStats;

/// Initializes a [ProcSet] from user-provided rows.
/// A successfully returned set is guaranteed to be compliant
/// with all of the CPU engine's assumptions. These are:
/// - no negative arrival, burst, I/O burst, id or queue
/// - no process with zero burst
/// - no two processes share an id
///
/// This function is the gatekeeper to the CPU engine.
pub fn init(rows: Vec<ProcRow>) -> Result<ProcSet, SimError> {
    let mut res = Vec::with_capacity(rows.len());
    for r in rows {
        if r.id < 0 || r.id > Pid::MAX as i64 {
            return Err(SimError::invalid(format!("process id {} out of range", r.id)));
        } else if r.arrival < 0 {
            return Err(SimError::invalid(format!("P{}: negative arrival {}", r.id, r.arrival)));
        } else if r.burst <= 0 {
            return Err(SimError::invalid(format!("P{}: burst must be positive, got {}", r.id, r.burst)));
        } else if r.io_burst < 0 {
            return Err(SimError::invalid(format!("P{}: negative I/O burst {}", r.id, r.io_burst)));
        } else if r.queue < 0 {
            return Err(SimError::invalid(format!("P{}: negative queue {}", r.id, r.queue)));
        }
        res.push(Process {
            id:         r.id as Pid,
            arrival:    r.arrival as Ticks,
            burst:      r.burst as Ticks,
            io_burst:   r.io_burst as Ticks,
            priority:   r.priority,
            queue:      r.queue as usize,
        });
    }
    check(&res)?;

    Ok(res)
}

/// Builds a [ProcSet] out of parallel lists, the way an interactive
/// front end collects them. Ids are assigned as 1, 2, ..., n.
///
/// Optional lists default to zeroes. Every list that is present must
/// be exactly as long as `arrivals`.
pub fn from_lists(
    arrivals:   &[i64],
    bursts:     &[i64],
    io_bursts:  Option<&[i64]>,
    priorities: Option<&[i64]>,
    queues:     Option<&[i64]>,
) -> Result<ProcSet, SimError> {
    let n = arrivals.len();
    for (name, len) in [
        ("burst", Some(bursts.len())),
        ("I/O burst", io_bursts.map(|l| l.len())),
        ("priority", priorities.map(|l| l.len())),
        ("queue", queues.map(|l| l.len())),
    ] {
        if let Some(l) = len {
            if l != n {
                return Err(SimError::invalid(format!("{n} arrival times but {l} {name} entries")));
            }
        }
    }
    let at = |l: Option<&[i64]>, i: usize| l.map_or(0, |v| v[i]);

    init((0..n)
        .map(|i| ProcRow {
            id:         i as i64 + 1,
            arrival:    arrivals[i],
            burst:      bursts[i],
            io_burst:   at(io_bursts, i),
            priority:   at(priorities, i),
            queue:      at(queues, i),
        })
        .collect())
}

/// Re-validates a set that may not have passed through [init].
/// Engines call this before their first step.
pub fn check(procs: &[Process]) -> Result<(), SimError> {
    let mut seen = HashSet::with_capacity(procs.len());
    for p in procs {
        if p.burst == 0 {
            return Err(SimError::invalid(format!("P{}: burst must be positive", p.id)));
        }
        if !seen.insert(p.id) {
            return Err(SimError::invalid(format!("duplicate process id {}", p.id)));
        }
    }

    Ok(())
}

/// Positions into `procs`, sorted by arrival and then by position.
/// This is the order in which processes show up at a ready queue.
#[inline(always)]
pub fn arrival_order(procs: &[Process]) -> Vec<usize> {
    (0..procs.len())
        .sorted_by_key(|&i| procs[i].queue_key(i))
        .collect()
}

#[inline(always)]
pub fn first_arrival(procs: &[Process]) -> Ticks {
    procs.iter()
        .map(|p| p.arrival)
        .min()
        .unwrap_or(0)
}

pub fn total_burst(procs: &[Process]) -> Ticks {
    procs.iter().fold(0, |sum, p| sum + p.burst)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, arrival: i64, burst: i64) -> ProcRow {
        ProcRow { id, arrival, burst, io_burst: 0, priority: 0, queue: 0 }
    }

    #[test]
    fn gatekeeper_rejects_bad_rows() {
        assert!(init(vec![row(1, -1, 3)]).is_err());
        assert!(init(vec![row(1, 0, 0)]).is_err());
        assert!(init(vec![row(1, 0, -2)]).is_err());
        assert!(init(vec![row(-1, 0, 2)]).is_err());
        assert!(init(vec![ProcRow { io_burst: -1, ..row(1, 0, 2) }]).is_err());
        assert!(init(vec![row(1, 0, 2), row(1, 3, 2)]).is_err());
        assert_eq!(init(vec![row(4, 0, 2), row(2, 3, 1)]).unwrap().len(), 2);
    }

    #[test]
    fn lists_must_line_up() {
        let err = from_lists(&[0, 1], &[3], None, None, None).unwrap_err();
        assert!(matches!(err, SimError::InvalidInput { .. }));
        assert!(from_lists(&[0, 1], &[3, 2], Some(&[0]), None, None).is_err());
        let set = from_lists(&[0, 1], &[3, 2], Some(&[0, 4]), Some(&[2, 1]), None).unwrap();
        assert_eq!(set[1], Process::new(2, 1, 2).with_io(4).with_priority(1));
    }

    #[test]
    fn check_catches_handmade_sets() {
        assert!(check(&[Process::new(1, 0, 0)]).is_err());
        assert!(check(&[Process::new(1, 0, 1), Process::new(1, 0, 1)]).is_err());
        assert!(check(&[]).is_ok());
    }

    #[test]
    fn arrival_order_is_stable() {
        let set = vec![Process::new(1, 3, 1), Process::new(2, 0, 1), Process::new(3, 0, 1)];
        assert_eq!(arrival_order(&set), vec![1, 2, 0]);
        assert_eq!(first_arrival(&set), 0);
        assert_eq!(total_burst(&set), 3);
    }
}

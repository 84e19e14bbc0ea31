use crate::helpe::*;

impl Process {
    /// Creates a process with no I/O, priority 0, in queue 0.
    pub fn new(id: Pid, arrival: Ticks, burst: Ticks) -> Self {
        Self {
            id,
            arrival,
            burst,
            io_burst:   0,
            priority:   0,
            queue:      0,
        }
    }

    pub fn with_io(mut self, io_burst: Ticks) -> Self {
        self.io_burst = io_burst;
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_queue(mut self, queue: usize) -> Self {
        self.queue = queue;
        self
    }

    /// Total time the process occupies the timeline once it runs.
    #[inline(always)]
    pub fn service(&self) -> Ticks {
        self.burst + self.io_burst
    }

    /// Returns `true` if the process is ready at moment `t`.
    #[inline(always)]
    pub fn has_arrived_by(&self, t: Ticks) -> bool {
        self.arrival <= t
    }
}

/// The per-process row of a finished CPU run. This is what the result
/// table of a presentation layer shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcStats {
    pub id:             Pid,
    pub arrival:        Ticks,
    pub burst:          Ticks,
    pub io_burst:       Ticks,
    pub priority:       i64,
    /// First dispatch.
    pub start:          Ticks,
    pub completion:     Ticks,
    pub turnaround:     Ticks,
    pub waiting:        Ticks,
    pub response:       Ticks,
}

impl ProcStats {
    /// Derives the row from the two moments a run decides for a process.
    ///
    /// Panics if `completion` comes before the process could possibly
    /// have finished, since that means the schedule itself is broken.
    pub fn new(p: &Process, start: Ticks, completion: Ticks) -> Self {
        let turnaround = completion - p.arrival;
        let waiting = turnaround.checked_sub(p.service())
            .expect("Completion earlier than arrival + service");

        Self {
            id:         p.id,
            arrival:    p.arrival,
            burst:      p.burst,
            io_burst:   p.io_burst,
            priority:   p.priority,
            start,
            completion,
            turnaround,
            waiting,
            response:   start - p.arrival,
        }
    }
}

//-----ORDERING HELPERS (START)---------------------
/*
   Most policies boil down to "pick the minimum by some key,
   breaking ties by arrival and then by input position". The
   keys below keep that tie-breaking in one place.
*/
impl Process {
    /// FCFS order: earliest arrival, ties by id.
    #[inline(always)]
    pub fn fcfs_key(&self) -> (Ticks, Pid) {
        (self.arrival, self.id)
    }

    /// Order of insertion into a ready queue: arrival, then position
    /// in the caller's list.
    #[inline(always)]
    pub fn queue_key(&self, pos: usize) -> (Ticks, usize) {
        (self.arrival, pos)
    }
}
//-----ORDERING HELPERS (END)---------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_follow_definitions() {
        let p = Process::new(1, 2, 4).with_io(3);
        let s = ProcStats::new(&p, 5, 14);
        assert_eq!(s.turnaround, 12);
        assert_eq!(s.waiting, 12 - 4 - 3);
        assert_eq!(s.response, 3);
    }

    #[test]
    #[should_panic]
    fn impossible_completion_panics() {
        let p = Process::new(1, 0, 4);
        ProcStats::new(&p, 0, 3);
    }

    #[test]
    fn builders_leave_rest_alone() {
        let p = Process::new(7, 1, 2).with_priority(-3).with_queue(1);
        assert_eq!((p.id, p.arrival, p.burst, p.io_burst), (7, 1, 2, 0));
        assert_eq!((p.priority, p.queue), (-3, 1));
        assert_eq!(p.service(), 2);
        assert!(p.has_arrived_by(1) && !p.has_arrived_by(0));
    }
}

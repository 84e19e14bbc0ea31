use crate::helpe::*;
use super::{CpuOutcome, CpuPolicy};

/// What a run knows about one process beyond its description. Kept
/// apart from [`Process`] so that the caller's input is never touched.
#[derive(Debug, Clone)]
pub struct Slot {
    pub remaining:  Ticks,
    pub start:      Option<Ticks>,
    pub completion: Option<Ticks>,
}

/// The state shared by every policy's dispatch loop: the clock, the
/// per-process records, and the timeline/decision logs being written.
///
/// Processes are referred to by their *position* in the input slice.
pub struct Run<'a> {
    pub procs:      &'a [Process],
    slots:          Vec<Slot>,
    pub now:        Ticks,
    timeline:       Timeline,
    decisions:      Vec<Decision>,
    // Positions in arrival order, how many of them were logged as
    // arrived, and how many were handed out to a ready queue.
    order:          Vec<usize>,
    noticed:        usize,
    admitted:       usize,
    done:           usize,
}

impl<'a> Run<'a> {
    pub fn new(procs: &'a [Process]) -> Self {
        Self {
            procs,
            slots:      procs.iter()
                .map(|p| Slot {
                    remaining:  p.burst,
                    start:      None,
                    completion: None,
                })
                .collect(),
            now:        first_arrival(procs),
            timeline:   vec![],
            decisions:  vec![],
            order:      arrival_order(procs),
            noticed:    0,
            admitted:   0,
            done:       0,
        }
    }

    #[inline(always)]
    pub fn finished(&self) -> bool {
        self.done == self.procs.len()
    }

    #[inline(always)]
    pub fn remaining(&self, pos: usize) -> Ticks {
        self.slots[pos].remaining
    }

    #[inline(always)]
    pub fn pid(&self, pos: usize) -> Pid {
        self.procs[pos].id
    }

    fn decide(&mut self, time: Ticks, pos: usize, kind: DecisionKind, level: Option<usize>) {
        let pid = self.pid(pos);
        debug!("t={time} P{pid} {kind:?}{}", level.map_or(String::new(), |l| format!(" (level {l})")));
        self.decisions.push(Decision { time, pid, kind, level });
    }

    /// Logs the arrivals up to now. Called at every unit boundary, so
    /// that the decision log stays chronological even while a burst
    /// keeps the newcomers out of the ready queues.
    fn notice(&mut self) {
        while let Some(&pos) = self.order.get(self.noticed) {
            if !self.procs[pos].has_arrived_by(self.now) { break; }
            self.noticed += 1;
            let arrival = self.procs[pos].arrival;
            self.decide(arrival, pos, DecisionKind::Arrive, None);
        }
    }

    /// Returns the positions of every process that has arrived by now
    /// and was not handed out before, in arrival order.
    pub fn admit(&mut self) -> Vec<usize> {
        self.notice();
        let mut res = vec![];
        while let Some(&pos) = self.order.get(self.admitted) {
            if !self.procs[pos].has_arrived_by(self.now) { break; }
            res.push(pos);
            self.admitted += 1;
        }

        res
    }

    /// Nothing is ready: burn one unit.
    pub fn idle(&mut self) {
        trace!("t={} idle", self.now);
        self.timeline.push(TimelineEvent {
            time:       self.now,
            subject:    None,
            kind:       EventKind::Idle,
            note:       format!("At time {}: CPU idle, no process ready", self.now),
        });
        self.now += 1;
        self.notice();
    }

    /// Hands the CPU to `pos`. The first dispatch fixes the start time.
    pub fn dispatch(&mut self, pos: usize, level: Option<usize>) {
        if self.slots[pos].start.is_none() {
            self.slots[pos].start = Some(self.now);
        }
        self.decide(self.now, pos, DecisionKind::Dispatch, level);
    }

    /// Runs `pos` for one unit.
    pub fn exec(&mut self, pos: usize, note: &str) {
        debug_assert!(self.slots[pos].remaining > 0, "Running a finished process");
        let pid = self.pid(pos);
        self.slots[pos].remaining -= 1;
        trace!("t={} P{pid} runs ({} left)", self.now, self.slots[pos].remaining);
        self.timeline.push(TimelineEvent {
            time:       self.now,
            subject:    Some(pid),
            kind:       EventKind::Cpu,
            note:       format!("At time {}: P{pid} {note} (remaining {})", self.now, self.slots[pos].remaining),
        });
        self.now += 1;
        self.notice();
    }

    /// Runs `pos` for `units` consecutive units.
    pub fn exec_for(&mut self, pos: usize, units: Ticks, note: &str) {
        for _ in 0..units {
            self.exec(pos, note);
        }
    }

    /// The CPU burst of `pos` is over: its I/O burst (if any) follows
    /// immediately, then the process completes.
    pub fn finish(&mut self, pos: usize) {
        debug_assert!(self.slots[pos].remaining == 0, "Finishing an unfinished process");
        let pid = self.pid(pos);
        for _ in 0..self.procs[pos].io_burst {
            self.timeline.push(TimelineEvent {
                time:       self.now,
                subject:    Some(pid),
                kind:       EventKind::Io,
                note:       format!("At time {}: I/O in progress for P{pid}", self.now),
            });
            self.now += 1;
            self.notice();
        }
        self.slots[pos].completion = Some(self.now);
        self.done += 1;
        self.decide(self.now, pos, DecisionKind::Complete, None);
    }

    pub fn preempt(&mut self, pos: usize, level: Option<usize>) {
        self.decide(self.now, pos, DecisionKind::Preempt, level);
    }

    pub fn requeue(&mut self, pos: usize, level: Option<usize>) {
        self.decide(self.now, pos, DecisionKind::Requeue, level);
    }

    pub fn demote(&mut self, pos: usize, to: usize) {
        self.decide(self.now, pos, DecisionKind::Demote, Some(to));
    }

    /// Seals the run. Every process must have completed.
    pub fn into_outcome(self, policy: CpuPolicy) -> CpuOutcome {
        let stats: Vec<ProcStats> = self.procs.iter()
            .zip(&self.slots)
            .map(|(p, s)| ProcStats::new(
                p,
                s.start.expect("Process never dispatched"),
                s.completion.expect("Process never completed"),
            ))
            .collect();
        let metrics = crate::analyze::cpu_metrics(&stats, &self.timeline);

        CpuOutcome {
            policy,
            stats,
            timeline:   self.timeline,
            decisions:  self.decisions,
            metrics,
        }
    }
}

//! CPU scheduling engine.
//!
//! Every policy shares one dispatch-loop contract: the clock
//! starts at the earliest arrival and moves in whole units, a process is
//! ready from its arrival on, and an empty ready set costs exactly one
//! idle unit. I/O bursts follow the completing CPU burst right away and
//! occupy the timeline, but they never count as waiting.

mod run;
mod batch;
mod preempt;
mod rr;
mod multilevel;

use crate::helpe::*;
use self::run::Run;

/// The eight supported policies. The set is closed: callers parse
/// names at their boundary ([`FromStr`]) and engines only ever see one
/// of these.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Debug, Serialize)]
pub enum CpuPolicy {
    /// First come, first served
    Fcfs,
    /// Shortest job first (non-preemptive)
    Sjf,
    /// Shortest remaining time first
    Srtf,
    /// Round Robin
    #[value(name = "rr")]
    RoundRobin,
    /// Priority, non-preemptive
    #[value(name = "priority")]
    PriorityNp,
    /// Priority, preemptive
    #[value(name = "priority-p")]
    PriorityP,
    /// Multilevel queue (queue 0 FCFS, queue 1 Round Robin)
    Mlq,
    /// Multilevel feedback queue
    Mlfq,
}

impl CpuPolicy {
    pub const ALL: [CpuPolicy; 8] = [
        Self::Fcfs, Self::Sjf, Self::Srtf, Self::RoundRobin,
        Self::PriorityNp, Self::PriorityP, Self::Mlq, Self::Mlfq,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Fcfs          => "FCFS",
            Self::Sjf           => "SJF",
            Self::Srtf          => "SRTF",
            Self::RoundRobin    => "Round Robin",
            Self::PriorityNp    => "Priority (non-preemptive)",
            Self::PriorityP     => "Priority (preemptive)",
            Self::Mlq           => "Multilevel Queue",
            Self::Mlfq          => "Multilevel Feedback Queue",
        }
    }
}

impl FromStr for CpuPolicy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s.trim(), true)
            .map_err(|_| SimError::policy(s, "CPU scheduling"))
    }
}

/// How one level of a feedback queue picks among its processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LevelPolicy {
    /// FIFO order, slices of `quantum` units; unfinished slices demote.
    Rr(i64),
    /// Minimum remaining time, run to completion.
    Sjf,
    /// Earliest arrival, run to completion.
    Fcfs,
}

impl FromStr for LevelPolicy {
    type Err = SimError;

    /// Accepts `rr:<quantum>`, `sjf` and `fcfs`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.split_once(':') {
            Some(("rr", q)) => q.trim()
                .parse::<i64>()
                .map(LevelPolicy::Rr)
                .map_err(|e| SimError::invalid(format!("bad quantum in `{s}`: {e}"))),
            None if lower == "sjf"  => Ok(LevelPolicy::Sjf),
            None if lower == "fcfs" => Ok(LevelPolicy::Fcfs),
            _ => Err(SimError::policy(s, "feedback level")),
        }
    }
}

/// What happens to a process whose Round-Robin slice runs out while it
/// already sits at the lowest feedback level.
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug, Default, Serialize)]
pub enum LowestLevel {
    /// Back to the tail of the lowest level, for another slice.
    #[default]
    Recycle,
    /// The lowest level grants the whole remaining burst at once.
    RunToCompletion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MlfqConfig {
    /// Level 0 first. New arrivals always enter level 0.
    pub levels: Vec<LevelPolicy>,
    pub lowest: LowestLevel,
}

impl Default for MlfqConfig {
    fn default() -> Self {
        Self {
            levels: vec![LevelPolicy::Rr(2), LevelPolicy::Rr(4), LevelPolicy::Fcfs],
            lowest: LowestLevel::Recycle,
        }
    }
}

/// Policy-specific knobs. Each policy reads only what it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpuParams {
    /// Round Robin slice.
    pub quantum:        i64,
    /// Slice of the multilevel queue's Round-Robin queue.
    pub mlq_quantum:    i64,
    pub mlfq:           MlfqConfig,
}

impl Default for CpuParams {
    fn default() -> Self {
        Self {
            quantum:        DEFAULT_QUANTUM,
            mlq_quantum:    DEFAULT_MLQ_QUANTUM,
            mlfq:           MlfqConfig::default(),
        }
    }
}

impl CpuParams {
    pub fn with_quantum(mut self, quantum: i64) -> Self {
        self.quantum = quantum;
        self
    }
}

/// Engine-level summary of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuMetrics {
    pub avg_turnaround: f64,
    pub avg_waiting:    f64,
    pub avg_response:   f64,
    /// Units from the first arrival to the last completion.
    pub makespan:       Ticks,
    pub cpu_busy:       Ticks,
    pub io_busy:        Ticks,
    pub idle:           Ticks,
    /// `cpu_busy / makespan`.
    pub utilization:    f64,
    /// Completed processes per unit of time.
    pub throughput:     f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuOutcome {
    pub policy:     CpuPolicy,
    /// One row per process, in the caller's order.
    pub stats:      Vec<ProcStats>,
    pub timeline:   Timeline,
    pub decisions:  Vec<Decision>,
    pub metrics:    CpuMetrics,
}

impl CpuOutcome {
    /// Counts decisions of one kind, e.g. how many times anything
    /// went back to the tail of a queue.
    pub fn count(&self, kind: DecisionKind) -> usize {
        self.decisions.iter()
            .filter(|d| d.kind == kind)
            .count()
    }
}

/// Turns a signed quantum from the configuration boundary into a
/// usable one.
fn quantum(q: i64, what: &str) -> Result<Ticks, SimError> {
    if q <= 0 {
        Err(SimError::invalid(format!("{what} quantum must be positive, got {q}")))
    } else { Ok(q as Ticks) }
}

/// Runs `policy` over `procs`. Parameters are validated before the
/// first unit of time is simulated, so an `Err` never comes with a
/// partial schedule.
pub fn schedule(
    policy: CpuPolicy,
    procs:  &[Process],
    params: &CpuParams,
) -> Result<CpuOutcome, SimError> {
    check(procs)?;
    debug!("{} over {} processes", policy.name(), procs.len());
    let mut run = Run::new(procs);
    match policy {
        CpuPolicy::Fcfs         => {
            batch::run_to_completion(&mut run, "FCFS", |p, pos| (p.fcfs_key(), pos));
        },
        CpuPolicy::Sjf          => {
            batch::run_to_completion(&mut run, "SJF", |p, pos| (p.burst, p.queue_key(pos)));
        },
        CpuPolicy::PriorityNp   => {
            batch::run_to_completion(&mut run, "priority", |p, pos| (p.priority, p.queue_key(pos)));
        },
        CpuPolicy::Srtf         => {
            preempt::shortest_remaining(&mut run);
        },
        CpuPolicy::PriorityP    => {
            preempt::preemptive_priority(&mut run);
        },
        CpuPolicy::RoundRobin   => {
            let q = quantum(params.quantum, "Round Robin")?;
            rr::round_robin(&mut run, q);
        },
        CpuPolicy::Mlq          => {
            let q = quantum(params.mlq_quantum, "multilevel queue")?;
            if let Some(p) = procs.iter().find(|p| p.queue > 1) {
                return Err(SimError::invalid(format!(
                    "P{}: multilevel queue class must be 0 or 1, got {}", p.id, p.queue)));
            }
            multilevel::multilevel_queue(&mut run, q);
        },
        CpuPolicy::Mlfq         => {
            let levels = multilevel::validate_levels(&params.mlfq)?;
            multilevel::feedback_queue(&mut run, &levels, params.mlfq.lowest);
        },
    }
    let outcome = run.into_outcome(policy);
    debug_assert!(crate::analyze::schedule_is_valid(procs, &outcome), "Invalid schedule!");

    Ok(outcome)
}

/// Runs every policy over the same set, in parallel. Results come back
/// in [`CpuPolicy::ALL`] order.
pub fn schedule_all(procs: &[Process], params: &CpuParams) -> Vec<Result<CpuOutcome, SimError>> {
    CpuPolicy::ALL
        .par_iter()
        .map(|&policy| schedule(policy, procs, params))
        .collect()
}

#[cfg(test)]
mod tests;

//! Welcome to `coresim`!
//!
//! Four engines for the classical resource-management algorithms of an
//! operating system, each a pure function of its input scenario:
//!
//! 1. [`cpu`]: CPU scheduling (FCFS, SJF, SRTF, Round Robin, priority with
//!    and without preemption, multilevel queue, multilevel feedback queue),
//! 2. [`disk`]: disk-head scheduling (FCFS, SSTF, SCAN, C-SCAN, LOOK, C-LOOK),
//! 3. [`memory`]: stepwise block allocation (first/best/worst fit, paging,
//!    segmentation),
//! 4. [`replace`]: page replacement (LRU, FIFO, Optimal, LFU, MFU).
//!
//! Nothing here renders, animates or persists anything. Callers hand a
//! scenario over, get a timeline (or sequence, or step list) plus metrics
//! back, and are free to replay those however they like.

mod process;
mod analyze;

pub mod procset;
pub mod cpu;
pub mod disk;
pub mod memory;
pub mod replace;
pub mod workload;
pub mod helpe;

pub use crate::helpe::*;

/// Our fundamental unit of interest on the CPU side. A [`Process`] is the
/// *immutable* description of some work:
///
/// 1. it becomes ready at [`arrival`](Process::arrival),
/// 2. it needs [`burst`](Process::burst) units of CPU time,
/// 3. right after its CPU burst it performs [`io_burst`](Process::io_burst)
///    units of I/O, which occupy the timeline but are not waiting.
///
/// > ***ATTENTION:*** engines never write into a [`Process`]. Whatever
/// > changes during a run (remaining time, first dispatch, completion)
/// > lives in a per-run record owned by the dispatch loop; feedback
/// > levels are the loop's own queues. Feeding the same set twice yields the same result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Process {
    /// Caller-assigned, unique within a set.
    pub id:         Pid,
    pub arrival:    Ticks,
    pub burst:      Ticks,
    pub io_burst:   Ticks,
    /// Lower value means more urgent. Only read by the priority policies.
    pub priority:   i64,
    /// Class for the multilevel queue: 0 is the FCFS queue, 1 the
    /// Round-Robin one. Ignored by every other policy.
    pub queue:      usize,
}

/// One contiguous partition of memory, as seen by the [`memory`] engine.
///
/// The occupants are kept in the order they were placed. Paging puts one
/// entry per page, segmentation one entry per segment.
///
/// Invariant, at every point in time:
/// `free + sum(occupant sizes) == original_size`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryBlock {
    pub original_size:  usize,
    pub free:           usize,
    pub occupants:      Vec<(Pid, usize)>,
}

use crate::{cpu::{CpuMetrics, CpuOutcome}, helpe::*};

/// Sums up a finished CPU run.
///
/// The makespan spans from the earliest arrival to the latest
/// completion. An empty run has zeroes everywhere.
pub fn cpu_metrics(stats: &[ProcStats], timeline: &[TimelineEvent]) -> CpuMetrics {
    let n = stats.len();
    let makespan = match (stats.iter().map(|s| s.arrival).min(), stats.iter().map(|s| s.completion).max()) {
        (Some(first), Some(last))   => last - first,
        _                           => 0,
    };
    let (mut cpu_busy, mut io_busy, mut idle) = (0, 0, 0);
    for e in timeline {
        match e.kind {
            EventKind::Cpu  => cpu_busy += 1,
            EventKind::Io   => io_busy += 1,
            EventKind::Idle => idle += 1,
        }
    }
    let avg = |f: fn(&ProcStats) -> Ticks| if n == 0 { 0.0 } else {
        stats.iter().map(f).sum::<Ticks>() as f64 / n as f64
    };
    let per_unit = |x: usize| if makespan == 0 { 0.0 } else { x as f64 / makespan as f64 };

    CpuMetrics {
        avg_turnaround: avg(|s| s.turnaround),
        avg_waiting:    avg(|s| s.waiting),
        avg_response:   avg(|s| s.response),
        makespan,
        cpu_busy,
        io_busy,
        idle,
        utilization:    per_unit(cpu_busy),
        throughput:     per_unit(n),
    }
}

/// Checks a CPU outcome against the description it came from:
///
/// (i)     the timeline has exactly one event per unit, with no gaps,
///         from the earliest arrival up to the latest completion,
///
/// (ii)    every process got exactly its burst in `Cpu` units and its
///         I/O burst in `Io` units, never before its arrival, and its
///         last unit is the one right before its completion,
///
/// (iii)   the stats come back in input order and the sum identity
///         `Σ turnaround == Σ (waiting + burst + io_burst)` holds.
pub fn schedule_is_valid(procs: &[Process], outcome: &CpuOutcome) -> bool {
    let timeline = &outcome.timeline;
    let stats = &outcome.stats;
    if stats.len() != procs.len() { return false; }
    if procs.is_empty() { return timeline.is_empty(); }

    let origin = first_arrival(procs);
    if timeline.iter()
        .enumerate()
        .any(|(k, e)| e.time != origin + k) { return false; }
    let end = stats.iter()
        .map(|s| s.completion)
        .max()
        .unwrap_or(origin);
    if origin + timeline.len() != end { return false; }

    // pid -> (cpu units, io units, first unit, last unit)
    let mut seen: HashMap<Pid, (Ticks, Ticks, Ticks, Ticks)> = HashMap::new();
    for e in timeline {
        let Some(pid) = e.subject else {
            if e.kind != EventKind::Idle { return false; }
            continue;
        };
        let entry = seen.entry(pid).or_insert((0, 0, e.time, e.time));
        match e.kind {
            EventKind::Cpu  => entry.0 += 1,
            EventKind::Io   => entry.1 += 1,
            EventKind::Idle => return false,
        }
        entry.3 = e.time;
    }
    for (p, s) in procs.iter().zip(stats) {
        let Some(&(cpu, io, first, last)) = seen.get(&p.id) else { return false; };
        if s.id != p.id
        || cpu != p.burst
        || io != p.io_burst
        || first < p.arrival
        || first != s.start
        || last + 1 != s.completion { return false; }
    }

    let lhs: Ticks = stats.iter().map(|s| s.turnaround).sum();
    let rhs: Ticks = stats.iter().map(|s| s.waiting + s.burst + s.io_burst).sum();

    lhs == rhs
}

/// Every block accounts for all of its space: nothing lost, nothing
/// made up.
pub fn blocks_are_consistent(blocks: &[MemoryBlock]) -> bool {
    blocks.iter()
        .all(|b| {
            let used: usize = b.occupants.iter().map(|&(_, sz)| sz).sum();
            b.free <= b.original_size && b.free + used == b.original_size
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::{schedule, CpuParams, CpuPolicy};

    fn sample() -> ProcSet {
        vec![
            Process::new(1, 0, 3).with_io(1),
            Process::new(2, 1, 2),
            Process::new(3, 9, 1),
        ]
    }

    #[test]
    fn metrics_count_every_unit() {
        let out = schedule(CpuPolicy::Fcfs, &sample(), &CpuParams::default()).unwrap();
        let m = &out.metrics;
        assert_eq!(m.cpu_busy, 6);
        assert_eq!(m.io_busy, 1);
        // P1 0..4, P2 4..6, idle 6..9, P3 9..10
        assert_eq!(m.idle, 3);
        assert_eq!(m.makespan, 10);
        assert_eq!(m.makespan, m.cpu_busy + m.io_busy + m.idle);
        assert!((m.utilization - 0.6).abs() < 1e-9);
        assert!((m.throughput - 0.3).abs() < 1e-9);
    }

    #[test]
    fn empty_run_has_zeroed_metrics() {
        let m = cpu_metrics(&[], &[]);
        assert_eq!(m.makespan, 0);
        assert_eq!(m.avg_waiting, 0.0);
        assert_eq!(m.throughput, 0.0);
    }

    #[test]
    fn tampered_schedules_are_caught() {
        let procs = sample();
        let out = schedule(CpuPolicy::RoundRobin, &procs, &CpuParams::default()).unwrap();
        assert!(schedule_is_valid(&procs, &out));

        let mut gap = out.clone();
        gap.timeline.remove(2);
        assert!(!schedule_is_valid(&procs, &gap));

        let mut stolen = out.clone();
        let victim = stolen.timeline.iter_mut()
            .find(|e| e.kind == EventKind::Cpu)
            .unwrap();
        victim.subject = Some(3);
        assert!(!schedule_is_valid(&procs, &stolen));

        let mut reordered = out;
        reordered.stats.swap(0, 1);
        assert!(!schedule_is_valid(&procs, &reordered));
    }

    #[test]
    fn block_accounting() {
        let mut b = MemoryBlock { original_size: 100, free: 60, occupants: vec![(0, 40)] };
        assert!(blocks_are_consistent(&[b.clone()]));
        b.free = 70;
        assert!(!blocks_are_consistent(&[b]));
    }
}

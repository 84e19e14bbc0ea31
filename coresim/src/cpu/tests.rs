use super::*;

fn set(specs: &[(Ticks, Ticks)]) -> ProcSet {
    specs.iter()
        .enumerate()
        .map(|(i, &(arrival, burst))| Process::new(i as Pid + 1, arrival, burst))
        .collect()
}

fn completions(out: &CpuOutcome) -> Vec<Ticks> {
    out.stats.iter().map(|s| s.completion).collect()
}

fn run(policy: CpuPolicy, procs: &[Process]) -> CpuOutcome {
    schedule(policy, procs, &CpuParams::default()).unwrap()
}

#[test]
fn fcfs_textbook() {
    let out = run(CpuPolicy::Fcfs, &set(&[(0, 5), (1, 3), (2, 8), (3, 6)]));
    assert_eq!(completions(&out), vec![5, 8, 16, 22]);
    let waits: Vec<Ticks> = out.stats.iter().map(|s| s.waiting).collect();
    assert_eq!(waits, vec![0, 4, 6, 13]);
    assert!((out.metrics.avg_waiting - 5.75).abs() < 1e-9);
}

#[test]
fn sjf_waits_for_the_running_job() {
    let out = run(CpuPolicy::Sjf, &set(&[(0, 5), (1, 3), (2, 8), (3, 6)]));
    assert_eq!(completions(&out), vec![5, 8, 22, 14]);
    assert!((out.metrics.avg_waiting - 5.25).abs() < 1e-9);
    assert_eq!(out.count(DecisionKind::Preempt), 0);
}

#[test]
fn srtf_preempts_on_strictly_shorter() {
    let out = run(CpuPolicy::Srtf, &set(&[(0, 8), (1, 4), (2, 9), (3, 5)]));
    assert_eq!(completions(&out), vec![17, 5, 26, 10]);
    assert!((out.metrics.avg_waiting - 6.5).abs() < 1e-9);
    assert_eq!(out.count(DecisionKind::Preempt), 1);
    // P1 ran at 0 and again from 10 on, but started only once.
    assert_eq!(out.stats[0].start, 0);
    assert_eq!(out.stats[0].response, 0);
}

#[test]
fn round_robin_requeues_behind_newcomers() {
    let procs = set(&[(0, 5), (1, 3), (2, 1)]);
    let out = run(CpuPolicy::RoundRobin, &procs);
    let order: Vec<Pid> = out.timeline.iter().filter_map(|e| e.subject).collect();
    assert_eq!(order, vec![1, 1, 2, 2, 3, 1, 1, 2, 1]);
    assert_eq!(completions(&out), vec![9, 8, 5]);
    assert_eq!(out.count(DecisionKind::Requeue), 3);
}

#[test]
fn round_robin_quantum_is_respected() {
    let procs = set(&[(0, 7), (0, 2)]);
    let params = CpuParams::default().with_quantum(3);
    let out = schedule(CpuPolicy::RoundRobin, &procs, &params).unwrap();
    let order: Vec<Pid> = out.timeline.iter().filter_map(|e| e.subject).collect();
    assert_eq!(order, vec![1, 1, 1, 2, 2, 1, 1, 1, 1]);
    // ceil(7/3) - 1 + ceil(2/3) - 1
    assert_eq!(out.count(DecisionKind::Requeue), 2);
}

#[test]
fn priority_without_preemption() {
    let procs = vec![
        Process::new(1, 0, 4).with_priority(2),
        Process::new(2, 1, 3).with_priority(1),
        Process::new(3, 2, 1).with_priority(3),
        Process::new(4, 3, 2).with_priority(1),
    ];
    let out = run(CpuPolicy::PriorityNp, &procs);
    assert_eq!(completions(&out), vec![4, 7, 10, 9]);
}

#[test]
fn priority_with_preemption_needs_strictly_better() {
    let procs = vec![
        Process::new(1, 0, 4).with_priority(3),
        Process::new(2, 1, 2).with_priority(1),
        Process::new(3, 2, 1).with_priority(1),
    ];
    let out = run(CpuPolicy::PriorityP, &procs);
    assert_eq!(completions(&out), vec![7, 3, 4]);
    assert_eq!(out.count(DecisionKind::Preempt), 1);
}

#[test]
fn mlq_system_arrival_interrupts_user_slice() {
    let procs = vec![
        Process::new(1, 0, 6).with_queue(1),
        Process::new(2, 2, 3).with_queue(0),
    ];
    let out = run(CpuPolicy::Mlq, &procs);
    assert_eq!(completions(&out), vec![9, 5]);
    assert_eq!(out.count(DecisionKind::Preempt), 1);
    assert_eq!(out.count(DecisionKind::Requeue), 0);
    let order: Vec<Pid> = out.timeline.iter().filter_map(|e| e.subject).collect();
    assert_eq!(order, vec![1, 1, 2, 2, 2, 1, 1, 1, 1]);
}

#[test]
fn mlq_rejects_unknown_classes() {
    let procs = vec![Process::new(1, 0, 2).with_queue(2)];
    assert!(matches!(
        schedule(CpuPolicy::Mlq, &procs, &CpuParams::default()),
        Err(SimError::InvalidInput { .. })
    ));
    // Other policies do not care about the class.
    assert!(schedule(CpuPolicy::Fcfs, &procs, &CpuParams::default()).is_ok());
}

#[test]
fn mlfq_demotes_unfinished_slices() {
    let out = run(CpuPolicy::Mlfq, &set(&[(0, 8), (1, 3)]));
    assert_eq!(completions(&out), vec![11, 9]);
    assert_eq!(out.count(DecisionKind::Demote), 3);
    let levels: Vec<(Pid, Option<usize>)> = out.decisions.iter()
        .filter(|d| d.kind == DecisionKind::Dispatch)
        .map(|d| (d.pid, d.level))
        .collect();
    assert_eq!(levels, vec![
        (1, Some(0)), (2, Some(0)), (1, Some(1)), (2, Some(1)), (1, Some(2)),
    ]);
}

#[test]
fn mlfq_lowest_level_is_configurable() {
    let procs = set(&[(0, 5)]);
    let mut params = CpuParams::default();
    params.mlfq = MlfqConfig { levels: vec![LevelPolicy::Rr(2)], lowest: LowestLevel::Recycle };
    let out = schedule(CpuPolicy::Mlfq, &procs, &params).unwrap();
    assert_eq!(out.count(DecisionKind::Requeue), 2);
    assert_eq!(out.count(DecisionKind::Dispatch), 3);

    params.mlfq.lowest = LowestLevel::RunToCompletion;
    let out = schedule(CpuPolicy::Mlfq, &procs, &params).unwrap();
    assert_eq!(out.count(DecisionKind::Requeue), 0);
    assert_eq!(out.count(DecisionKind::Dispatch), 1);
    assert_eq!(completions(&out), vec![5]);
}

#[test]
fn mlfq_shortest_remaining_level() {
    let procs = set(&[(0, 5), (0, 3), (0, 2)]);
    let mut params = CpuParams::default();
    params.mlfq = MlfqConfig {
        levels: vec![LevelPolicy::Rr(1), LevelPolicy::Sjf],
        lowest: LowestLevel::Recycle,
    };
    let out = schedule(CpuPolicy::Mlfq, &procs, &params).unwrap();
    assert_eq!(completions(&out), vec![10, 6, 4]);
    let bottom: Vec<Pid> = out.decisions.iter()
        .filter(|d| d.kind == DecisionKind::Dispatch && d.level == Some(1))
        .map(|d| d.pid)
        .collect();
    assert_eq!(bottom, vec![3, 2, 1]);
}

#[test]
fn arrivals_are_logged_when_they_happen() {
    let out = run(CpuPolicy::Fcfs, &set(&[(0, 5), (1, 1)]));
    let log: Vec<(Ticks, Pid, DecisionKind)> = out.decisions.iter()
        .map(|d| (d.time, d.pid, d.kind))
        .collect();
    assert_eq!(log, vec![
        (0, 1, DecisionKind::Arrive),
        (0, 1, DecisionKind::Dispatch),
        (1, 2, DecisionKind::Arrive),
        (5, 1, DecisionKind::Complete),
        (5, 2, DecisionKind::Dispatch),
        (6, 2, DecisionKind::Complete),
    ]);
}

#[test]
fn io_follows_the_cpu_burst() {
    let procs = vec![Process::new(1, 0, 2).with_io(2), Process::new(2, 0, 1)];
    let out = run(CpuPolicy::Fcfs, &procs);
    let kinds: Vec<EventKind> = out.timeline.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EventKind::Cpu, EventKind::Cpu, EventKind::Io, EventKind::Io, EventKind::Cpu]);
    assert_eq!(out.timeline[2].subject, Some(1));
    assert_eq!(completions(&out), vec![4, 5]);
    // I/O is never waiting.
    assert_eq!(out.stats[0].waiting, 0);
    assert_eq!(out.stats[1].waiting, 4);
}

#[test]
fn clock_starts_at_first_arrival_and_idles_in_gaps() {
    let out = run(CpuPolicy::Sjf, &set(&[(3, 1), (6, 1)]));
    assert_eq!(out.timeline[0].time, 3);
    assert_eq!(out.timeline.len(), 4);
    assert_eq!(out.metrics.idle, 2);
    assert!(out.timeline[1..3].iter().all(|e| e.subject.is_none()));
}

#[test]
fn bad_parameters_are_rejected_up_front() {
    let procs = set(&[(0, 2)]);
    let zero_q = CpuParams::default().with_quantum(0);
    assert!(schedule(CpuPolicy::RoundRobin, &procs, &zero_q).is_err());
    // Quantum is only read by Round Robin.
    assert!(schedule(CpuPolicy::Fcfs, &procs, &zero_q).is_ok());

    let mut params = CpuParams::default();
    params.mlq_quantum = -1;
    assert!(schedule(CpuPolicy::Mlq, &procs, &params).is_err());

    let mut params = CpuParams::default();
    params.mlfq.levels.clear();
    assert!(schedule(CpuPolicy::Mlfq, &procs, &params).is_err());
    params.mlfq.levels = vec![LevelPolicy::Rr(0), LevelPolicy::Fcfs];
    assert!(schedule(CpuPolicy::Mlfq, &procs, &params).is_err());

    let dup = vec![Process::new(1, 0, 1), Process::new(1, 2, 1)];
    assert!(schedule(CpuPolicy::Fcfs, &dup, &CpuParams::default()).is_err());
}

#[test]
fn empty_set_yields_empty_outcome() {
    for policy in CpuPolicy::ALL {
        let out = run(policy, &[]);
        assert!(out.stats.is_empty() && out.timeline.is_empty() && out.decisions.is_empty());
        assert_eq!(out.metrics.makespan, 0);
    }
}

#[test]
fn policies_parse_by_name() {
    assert_eq!("srtf".parse::<CpuPolicy>().unwrap(), CpuPolicy::Srtf);
    assert_eq!("RR".parse::<CpuPolicy>().unwrap(), CpuPolicy::RoundRobin);
    assert_eq!("priority-p".parse::<CpuPolicy>().unwrap(), CpuPolicy::PriorityP);
    assert!(matches!("lottery".parse::<CpuPolicy>(), Err(SimError::Policy { .. })));

    assert_eq!("rr:4".parse::<LevelPolicy>().unwrap(), LevelPolicy::Rr(4));
    assert_eq!(" FCFS ".parse::<LevelPolicy>().unwrap(), LevelPolicy::Fcfs);
    assert!("rr:x".parse::<LevelPolicy>().is_err());
    assert!("lifo".parse::<LevelPolicy>().is_err());
}

#[test]
fn every_policy_at_once() {
    let procs = set(&[(0, 4), (1, 3), (2, 5), (6, 2)]);
    let all = schedule_all(&procs, &CpuParams::default());
    assert_eq!(all.len(), CpuPolicy::ALL.len());
    for (policy, res) in CpuPolicy::ALL.iter().zip(all) {
        let out = res.unwrap();
        assert_eq!(out.policy, *policy);
        assert_eq!(out, run(*policy, &procs));
    }
}

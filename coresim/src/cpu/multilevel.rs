use crate::helpe::*;
use super::{run::Run, LevelPolicy, LowestLevel, MlfqConfig};

//---START MULTILEVEL QUEUE
/// Hands newcomers to their fixed queue.
fn sort_arrivals(
    run:    &mut Run,
    system: &mut VecDeque<usize>,
    user:   &mut VecDeque<usize>,
) {
    for pos in run.admit() {
        match run.procs[pos].queue {
            0 => system.push_back(pos),
            _ => user.push_back(pos),
        }
    }
}

/// Two fixed classes: queue 0 runs FCFS to completion, queue 1 runs
/// Round Robin and only gets the CPU while queue 0 is empty. A queue-0
/// arrival cuts a queue-1 slice short at the next unit boundary.
///
/// Class values must already be known to lie in {0, 1}.
pub fn multilevel_queue(run: &mut Run, quantum: Ticks) {
    let mut system: VecDeque<usize> = VecDeque::new();
    let mut user: VecDeque<usize> = VecDeque::new();
    while !run.finished() {
        sort_arrivals(run, &mut system, &mut user);
        if let Some(pos) = system.pop_front() {
            run.dispatch(pos, Some(0));
            let units = run.remaining(pos);
            run.exec_for(pos, units, "executing (MLQ queue 0, FCFS)");
            run.finish(pos);
            continue;
        }
        let Some(pos) = user.pop_front() else {
            run.idle();
            continue;
        };
        run.dispatch(pos, Some(1));
        let mut interrupted = false;
        for _ in 0..quantum {
            run.exec(pos, "executing (MLQ queue 1, RR)");
            sort_arrivals(run, &mut system, &mut user);
            if run.remaining(pos) == 0 { break; }
            if !system.is_empty() {
                interrupted = true;
                break;
            }
        }
        if run.remaining(pos) == 0 {
            run.finish(pos);
        } else {
            if interrupted {
                run.preempt(pos, Some(1));
            } else {
                run.requeue(pos, Some(1));
            }
            user.push_back(pos);
        }
    }
}
//---END MULTILEVEL QUEUE

//---START MULTILEVEL FEEDBACK QUEUE
/// A feedback level, checked and ready to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Rr(Ticks),
    Sjf,
    Fcfs,
}

pub fn validate_levels(cfg: &MlfqConfig) -> Result<Vec<Level>, SimError> {
    if cfg.levels.is_empty() {
        return Err(SimError::invalid("multilevel feedback queue needs at least one level"));
    }
    cfg.levels.iter()
        .enumerate()
        .map(|(idx, l)| match *l {
            LevelPolicy::Rr(q) if q <= 0 => Err(SimError::invalid(
                format!("level {idx}: Round Robin quantum must be positive, got {q}"))),
            LevelPolicy::Rr(q)  => Ok(Level::Rr(q as Ticks)),
            LevelPolicy::Sjf    => Ok(Level::Sjf),
            LevelPolicy::Fcfs   => Ok(Level::Fcfs),
        })
        .collect()
}

/// Every arrival enters level 0. The CPU always serves the first
/// non-empty level, and a slice is never cut short. A Round-Robin slice
/// that ends with work left sends the process one level down, or, at
/// the lowest level, does what `lowest` says.
pub fn feedback_queue(run: &mut Run, levels: &[Level], lowest: LowestLevel) {
    let procs = run.procs;
    let bottom = levels.len() - 1;
    let mut queues: Vec<VecDeque<usize>> = vec![VecDeque::new(); levels.len()];
    while !run.finished() {
        queues[0].extend(run.admit());
        let Some(lvl) = queues.iter().position(|q| !q.is_empty()) else {
            run.idle();
            continue;
        };
        let (i, note) = match levels[lvl] {
            Level::Rr(_)    => (Some(0), "RR"),
            Level::Sjf      => (queues[lvl].iter()
                .position_min_by_key(|&&pos| (run.remaining(pos), procs[pos].queue_key(pos))), "SJF"),
            Level::Fcfs     => (queues[lvl].iter()
                .position_min_by_key(|&&pos| procs[pos].queue_key(pos)), "FCFS"),
        };
        let Some(pos) = i.and_then(|i| queues[lvl].remove(i)) else { continue; };
        let slice = match levels[lvl] {
            Level::Rr(_) if lvl == bottom && lowest == LowestLevel::RunToCompletion => run.remaining(pos),
            Level::Rr(q)    => q.min(run.remaining(pos)),
            _               => run.remaining(pos),
        };
        run.dispatch(pos, Some(lvl));
        let note = format!("executing (MLFQ level {lvl}, {note})");
        for _ in 0..slice {
            run.exec(pos, &note);
            queues[0].extend(run.admit());
        }
        if run.remaining(pos) == 0 {
            run.finish(pos);
        } else if lvl == bottom {
            run.requeue(pos, Some(lvl));
            queues[lvl].push_back(pos);
        } else {
            run.demote(pos, lvl + 1);
            queues[lvl + 1].push_back(pos);
        }
    }
}
//---END MULTILEVEL FEEDBACK QUEUE

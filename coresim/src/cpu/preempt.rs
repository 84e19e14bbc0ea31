use crate::helpe::*;
use super::run::Run;

/// Unit-by-unit selection. After every unit, the best ready candidate
/// (by `primary`, then arrival, then position) takes the CPU away from
/// the running process, but only if its `primary` is strictly better.
fn preemptive<K: Ord + Copy>(
    run:        &mut Run,
    note:       &str,
    primary:    impl Fn(&Run, usize) -> K,
) {
    let procs = run.procs;
    let mut ready: Vec<usize> = vec![];
    let mut current: Option<usize> = None;
    while !run.finished() {
        ready.extend(run.admit());
        let best = ready.iter()
            .position_min_by_key(|&&pos| (primary(&*run, pos), procs[pos].queue_key(pos)));
        let pos = match (current, best) {
            (Some(cur), Some(i)) if primary(&*run, ready[i]) < primary(&*run, cur) => {
                let cand = ready.swap_remove(i);
                run.preempt(cur, None);
                ready.push(cur);
                run.dispatch(cand, None);
                cand
            },
            (Some(cur), _) => cur,
            (None, Some(i)) => {
                let cand = ready.swap_remove(i);
                run.dispatch(cand, None);
                cand
            },
            (None, None) => {
                run.idle();
                continue;
            },
        };
        run.exec(pos, note);
        if run.remaining(pos) == 0 {
            run.finish(pos);
            current = None;
        } else {
            current = Some(pos);
        }
    }
}

pub fn shortest_remaining(run: &mut Run) {
    preemptive(run, "executing (SRTF)", |r, pos| r.remaining(pos));
}

/// Lower value means higher priority.
pub fn preemptive_priority(run: &mut Run) {
    preemptive(run, "executing (priority)", |r, pos| r.procs[pos].priority);
}

use crate::helpe::*;
use super::run::Run;

/// Non-preemptive selection: whoever minimizes `key` among the ready
/// processes gets the CPU for its whole burst. FCFS, SJF and
/// non-preemptive priority only differ in the key.
///
/// `key` must break every tie (e.g. by end with the position), so that
/// the order of the ready list does not matter.
pub fn run_to_completion<K: Ord>(
    run:    &mut Run,
    note:   &str,
    key:    impl Fn(&Process, usize) -> K,
) {
    let procs = run.procs;
    let mut ready: Vec<usize> = vec![];
    while !run.finished() {
        ready.extend(run.admit());
        let Some(i) = ready.iter()
            .position_min_by_key(|&&pos| key(&procs[pos], pos)) else {
            run.idle();
            continue;
        };
        let pos = ready.swap_remove(i);
        run.dispatch(pos, None);
        let units = run.remaining(pos);
        run.exec_for(pos, units, note);
        run.finish(pos);
    }
}

use crate::helpe::*;
use super::run::Run;

/// Round Robin over a single FIFO ready queue. A slice is
/// `min(quantum, remaining)` units long. When a slice ends with work
/// left, whoever arrived meanwhile gets in line first, and only then
/// does the process go back to the tail.
pub fn round_robin(run: &mut Run, quantum: Ticks) {
    let mut queue: VecDeque<usize> = VecDeque::new();
    while !run.finished() {
        queue.extend(run.admit());
        let Some(pos) = queue.pop_front() else {
            run.idle();
            continue;
        };
        run.dispatch(pos, None);
        let slice = quantum.min(run.remaining(pos));
        run.exec_for(pos, slice, "executing (RR)");
        if run.remaining(pos) == 0 {
            run.finish(pos);
        } else {
            queue.extend(run.admit());
            run.requeue(pos, None);
            queue.push_back(pos);
        }
    }
}

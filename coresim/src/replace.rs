//! Page replacement.
//!
//! A fixed number of frames serves a reference string. Each policy is a
//! [`Replacer`]: it is told about every reference in order and answers
//! whether the page was resident, and if not, which page (if any) had to
//! go to make room.
use crate::helpe::*;
use std::cmp::Reverse;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Debug, Serialize)]
pub enum ReplacePolicy {
    /// Least recently used
    Lru,
    /// First in, first out
    Fifo,
    /// Farthest next use (needs the whole reference string)
    Optimal,
    /// Least frequently used
    Lfu,
    /// Most frequently used
    Mfu,
}

impl ReplacePolicy {
    pub const ALL: [ReplacePolicy; 5] = [
        Self::Lru, Self::Fifo, Self::Optimal, Self::Lfu, Self::Mfu,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Lru       => "LRU",
            Self::Fifo      => "FIFO",
            Self::Optimal   => "Optimal",
            Self::Lfu       => "LFU",
            Self::Mfu       => "MFU",
        }
    }
}

impl FromStr for ReplacePolicy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s.trim(), true)
            .map_err(|_| SimError::policy(s, "page replacement"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Hit,
    /// `evicted` is `None` while free frames remain.
    Fault { evicted: Option<PageId> },
}

/// Defines the interface of a replacement policy.
pub trait Replacer {
    /// Handles reference number `step`, which is to `page`.
    fn access(&mut self, step: usize, page: PageId) -> Access;

    /// Frame contents, in the order the policy keeps them.
    fn resident(&self) -> Vec<PageId>;
}

/// Recency order is the set's order: front is least recent.
pub struct Lru {
    capacity:   usize,
    frames:     IndexSet<PageId>,
}

impl Lru {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, frames: IndexSet::with_capacity(capacity) }
    }
}

impl Replacer for Lru {
    fn access(&mut self, _: usize, page: PageId) -> Access {
        if self.frames.shift_remove(&page) {
            self.frames.insert(page);
            return Access::Hit;
        }
        let evicted = if self.frames.len() == self.capacity {
            self.frames.shift_remove_index(0)
        } else { None };
        self.frames.insert(page);

        Access::Fault { evicted }
    }

    fn resident(&self) -> Vec<PageId> {
        self.frames.iter().copied().collect()
    }
}

/// Frame slots are replaced in place, round the clock.
pub struct Fifo {
    capacity:   usize,
    frames:     Vec<PageId>,
    hand:       usize,
}

impl Fifo {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, frames: Vec::with_capacity(capacity), hand: 0 }
    }
}

impl Replacer for Fifo {
    fn access(&mut self, _: usize, page: PageId) -> Access {
        if self.frames.contains(&page) { return Access::Hit; }
        if self.frames.len() < self.capacity {
            self.frames.push(page);
            return Access::Fault { evicted: None };
        }
        let evicted = std::mem::replace(&mut self.frames[self.hand], page);
        self.hand = (self.hand + 1) % self.capacity;

        Access::Fault { evicted: Some(evicted) }
    }

    fn resident(&self) -> Vec<PageId> {
        self.frames.clone()
    }
}

/// Belady's algorithm.
///
/// > ***ATTENTION:*** not a causal policy. It is handed the complete
/// > reference string up front, and `step` must be the true position of
/// > each reference within it.
pub struct Optimal {
    capacity:   usize,
    frames:     Vec<PageId>,
    refs:       Vec<PageId>,
}

impl Optimal {
    pub fn new(capacity: usize, refs: &[PageId]) -> Self {
        Self { capacity, frames: Vec::with_capacity(capacity), refs: refs.to_vec() }
    }

    /// Position of the next reference to `page` after `step`, if any.
    fn next_use(&self, step: usize, page: PageId) -> Option<usize> {
        self.refs.iter()
            .skip(step + 1)
            .position(|&p| p == page)
    }
}

impl Replacer for Optimal {
    fn access(&mut self, step: usize, page: PageId) -> Access {
        if self.frames.contains(&page) { return Access::Hit; }
        if self.frames.len() < self.capacity {
            self.frames.push(page);
            return Access::Fault { evicted: None };
        }
        // Never used again beats everything; otherwise the farthest wins,
        // and the first frame wins among equals.
        let Some(victim) = self.frames.iter()
            .position_min_by_key(|&&p| Reverse(self.next_use(step, p).unwrap_or(usize::MAX))) else {
            return Access::Fault { evicted: None };
        };
        let evicted = std::mem::replace(&mut self.frames[victim], page);

        Access::Fault { evicted: Some(evicted) }
    }

    fn resident(&self) -> Vec<PageId> {
        self.frames.clone()
    }
}

/// Reference counts are cumulative over the whole string, including
/// the time a page spends evicted.
#[derive(Default)]
struct Counter {
    counts:     HashMap<PageId, usize>,
    last_used:  HashMap<PageId, usize>,
}

impl Counter {
    fn touch(&mut self, step: usize, page: PageId) {
        *self.counts.entry(page).or_insert(0) += 1;
        self.last_used.insert(page, step);
    }

    fn count(&self, page: PageId) -> usize {
        self.counts.get(&page).copied().unwrap_or(0)
    }

    fn last_used(&self, page: PageId) -> usize {
        self.last_used.get(&page).copied().unwrap_or(0)
    }
}

/// Evicts the lowest count, least recently used among equals. The new
/// page goes to the end.
pub struct Lfu {
    capacity:   usize,
    frames:     Vec<PageId>,
    counter:    Counter,
}

impl Lfu {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, frames: Vec::with_capacity(capacity), counter: Counter::default() }
    }
}

impl Replacer for Lfu {
    fn access(&mut self, step: usize, page: PageId) -> Access {
        self.counter.touch(step, page);
        if self.frames.contains(&page) { return Access::Hit; }
        let evicted = if self.frames.len() == self.capacity {
            self.frames.iter()
                .position_min_by_key(|&&p| (self.counter.count(p), self.counter.last_used(p)))
                .map(|i| self.frames.remove(i))
        } else { None };
        self.frames.push(page);

        Access::Fault { evicted }
    }

    fn resident(&self) -> Vec<PageId> {
        self.frames.clone()
    }
}

/// Evicts the highest count, first in resident order among equals. The
/// new page goes to the end.
pub struct Mfu {
    capacity:   usize,
    frames:     Vec<PageId>,
    counter:    Counter,
}

impl Mfu {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, frames: Vec::with_capacity(capacity), counter: Counter::default() }
    }
}

impl Replacer for Mfu {
    fn access(&mut self, step: usize, page: PageId) -> Access {
        self.counter.touch(step, page);
        if self.frames.contains(&page) { return Access::Hit; }
        let evicted = if self.frames.len() == self.capacity {
            self.frames.iter()
                .position_min_by_key(|&&p| Reverse(self.counter.count(p)))
                .map(|i| self.frames.remove(i))
        } else { None };
        self.frames.push(page);

        Access::Fault { evicted }
    }

    fn resident(&self) -> Vec<PageId> {
        self.frames.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageStep {
    pub page:       PageId,
    pub fault:      bool,
    pub evicted:    Option<PageId>,
    /// Frame contents after this reference.
    pub resident:   Vec<PageId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagingOutcome {
    pub policy:     ReplacePolicy,
    pub frames:     usize,
    pub steps:      Vec<PageStep>,
    pub faults:     usize,
    pub hits:       usize,
    pub hit_ratio:  f64,
}

/// Builds the strategy object for `policy`.
pub fn replacer(policy: ReplacePolicy, frames: usize, refs: &[PageId]) -> Box<dyn Replacer> {
    match policy {
        ReplacePolicy::Lru      => Box::new(Lru::new(frames)),
        ReplacePolicy::Fifo     => Box::new(Fifo::new(frames)),
        ReplacePolicy::Optimal  => Box::new(Optimal::new(frames, refs)),
        ReplacePolicy::Lfu      => Box::new(Lfu::new(frames)),
        ReplacePolicy::Mfu      => Box::new(Mfu::new(frames)),
    }
}

/// Serves `refs` with `frames` frames under `policy`.
pub fn simulate(policy: ReplacePolicy, refs: &[i64], frames: i64) -> Result<PagingOutcome, SimError> {
    if frames <= 0 {
        return Err(SimError::invalid(format!("frame count must be positive, got {frames}")));
    }
    let refs = refs.iter()
        .enumerate()
        .map(|(i, &p)| if p < 0 {
            Err(SimError::invalid(format!("reference #{i}: negative page id {p}")))
        } else { Ok(p as PageId) })
        .collect::<Result<Vec<PageId>, SimError>>()?;
    let frames = frames as usize;
    debug!("{} with {frames} frames over {} references", policy.name(), refs.len());

    let mut strategy = replacer(policy, frames, &refs);
    let steps: Vec<PageStep> = refs.iter()
        .enumerate()
        .map(|(step, &page)| {
            let access = strategy.access(step, page);
            let resident = strategy.resident();
            debug_assert!(resident.len() <= frames && resident.contains(&page));
            let (fault, evicted) = match access {
                Access::Hit                 => (false, None),
                Access::Fault { evicted }   => (true, evicted),
            };
            trace!("ref {step}: page {page} {} {resident:?}", if fault { "fault" } else { "hit" });
            PageStep { page, fault, evicted, resident }
        })
        .collect();
    let faults = steps.iter().filter(|s| s.fault).count();
    let hits = steps.len() - faults;

    Ok(PagingOutcome {
        policy,
        frames,
        faults,
        hits,
        hit_ratio: if steps.is_empty() { 0.0 } else { hits as f64 / steps.len() as f64 },
        steps,
    })
}

/// Runs every policy over the same string, in parallel. Results come
/// back in [`ReplacePolicy::ALL`] order.
pub fn simulate_all(refs: &[i64], frames: i64) -> Vec<Result<PagingOutcome, SimError>> {
    ReplacePolicy::ALL
        .par_iter()
        .map(|&policy| simulate(policy, refs, frames))
        .collect()
}

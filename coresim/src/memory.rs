//! Stepwise memory allocation.
//!
//! A [`MemoryEngine`] is a resumable cursor over a list of process
//! sizes. Each call to [`MemoryEngine::allocate_next`] places exactly one
//! process into the block set under the chosen discipline and reports
//! what happened. A process that does not fit is a per-step outcome,
//! never a reason to stop: the next step simply goes on.
use crate::helpe::*;

/// Discipline names as they appear on a command line.
#[derive(Copy, Clone, PartialEq, Eq, Hash, ValueEnum, Debug, Serialize)]
pub enum DisciplineKind {
    /// First block that is large enough
    FirstFit,
    /// Smallest block that is large enough
    BestFit,
    /// Largest block that is large enough
    WorstFit,
    /// Fixed-size pages spread over any blocks
    Paging,
    /// Two segments (60% / 40%), each placed first-fit
    Segmentation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Discipline {
    FirstFit,
    BestFit,
    WorstFit,
    Paging { page_size: usize },
    Segmentation,
}

impl Discipline {
    /// `page_size` is only read for [`DisciplineKind::Paging`].
    pub fn from_kind(kind: DisciplineKind, page_size: i64) -> Result<Self, SimError> {
        Ok(match kind {
            DisciplineKind::FirstFit        => Self::FirstFit,
            DisciplineKind::BestFit         => Self::BestFit,
            DisciplineKind::WorstFit        => Self::WorstFit,
            DisciplineKind::Segmentation    => Self::Segmentation,
            DisciplineKind::Paging          => {
                if page_size <= 0 {
                    return Err(SimError::invalid(format!("page size must be positive, got {page_size}")));
                }
                Self::Paging { page_size: page_size as usize }
            },
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::FirstFit      => "First Fit",
            Self::BestFit       => "Best Fit",
            Self::WorstFit      => "Worst Fit",
            Self::Paging { .. } => "Paging",
            Self::Segmentation  => "Segmentation",
        }
    }

    fn action(&self) -> &'static str {
        match self {
            Self::Paging { .. } => "page",
            Self::Segmentation  => "segment",
            _                   => "allocate",
        }
    }
}

impl FromStr for DisciplineKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s.trim(), true)
            .map_err(|_| SimError::policy(s, "memory allocation"))
    }
}

/// Where a process ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Placement {
    /// Contiguous, in one block.
    Block { index: usize },
    /// `count` pages, as `(block index, pages in that block)`.
    Pages {
        count:                  usize,
        frames:                 Vec<(usize, usize)>,
        /// Unused space in the last page.
        internal_fragmentation: usize,
    },
    /// `(block index, segment size)`, in segment order.
    Segments { parts: Vec<(usize, usize)> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocStep {
    /// Position in the process list.
    pub process:    Pid,
    pub size:       usize,
    pub result:     Result<Placement, AllocationFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemorySummary {
    pub allocated:              usize,
    pub failed:                 usize,
    pub used:                   usize,
    pub free:                   usize,
    pub largest_free:           usize,
    /// Free space outside the largest free block, i.e. what no single
    /// contiguous request can use.
    pub external_fragmentation: usize,
    /// Sum of the unused page tails. Zero unless paging.
    pub internal_fragmentation: usize,
}

pub struct MemoryEngine {
    blocks:     Vec<MemoryBlock>,
    processes:  Vec<usize>,
    discipline: Discipline,
    cursor:     usize,
    allocated:  usize,
    failed:     usize,
    internal:   usize,
}

impl MemoryEngine {
    /// Validates the scenario. Every block and process size must be
    /// positive.
    pub fn new(blocks: &[i64], processes: &[i64], discipline: Discipline) -> Result<Self, SimError> {
        let positive = |v: &[i64], what: &str| v.iter()
            .enumerate()
            .map(|(i, &x)| if x <= 0 {
                Err(SimError::invalid(format!("{what} #{i} must be positive, got {x}")))
            } else { Ok(x as usize) })
            .collect::<Result<Vec<usize>, SimError>>();
        if let Discipline::Paging { page_size: 0 } = discipline {
            return Err(SimError::invalid("page size must be positive"));
        }
        if processes.len() > Pid::MAX as usize {
            return Err(SimError::invalid("too many processes"));
        }

        Ok(Self {
            blocks:     positive(blocks, "block")?
                .into_iter()
                .map(|sz| MemoryBlock { original_size: sz, free: sz, occupants: vec![] })
                .collect(),
            processes:  positive(processes, "process")?,
            discipline,
            cursor:     0,
            allocated:  0,
            failed:     0,
            internal:   0,
        })
    }

    pub fn blocks(&self) -> &[MemoryBlock] {
        &self.blocks
    }

    /// Sizes of the processes not stepped through yet.
    pub fn pending(&self) -> &[usize] {
        &self.processes[self.cursor..]
    }

    /// Index of the next process to place.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn discipline(&self) -> Discipline {
        self.discipline
    }

    pub fn summary(&self) -> MemorySummary {
        let free: usize = self.blocks.iter().map(|b| b.free).sum();
        let total: usize = self.blocks.iter().map(|b| b.original_size).sum();
        let largest_free = self.blocks.iter()
            .map(|b| b.free)
            .max()
            .unwrap_or(0);

        MemorySummary {
            allocated:              self.allocated,
            failed:                 self.failed,
            used:                   total - free,
            free,
            largest_free,
            external_fragmentation: free - largest_free,
            internal_fragmentation: self.internal,
        }
    }

    /// Places the next pending process. Returns `None` once every
    /// process has had its turn.
    pub fn allocate_next(&mut self) -> Option<AllocStep> {
        let size = *self.processes.get(self.cursor)?;
        let process = self.cursor as Pid;
        self.cursor += 1;

        let result = match self.discipline {
            Discipline::FirstFit        => self.fit(process, size, |_, _| false),
            Discipline::BestFit         => self.fit(process, size, |cand, best| cand < best),
            Discipline::WorstFit        => self.fit(process, size, |cand, best| cand > best),
            Discipline::Paging { page_size } => self.page(process, size, page_size),
            Discipline::Segmentation    => self.segment(process, size),
        };
        match &result {
            Ok(placement)   => {
                self.allocated += 1;
                debug!("P{process} ({size}) -> {placement:?}");
            },
            Err(failure)    => {
                self.failed += 1;
                warn!("{failure}");
            },
        }
        debug_assert!(crate::analyze::blocks_are_consistent(&self.blocks), "Block accounting broken!");

        Some(AllocStep { process, size, result })
    }

    /// Steps through everything that is left.
    pub fn run_to_end(&mut self) -> Vec<AllocStep> {
        self.by_ref().collect()
    }

    fn failure(&self, process: Pid, size: usize, reason: String, partial: Vec<(usize, usize)>) -> AllocationFailure {
        AllocationFailure {
            process,
            size,
            action: self.discipline.action(),
            reason,
            partial,
        }
    }

    #[inline(always)]
    fn put(&mut self, idx: usize, process: Pid, size: usize) {
        let b = &mut self.blocks[idx];
        b.free -= size;
        b.occupants.push((process, size));
    }

    /// Contiguous placement. Scans blocks in order and keeps a candidate
    /// that fits, replacing it whenever `better(candidate free, kept free)`.
    /// Ties thus stay with the earlier block.
    fn fit(
        &mut self,
        process:    Pid,
        size:       usize,
        better:     impl Fn(usize, usize) -> bool,
    ) -> Result<Placement, AllocationFailure> {
        let mut pick: Option<usize> = None;
        for (i, b) in self.blocks.iter().enumerate() {
            if b.free < size { continue; }
            match pick {
                None                                        => pick = Some(i),
                Some(p) if better(b.free, self.blocks[p].free)  => pick = Some(i),
                _                                           => {},
            }
        }
        match pick {
            Some(index) => {
                self.put(index, process, size);
                Ok(Placement::Block { index })
            },
            None        => Err(self.failure(process, size, "no block has enough free space".to_string(), vec![])),
        }
    }

    /// All pages or none: slivers are counted before anything moves.
    fn page(&mut self, process: Pid, size: usize, page_size: usize) -> Result<Placement, AllocationFailure> {
        let count = size.div_ceil(page_size);
        let mut frames = vec![];
        let mut found = 0;
        for (i, b) in self.blocks.iter().enumerate() {
            if found == count { break; }
            let here = (b.free / page_size).min(count - found);
            if here > 0 {
                frames.push((i, here));
                found += here;
            }
        }
        if found < count {
            return Err(self.failure(
                process,
                size,
                format!("{count} pages of {page_size} needed, only {found} available"),
                vec![],
            ));
        }
        for &(i, pages) in &frames {
            for _ in 0..pages {
                self.put(i, process, page_size);
            }
        }
        let internal_fragmentation = count * page_size - size;
        self.internal += internal_fragmentation;

        Ok(Placement::Pages { count, frames, internal_fragmentation })
    }

    /// Two segments, each first-fit. A failing second segment leaves the
    /// first one where it is.
    fn segment(&mut self, process: Pid, size: usize) -> Result<Placement, AllocationFailure> {
        // 60% of `size`, rounded down, without overflowing on huge sizes.
        let first = size / 10 * 6 + size % 10 * 6 / 10;
        let mut parts = vec![];
        for seg in [first, size - first] {
            if seg == 0 { continue; }
            match self.blocks.iter().position(|b| b.free >= seg) {
                Some(i) => {
                    self.put(i, process, seg);
                    parts.push((i, seg));
                },
                None    => return Err(self.failure(
                    process,
                    size,
                    format!("no block can hold a segment of {seg}"),
                    parts,
                )),
            }
        }

        Ok(Placement::Segments { parts })
    }
}

impl Iterator for MemoryEngine {
    type Item = AllocStep;

    fn next(&mut self) -> Option<Self::Item> {
        self.allocate_next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCKS: [i64; 5] = [100, 500, 200, 300, 600];
    const PROCS: [i64; 4] = [212, 417, 112, 426];

    fn placed_in(step: &AllocStep) -> Option<usize> {
        match step.result {
            Ok(Placement::Block { index }) => Some(index),
            _ => None,
        }
    }

    fn run(discipline: Discipline) -> (Vec<Option<usize>>, MemoryEngine) {
        let mut engine = MemoryEngine::new(&BLOCKS, &PROCS, discipline).unwrap();
        let res = engine.run_to_end().iter().map(placed_in).collect();
        (res, engine)
    }

    #[test]
    fn first_fit_textbook() {
        let (res, engine) = run(Discipline::FirstFit);
        assert_eq!(res, vec![Some(1), Some(4), Some(1), None]);
        assert_eq!(engine.summary().failed, 1);
    }

    #[test]
    fn best_fit_textbook() {
        let (res, engine) = run(Discipline::BestFit);
        assert_eq!(res, vec![Some(3), Some(1), Some(2), Some(4)]);
        let s = engine.summary();
        assert_eq!(s.used, 212 + 417 + 112 + 426);
        assert_eq!(s.free + s.used, 1700);
    }

    #[test]
    fn worst_fit_textbook() {
        let (res, _) = run(Discipline::WorstFit);
        assert_eq!(res, vec![Some(4), Some(1), Some(4), None]);
    }

    #[test]
    fn ties_go_to_the_earlier_block() {
        let mut best = MemoryEngine::new(&[50, 30, 30], &[25], Discipline::BestFit).unwrap();
        assert_eq!(placed_in(&best.allocate_next().unwrap()), Some(1));
        let mut worst = MemoryEngine::new(&[30, 50, 50], &[25], Discipline::WorstFit).unwrap();
        assert_eq!(placed_in(&worst.allocate_next().unwrap()), Some(1));
    }

    #[test]
    fn stepping_is_resumable() {
        let mut engine = MemoryEngine::new(&BLOCKS, &PROCS, Discipline::FirstFit).unwrap();
        assert_eq!(engine.cursor(), 0);
        let step = engine.allocate_next().unwrap();
        assert_eq!((step.process, step.size), (0, 212));
        assert_eq!(engine.blocks()[1].free, 288);
        assert_eq!(engine.blocks()[1].occupants, vec![(0, 212)]);
        assert_eq!(engine.pending(), &[417, 112, 426]);
        assert_eq!(engine.run_to_end().len(), 3);
        assert!(engine.allocate_next().is_none());
        assert!(engine.pending().is_empty());
    }

    #[test]
    fn paging_is_all_or_nothing() {
        let paging = Discipline::Paging { page_size: 4 };
        let mut engine = MemoryEngine::new(&[10, 6], &[10, 9], paging).unwrap();
        // 3 pages: two in block 0, one in block 1.
        let step = engine.allocate_next().unwrap();
        assert_eq!(step.result, Ok(Placement::Pages {
            count: 3,
            frames: vec![(0, 2), (1, 1)],
            internal_fragmentation: 2,
        }));
        // 3 more pages needed, none left.
        let before = engine.blocks().to_vec();
        let step = engine.allocate_next().unwrap();
        assert!(step.result.is_err());
        assert_eq!(engine.blocks(), &before[..]);
        let s = engine.summary();
        assert_eq!((s.allocated, s.failed, s.internal_fragmentation), (1, 1, 2));
        assert_eq!((s.free, s.largest_free, s.external_fragmentation), (4, 2, 2));
    }

    #[test]
    fn segmentation_keeps_partial_state() {
        let mut engine = MemoryEngine::new(&[70, 20], &[100], Discipline::Segmentation).unwrap();
        let step = engine.allocate_next().unwrap();
        let failure = step.result.unwrap_err();
        assert_eq!(failure.partial, vec![(0, 60)]);
        assert_eq!(failure.action, "segment");
        assert_eq!(engine.blocks()[0].free, 10);

        let mut engine = MemoryEngine::new(&[70, 50], &[100], Discipline::Segmentation).unwrap();
        let step = engine.allocate_next().unwrap();
        assert_eq!(step.result, Ok(Placement::Segments { parts: vec![(0, 60), (1, 40)] }));
    }

    #[test]
    fn segmentation_splits_huge_processes() {
        let mut engine = MemoryEngine::new(
            &[i64::MAX],
            &[4_000_000_000_000_000_000, 17],
            Discipline::Segmentation,
        ).unwrap();
        let steps = engine.run_to_end();
        assert_eq!(steps[0].result, Ok(Placement::Segments {
            parts: vec![(0, 2_400_000_000_000_000_000), (0, 1_600_000_000_000_000_000)],
        }));
        assert_eq!(steps[1].result, Ok(Placement::Segments { parts: vec![(0, 10), (0, 7)] }));
    }

    #[test]
    fn failures_do_not_stop_later_steps() {
        let mut engine = MemoryEngine::new(&[10], &[50, 5], Discipline::FirstFit).unwrap();
        let steps = engine.run_to_end();
        assert!(steps[0].result.is_err());
        assert_eq!(placed_in(&steps[1]), Some(0));
    }

    #[test]
    fn bad_scenarios_are_rejected() {
        assert!(MemoryEngine::new(&[0, 10], &[5], Discipline::FirstFit).is_err());
        assert!(MemoryEngine::new(&[10], &[-5], Discipline::FirstFit).is_err());
        assert!(MemoryEngine::new(&[10], &[5], Discipline::Paging { page_size: 0 }).is_err());
        assert!(Discipline::from_kind(DisciplineKind::Paging, -4).is_err());
        assert_eq!(
            Discipline::from_kind(DisciplineKind::BestFit, -4).unwrap(),
            Discipline::BestFit
        );
    }
}

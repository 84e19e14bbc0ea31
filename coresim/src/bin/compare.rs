use anyhow::{Context, Result};
use coresim::*;
use coresim::{
    cpu::{CpuOutcome, CpuParams},
    disk::{DiskOutcome, Direction},
    memory::{Discipline, MemoryEngine, MemorySummary},
    replace::PagingOutcome,
    workload::ProcShape,
};

/// Runs every policy of one engine over the same scenario and ranks them
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Engine to compare policies of
    #[arg(value_enum)]
    engine:     EngineKind,

    /// Scenario file: process CSV for `cpu`, integer list otherwise
    #[arg(short, long, value_parser = clap::value_parser!(PathBuf))]
    input:      Option<PathBuf>,

    /// Generate a random scenario of this many items instead
    #[arg(short, long, conflicts_with = "input")]
    #[arg(value_parser = clap::value_parser!(usize))]
    random:     Option<usize>,

    /// Seed for --random
    #[arg(long, default_value_t = 0)]
    #[arg(value_parser = clap::value_parser!(u64))]
    seed:       u64,

    /// Round Robin time slice
    #[arg(short, long, default_value_t = DEFAULT_QUANTUM)]
    #[arg(value_parser = clap::value_parser!(i64))]
    quantum:    i64,

    /// Initial head position
    #[arg(long, default_value_t = 0)]
    #[arg(value_parser = clap::value_parser!(i64))]
    head:       i64,

    /// Number of disk tracks
    #[arg(long, default_value_t = 200)]
    #[arg(value_parser = clap::value_parser!(i64))]
    size:       i64,

    /// Initial sweep direction
    #[arg(short, long, value_enum, default_value_t = Direction::Right)]
    direction:  Direction,

    /// Number of page frames
    #[arg(short, long, default_value_t = 3)]
    #[arg(value_parser = clap::value_parser!(i64))]
    frames:     i64,

    /// Block sizes, for `mem`
    #[arg(short, long)]
    blocks:     Option<String>,

    /// Page size, for `mem`
    #[arg(long, default_value_t = 4)]
    #[arg(value_parser = clap::value_parser!(i64))]
    page_size:  i64,

    /// Log scheduling decisions; twice to log every time unit
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose:    u8,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum EngineKind {
    /// The eight CPU scheduling policies, ranked by average waiting time
    Cpu,
    /// The six disk policies, ranked by head movement
    Disk,
    /// The five allocation disciplines, ranked by failures
    Mem,
    /// The five replacement policies, ranked by page faults
    Page,
}

fn list(cli: &Args, what: &str, gen: impl FnOnce(usize, u64) -> Vec<i64>) -> Result<Vec<i64>> {
    match (&cli.input, cli.random) {
        (Some(path), _) => read_list(path.clone())
            .with_context(|| format!("Reading {what} from {}", path.display())),
        (None, Some(n)) => Ok(gen(n, cli.seed)),
        (None, None)    => anyhow::bail!("Either --input or --random is needed"),
    }
}

fn main() -> Result<()> {
    let cli = Args::parse();
    init_logger(cli.verbose)?;

    match cli.engine {
        EngineKind::Cpu     => {
            let procs = match (&cli.input, cli.random) {
                (Some(path), _) => read_from_path::<ProcCSVParser, &str>(path.clone())
                    .with_context(|| format!("Reading processes from {}", path.display()))?,
                (None, Some(n)) => workload::processes(&ProcShape { count: n, ..ProcShape::default() }, cli.seed),
                (None, None)    => anyhow::bail!("Either --input or --random is needed"),
            };
            let params = CpuParams::default().with_quantum(cli.quantum);
            let outs = cpu::schedule_all(&procs, &params)
                .into_iter()
                .collect::<Result<Vec<CpuOutcome>, SimError>>()?;
            rank_cpu(&outs);
        },
        EngineKind::Disk    => {
            let size = cli.size;
            let requests = list(&cli, "requests", |n, seed| workload::requests(n, size.max(1) as Track, seed))?;
            let outs = disk::seek_all(cli.head, &requests, cli.size, cli.direction)
                .into_iter()
                .collect::<Result<Vec<DiskOutcome>, SimError>>()?;
            rank_disk(&outs);
        },
        EngineKind::Mem     => {
            let processes = list(&cli, "process sizes", |n, seed| workload::sizes(n, 400, seed))?;
            let blocks = match &cli.blocks {
                Some(s) => parse_list(s).context("Parsing block sizes")?,
                None    => workload::sizes(processes.len().max(1), 600, cli.seed.wrapping_add(1)),
            };
            let disciplines = [
                Discipline::FirstFit,
                Discipline::BestFit,
                Discipline::WorstFit,
                Discipline::from_kind(memory::DisciplineKind::Paging, cli.page_size)?,
                Discipline::Segmentation,
            ];
            let summaries = disciplines
                .par_iter()
                .map(|&d| -> Result<(Discipline, MemorySummary), SimError> {
                    let mut engine = MemoryEngine::new(&blocks, &processes, d)?;
                    engine.run_to_end();
                    Ok((d, engine.summary()))
                })
                .collect::<Result<Vec<(Discipline, MemorySummary)>, SimError>>()?;
            rank_mem(&summaries);
        },
        EngineKind::Page    => {
            let refs = list(&cli, "references", |n, seed| workload::references(n, 10, seed))?;
            let outs = replace::simulate_all(&refs, cli.frames)
                .into_iter()
                .collect::<Result<Vec<PagingOutcome>, SimError>>()?;
            rank_page(&outs);
        },
    }

    Ok(())
}

//---START RANKINGS
fn rank_cpu(outs: &[CpuOutcome]) {
    println!("{:>4} {:<28} {:>9} {:>11} {:>9} {:>8} {:>6}",
        "Rank", "Policy", "Waiting", "Turnaround", "Response", "Makespan", "Util%");
    let ranked = outs.iter()
        .sorted_by(|a, b| a.metrics.avg_waiting.total_cmp(&b.metrics.avg_waiting)
            .then(a.metrics.avg_turnaround.total_cmp(&b.metrics.avg_turnaround))
            .then(a.policy.cmp(&b.policy)));
    for (i, o) in ranked.enumerate() {
        let m = &o.metrics;
        println!("{:>4} {:<28} {:>9.2} {:>11.2} {:>9.2} {:>8} {:>6.1}",
            i + 1, o.policy.name(), m.avg_waiting, m.avg_turnaround, m.avg_response,
            m.makespan, m.utilization * 100.0);
    }
}

fn rank_disk(outs: &[DiskOutcome]) {
    println!("{:>4} {:<8} {:>9} {:>9} {:>8}", "Rank", "Policy", "Movement", "Avg seek", "Max seek");
    let ranked = outs.iter()
        .sorted_by_key(|o| (o.movement, o.policy));
    for (i, o) in ranked.enumerate() {
        println!("{:>4} {:<8} {:>9} {:>9.2} {:>8}",
            i + 1, o.policy.name(), o.movement, o.metrics.avg_seek, o.metrics.max_seek);
    }
}

fn rank_mem(summaries: &[(Discipline, MemorySummary)]) {
    println!("{:>4} {:<13} {:>9} {:>6} {:>6} {:>9} {:>9}",
        "Rank", "Discipline", "Allocated", "Failed", "Used", "Ext frag", "Int frag");
    let ranked = summaries.iter()
        .enumerate()
        .sorted_by_key(|(idx, (_, s))| (s.failed, s.external_fragmentation + s.internal_fragmentation, *idx));
    for (i, (_, (d, s))) in ranked.enumerate() {
        println!("{:>4} {:<13} {:>9} {:>6} {:>6} {:>9} {:>9}",
            i + 1, d.name(), s.allocated, s.failed, s.used,
            s.external_fragmentation, s.internal_fragmentation);
    }
}

fn rank_page(outs: &[PagingOutcome]) {
    println!("{:>4} {:<8} {:>7} {:>5} {:>7}", "Rank", "Policy", "Faults", "Hits", "Hit%");
    let ranked = outs.iter()
        .sorted_by_key(|o| (o.faults, o.policy));
    for (i, o) in ranked.enumerate() {
        println!("{:>4} {:<8} {:>7} {:>5} {:>7.2}",
            i + 1, o.policy.name(), o.faults, o.hits, o.hit_ratio * 100.0);
    }
}
//---END RANKINGS

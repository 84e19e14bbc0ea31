use anyhow::{Context, Result};
use coresim::*;
use coresim::{
    cpu::{CpuOutcome, CpuParams, CpuPolicy, LevelPolicy, LowestLevel, MlfqConfig},
    disk::{DiskOutcome, DiskPolicy, Direction},
    memory::{AllocStep, Discipline, DisciplineKind, MemoryEngine, Placement},
    replace::{PagingOutcome, ReplacePolicy},
};
use clap::Subcommand;

/// Simulates the classical resource-management algorithms of an OS
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    engine:     Engine,

    /// Print the full outcome as JSON instead of tables
    #[arg(long, global = true, default_value_t = false)]
    json:       bool,

    /// Log scheduling decisions; twice to log every time unit
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose:    u8,
}

#[derive(Subcommand, Debug)]
enum Engine {
    /// CPU scheduling
    Cpu(CpuArgs),
    /// Disk-head scheduling
    Disk(DiskArgs),
    /// Memory allocation, one process at a time
    Mem(MemArgs),
    /// Page replacement
    Page(PageArgs),
}

#[derive(clap::Args, Debug)]
struct CpuArgs {
    /// Scheduling policy
    #[arg(value_enum)]
    policy:         CpuPolicy,

    /// CSV file with `id,arrival,burst[,io_burst[,priority[,queue]]]` rows
    #[arg(short, long, value_parser = clap::value_parser!(PathBuf))]
    input:          Option<PathBuf>,

    /// Arrival times, e.g. "0,1,2"
    #[arg(short, long, required_unless_present = "input")]
    arrivals:       Option<String>,

    /// CPU bursts, one per arrival
    #[arg(short, long, required_unless_present = "input")]
    bursts:         Option<String>,

    /// I/O bursts, one per arrival
    #[arg(long)]
    io:             Option<String>,

    /// Priorities (lower is more urgent), one per arrival
    #[arg(short, long)]
    priorities:     Option<String>,

    /// Multilevel queue classes (0 or 1), one per arrival
    #[arg(long)]
    queues:         Option<String>,

    /// Round Robin time slice
    #[arg(short, long, default_value_t = DEFAULT_QUANTUM)]
    #[arg(value_parser = clap::value_parser!(i64))]
    quantum:        i64,

    /// Time slice of the multilevel queue's Round-Robin queue
    #[arg(long, default_value_t = DEFAULT_MLQ_QUANTUM)]
    #[arg(value_parser = clap::value_parser!(i64))]
    mlq_quantum:    i64,

    /// Feedback levels, top first (`rr:<quantum>`, `sjf` or `fcfs`)
    #[arg(long, value_delimiter = ',', default_value = "rr:2,rr:4,fcfs")]
    levels:         Vec<LevelPolicy>,

    /// What the lowest feedback level does with an unfinished slice
    #[arg(long, value_enum, default_value_t = LowestLevel::Recycle)]
    lowest:         LowestLevel,

    /// Also print the unit-by-unit timeline
    #[arg(short, long, default_value_t = false)]
    timeline:       bool,
}

#[derive(clap::Args, Debug)]
struct DiskArgs {
    /// Scheduling policy
    #[arg(value_enum)]
    policy:     DiskPolicy,

    /// Initial head position
    #[arg(long, default_value_t = 0)]
    #[arg(value_parser = clap::value_parser!(i64))]
    head:       i64,

    /// Track requests, e.g. "98,183,37"
    #[arg(short, long, required_unless_present = "input")]
    requests:   Option<String>,

    /// File with the track requests
    #[arg(short, long, value_parser = clap::value_parser!(PathBuf))]
    input:      Option<PathBuf>,

    /// Number of tracks
    #[arg(short, long, default_value_t = 200)]
    #[arg(value_parser = clap::value_parser!(i64))]
    size:       i64,

    /// Initial travel direction of the sweeping policies
    #[arg(short, long, value_enum, default_value_t = Direction::Right)]
    direction:  Direction,
}

#[derive(clap::Args, Debug)]
struct MemArgs {
    /// Allocation discipline
    #[arg(value_enum)]
    discipline: DisciplineKind,

    /// Block sizes, e.g. "100,500,200"
    #[arg(short, long)]
    blocks:     String,

    /// Process sizes, served in the order given
    #[arg(short, long)]
    processes:  String,

    /// Page size, for paging
    #[arg(long, default_value_t = 4)]
    #[arg(value_parser = clap::value_parser!(i64))]
    page_size:  i64,

    /// Only take this many steps
    #[arg(short, long)]
    #[arg(value_parser = clap::value_parser!(usize))]
    steps:      Option<usize>,
}

#[derive(clap::Args, Debug)]
struct PageArgs {
    /// Replacement policy
    #[arg(value_enum)]
    policy:     ReplacePolicy,

    /// Reference string, e.g. "7,0,1,2,0"
    #[arg(short, long, required_unless_present = "input")]
    refs:       Option<String>,

    /// File with the reference string
    #[arg(short, long, value_parser = clap::value_parser!(PathBuf))]
    input:      Option<PathBuf>,

    /// Number of frames
    #[arg(short, long, default_value_t = 3)]
    #[arg(value_parser = clap::value_parser!(i64))]
    frames:     i64,
}

/// Reads an integer list from the command line or from a file.
fn list(inline: Option<&str>, file: Option<&PathBuf>, what: &str) -> Result<Vec<i64>> {
    match (inline, file) {
        (Some(s), _)        => parse_list(s).with_context(|| format!("Parsing {what}")),
        (None, Some(path))  => read_list(path.clone()).with_context(|| format!("Reading {what} from {}", path.display())),
        (None, None)        => anyhow::bail!("No {what} given"),
    }
}

fn main() -> Result<()> {
    let cli = Args::parse();
    init_logger(cli.verbose)?;

    match cli.engine {
        Engine::Cpu(args)   => {
            let procs = match &args.input {
                Some(path)  => read_from_path::<ProcCSVParser, &str>(path.clone())
                    .with_context(|| format!("Reading processes from {}", path.display()))?,
                None        => {
                    let arrivals = list(args.arrivals.as_deref(), None, "arrival times")?;
                    let bursts = list(args.bursts.as_deref(), None, "bursts")?;
                    let optional = |s: &Option<String>| s.as_deref().map(parse_list).transpose();
                    from_lists(
                        &arrivals,
                        &bursts,
                        optional(&args.io)?.as_deref(),
                        optional(&args.priorities)?.as_deref(),
                        optional(&args.queues)?.as_deref(),
                    )?
                },
            };
            let params = CpuParams {
                quantum:        args.quantum,
                mlq_quantum:    args.mlq_quantum,
                mlfq:           MlfqConfig { levels: args.levels, lowest: args.lowest },
            };
            let out = cpu::schedule(args.policy, &procs, &params)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print_cpu(&out, args.timeline);
            }
        },
        Engine::Disk(args)  => {
            let requests = list(args.requests.as_deref(), args.input.as_ref(), "requests")?;
            let out = disk::seek(args.policy, args.head, &requests, args.size, args.direction)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print_disk(&out);
            }
        },
        Engine::Mem(args)   => {
            let blocks = parse_list(&args.blocks).context("Parsing block sizes")?;
            let processes = parse_list(&args.processes).context("Parsing process sizes")?;
            let discipline = Discipline::from_kind(args.discipline, args.page_size)?;
            let mut engine = MemoryEngine::new(&blocks, &processes, discipline)?;
            let steps: Vec<AllocStep> = match args.steps {
                Some(n) => engine.by_ref().take(n).collect(),
                None    => engine.run_to_end(),
            };
            if cli.json {
                let report = serde_json::json!({
                    "discipline":   discipline,
                    "steps":        steps,
                    "blocks":       engine.blocks(),
                    "pending":      engine.pending(),
                    "summary":      engine.summary(),
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_mem(&engine, &steps);
            }
        },
        Engine::Page(args)  => {
            let refs = list(args.refs.as_deref(), args.input.as_ref(), "references")?;
            let out = replace::simulate(args.policy, &refs, args.frames)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print_page(&out);
            }
        },
    }

    Ok(())
}

//---START TABLES
fn print_cpu(out: &CpuOutcome, timeline: bool) {
    println!("{}", out.policy.name());
    println!("{:>5} {:>7} {:>5} {:>4} {:>8} {:>5} {:>10} {:>10} {:>7} {:>8}",
        "PID", "Arrival", "Burst", "I/O", "Priority", "Start", "Completion", "Turnaround", "Waiting", "Response");
    for s in &out.stats {
        println!("{:>5} {:>7} {:>5} {:>4} {:>8} {:>5} {:>10} {:>10} {:>7} {:>8}",
            format!("P{}", s.id), s.arrival, s.burst, s.io_burst, s.priority,
            s.start, s.completion, s.turnaround, s.waiting, s.response);
    }
    let m = &out.metrics;
    println!("Average turnaround: {:.2}", m.avg_turnaround);
    println!("Average waiting:    {:.2}", m.avg_waiting);
    println!("Average response:   {:.2}", m.avg_response);
    println!("Makespan: {} (CPU {}, I/O {}, idle {})", m.makespan, m.cpu_busy, m.io_busy, m.idle);
    println!("Utilization: {:.1}%, throughput: {:.3}/unit", m.utilization * 100.0, m.throughput);
    if timeline {
        println!();
        for e in &out.timeline {
            println!("{}", e.note);
        }
    }
}

fn print_disk(out: &DiskOutcome) {
    println!("{} ({:?})", out.policy.name(), out.direction);
    println!("Sequence: {}", out.sequence.iter().join(" -> "));
    if out.path != out.sequence {
        println!("Path:     {}", out.path.iter().join(" -> "));
    }
    println!("Total head movement: {}", out.movement);
    println!("Average seek: {:.2}, longest seek: {}", out.metrics.avg_seek, out.metrics.max_seek);
    println!("Throughput: {:.4} requests/track", out.metrics.throughput);
}

fn print_mem(engine: &MemoryEngine, steps: &[AllocStep]) {
    println!("{}", engine.discipline().name());
    for step in steps {
        match &step.result {
            Ok(Placement::Block { index })  => {
                println!("P{} ({}): block {index}", step.process, step.size);
            },
            Ok(Placement::Pages { count, frames, internal_fragmentation }) => {
                println!("P{} ({}): {count} pages in {} ({internal_fragmentation} wasted)",
                    step.process, step.size,
                    frames.iter().map(|(b, n)| format!("block {b} x{n}")).join(", "));
            },
            Ok(Placement::Segments { parts })   => {
                println!("P{} ({}): segments {}", step.process, step.size,
                    parts.iter().map(|(b, sz)| format!("{sz} in block {b}")).join(", "));
            },
            Err(failure)    => println!("{failure}"),
        }
    }
    println!();
    for (i, b) in engine.blocks().iter().enumerate() {
        println!("Block {i}: {}/{} free [{}]", b.free, b.original_size,
            b.occupants.iter().map(|(p, sz)| format!("P{p}:{sz}")).join(" "));
    }
    if !engine.pending().is_empty() {
        println!("Pending: {}", engine.pending().iter().join(", "));
    }
    let s = engine.summary();
    println!("Allocated {}, failed {}; used {}, free {} (largest {})",
        s.allocated, s.failed, s.used, s.free, s.largest_free);
    println!("External fragmentation {}, internal fragmentation {}",
        s.external_fragmentation, s.internal_fragmentation);
}

fn print_page(out: &PagingOutcome) {
    println!("{} with {} frames", out.policy.name(), out.frames);
    for (i, s) in out.steps.iter().enumerate() {
        let evicted = s.evicted.map_or(String::new(), |p| format!(", evicted {p}"));
        println!("Step {:>3}: page {:>3} {}{evicted} -> [{}]",
            i + 1, s.page, if s.fault { "fault" } else { "hit  " }, s.resident.iter().join(", "));
    }
    println!("Faults: {}, hits: {}, hit ratio: {:.2}%", out.faults, out.hits, out.hit_ratio * 100.0);
}
//---END TABLES

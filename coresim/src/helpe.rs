pub use std::{
    io::{BufRead, BufReader},
    collections::{HashMap, HashSet, VecDeque},
    path::PathBuf,
    str::FromStr,
};
pub use thiserror::Error;
pub use itertools::Itertools;
pub use rayon::prelude::*;
pub use indexmap::IndexSet;
pub use clap::{Parser, ValueEnum};
pub use serde::Serialize;
pub use log::{debug, trace, warn};

pub use crate::{Process, MemoryBlock,
    procset::*,
};

/// The unit for measuring logical time on the CPU side. Every engine
/// works on whole units; there is no such thing as half a tick.
pub type Ticks = usize;

/// Caller-assigned process identifier.
pub type Pid = u32;

/// A disk track (cylinder) number.
pub type Track = usize;

/// A virtual page identifier, as it appears in a reference string.
pub type PageId = usize;

/// A group of processes, in the caller's order.
///
/// A set coming out of [`procset::init`](crate::procset::init) is
/// guaranteed to satisfy every assumption the CPU engine makes.
pub type ProcSet = Vec<Process>;

/// Round-Robin time slice used when the caller does not pick one.
pub const DEFAULT_QUANTUM: i64 = 2;
/// Time slice of the multilevel queue's Round-Robin queue.
pub const DEFAULT_MLQ_QUANTUM: i64 = 4;

//---START TIMELINE PRIMITIVES
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
/// What the CPU was doing during one unit of time.
pub enum EventKind {
    Cpu,
    Io,
    Idle,
}

/// Exactly one of these exists per unit of time, from the first
/// arrival up to the last completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEvent {
    pub time:       Ticks,
    /// `None` means the CPU idled.
    pub subject:    Option<Pid>,
    pub kind:       EventKind,
    pub note:       String,
}

pub type Timeline = Vec<TimelineEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DecisionKind {
    /// Entered a ready queue.
    Arrive,
    /// Got the CPU, be it for the first time or not.
    Dispatch,
    /// Lost the CPU to a more deserving process in the middle of a burst.
    Preempt,
    /// Used up its slice and went back to the tail of its queue.
    Requeue,
    /// Used up its slice and went one feedback level down.
    Demote,
    Complete,
}

/// A scheduling decision, in the order it was taken. Timelines say
/// *what* ran; decisions say *why*.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub time:   Ticks,
    pub pid:    Pid,
    pub kind:   DecisionKind,
    /// Queue level, for the multilevel policies.
    pub level:  Option<usize>,
}
//---END TIMELINE PRIMITIVES

//---START ERRORS
/// Everything that can go wrong, surfaced synchronously. No engine ever
/// substitutes a default for a bad parameter.
#[derive(Error, Debug)]
pub enum SimError {
    /// Malformed, negative or mismatched parameters. Always reported
    /// before the first simulation step.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    /// A per-process allocation failure, escalated by the caller.
    #[error(transparent)]
    Allocation(#[from] AllocationFailure),
    #[error("unknown {expected} policy `{name}`")]
    Policy { name: String, expected: &'static str },
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SimError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput { message: message.into() }
    }

    pub fn policy(name: &str, expected: &'static str) -> Self {
        Self::Policy { name: name.to_string(), expected }
    }
}

/// Appears when one process could not be placed under the current block
/// state. It is an *outcome* of that one step: later steps go on.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("cannot {action} process P{process} ({size} units): {reason}")]
pub struct AllocationFailure {
    pub process:    Pid,
    pub size:       usize,
    pub action:     &'static str,
    pub reason:     String,
    /// Pieces that did get placed before the failure, as
    /// `(block index, size)`. Only segmentation leaves any behind.
    pub partial:    Vec<(usize, usize)>,
}
//---END ERRORS

//---START EXTERNAL INTERFACES
// The types listed below read scenarios from files. To support
// another format, write a type that satisfies `ProcGen`.

/// A process as written by a user: signed, unchecked. The gatekeeper
/// in [`procset`](crate::procset) turns these into [`Process`]es.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcRow {
    pub id:         i64,
    pub arrival:    i64,
    pub burst:      i64,
    pub io_burst:   i64,
    pub priority:   i64,
    pub queue:      i64,
}

/// Defines the interface for reading processes.
pub trait ProcGen<T> {
    fn new(path: PathBuf) -> Self;
    /// Either every row is read, or the first offending line is reported.
    fn read_rows(&self) -> Result<Vec<ProcRow>, SimError>;
    /// Uses some available data to spawn one [ProcRow].
    fn gen_single(&self, d: T, line: usize) -> Result<ProcRow, SimError>;
}

/// Reads `id,arrival,burst[,io_burst[,priority[,queue]]]` lines. The
/// first line is a header and is skipped, as are blank lines and lines
/// starting with `#`. Missing optional columns default to zero.
pub struct ProcCSVParser {
    pub path: PathBuf,
}

impl ProcGen<&str> for ProcCSVParser {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
        }
    }

    fn read_rows(&self) -> Result<Vec<ProcRow>, SimError> {
        let fd = std::fs::File::open(self.path.as_path())?;
        let reader = BufReader::new(fd);
        let mut res = vec![];
        // First line is the header!
        for (idx, line) in reader.lines().enumerate().skip(1) {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') { continue; }
            res.push(self.gen_single(trimmed, idx + 1)?);
        }

        Ok(res)
    }

    fn gen_single(&self, d: &str, line: usize) -> Result<ProcRow, SimError> {
        let fields = d.split(',')
            .map(|x| x.trim())
            .map(|x| x.parse::<i64>().map_err(|e| SimError::Parse {
                line,
                message: format!("`{x}`: {e}"),
            }))
            .collect::<Result<Vec<i64>, SimError>>()?;
        if fields.len() < 3 || fields.len() > 6 {
            return Err(SimError::Parse {
                line,
                message: format!("expected 3 to 6 columns, found {}", fields.len()),
            });
        }
        let opt = |i: usize| fields.get(i).copied().unwrap_or(0);

        Ok(ProcRow {
            id:         fields[0],
            arrival:    fields[1],
            burst:      fields[2],
            io_burst:   opt(3),
            priority:   opt(4),
            queue:      opt(5),
        })
    }
}

/// Parses a list of integers separated by whitespace and/or commas,
/// e.g. `"90,12 56, 77"`. Used for request lists, block sizes and
/// reference strings, whether they come from a file or the terminal.
pub fn parse_list(src: &str) -> Result<Vec<i64>, SimError> {
    src.lines()
        .enumerate()
        .flat_map(|(idx, l)| {
            l.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|x| !x.is_empty())
                .map(move |x| (idx + 1, x))
        })
        .map(|(line, x)| x.parse::<i64>().map_err(|e| SimError::Parse {
            line,
            message: format!("`{x}`: {e}"),
        }))
        .collect()
}

pub fn read_list(path: PathBuf) -> Result<Vec<i64>, SimError> {
    parse_list(&std::fs::read_to_string(path)?)
}

pub fn read_from_path<T, B>(file_path: PathBuf) -> Result<ProcSet, SimError>
where T: ProcGen<B> {
    let parser = T::new(file_path);
    let rows = parser.read_rows()?;
    crate::procset::init(rows)
}

/// Sets up terminal logging for the binaries: `-v` once for
/// per-decision logs, twice for per-unit ones.
pub fn init_logger(verbose: u8) -> Result<(), log::SetLoggerError> {
    let llv = match verbose {
        0 => simplelog::LevelFilter::Info,
        1 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    let mut lcfg = simplelog::ConfigBuilder::new();
    lcfg.set_time_level(simplelog::LevelFilter::Error)
        .set_location_level(simplelog::LevelFilter::Off)
        .set_target_level(simplelog::LevelFilter::Off)
        .set_thread_level(simplelog::LevelFilter::Off);
    simplelog::TermLogger::init(
        llv,
        lcfg.build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )
}
//---END EXTERNAL INTERFACES

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_accepts_mixed_separators() {
        assert_eq!(parse_list("90,12 56,\n 77").unwrap(), vec![90, 12, 56, 77]);
        assert!(parse_list("").unwrap().is_empty());
    }

    #[test]
    fn list_reports_offending_line() {
        match parse_list("1 2\n3 x") {
            Err(SimError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn csv_row_defaults_optional_columns() {
        let parser = ProcCSVParser::new(PathBuf::from("unused.csv"));
        let row = parser.gen_single("3, 4, 5", 2).unwrap();
        assert_eq!(row, ProcRow { id: 3, arrival: 4, burst: 5, io_burst: 0, priority: 0, queue: 0 });
        assert!(parser.gen_single("1,2", 2).is_err());
        assert!(parser.gen_single("1,2,three", 2).is_err());
    }

    #[test]
    fn csv_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("coresim-procs-{}.csv", std::process::id()));
        std::fs::write(&path, "id,arrival,burst,io,prio\n1,0,5,0,2\n\n# comment\n2,1,3,1,1\n").unwrap();
        let set = read_from_path::<ProcCSVParser, &str>(path.clone()).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set[1].io_burst, 1);
        assert_eq!(set[1].priority, 1);
    }
}

// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Memory and duration monitoring for `--dump-stats`. Currently only
//! supported on Linux. Grounded on `util/mem_watcher.rs` almost verbatim in
//! structure (background thread + `Mutex<usize>` high-water mark over
//! `/proc/self/statm`), adapted to report through `log::info!` instead of
//! `println!` and to additionally track elapsed wall time.

use std::fs::File;
use std::io::{Error, ErrorKind, Read, Result};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use libc::pid_t;
use log::{error, info};
use nom::bytes::streaming::tag;
use nom::character::complete::digit1;
use nom::combinator::map_res;
use nom::multi::count;
use nom::sequence::{terminated, tuple};
use nom::IResult;

/// Memory usage information parsed from `/proc/[pid]/statm`.
///
/// All values are in units of pages. See `man 5 proc`.
#[derive(Debug, Default, PartialEq, Eq, Hash)]
pub struct Statm {
    pub size: usize,
    pub resident: usize,
    pub share: usize,
    pub text: usize,
    pub data: usize,
}

/// Tracks peak resident memory and elapsed wall time across a run.
pub struct MemoryWatcher {
    init_resident: usize,
    max_resident: Arc<Mutex<usize>>,
    handle: Option<JoinHandle<()>>,
    started_at: Option<Instant>,
}

impl Default for MemoryWatcher {
    fn default() -> Self {
        MemoryWatcher {
            init_resident: 0,
            max_resident: Arc::new(Mutex::new(0)),
            handle: None,
            started_at: None,
        }
    }
}

impl MemoryWatcher {
    /// Reads the current resident set size to use as the run's baseline. If
    /// it can't be read (non-Linux, sandboxed `/proc`), falls back to zero.
    pub fn new() -> Self {
        if let Ok(statm) = statm_self() {
            MemoryWatcher {
                init_resident: statm.resident,
                ..MemoryWatcher::default()
            }
        } else {
            error!("unable to parse the statm file, memory stats will report as zero");
            MemoryWatcher::default()
        }
    }

    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
        let max_resident = self.max_resident.clone();
        self.handle = Some(thread::spawn(move || loop {
            if let Ok(statm) = statm_self() {
                let mut max_rss = max_resident.lock().unwrap();
                if statm.resident > *max_rss {
                    *max_rss = statm.resident;
                }
            }
            thread::sleep(Duration::from_millis(100));
        }));
    }

    /// Stops the background poller and reports the run's stats at `info`
    /// level.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            drop(handle);
        }

        let max_rss = *self.max_resident.lock().unwrap();
        let elapsed = self
            .started_at
            .map(|start| start.elapsed())
            .unwrap_or_default();
        info!(
            "memory before analysis: {} MB, peak during analysis: {} MB, elapsed: {}",
            rss_in_megabytes(self.init_resident),
            rss_in_megabytes(max_rss),
            humantime::format_duration(elapsed),
        );
    }
}

fn rss_in_megabytes(rss_pages: usize) -> usize {
    rss_pages * 4 / 1024
}

/// Transforms a `nom` parse result into an `io::Result`. The parser must
/// completely consume the input.
fn map_result<T>(result: IResult<&str, T>) -> Result<T> {
    match result {
        Ok((remaining, val)) if remaining.is_empty() => Ok(val),
        Ok((remaining, _)) => Err(Error::new(
            ErrorKind::InvalidInput,
            format!("unable to parse whole input, remaining: {remaining:?}"),
        )),
        Err(err) => Err(Error::new(
            ErrorKind::InvalidInput,
            format!("unable to parse input: {err:?}"),
        )),
    }
}

fn parse_usize(input: &str) -> IResult<&str, usize> {
    map_res(digit1, |s: &str| s.parse::<usize>())(input)
}

/// Parses the statm file format: `size resident shared text lib data dt`.
fn parse_statm(input: &str) -> IResult<&str, Statm> {
    tuple((count(terminated(parse_usize, tag(" ")), 6), parse_usize))(input).map(
        |(next_input, (fields, _dt))| {
            let statm = Statm {
                size: fields[0],
                resident: fields[1],
                share: fields[2],
                text: fields[3],
                data: fields[5],
            };
            (next_input, statm)
        },
    )
}

fn statm_file(file: &mut File) -> Result<Statm> {
    let mut buf = String::new();
    file.read_to_string(&mut buf)?;
    map_result(parse_statm(buf.trim()))
}

/// Returns memory status information for the process with the provided pid.
pub fn statm(pid: pid_t) -> Result<Statm> {
    statm_file(&mut File::open(format!("/proc/{pid}/statm"))?)
}

/// Returns memory status information for the current process.
pub fn statm_self() -> Result<Statm> {
    statm_file(&mut File::open("/proc/self/statm")?)
}

// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The main routine of `ltex`.
//!
//! Grounded on `bin/pta.rs`'s option-parsing-then-run shape, with all
//! `rustc_driver`/sysroot machinery removed — there is no compiler to
//! invoke here, only a JSON-file-backed summary and description store to
//! construct before calling into the library's pipeline.

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use log::{info, warn};

use ltex::options::AnalysisOptions;
use ltex::store::{JsonDescriptionStore, JsonSummaryStore};
use ltex::util::mem_watcher::MemoryWatcher;

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;

fn run() -> anyhow::Result<()> {
    if env::var("LTEX_LOG").is_ok() {
        let env = env_logger::Env::new()
            .filter("LTEX_LOG")
            .write_style("LTEX_LOG_STYLE");
        env_logger::init_from_env(env);
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let options = AnalysisOptions::parse_from_args(&args);
    info!("ltex options: {options:?}");

    let mut watcher = options.dump_stats.then(MemoryWatcher::new);
    if let Some(watcher) = watcher.as_mut() {
        watcher.start();
    }

    let summary_dir = env::var("LTEX_SUMMARY_DIR").unwrap_or_else(|_| "summaries".to_string());
    let summaries = JsonSummaryStore::new(PathBuf::from(summary_dir));
    let description_path =
        env::var("LTEX_DESCRIPTIONS").unwrap_or_else(|_| "descriptions.json".to_string());
    let descriptions = JsonDescriptionStore::load(&description_path)
        .context("loading the procedure description store")?;

    let coverage = ltex::run_pipeline(&options, &summaries, &descriptions)?;

    for literal in &coverage.empty_sources {
        warn!("source `{literal}` resolved to zero vertices in its procedure");
    }
    for literal in &coverage.empty_sinks {
        warn!("sink `{literal}` resolved to zero vertices in its procedure");
    }

    if let Some(watcher) = watcher.as_mut() {
        watcher.stop();
    }

    Ok(())
}

fn main() {
    let exit_code = match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(err) => {
            eprintln!("ltex: {err:#}");
            EXIT_FAILURE
        }
    };
    std::process::exit(exit_code);
}

// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Analysis options. Grounded on `util/options.rs`'s `AnalysisOptions`
//! struct plus `clap::Command` builder, trimmed of every rustc/cargo-
//! specific flag and the `--` rustc-passthrough split, since this CLI never
//! forwards to a compiler.

use clap::{Arg, Command};

const USAGE: &str = r#"ltex [OPTIONS] --source <SOURCE> --sink <SINK>"#;

fn make_options_parser() -> Command<'static> {
    Command::new("ltex")
        .no_binary_name(true)
        .override_usage(USAGE)
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("source")
                .long("source")
                .takes_value(true)
                .multiple_occurrences(true)
                .required(true)
                .help("A source endpoint, `[module:]function/arity$(ret|argN)`."),
        )
        .arg(
            Arg::new("sink")
                .long("sink")
                .takes_value(true)
                .multiple_occurrences(true)
                .required(true)
                .help("A sink endpoint, `[module:]function/arity$(ret|argN)`."),
        )
        .arg(
            Arg::new("sanitizer")
                .long("sanitizer")
                .takes_value(true)
                .multiple_occurrences(true)
                .help("A sanitizer procedure, `[module:]function/arity`."),
        )
        .arg(
            Arg::new("results-dir")
                .long("results-dir")
                .takes_value(true)
                .default_value("lineage-results")
                .help("Directory the taint result (and, with --dump-reachable, the reachable map) is written to."),
        )
        .arg(
            Arg::new("lineage-limit")
                .long("lineage-limit")
                .takes_value(true)
                .value_parser(clap::value_parser!(u64))
                .help("Global edge budget for the forward reachability phase."),
        )
        .arg(
            Arg::new("dump-reachable")
                .long("dump-reachable")
                .takes_value(false)
                .help("Also write the pre-coreachability reachable map to <results-dir>/reachable."),
        )
        .arg(
            Arg::new("dump-stats")
                .long("dump-stats")
                .takes_value(false)
                .help("Report peak memory and elapsed time after the run."),
        )
}

#[derive(Clone, Debug, Default)]
pub struct AnalysisOptions {
    pub source: Vec<String>,
    pub sink: Vec<String>,
    pub sanitizer: Vec<String>,
    pub results_dir: String,
    pub lineage_limit: Option<u64>,
    pub dump_reachable: bool,
    pub dump_stats: bool,
}

impl AnalysisOptions {
    /// Parses options from a list of strings (normally `env::args().skip(1)`).
    /// Exits the process on `--help`/`--version` or a malformed argument, by
    /// way of `clap`'s own `Error::exit`.
    pub fn parse_from_args(args: &[String]) -> Self {
        let matches = make_options_parser().get_matches_from(args);

        let source = matches
            .get_many::<String>("source")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        let sink = matches
            .get_many::<String>("sink")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        let sanitizer = matches
            .get_many::<String>("sanitizer")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        let results_dir = matches
            .get_one::<String>("results-dir")
            .cloned()
            .unwrap_or_else(|| "lineage-results".to_string());
        let lineage_limit = matches.get_one::<u64>("lineage-limit").copied();

        AnalysisOptions {
            source,
            sink,
            sanitizer,
            results_dir,
            lineage_limit,
            dump_reachable: matches.contains_id("dump-reachable"),
            dump_stats: matches.contains_id("dump-stats"),
        }
    }
}

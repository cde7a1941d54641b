//! Run configuration, parsed from the command line.
//!
//! The parser is a plain value: nothing here touches global state. One
//! quirk is inherited from the tool this replaces: unknown flags are
//! ignored rather than fatal, so the raw argument vector is filtered
//! down to the known flag set before clap sees it. Errors in the
//! values of known flags still fail the parse.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;

use crate::engine::SyncStrategy;
use crate::error::Error;

/// Flags that consume the following argument.
const VALUE_FLAGS: [&str; 16] = [
    "-w",
    "--width",
    "-h",
    "--height",
    "-s",
    "--steps",
    "--iterations",
    "-t",
    "--thread",
    "-i",
    "--input",
    "--seed",
    "--sync",
    "-n",
    "--tasks",
    "--grain",
];

/// Flags that stand alone.
const UNARY_FLAGS: [&str; 2] = ["--vect", "--help"];

/// Parallel Game of Life on a toroidal grid.
#[derive(Parser, Debug)]
#[command(name = "parlife", disable_help_flag = true)]
pub struct Config {
    /// Interior grid width
    #[arg(short = 'w', long, default_value_t = 1000)]
    pub width: usize,

    /// Interior grid height
    #[arg(short = 'h', long, default_value_t = 1000)]
    pub height: usize,

    /// Number of generations to run
    #[arg(short = 's', long, visible_alias = "iterations", default_value_t = 100)]
    pub steps: u32,

    /// Worker count; 0 or 1 runs the sequential path
    /// [default: hardware concurrency]
    #[arg(short = 't', long = "thread")]
    pub thread: Option<usize>,

    /// Read the initial grid from an ASCII file of '0'/'1' rows
    /// (overrides --width/--height)
    #[arg(short = 'i', long)]
    pub input: Option<PathBuf>,

    /// Seed for the random initial grid [default: timestamp]
    #[arg(long)]
    pub seed: Option<u64>,

    /// Synchronization strategy: condvar, spinning or coordinator
    #[arg(long, default_value = "spinning")]
    pub sync: SyncStrategy,

    /// Task count per generation for the coordinator strategy
    /// [default: worker count]
    #[arg(short = 'n', long = "tasks")]
    pub tasks: Option<usize>,

    /// Minimum chunk size of the static partition; 0 derives it from
    /// the worker count
    #[arg(long, default_value_t = 0)]
    pub grain: usize,

    /// Use the blocked stencil kernel
    #[arg(long)]
    pub vect: bool,

    /// Print usage information
    #[arg(long, action = clap::ArgAction::HelpLong)]
    help: Option<bool>,
}

impl Config {
    /// Parse a raw argument vector, dropping flags outside the known
    /// set (together with their value, if any) beforehand.
    pub fn try_parse_filtered<I>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let mut kept: Vec<String> = Vec::new();
        kept.extend(args.next());

        let mut expect_value = false;
        for arg in args {
            if expect_value {
                kept.push(arg);
                expect_value = false;
                continue;
            }
            if !arg.starts_with('-') {
                // Stray positional, e.g. the value of a dropped flag.
                tracing::debug!(%arg, "ignoring unrecognized argument");
                continue;
            }
            let name = arg.split('=').next().unwrap_or(&arg);
            if UNARY_FLAGS.contains(&name) {
                kept.push(arg);
            } else if VALUE_FLAGS.contains(&name) {
                expect_value = !arg.contains('=');
                kept.push(arg);
            } else if is_attached_short(&arg) {
                // Short flag with an attached value, e.g. `-w8`.
                kept.push(arg);
            } else {
                tracing::debug!(%arg, "ignoring unrecognized flag");
            }
        }

        Self::try_parse_from(kept)
    }

    /// Check the value ranges the parser cannot express.
    pub fn validate(&self) -> Result<(), Error> {
        if self.input.is_none() && (self.width == 0 || self.height == 0) {
            return Err(Error::Config(format!(
                "grid dimensions must be positive, got {}x{}",
                self.height, self.width
            )));
        }
        if self.steps == 0 {
            return Err(Error::Config(
                "the number of steps must be positive".into(),
            ));
        }
        if self.tasks == Some(0) {
            return Err(Error::Config("the task count must be positive".into()));
        }
        Ok(())
    }

    /// Resolved worker count; defaults to the hardware concurrency.
    pub fn workers(&self) -> usize {
        self.thread.unwrap_or_else(num_cpus::get)
    }

    /// Resolved coordinator task count; defaults to the worker count.
    pub fn num_tasks(&self) -> usize {
        self.tasks.unwrap_or_else(|| self.workers().max(1))
    }

    /// Resolved RNG seed; defaults to the wall clock.
    pub fn resolved_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
        })
    }
}

/// A token like `-w8`: a known short value flag with the value glued on.
fn is_attached_short(arg: &str) -> bool {
    arg.len() > 2
        && !arg.starts_with("--")
        && VALUE_FLAGS.contains(&&arg[..2])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, clap::Error> {
        let argv = std::iter::once("parlife".to_string())
            .chain(args.iter().map(|s| s.to_string()));
        Config::try_parse_filtered(argv)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.width, 1000);
        assert_eq!(config.height, 1000);
        assert_eq!(config.steps, 100);
        assert_eq!(config.sync, SyncStrategy::Spinning);
        assert_eq!(config.grain, 0);
        assert!(!config.vect);
        assert!(config.thread.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_short_and_long_flags() {
        let config = parse(&["-w", "64", "--height", "32", "-s", "10", "-t", "4"]).unwrap();
        assert_eq!(config.width, 64);
        assert_eq!(config.height, 32);
        assert_eq!(config.steps, 10);
        assert_eq!(config.workers(), 4);
    }

    #[test]
    fn test_iterations_alias() {
        let config = parse(&["--iterations", "7"]).unwrap();
        assert_eq!(config.steps, 7);
    }

    #[test]
    fn test_unknown_flags_are_ignored() {
        let config = parse(&["--frobnicate", "3", "-x", "-w", "12", "--also-not-real"]).unwrap();
        assert_eq!(config.width, 12);
    }

    #[test]
    fn test_attached_short_value() {
        let config = parse(&["-w8", "-h4"]).unwrap();
        assert_eq!(config.width, 8);
        assert_eq!(config.height, 4);
    }

    #[test]
    fn test_equals_form() {
        let config = parse(&["--width=24", "--sync=coordinator"]).unwrap();
        assert_eq!(config.width, 24);
        assert_eq!(config.sync, SyncStrategy::Coordinator);
    }

    #[test]
    fn test_bad_value_for_known_flag_fails() {
        assert!(parse(&["-w", "abc"]).is_err());
        assert!(parse(&["--sync", "fastflow"]).is_err());
    }

    #[test]
    fn test_zero_dimensions_rejected_by_validate() {
        let config = parse(&["-w", "0"]).unwrap();
        assert!(config.validate().is_err());
        let config = parse(&["-s", "0"]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sequential_worker_counts() {
        let config = parse(&["-t", "0"]).unwrap();
        assert_eq!(config.workers(), 0);
        let config = parse(&["-t", "1"]).unwrap();
        assert_eq!(config.workers(), 1);
    }

    #[test]
    fn test_task_default_follows_workers() {
        let config = parse(&["-t", "6"]).unwrap();
        assert_eq!(config.num_tasks(), 6);
        let config = parse(&["-t", "6", "-n", "24"]).unwrap();
        assert_eq!(config.num_tasks(), 24);
    }
}

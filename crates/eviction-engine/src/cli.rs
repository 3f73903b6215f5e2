//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use eviction_types::{ContestantId, PoolId};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "eviction-config.yaml";

#[derive(Parser, Debug)]
#[command(
    name = "eviction-engine",
    about = "Administer eviction pools: record weeks, compute points, complete seasons",
    version
)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply pending database migrations and seed the default scoring rules
    Migrate,
    #[command(flatten)]
    Pool(PoolCommand),
}

/// Commands that run through the season service.
#[derive(Subcommand, Debug)]
pub enum PoolCommand {
    /// Show one week's record, special events, and ceremony progress
    Week(WeekArgs),
    /// Save a week from a JSON file as a draft
    SaveDraft(WeekFileArgs),
    /// Submit a week from a JSON file; prints the unmet steps if refused
    SubmitWeek(WeekFileArgs),
    /// Delete a week's record and its special events
    ClearWeek(WeekArgs),
    /// Print every contestant's weekly and cumulative points
    Points(PoolArgs),
    /// Print the team leaderboard
    Standings(PoolArgs),
    /// Print a contestant's status as of a week
    Status(StatusArgs),
    /// Print the season-completion checklist
    SeasonCheck(PoolArgs),
    /// Derive and store every contestant's final placement
    AssignPlacements(PoolArgs),
    /// Complete the season and freeze the pool
    CompleteSeason(PoolArgs),
}

#[derive(Args, Debug)]
pub struct PoolArgs {
    /// The pool to operate on
    #[arg(long)]
    pub pool: PoolId,
}

#[derive(Args, Debug)]
pub struct WeekArgs {
    /// The pool to operate on
    #[arg(long)]
    pub pool: PoolId,
    /// Week number (1-based)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub week: u32,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// The pool to operate on
    #[arg(long)]
    pub pool: PoolId,
    /// The contestant to resolve
    #[arg(long)]
    pub contestant: ContestantId,
    /// Week number (1-based)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub week: u32,
}

#[derive(Args, Debug)]
pub struct WeekFileArgs {
    /// JSON file holding `record` and, optionally, `special_events`
    #[arg(long)]
    pub file: PathBuf,
}

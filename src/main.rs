//! Mastery Tracker - failure and mastery tracking for vocabulary practice
//!
//! CLI entry point with global panic handler.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mastery_tracker::cli::clear::ClearOptions;
use mastery_tracker::cli::problems::ProblemsOptions;
use mastery_tracker::cli::prune::PruneOptions;
use mastery_tracker::cli::record::RecordOptions;
use mastery_tracker::cli::stats::StatsOptions;
use mastery_tracker::cli::trends::TrendsOptions;
use mastery_tracker::cli::{
    ClearCommand, ProblemsCommand, ProblemsQuery, PruneCommand, RecordCommand, StatsCommand,
    TrendsCommand,
};
use mastery_tracker::config::{mastery_home, Config};
use mastery_tracker::error::{exit_codes, FailOpen};
use mastery_tracker::{
    FailureDetails, FailureTracker, FailureType, FileStateStore, LearningMode, StudyItem,
};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "MASTERY_LOG";

// =============================================================================
// CLI Definition
// =============================================================================

/// Mastery Tracker - failure and mastery tracking for vocabulary practice
#[derive(Parser)]
#[command(name = "mastery")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding persisted state (default: ~/.mastery/state)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// [Engine] Record an incorrect answer
    Fail {
        /// Item identifier
        item_id: String,
        /// Failure type (e.g. recall-error)
        #[arg(long = "type")]
        failure_type: FailureType,
        /// Learning mode (e.g. flashcard)
        #[arg(long)]
        mode: LearningMode,
        /// English text
        #[arg(long, default_value = "")]
        english: String,
        /// Kikuyu text
        #[arg(long, default_value = "")]
        kikuyu: String,
        /// Content category
        #[arg(long, default_value = "")]
        category: String,
        /// What the learner answered
        #[arg(long, default_value = "")]
        answer: String,
        /// The expected answer
        #[arg(long, default_value = "")]
        correct: String,
        /// Difficulty tag
        #[arg(long, default_value = "")]
        tag: String,
        /// Response time in milliseconds
        #[arg(long, default_value_t = 0)]
        response_ms: u64,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// [Engine] Record a correct answer
    Succeed {
        /// Item identifier
        item_id: String,
        /// Learning mode (e.g. flashcard)
        #[arg(long)]
        mode: LearningMode,
        /// Response time in milliseconds
        #[arg(long, default_value_t = 0)]
        response_ms: u64,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// [User] List the most-failed items
    Problems {
        /// Maximum number of items
        #[arg(long, short, default_value_t = 10)]
        limit: usize,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// [User] List items that failed with a given failure type
    ByType {
        /// Failure type (e.g. spelling-error)
        failure_type: FailureType,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// [User] List problem items in a category
    ByCategory {
        /// Category name
        category: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// [User] List items needing attention, most urgent first
    Attention {
        /// Maximum number of items (default from config)
        #[arg(long, short)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// [User] Show the failure timeline for one item
    Trends {
        /// Item identifier
        item_id: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// [User] Display failure statistics and mastery distribution
    Stats {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
        /// Show detailed breakdowns
        #[arg(long, short)]
        detailed: bool,
    },

    /// [User] Forget one item (mark it as known)
    Clear {
        /// Item identifier
        item_id: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// [User] Clear all failure tracking
    Reset {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// [Utility] Remove entries past the retention horizon
    Prune {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();
    init_logging();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("mastery error: {}", e);
            ExitCode::from(exit_codes::SUCCESS as u8) // Fail-open
        }
    }
}

/// Send logs to stderr, filtered by `MASTERY_LOG` (default: warn).
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Set up the global panic handler.
///
/// On panic, logs to ~/.mastery/crash.log and exits with code 3.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("mastery panic: {}", info);

        if let Some(home) = mastery_home() {
            let crash_log = home.join("crash.log");
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::CRASH);
    }));
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load();

    let store = match cli.state_dir {
        Some(dir) => FileStateStore::with_dir(dir)?,
        None => FileStateStore::new()?,
    };
    let tracker = FailureTracker::new(Arc::new(store), config);

    let code = dispatch(cli.command, &tracker);

    // Writes are debounced; make sure they land before the process exits
    tracker.flush().fail_open_default("flushing tracker state");

    Ok(code)
}

/// Route a parsed command to its implementation.
fn dispatch(command: Commands, tracker: &FailureTracker) -> ExitCode {
    match command {
        Commands::Fail {
            item_id,
            failure_type,
            mode,
            english,
            kikuyu,
            category,
            answer,
            correct,
            tag,
            response_ms,
            json,
            quiet,
        } => {
            let item = StudyItem::new(item_id, english, kikuyu, category);
            let details = FailureDetails {
                user_answer: answer,
                correct_answer: correct,
                difficulty_tag: tag,
                response_time_ms: response_ms,
            };
            run_fail(tracker, &item, failure_type, mode, details, json, quiet)
        }
        Commands::Succeed {
            item_id,
            mode,
            response_ms,
            json,
            quiet,
        } => run_succeed(tracker, &item_id, mode, response_ms, json, quiet),
        Commands::Problems { limit, json, quiet } => {
            run_problems(tracker, ProblemsQuery::Top { limit }, json, quiet)
        }
        Commands::ByType {
            failure_type,
            json,
            quiet,
        } => run_problems(tracker, ProblemsQuery::ByType(failure_type), json, quiet),
        Commands::ByCategory {
            category,
            json,
            quiet,
        } => run_problems(tracker, ProblemsQuery::ByCategory(category), json, quiet),
        Commands::Attention { limit, json, quiet } => {
            let limit = limit.unwrap_or(tracker.config().attention.limit);
            run_problems(tracker, ProblemsQuery::Attention { limit }, json, quiet)
        }
        Commands::Trends {
            item_id,
            json,
            quiet,
        } => run_trends(tracker, &item_id, json, quiet),
        Commands::Stats {
            json,
            quiet,
            detailed,
        } => run_stats(tracker, json, quiet, detailed),
        Commands::Clear {
            item_id,
            json,
            quiet,
        } => run_clear(tracker, Some(&item_id), json, quiet),
        Commands::Reset { json, quiet } => run_clear(tracker, None, json, quiet),
        Commands::Prune { json, quiet } => run_prune(tracker, json, quiet),
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

/// Convert a success boolean to an exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::SUCCESS as u8)
    } else {
        ExitCode::from(exit_codes::ERROR as u8)
    }
}

fn print_formatted(formatted: &str) {
    if !formatted.is_empty() {
        println!("{}", formatted);
    }
}

fn run_fail(
    tracker: &FailureTracker,
    item: &StudyItem,
    failure_type: FailureType,
    mode: LearningMode,
    details: FailureDetails,
    json: bool,
    quiet: bool,
) -> ExitCode {
    let cmd = RecordCommand::new(tracker);
    let options = RecordOptions { json, quiet };

    let output = cmd.fail(item, failure_type, mode, details);
    print_formatted(&cmd.format_output(&output, &options));

    success_to_exit_code(output.success)
}

fn run_succeed(
    tracker: &FailureTracker,
    item_id: &str,
    mode: LearningMode,
    response_ms: u64,
    json: bool,
    quiet: bool,
) -> ExitCode {
    let cmd = RecordCommand::new(tracker);
    let options = RecordOptions { json, quiet };

    let output = cmd.succeed(item_id, mode, response_ms);
    print_formatted(&cmd.format_output(&output, &options));

    success_to_exit_code(output.success)
}

fn run_problems(tracker: &FailureTracker, query: ProblemsQuery, json: bool, quiet: bool) -> ExitCode {
    let cmd = ProblemsCommand::new(tracker);
    let options = ProblemsOptions { json, quiet };

    let output = cmd.run(&query);
    print_formatted(&cmd.format_output(&output, &options));

    success_to_exit_code(output.success)
}

fn run_trends(tracker: &FailureTracker, item_id: &str, json: bool, quiet: bool) -> ExitCode {
    let cmd = TrendsCommand::new(tracker);
    let options = TrendsOptions { json, quiet };

    let output = cmd.run(item_id);
    print_formatted(&cmd.format_output(&output, &options));

    success_to_exit_code(output.success)
}

fn run_stats(tracker: &FailureTracker, json: bool, quiet: bool, detailed: bool) -> ExitCode {
    let cmd = StatsCommand::new(tracker);
    let options = StatsOptions {
        json,
        quiet,
        detailed,
    };

    let output = cmd.run();
    print_formatted(&cmd.format_output(&output, &options));

    success_to_exit_code(output.success)
}

fn run_clear(tracker: &FailureTracker, item_id: Option<&str>, json: bool, quiet: bool) -> ExitCode {
    let cmd = ClearCommand::new(tracker);
    let options = ClearOptions { json, quiet };

    let output = match item_id {
        Some(id) => cmd.clear_item(id),
        None => cmd.reset(),
    };
    print_formatted(&cmd.format_output(&output, &options));

    success_to_exit_code(output.success)
}

fn run_prune(tracker: &FailureTracker, json: bool, quiet: bool) -> ExitCode {
    let cmd = PruneCommand::new(tracker);
    let options = PruneOptions { json, quiet };

    let output = cmd.run();
    print_formatted(&cmd.format_output(&output, &options));

    success_to_exit_code(output.success)
}

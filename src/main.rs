mod article;
mod checker;
mod commands;
mod config;
mod diagnostics;
mod error;
mod identifiers;
mod links;
mod redirects;
mod references;
mod registry;
mod types;
mod watch;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::commands::OutputFormat;

/// Exit code for errors that stop the run before a report is produced.
const EXIT_FATAL: u8 = 2;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "wikicheck", about = "Check links and section anchors in a markdown wiki")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Check links in the given articles, or in every article under wiki/
    Check {
        /// Article paths relative to the repository root
        files: Vec<String>,
        /// Output format for failures
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List the identifiers (section anchors) an article exposes
    Ids {
        /// Article path relative to the repository root
        file: String,
        /// `json` also includes the article's front matter
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Check, then re-check whenever the wiki changes
    Watch {
        /// Article paths relative to the repository root
        files: Vec<String>,
        /// Output format for failures
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { files, format } => commands::check(&files, format),
        Commands::Ids { file, format } => commands::ids(&file, format).map(|()| return ExitCode::SUCCESS),
        Commands::Watch { files, format } => watch::run(&files, format),
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(EXIT_FATAL)
        },
    };
}

pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "riverlevels",
    about = "River levels skill operator CLI",
    long_about = "Inspect configuration, check provider readiness, and route sample requests through the skill.",
    after_help = "Examples:\n  riverlevels doctor --json\n  riverlevels config\n  riverlevels invoke --intent LevelDeeIntent"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
    #[command(about = "Validate config, catalog integrity, and provider reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Route a launch or intent request through the skill and print the response")]
    Invoke {
        #[arg(long, help = "Intent name to send, e.g. LevelDeeIntent")]
        intent: Option<String>,
        #[arg(long, conflicts_with = "intent", help = "Send a session-start request")]
        launch: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Invoke { intent, launch } => {
            let target = match intent {
                Some(intent) if !launch => commands::invoke::Target::Intent(intent),
                _ => commands::invoke::Target::Launch,
            };
            commands::invoke::run(target)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

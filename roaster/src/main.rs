//! Dev-log roaster CLI.
//!
//! `roaster run` mirrors the dev log, skips contributors with a recent entry,
//! and otherwise has the agent write and push a roast. `roaster check` runs
//! only the recency gate against an existing checkout.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use roaster::core::types::RunOutcome;
use roaster::exit_codes;
use roaster::io::config::load_config;
use roaster::io::entries::RecencyGate;
use roaster::io::generator::ClaudeGenerator;
use roaster::io::remote::GitContentRepo;
use roaster::pipeline::run_pipeline;

const DEFAULT_CONFIG: &str = "roaster.toml";

#[derive(Parser)]
#[command(
    name = "roaster",
    version,
    about = "Roast contributors who skipped their dev log"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mirror the dev log and publish a roast unless HANDLE posted recently.
    Run {
        /// GitHub handle to check and roast.
        #[arg(long)]
        handle: String,
        /// Config file; defaults apply when it does not exist.
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
    /// Print whether HANDLE has a recent published entry in a checkout.
    Check {
        #[arg(long)]
        handle: String,
        /// Root of an existing dev-log checkout.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    roaster::logging::init();
    let code = tokio::select! {
        result = run(cli) => match result {
            Ok(code) => code,
            Err(err) => {
                eprintln!("{:#}", err);
                exit_codes::FAILED
            }
        },
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, stopping run");
            exit_codes::INTERRUPTED
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Run { handle, config } => cmd_run(&handle, config).await,
        Command::Check {
            handle,
            dir,
            config,
        } => cmd_check(&handle, dir, config).await,
    }
}

async fn cmd_run(handle: &str, config_path: PathBuf) -> Result<i32> {
    let cfg = load_config(&config_path)?;
    let repo = GitContentRepo::from_config(&cfg);
    let generator = ClaudeGenerator::from_config(&cfg);
    match run_pipeline(handle, &repo, &generator, &cfg).await? {
        RunOutcome::Skipped { workdir } => {
            info!(workdir = %workdir.display(), "run finished without a roast");
        }
        RunOutcome::Published { workdir, entries } => {
            for entry in &entries {
                info!(entry = %entry.display(), "published");
            }
            info!(workdir = %workdir.display(), "run finished");
        }
    }
    Ok(exit_codes::OK)
}

async fn cmd_check(handle: &str, dir: PathBuf, config_path: PathBuf) -> Result<i32> {
    let cfg = load_config(&config_path)?;
    let found = RecencyGate::from_config(&cfg)
        .has_recent_entry(handle, &dir)
        .await?;
    println!("{found}");
    Ok(if found {
        exit_codes::OK
    } else {
        exit_codes::NO_RECENT_ENTRY
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run() {
        let cli = Cli::parse_from(["roaster", "run", "--handle", "alice"]);
        match cli.command {
            Command::Run { handle, config } => {
                assert_eq!(handle, "alice");
                assert_eq!(config, PathBuf::from("roaster.toml"));
            }
            Command::Check { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn parse_run_requires_handle() {
        assert!(Cli::try_parse_from(["roaster", "run"]).is_err());
    }

    #[test]
    fn parse_check_with_dir() {
        let cli = Cli::parse_from(["roaster", "check", "--handle", "bob", "--dir", "/srv/dev-log"]);
        assert!(matches!(
            cli.command,
            Command::Check { ref handle, ref dir, .. }
                if handle == "bob" && dir == &PathBuf::from("/srv/dev-log")
        ));
    }

    #[tokio::test]
    async fn check_reports_missing_entry_with_exit_code() {
        let temp = tempfile::tempdir().expect("tempdir");
        let code = cmd_check("alice", temp.path().to_path_buf(), temp.path().join("none.toml"))
            .await
            .expect("check");
        assert_eq!(code, exit_codes::NO_RECENT_ENTRY);
    }
}

use std::{path::PathBuf, str::FromStr};

use clap::{ArgAction, Parser};
use tmux_compose_core::config::{CONFIG_FILE_ENV, DEFAULT_CONFIG_FILE};

const COMMANDS_HELP: &str = "\
Commands:
  up    Create every session in the compose file that is not running
  down  Kill every session in the compose file that is running
  ls    List running tmux sessions";

#[derive(Parser)]
#[command(name = "tmux-compose")]
#[command(about = "Launch tmux sessions, windows and panes from a compose file")]
#[command(version)]
#[command(disable_help_flag = true)]
#[command(after_help = COMMANDS_HELP)]
pub struct Cli {
    /// Path to the compose file
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        env = CONFIG_FILE_ENV,
        default_value = DEFAULT_CONFIG_FILE
    )]
    pub file: PathBuf,

    /// Print the tmux commands instead of running them
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,

    /// Print `ls` output as JSON
    #[arg(long = "json")]
    pub json: bool,

    /// Print help
    #[arg(short = 'h', long = "help", action = ArgAction::SetTrue)]
    pub help: bool,

    /// Command to run: up, down or ls
    #[arg(value_name = "COMMAND")]
    pub command: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Up,
    Down,
    Ls,
}

impl Command {
    /// Whether the command reads the compose file
    pub fn needs_config(self) -> bool {
        !matches!(self, Command::Ls)
    }
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Command::Up),
            "down" => Ok(Command::Down),
            "ls" => Ok(Command::Ls),
            other => anyhow::bail!("Unknown command: {}", other),
        }
    }
}

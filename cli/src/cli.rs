//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// How dispatch results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Ordered results as a JSON array
    Json,
    /// One human-readable block per call
    Text,
}

/// CLI arguments for agent-relay
#[derive(Parser, Debug)]
#[command(name = "agent-relay")]
#[command(author, version, about = "Dispatch a batch of agent-tool calls to concurrent child agents")]
#[command(long_about = r#"
agent-relay runs one turn of tool calls against the agents defined in the
configuration. Every call to an agent tool (`agent__Name`) runs on a fresh
instance of that agent; results come back in request order.

The batch is a JSON array of calls:

  [
    { "id": "c1", "name": "agent__Summarizer", "arguments": { "text": "..." } },
    { "id": "c2", "name": "agent__Summarizer", "arguments": { "text": "..." } }
  ]

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./relay.toml        Project-level config
3. ~/.config/agent-relay/config.toml   Global config

Example:
  agent-relay batch.json
  agent-relay --event-log events.jsonl -o text batch.json
  cat batch.json | agent-relay -
"#)]
pub struct Cli {
    /// JSON file holding the batch ("-" reads stdin)
    pub batch: Option<PathBuf>,

    /// Name the dispatcher reports as the calling agent
    #[arg(long, value_name = "NAME", default_value = "Parent")]
    pub caller: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub output: OutputFormat,

    /// Cancel the whole batch after this many seconds
    #[arg(long, value_name = "SECS")]
    pub deadline_secs: Option<u64>,

    /// Print the tools exposed to the caller and exit
    #[arg(long)]
    pub list_tools: bool,

    /// Append dispatch events to this JSONL file
    #[arg(long, value_name = "PATH")]
    pub event_log: Option<PathBuf>,

    /// Also write diagnostic logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["agent-relay", "batch.json"]).unwrap();
        assert_eq!(cli.batch, Some(PathBuf::from("batch.json")));
        assert_eq!(cli.caller, "Parent");
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(cli.deadline_secs.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "agent-relay",
            "-vv",
            "-o",
            "text",
            "--deadline-secs",
            "30",
            "--event-log",
            "events.jsonl",
            "--no-config",
            "-",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.output, OutputFormat::Text);
        assert_eq!(cli.deadline_secs, Some(30));
        assert_eq!(cli.event_log, Some(PathBuf::from("events.jsonl")));
        assert!(cli.no_config);
        assert_eq!(cli.batch, Some(PathBuf::from("-")));
    }
}

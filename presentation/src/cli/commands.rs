//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// User id applied when `--user` is not given
pub const DEFAULT_USER: &str = "user";

/// CLI arguments for data-crew
#[derive(Parser, Debug)]
#[command(name = "data-crew")]
#[command(author, version, about = "A team of AI agents for data engineering")]
#[command(long_about = r#"
data-crew answers data engineering questions with a coordinated team of agents:

- RAG Agent: validated reference material from the internal knowledge base
- Web Agent: current official documentation from the web
- Code Standards Agent: production code, always preceded by a Decision Memo

Each question is routed to the agents it needs, dispatched concurrently and
synthesized into one attributed answer. Conversations are kept per session.

Configuration is loaded from (in priority order):
1. GOOGLE_API_KEY / GOOGLE_PROJECT_ID / DATA_STORE_ID
2. DATA_CREW_* environment variables (e.g. DATA_CREW_DISPATCH__HISTORY_WINDOW)
3. --config <path>
4. ./data-crew.toml or ./.data-crew.toml
5. ~/.config/data-crew/config.toml

Example:
  data-crew chat --user ana --session etl
  data-crew list-sessions --user ana
  data-crew cleanup-sessions --user ana --older-than-days 14
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive chat with the agent team
    Chat {
        /// User id
        #[arg(long, default_value = DEFAULT_USER)]
        user: String,

        /// Resume or name a session (becomes `<user>_<session>`)
        #[arg(long)]
        session: Option<String>,

        /// Clear the session's history before starting
        #[arg(long)]
        clear_history: bool,
    },

    /// List the sessions of a user
    ListSessions {
        #[arg(long, default_value = DEFAULT_USER)]
        user: String,
    },

    /// Delete sessions with no activity for a number of days
    CleanupSessions {
        #[arg(long, default_value = DEFAULT_USER)]
        user: String,

        #[arg(long, default_value_t = 30)]
        older_than_days: u32,
    },

    /// Show turn count and activity of one session
    InspectSession {
        #[arg(long, default_value = DEFAULT_USER)]
        user: String,

        #[arg(long)]
        session: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_defaults() {
        let cli = Cli::parse_from(["data-crew", "chat"]);
        assert_eq!(
            cli.command,
            Some(Command::Chat {
                user: DEFAULT_USER.to_string(),
                session: None,
                clear_history: false,
            })
        );
    }

    #[test]
    fn test_cleanup_with_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "data-crew",
            "cleanup-sessions",
            "--user",
            "ana",
            "--older-than-days",
            "7",
            "-vv",
            "--no-config",
        ]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_config);
        assert_eq!(
            cli.command,
            Some(Command::CleanupSessions {
                user: "ana".to_string(),
                older_than_days: 7,
            })
        );
    }

    #[test]
    fn test_cleanup_default_retention() {
        let cli = Cli::parse_from(["data-crew", "cleanup-sessions"]);
        assert!(matches!(
            cli.command,
            Some(Command::CleanupSessions { older_than_days: 30, .. })
        ));
    }

    #[test]
    fn test_inspect_requires_session() {
        assert!(Cli::try_parse_from(["data-crew", "inspect-session", "--user", "ana"]).is_err());
    }

    #[test]
    fn test_show_config_without_subcommand() {
        let cli = Cli::parse_from(["data-crew", "--show-config"]);
        assert!(cli.show_config);
        assert!(cli.command.is_none());
    }
}

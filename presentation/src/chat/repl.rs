//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::{ConsoleFormatter, CycleProgressReporter};
use colored::Colorize;
use crew_application::{
    Coordinator, CycleInput, NoProgress, PersistenceStatus, SessionLifecycle, SessionStore,
};
use crew_domain::SessionKey;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Input lines the REPL handles itself instead of sending to the agents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    Quit,
    Help,
    Clear,
    New,
    Session,
}

impl ChatCommand {
    /// Recognise a command, with or without a leading slash
    pub fn parse(line: &str) -> Option<Self> {
        let word = line.trim().trim_start_matches('/').to_ascii_lowercase();
        match word.as_str() {
            "quit" | "exit" | "q" => Some(ChatCommand::Quit),
            "help" | "h" | "?" => Some(ChatCommand::Help),
            "clear" => Some(ChatCommand::Clear),
            "new" => Some(ChatCommand::New),
            "session" => Some(ChatCommand::Session),
            _ => None,
        }
    }
}

/// Interactive chat REPL bound to one session at a time
pub struct ChatRepl<S: SessionStore + 'static> {
    coordinator: Arc<Coordinator<S>>,
    sessions: SessionLifecycle<S>,
    key: SessionKey,
    show_progress: bool,
}

impl<S: SessionStore + 'static> ChatRepl<S> {
    pub fn new(
        coordinator: Arc<Coordinator<S>>,
        sessions: SessionLifecycle<S>,
        key: SessionKey,
    ) -> Self {
        Self {
            coordinator,
            sessions,
            key,
            show_progress: true,
        }
    }

    /// Set whether to show progress
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn session(&self) -> &SessionKey {
        &self.key
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        let history_path = dirs::data_dir().map(|p| p.join("data-crew").join("history.txt"));
        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            match rl.readline(">>> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if let Some(command) = ChatCommand::parse(line) {
                        if self.handle_command(command).await {
                            break;
                        }
                        continue;
                    }

                    let _ = rl.add_history_entry(line);
                    self.process_query(line).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C (type 'exit' to leave)");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    self.print_goodbye();
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = history_path {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│            data-crew - Chat Mode            │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Session: {}", self.key.session.as_str().bold());
        println!();
        Self::print_help();
    }

    fn print_help() {
        println!("Commands:");
        println!("  help       - Show this help");
        println!("  session    - Show the current session id");
        println!("  clear      - Clear the history of this session");
        println!("  new        - Start a new session");
        println!("  exit, quit - Leave (the session is kept)");
        println!();
        println!("Press Ctrl+C while the agents work to stop and keep the partial answer.");
        println!();
    }

    fn print_goodbye(&self) {
        println!(
            "Session saved as {}. Resume with --session {}",
            self.key.session.as_str().bold(),
            self.key.session.as_str()
        );
    }

    /// Handle a REPL command. Returns true if the REPL should exit.
    async fn handle_command(&mut self, command: ChatCommand) -> bool {
        match command {
            ChatCommand::Quit => {
                self.print_goodbye();
                return true;
            }
            ChatCommand::Help => Self::print_help(),
            ChatCommand::Session => println!("Session: {}", self.key.session.as_str()),
            ChatCommand::Clear => match self.sessions.clear(&self.key).await {
                Ok(()) => println!("{} History of {} cleared.", "v".green(), self.key.session),
                Err(e) => eprintln!("{} Could not clear history: {}", "x".red(), e),
            },
            ChatCommand::New => {
                self.key = self.sessions.new_session(&self.key.user);
                println!("Started session {}", self.key.session.as_str().bold());
            }
        }
        false
    }

    async fn process_query(&self, query: &str) {
        println!();

        let token = CancellationToken::new();
        let watcher = {
            let token = token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    token.cancel();
                }
            })
        };

        let input = CycleInput::new(self.key.clone(), query).with_cancellation(token);
        let result = if self.show_progress {
            let progress = CycleProgressReporter::new();
            self.coordinator.run_with_progress(input, &progress).await
        } else {
            self.coordinator.run_with_progress(input, &NoProgress).await
        };
        watcher.abort();

        match result {
            Ok(outcome) => {
                println!("{}", ConsoleFormatter::format(&outcome.response));
                if outcome.interrupted {
                    println!("{}", "Stopped: showing what the agents finished.".yellow());
                }
                if let PersistenceStatus::Failed { reason } = &outcome.persistence {
                    eprintln!(
                        "{} This turn was not saved to the session: {}",
                        "!".yellow(),
                        reason
                    );
                }
            }
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
            }
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ChatCommand::parse("exit"), Some(ChatCommand::Quit));
        assert_eq!(ChatCommand::parse("QUIT"), Some(ChatCommand::Quit));
        assert_eq!(ChatCommand::parse("/q"), Some(ChatCommand::Quit));
        assert_eq!(ChatCommand::parse(" clear "), Some(ChatCommand::Clear));
        assert_eq!(ChatCommand::parse("/new"), Some(ChatCommand::New));
    }

    #[test]
    fn test_questions_are_not_commands() {
        assert_eq!(ChatCommand::parse("exit strategy for spark jobs?"), None);
        assert_eq!(ChatCommand::parse("what is a data lake"), None);
    }
}

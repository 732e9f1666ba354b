//! CLI entrypoint for data-crew
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use crew_application::{
    AgentPool, CodeStandardsAgent, ConversationLogger, Coordinator, KnowledgeAgent, LlmGateway,
    SessionLifecycle, WebSearchAgent,
};
use crew_domain::UserId;
use crew_infrastructure::{
    ConfigLoader, ConfigValidationError, DuckDuckGoSearch, FileConfig, GeminiLlmGateway,
    JsonlConversationLogger, RedbSessionStore, VertexAuth, VertexKnowledgeSearch,
};
use crew_presentation::{ChatRepl, Cli, Command, ConsoleFormatter, DEFAULT_USER};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_ref()) {
            println!("{}", line);
        }
        return ExitCode::SUCCESS;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
    }
    .context("failed to load configuration")?;

    let _log_guard = init_logging(&cli, &config);
    info!("Starting data-crew");

    let command = cli.command.clone().unwrap_or(Command::Chat {
        user: DEFAULT_USER.to_string(),
        session: None,
        clear_history: false,
    });
    check_config(&config, matches!(command, Command::Chat { .. }))?;

    let store = Arc::new(
        RedbSessionStore::open(&config.storage.database_path())
            .context("failed to open the session store")?,
    );
    let sessions = SessionLifecycle::new(store.clone());

    match command {
        Command::Chat {
            user,
            session,
            clear_history,
        } => {
            let user = UserId::new(user)?;
            let key = sessions.resolve(&user, session.as_deref())?;
            if clear_history {
                sessions.clear(&key).await?;
            }

            let coordinator = build_coordinator(&config, store)?;
            let mut repl =
                ChatRepl::new(Arc::new(coordinator), sessions, key).with_progress(!cli.quiet);
            repl.run().await.context("chat session failed")?;
        }
        Command::ListSessions { user } => {
            let user = UserId::new(user)?;
            let ids = sessions.list(&user).await?;
            print!("{}", ConsoleFormatter::format_sessions(&user, &ids));
        }
        Command::CleanupSessions {
            user,
            older_than_days,
        } => {
            let user = UserId::new(user)?;
            let removed = sessions.prune(&user, older_than_days).await?;
            println!(
                "Removed {} session(s) of {} inactive for more than {} days.",
                removed, user, older_than_days
            );
        }
        Command::InspectSession { user, session } => {
            let user = UserId::new(user)?;
            let key = sessions.resolve(&user, Some(session.as_str()))?;
            match sessions.inspect(&key).await? {
                Some(summary) => print!("{}", ConsoleFormatter::format_summary(&summary)),
                None => bail!("session {} not found", key),
            }
        }
    }

    Ok(())
}

/// Stderr logging by verbosity, plus a daily file when `logging.file` is set
fn init_logging(cli: &Cli, config: &FileConfig) -> Option<WorkerGuard> {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(filter());

    if !config.logging.file {
        tracing_subscriber::registry().with(stderr_layer).init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(config.logging.log_dir(), "data-crew.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(filter());

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Some(guard)
}

/// Session commands only touch local storage, so they run without credentials
fn check_config(config: &FileConfig, needs_credentials: bool) -> Result<()> {
    let issues: Vec<ConfigValidationError> = config
        .validate()
        .into_iter()
        .filter(|issue| {
            needs_credentials
                || !matches!(
                    issue,
                    ConfigValidationError::MissingApiKey
                        | ConfigValidationError::MissingProjectId
                        | ConfigValidationError::MissingDataStoreId
                )
        })
        .collect();

    if issues.is_empty() {
        return Ok(());
    }
    for issue in &issues {
        eprintln!("  {} {}", "x".red(), issue);
    }
    bail!("invalid configuration ({} issue(s))", issues.len())
}

fn build_coordinator(
    config: &FileConfig,
    store: Arc<RedbSessionStore>,
) -> Result<Coordinator<RedbSessionStore>> {
    let google = &config.google;
    let api_key = google
        .api_key
        .as_deref()
        .context("google.api_key is not set")?;
    let serving_config = google
        .serving_config()
        .context("knowledge base data store is not configured")?;

    let gateway: Arc<dyn LlmGateway> = Arc::new(GeminiLlmGateway::new(api_key)?);
    let auth = match google.access_token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => VertexAuth::Bearer(token.to_string()),
        _ => VertexAuth::ApiKey(api_key.to_string()),
    };
    let knowledge = Arc::new(VertexKnowledgeSearch::new(&serving_config, auth)?);
    let web = Arc::new(DuckDuckGoSearch::new()?);

    let pool = AgentPool::builder()
        .register(Arc::new(WebSearchAgent::new(
            gateway.clone(),
            web,
            config.models.flash(),
        )))
        .register(Arc::new(KnowledgeAgent::new(
            gateway.clone(),
            knowledge,
            config.models.pro(),
        )))
        .register(Arc::new(CodeStandardsAgent::new(
            gateway.clone(),
            config.models.pro(),
        )))
        .build();
    info!("Registered {} agent(s)", pool.len());

    let mut coordinator = Coordinator::new(store, Arc::new(pool), config.coordinator_config())
        .with_lead_gateway(gateway);

    if let Some(path) = config.logging.conversation_log_path() {
        match JsonlConversationLogger::open(&path) {
            Ok(logger) => {
                info!("Writing conversation transcript to {}", path.display());
                let logger: Arc<dyn ConversationLogger> = Arc::new(logger);
                coordinator = coordinator.with_conversation_logger(logger);
            }
            Err(e) => warn!("Could not open {}: {}", path.display(), e),
        }
    }

    Ok(coordinator)
}

// SPDX-License-Identifier: GPL-3.0-only

//! WordKiosk main application
//!
//! Runs the kiosk terminal on the console, or queries the word collection.
//! Key presses for the kiosk are read from standard input; logs go to
//! standard error so the terminal drawing on standard output stays clean.

use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::task::LocalSet;
use wordkiosk::app::{AppError, ConsoleSurface, KioskApp};
use wordkiosk::app_settings;
use wordkiosk::client::{EPOCH_TIMESTAMP, HttpTransport, SubmissionClient, WordsReceiver};
use wordkiosk::config::KioskConfig;
use wordkiosk::layout::load_layouts;

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "wordkiosk")]
#[command(about = "Kiosk word-collection terminal")]
#[command(version)]
struct Cli {
    /// Configuration file merged over the bundled defaults
    #[arg(long, short = 'c', value_name = "PATH", env = app_settings::CONFIG_ENV, global = true)]
    config: Option<PathBuf>,

    /// Word-collection service endpoint
    #[arg(long, value_name = "URL", env = app_settings::ENDPOINT_ENV, global = true)]
    endpoint: Option<String>,

    /// Subcommand to execute (defaults to `kiosk`).
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Run the kiosk terminal, reading key presses from stdin
    Kiosk,
    /// Fetch the approved words once and print them
    Words {
        /// Maximum number of words
        #[arg(long)]
        limit: Option<usize>,
        /// Keep the service's order instead of sampling
        #[arg(long)]
        ordered: bool,
        /// Only words stored after this ISO-8601 timestamp
        #[arg(long, default_value = EPOCH_TIMESTAMP)]
        since: String,
    },
    /// Poll the word collection and print new words as they arrive
    Watch {
        /// Maximum number of words per poll
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(app_settings::LOG_DIRECTIVE.parse().expect("valid directive")),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!("Failed to start runtime: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let local = LocalSet::new();
    match local.block_on(&runtime, run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let loaded = KioskConfig::load(cli.config.as_deref())?;
    loaded.log_warnings("config");
    let mut config = loaded.into_inner();
    if let Some(endpoint) = cli.endpoint {
        config.api.endpoint = endpoint;
    }
    tracing::info!("Using endpoint {}", config.api.endpoint);
    let config = Arc::new(config);

    match cli.command.unwrap_or(Command::Kiosk) {
        Command::Kiosk => run_kiosk(config).await,
        Command::Words {
            limit,
            ordered,
            since,
        } => {
            let client = SubmissionClient::new(HttpTransport::new(&config.api)?, &config.api);
            let limit = limit.unwrap_or(config.api.default_words_limit);
            let reply = client.fetch_words(limit, !ordered, &since).await?;

            for word in &reply.words {
                println!("{}", word.value);
            }
            tracing::info!("{} of {} word(s) printed", reply.words.len(), reply.total);
            Ok(())
        }
        Command::Watch { limit } => {
            let client = SubmissionClient::new(HttpTransport::new(&config.api)?, &config.api);
            let mut receiver = WordsReceiver::new(client, &config.api)
                .with_limit(limit.unwrap_or(config.api.default_words_limit));
            let mut batches = receiver.subscribe();

            let printer = tokio::task::spawn_local(async move {
                use futures::StreamExt;
                while let Some(batch) = batches.next().await {
                    for word in batch {
                        println!("{}", word.value);
                    }
                }
            });
            receiver.run().await;
            printer.await.map_err(AppError::Task)
        }
    }
}

async fn run_kiosk(config: Arc<KioskConfig>) -> Result<(), AppError> {
    let layouts = load_layouts(config.layouts_file.as_deref())?;
    layouts.log_warnings("layouts");

    let transport = HttpTransport::new(&config.api)?;
    let surface =
        ConsoleSurface::new(std::io::stdout()).with_clear_screen(std::io::stdout().is_terminal());
    let app = KioskApp::new(Arc::clone(&config), layouts.into_inner(), transport, surface);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut pipeline = app.run(stdin).await?;

    let client = pipeline.client_mut();
    if !client.queue().is_empty() {
        let report = client.flush().await;
        tracing::info!("Final queue pass: {:?}", report);
    }
    Ok(())
}

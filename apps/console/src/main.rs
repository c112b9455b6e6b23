use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    config::{load_settings_from, SETTINGS_FILE},
    DashboardStore, HttpRepositoryApi, StatusFeed, StoreEvent, StoreOptions, ToggleOutcome,
    WebSocketStatusFeed, MAX_COMPARISON,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod command;
mod render;

use command::{Command, HELP};

#[derive(Parser, Debug)]
struct Args {
    /// Overrides `server_url` from the settings file and environment.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long, default_value = SETTINGS_FILE)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings_from(&args.config, |key| std::env::var(key).ok());
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    let api_base = settings.api_base().context("invalid server url")?;
    let feed = WebSocketStatusFeed::new(
        settings.status_feed_url().context("invalid server url")?,
        settings.feed_queue,
    );
    info!(server_url = %api_base, feed_url = %feed.url(), "starting dashboard");

    let store = DashboardStore::create(
        Arc::new(HttpRepositoryApi::new(api_base)),
        Arc::new(feed) as Arc<dyn StatusFeed>,
        StoreOptions {
            event_buffer: settings.event_buffer,
        },
    )
    .await;

    let renderer = spawn_renderer(Arc::clone(&store));
    println!("{}", store.read(render::render).await);
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        if !run_command(&store, command).await {
            break;
        }
    }

    store.teardown().await;
    renderer.abort();
    Ok(())
}

/// Returns `false` once the user asked to quit.
async fn run_command(store: &Arc<DashboardStore>, command: Command) -> bool {
    match command {
        Command::Submit(url) => {
            store.set_repo_url(url).await;
            if !store.submit_input().await {
                println!("enter a repository url to analyze");
            }
        }
        Command::Select(repository_id) => {
            let repository = store
                .read(|state| state.repository(repository_id).cloned())
                .await;
            match repository {
                // Runs detached so a slow fetch can be superseded by the next selection.
                Some(repository) => {
                    let store = Arc::clone(store);
                    tokio::spawn(async move { store.select_repository(Some(repository)).await });
                }
                None => println!("no repository #{repository_id}"),
            }
        }
        Command::Clear => store.select_repository(None).await,
        Command::Compare(analysis_id) => {
            if store.toggle_comparison_selection(analysis_id).await == ToggleOutcome::AtCapacity {
                println!("at most {MAX_COMPARISON} analyses can be compared");
            }
        }
        Command::Refresh => store.load_repositories().await,
        Command::Show => println!("{}", store.read(render::render).await),
        Command::Help => println!("{HELP}"),
        Command::Quit => return false,
    }
    true
}

fn spawn_renderer(store: Arc<DashboardStore>) -> tokio::task::JoinHandle<()> {
    let mut events = store.subscribe_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(StoreEvent::InputChanged | StoreEvent::LoadingChanged(_)) => continue,
                Ok(StoreEvent::FeedClosed) => warn!("live status updates stopped"),
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
            println!("{}", store.read(render::render).await);
        }
    })
}

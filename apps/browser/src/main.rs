mod commands;
mod config;
mod feedback;
mod render;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use selection_core::{
    debounce::FilterDebouncer, transport::HttpItemsTransport, DurableSelectionCache,
    InMemorySelectionCache, SelectionCache, SelectionReconciler,
};
use shared::domain::CollectionKind;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use commands::{parse_command, Command, HELP};
use config::{load_settings, prepare_database_url, Settings};

#[derive(Parser, Debug)]
#[command(about = "Terminal dual-list item browser")]
struct Args {
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[arg(long)]
    api_base_url: Option<String>,
    #[arg(long)]
    cache_database_url: Option<String>,
    #[arg(long)]
    page_size: Option<u64>,
    /// Keep the selection snapshot in memory only.
    #[arg(long)]
    no_cache: bool,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(v) = &self.api_base_url {
            settings.api_base_url = v.clone();
        }
        if let Some(v) = &self.cache_database_url {
            settings.cache_database_url = v.clone();
        }
        if let Some(v) = self.page_size {
            settings.page_size = v;
        }
    }
}

async fn durable_cache(settings: &Settings) -> Result<DurableSelectionCache> {
    let url = prepare_database_url(&settings.cache_database_url)?;
    DurableSelectionCache::initialize(&url).await
}

async fn open_cache(settings: &Settings, no_cache: bool) -> Arc<dyn SelectionCache> {
    if no_cache {
        return Arc::new(InMemorySelectionCache::default());
    }
    match durable_cache(settings).await {
        Ok(cache) => Arc::new(cache),
        Err(err) => {
            warn!("selection: falling back to in-memory snapshot cache: {err:#}");
            Arc::new(InMemorySelectionCache::default())
        }
    }
}

struct Browser {
    reconciler: Arc<SelectionReconciler>,
    universe_filter: FilterDebouncer,
    selection_filter: FilterDebouncer,
}

impl Browser {
    fn new(reconciler: Arc<SelectionReconciler>, settings: &Settings) -> Self {
        let debounce = settings.filter_debounce();
        Self {
            universe_filter: FilterDebouncer::new(
                Arc::clone(&reconciler),
                CollectionKind::Universe,
                debounce,
            ),
            selection_filter: FilterDebouncer::new(
                Arc::clone(&reconciler),
                CollectionKind::Selection,
                debounce,
            ),
            reconciler,
        }
    }

    /// Returns `false` once the user asked to quit.
    async fn execute(&self, command: Command) -> bool {
        match command {
            Command::List(Some(kind)) => {
                println!("{}", render::render_view(&self.reconciler.view(kind).await));
            }
            Command::List(None) => {
                let snapshot = self.reconciler.snapshot().await;
                println!("{}", render::render_view(&snapshot.universe));
                println!("{}", render::render_view(&snapshot.selection));
            }
            Command::More(kind) => {
                let outcome = self.reconciler.load_more(kind).await;
                println!("{}", feedback::load_message(outcome));
            }
            Command::Scroll(kind, range) => {
                let outcome = self.reconciler.on_visible_range_changed(kind, range).await;
                println!("{}", feedback::load_message(outcome));
            }
            Command::Filter(kind, text) => {
                let debouncer = match kind {
                    CollectionKind::Universe => &self.universe_filter,
                    CollectionKind::Selection => &self.selection_filter,
                };
                debouncer.push(text).await;
            }
            Command::Select(id) => {
                let outcome = self.reconciler.select(id).await;
                println!("{}", feedback::mutation_message(outcome));
            }
            Command::Unselect(id) => {
                let outcome = self.reconciler.unselect(id).await;
                println!("{}", feedback::mutation_message(outcome));
            }
            Command::Move { active, over } => {
                let outcome = self.reconciler.move_selected(active, over).await;
                println!("{}", feedback::mutation_message(outcome));
            }
            Command::Create(input) => match self.reconciler.create_item_from_input(&input).await {
                Ok(item) => println!("created #{} {}", item.id, item.name),
                Err(err) => println!("{}", err.user_message()),
            },
            Command::Stats => {
                println!("{}", render::render_stats(&self.reconciler.snapshot().await));
            }
            Command::Reload => self.reconciler.initialize().await,
            Command::Help => println!("{HELP}"),
            Command::Quit => return false,
        }
        true
    }
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

    let mut settings = load_settings(&args.config);
    args.apply(&mut settings);
    settings.validate()?;
    info!(api_base_url = %settings.api_base_url, page_size = settings.page_size, "browser: starting");

    let transport = HttpItemsTransport::new(&settings.api_base_url)
        .context("failed to build items transport")?;
    let cache = open_cache(&settings, args.no_cache).await;
    let reconciler = SelectionReconciler::new_with_dependencies(
        Arc::new(transport),
        cache,
        settings.reconciler_options(),
    );

    let mut events = reconciler.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(message) = feedback::event_message(&event) {
                        eprintln!("! {message}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "browser: event listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    reconciler.initialize().await;
    if let Some(ids) = reconciler.cached_selection().await {
        println!("{}", feedback::cached_selection_message(&ids));
    }
    let browser = Browser::new(Arc::clone(&reconciler), &settings);
    println!("{}", render::render_stats(&reconciler.snapshot().await));
    println!("type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Ok(Some(command)) => {
                if !browser.execute(command).await {
                    break;
                }
            }
            Ok(None) => {}
            Err(message) => println!("{message}"),
        }
    }

    info!("browser: exiting");
    Ok(())
}

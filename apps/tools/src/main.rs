use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared::{domain::ItemId, protocol::SelectionSnapshot};
use storage::Storage;

const SNAPSHOT_KEY: &str = "itemsStore";

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/browser.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the cached selection snapshot.
    ShowSnapshot {
        #[arg(long, default_value = SNAPSHOT_KEY)]
        key: String,
    },
    /// Overwrite the cached selection with the given ids, in order.
    SetSnapshot {
        #[arg(long, default_value = SNAPSHOT_KEY)]
        key: String,
        ids: Vec<i64>,
    },
    ClearSnapshot {
        #[arg(long, default_value = SNAPSHOT_KEY)]
        key: String,
    },
    ListKeys,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::ShowSnapshot { key } => match storage.get_snapshot(&key).await? {
            Some(stored) => {
                let snapshot: SelectionSnapshot = serde_json::from_str(&stored.value)
                    .with_context(|| format!("snapshot '{key}' is not a selection document"))?;
                let ids = snapshot
                    .selected_ids
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                println!(
                    "key={key} updated_at={} selected={} ids=[{ids}]",
                    stored.updated_at.to_rfc3339(),
                    snapshot.selected_ids.len()
                );
            }
            None => println!("no snapshot stored under key={key}"),
        },
        Command::SetSnapshot { key, ids } => {
            let snapshot = SelectionSnapshot {
                selected_ids: ids.into_iter().map(ItemId).collect(),
            };
            storage
                .put_snapshot(&key, &serde_json::to_string(&snapshot)?)
                .await?;
            println!("stored {} id(s) under key={key}", snapshot.selected_ids.len());
        }
        Command::ClearSnapshot { key } => {
            if storage.delete_snapshot(&key).await? {
                println!("cleared key={key}");
            } else {
                println!("nothing stored under key={key}");
            }
        }
        Command::ListKeys => {
            for key in storage.list_snapshot_keys().await? {
                println!("{key}");
            }
        }
    }

    Ok(())
}

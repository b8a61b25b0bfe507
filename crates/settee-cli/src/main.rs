use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde_json::json;
use settee_core::telemetry::init_tracing;
use settee_core::{
    Credentials, EnqueueOptions, EnqueueOutcome, Order, Provisioned, QueueError, SetteeConfig,
    WorkQueue,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "settee", about = "Work queue over a document store")]
struct Cli {
    /// Config file (default: settee.toml, then /etc/settee/settee.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store location: memory, rocksdb://<path> or a directory
    #[arg(long, global = true)]
    location: Option<String>,

    /// Queue name
    #[arg(long, global = true)]
    name: Option<String>,

    /// Selection order: fifo, lifo or random
    #[arg(long, global = true)]
    order: Option<Order>,

    /// Store user
    #[arg(long, global = true)]
    user: Option<String>,

    /// Store password
    #[arg(long, global = true)]
    password: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the queue and its views if missing
    Init,

    /// Add messages to the queue
    Enqueue {
        /// Message ids
        #[arg(required = true)]
        ids: Vec<String>,

        /// Requeue messages that already exist
        #[arg(long = "override")]
        override_existing: bool,
    },

    /// Show the message the next worker would take
    Next,

    /// Mark a message as taken
    Dequeue {
        /// Message id
        id: String,
    },

    /// Show one message
    Status {
        /// Message id
        id: String,
    },

    /// Count queued messages
    Count,

    /// List queued (or dequeued) messages, oldest first
    List {
        /// List dequeued messages instead
        #[arg(long)]
        dequeued: bool,

        /// Maximum number of messages
        #[arg(long, default_value = "50")]
        limit: usize,
    },
}

/// Load the explicit config file, else the first one found on the search
/// path, else defaults. Returns the path that was read.
fn load_config(explicit: Option<&Path>) -> (SetteeConfig, Option<PathBuf>) {
    if let Some(path) = explicit {
        let config = SetteeConfig::load(path).unwrap_or_else(|e| fail(&e));
        return (config, Some(path.to_path_buf()));
    }

    for path in ["settee.toml", "/etc/settee/settee.toml"] {
        if Path::new(path).exists() {
            let config = SetteeConfig::load(path).unwrap_or_else(|e| fail(&e));
            return (config, Some(PathBuf::from(path)));
        }
    }

    (SetteeConfig::default(), None)
}

fn apply_overrides(cli: &Cli, config: &mut SetteeConfig) {
    if let Some(location) = &cli.location {
        config.store.location = location.clone();
    }
    if let Some(name) = &cli.name {
        config.store.name = name.clone();
    }
    if let Some(order) = cli.order {
        config.queue.order = order;
    }
    if let Some(user) = &cli.user {
        let password = cli.password.clone().unwrap_or_default();
        config.store.credentials = Some(Credentials::new(user.clone(), password));
    } else if let (Some(password), Some(credentials)) =
        (&cli.password, config.store.credentials.as_mut())
    {
        credentials.password = password.clone();
    }
}

fn fail(err: &QueueError) -> ! {
    eprintln!("Error: {err}");
    process::exit(1);
}

async fn cmd_init(queue: &WorkQueue) {
    match queue.ensure_queue().await {
        Ok(Provisioned::Created) => println!("Created queue \"{}\"", queue.name()),
        Ok(Provisioned::AlreadyExists) => println!("Queue \"{}\" already exists", queue.name()),
        Err(e) => fail(&e),
    }
}

async fn cmd_enqueue(queue: &WorkQueue, ids: Vec<String>, override_existing: bool, as_json: bool) {
    let options = EnqueueOptions { override_existing };
    let entries = queue.enqueue_many(ids, options).await;
    let mut failed = false;

    for entry in &entries {
        let status = match &entry.result {
            Ok(EnqueueOutcome::Inserted { .. }) => "queued".to_string(),
            Ok(EnqueueOutcome::Overwritten { .. }) => "requeued".to_string(),
            Ok(EnqueueOutcome::AlreadyPresent { queued: Some(true) }) => {
                "already queued".to_string()
            }
            Ok(EnqueueOutcome::AlreadyPresent { .. }) => {
                "already present, not requeued".to_string()
            }
            Err(e) => {
                failed = true;
                format!("error: {e}")
            }
        };
        if as_json {
            println!("{}", json!({ "id": entry.id, "status": status }));
        } else {
            println!("{}: {status}", entry.id);
        }
    }

    if failed {
        process::exit(1);
    }
}

async fn cmd_next(queue: &WorkQueue, as_json: bool) {
    match queue.next().await {
        Ok(item) if as_json => {
            println!("{}", json!({ "id": item.id, "insert_time": item.insert_time }))
        }
        Ok(item) => println!("{}", item.id),
        Err(e @ QueueError::EmptyQueue(_)) => {
            eprintln!("Error: {e}");
            process::exit(2);
        }
        Err(e) => fail(&e),
    }
}

async fn cmd_dequeue(queue: &WorkQueue, id: String) {
    match queue.dequeue(&id).await {
        Ok(outcome) if outcome.was_queued => println!("Dequeued \"{id}\""),
        Ok(_) => println!("\"{id}\" was already dequeued"),
        Err(e) => fail(&e),
    }
}

async fn cmd_status(queue: &WorkQueue, id: String, as_json: bool) {
    let message = queue.message(&id).await.unwrap_or_else(|e| fail(&e));
    if as_json {
        println!(
            "{}",
            json!({
                "id": message.id,
                "queued": message.queued,
                "insert_time": message.insert_time,
                "dequeue_time": message.dequeue_time,
            })
        );
        return;
    }

    println!("Message: {}", message.id);
    println!("  Queued:       {}", message.queued);
    println!("  Insert time:  {}", format_time(message.insert_time));
    println!("  Dequeue time: {}", format_time(message.dequeue_time));
}

async fn cmd_count(queue: &WorkQueue) {
    match queue.count_queued().await {
        Ok(count) => println!("{count}"),
        Err(e) => fail(&e),
    }
}

async fn cmd_list(queue: &WorkQueue, dequeued: bool, limit: usize, as_json: bool) {
    let result = if dequeued {
        queue.list_dequeued(limit).await
    } else {
        queue.list_queued(limit).await
    };
    let entries = result.unwrap_or_else(|e| fail(&e));

    if as_json {
        for entry in &entries {
            println!("{}", json!({ "id": entry.id, "time": entry.time }));
        }
        return;
    }
    if entries.is_empty() {
        println!("No messages found.");
        return;
    }

    let id_width = entries
        .iter()
        .map(|e| e.id.len())
        .max()
        .unwrap_or(2)
        .max(2);
    let time_header = if dequeued { "DEQUEUED_AT" } else { "INSERTED_AT" };
    println!("{:<id_width$}  {time_header}", "ID");
    for entry in &entries {
        println!("{:<id_width$}  {}", entry.id, format_time(entry.time));
    }
}

fn format_time(time: Option<u64>) -> String {
    time.map_or_else(|| "-".to_string(), |ns| ns.to_string())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let (mut config, loaded_from) = load_config(cli.config.as_deref());
    init_tracing(&config.telemetry.log_level);
    match &loaded_from {
        Some(path) => info!(path = %path.display(), "loaded configuration"),
        None => info!("no config file found, using defaults"),
    }
    apply_overrides(&cli, &mut config);

    let queue = WorkQueue::open(&config.store, config.queue).unwrap_or_else(|e| fail(&e));

    match cli.command {
        Commands::Init => cmd_init(&queue).await,
        Commands::Enqueue {
            ids,
            override_existing,
        } => cmd_enqueue(&queue, ids, override_existing || config.queue.override_existing, cli.json).await,
        Commands::Next => cmd_next(&queue, cli.json).await,
        Commands::Dequeue { id } => cmd_dequeue(&queue, id).await,
        Commands::Status { id } => cmd_status(&queue, id, cli.json).await,
        Commands::Count => cmd_count(&queue).await,
        Commands::List { dequeued, limit } => cmd_list(&queue, dequeued, limit, cli.json).await,
    }
}

//! ArborKV CLI
//!
//! Command-line interface for inspecting and editing an ArborKV store file.

use std::process;

use arborkv::{Config, Datastore, Key, Order, Query, SyncStrategy};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

/// ArborKV CLI
#[derive(Parser, Debug)]
#[command(name = "arborkv-cli")]
#[command(about = "CLI for the ArborKV embedded key-value store")]
#[command(version)]
struct Args {
    /// Store file
    #[arg(short, long, default_value = "./arborkv.redb")]
    path: String,

    /// Bucket (key-space) name
    #[arg(short, long, default_value = arborkv::config::DEFAULT_BUCKET)]
    bucket: String,

    /// Defer durability until `sync` or exit
    #[arg(long)]
    manual_sync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Delete {
        /// The key to delete
        key: String,
    },

    /// Check whether a key exists
    Has {
        /// The key to check
        key: String,
    },

    /// Print the size of a value in bytes
    Size {
        /// The key to measure
        key: String,
    },

    /// List entries
    Query {
        /// Key prefix
        #[arg(long, default_value = "")]
        prefix: String,

        /// Print keys only
        #[arg(long)]
        keys_only: bool,

        /// Entries to skip
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Maximum entries (0 = all)
        #[arg(long, default_value = "0")]
        limit: usize,

        /// Sort order
        #[arg(long, value_enum)]
        order: Option<OrderArg>,
    },

    /// Flush deferred writes to disk
    Sync,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OrderArg {
    Key,
    KeyDesc,
    Value,
    ValueDesc,
}

impl From<OrderArg> for Order {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Key => Order::ByKey,
            OrderArg::KeyDesc => Order::ByKeyDescending,
            OrderArg::Value => Order::ByValue,
            OrderArg::ValueDesc => Order::ByValueDescending,
        }
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,arborkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let sync_strategy = if args.manual_sync {
        SyncStrategy::Manual
    } else {
        SyncStrategy::EveryCommit
    };
    let config = Config::builder()
        .path(&args.path)
        .bucket(&args.bucket)
        .sync_strategy(sync_strategy)
        .build();

    let store = match Datastore::open(config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open datastore: {}", e);
            process::exit(1);
        }
    };

    let outcome = run(&store, args.command);
    let closed = store.close();

    if let Err(e) = outcome.and(closed) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run(store: &Datastore, command: Commands) -> arborkv::Result<()> {
    match command {
        Commands::Get { key } => {
            let value = store.get(&Key::new(key))?;
            println!("{}", String::from_utf8_lossy(&value));
        }
        Commands::Put { key, value } => {
            store.put(&Key::new(key), value.as_bytes())?;
        }
        Commands::Delete { key } => {
            store.delete(&Key::new(key))?;
        }
        Commands::Has { key } => {
            println!("{}", store.has(&Key::new(key))?);
        }
        Commands::Size { key } => {
            println!("{}", store.get_size(&Key::new(key))?);
        }
        Commands::Query {
            prefix,
            keys_only,
            offset,
            limit,
            order,
        } => {
            let mut builder = Query::builder()
                .prefix(prefix)
                .keys_only(keys_only)
                .offset(offset)
                .limit(limit);
            if let Some(order) = order {
                builder = builder.order(order.into());
            }

            for result in store.query(builder.build())? {
                let entry = result.into_result()?;
                match &entry.value {
                    Some(value) => println!("{}\t{}", entry.key, String::from_utf8_lossy(value)),
                    None => println!("{}", entry.key),
                }
            }
        }
        Commands::Sync => {
            store.sync(&Key::root())?;
        }
    }
    Ok(())
}

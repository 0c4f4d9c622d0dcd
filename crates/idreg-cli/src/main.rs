//! Identifier registry command line.
//!
//! One-shot commands over a SQLite registry file. Results go to stdout as
//! JSON; logs go to stderr, filtered by `IDREG_LOG`.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use idreg::store::{JournalMode, SqliteConfig, SqliteStore, Store, SyncMode};
use idreg::{IdentifierResponse, Metadata, PublicId, RegisterRequest, Registry};

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "idreg")]
#[command(about = "Stable public identifiers for (namespace, entity type, metadata)")]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "IDREG_DB", value_name = "PATH", default_value = "idreg.db")]
    db: PathBuf,

    /// How long to wait on another writer's lock
    #[arg(long, env = "IDREG_BUSY_TIMEOUT_MS", value_name = "MS")]
    busy_timeout_ms: Option<u64>,

    #[arg(long, value_enum, default_value_t = JournalArg::Wal)]
    journal_mode: JournalArg,

    #[arg(long, value_enum, default_value_t = SyncArg::Full)]
    synchronous: SyncArg,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or upgrade the schema
    Init,
    /// Get or create the identifier for an entity
    Issue {
        #[arg(long)]
        namespace: String,
        #[arg(long)]
        entity_type: String,
        /// Metadata entry, repeatable
        #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_meta)]
        meta: Vec<(String, String)>,
    },
    /// Handle a JSON request body, read from stdin unless given
    Request {
        #[arg(long)]
        body: Option<String>,
    },
    /// Print the record for an identifier
    Lookup { uuid: String },
    /// Count stored records
    Count {
        #[arg(long)]
        namespace: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum JournalArg {
    Wal,
    Delete,
}

impl From<JournalArg> for JournalMode {
    fn from(arg: JournalArg) -> Self {
        match arg {
            JournalArg::Wal => JournalMode::Wal,
            JournalArg::Delete => JournalMode::Delete,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SyncArg {
    Full,
    Normal,
}

impl From<SyncArg> for SyncMode {
    fn from(arg: SyncArg) -> Self {
        match arg {
            SyncArg::Full => SyncMode::Full,
            SyncArg::Normal => SyncMode::Normal,
        }
    }
}

impl Cli {
    fn store_config(&self) -> SqliteConfig {
        let mut config = SqliteConfig::new(&self.db)
            .journal_mode(self.journal_mode.into())
            .synchronous(self.synchronous.into());
        if let Some(ms) = self.busy_timeout_ms {
            config = config.busy_timeout_ms(ms);
        }
        config
    }
}

fn parse_meta(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{raw}`")),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("IDREG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let config = cli.store_config();
    let store = SqliteStore::open_with_config(config)
        .with_context(|| format!("failed to open registry at {}", cli.db.display()))?;
    info!(db = %cli.db.display(), "registry opened");

    run(cli.command, Registry::new(store)).await
}

async fn run(command: Command, registry: Registry<SqliteStore>) -> anyhow::Result<ExitCode> {
    match command {
        Command::Init => {
            print_json(&json!({
                "schema_version": idreg::store::migration::CURRENT_VERSION,
            }))?;
        }
        Command::Issue {
            namespace,
            entity_type,
            meta,
        } => {
            let metadata: Metadata = meta.into_iter().collect();
            let request = RegisterRequest::new(namespace, entity_type, metadata)?;
            let record = registry.register(&request).await?;
            print_json(&IdentifierResponse::from(record))?;
        }
        Command::Request { body } => {
            let body = match body {
                Some(body) => body,
                None => {
                    let mut buf = String::new();
                    io::stdin()
                        .read_to_string(&mut buf)
                        .context("failed to read request body from stdin")?;
                    buf
                }
            };
            let request = RegisterRequest::from_slice(body.as_bytes())?;
            let record = registry.register(&request).await?;
            print_json(&IdentifierResponse::from(record))?;
        }
        Command::Lookup { uuid } => {
            let identifier: PublicId = uuid
                .parse()
                .with_context(|| format!("`{uuid}` is not an identifier"))?;
            match registry.lookup(&identifier).await? {
                Some(record) => print_json(&IdentifierResponse::from(record))?,
                None => {
                    eprintln!("no record for {identifier}");
                    return Ok(ExitCode::from(2));
                }
            }
        }
        Command::Count { namespace } => {
            let count = registry.store().count_records(namespace.as_deref()).await?;
            print_json(&json!({ "namespace": namespace, "count": count }))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

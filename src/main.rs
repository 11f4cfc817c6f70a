#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

mod cli;
mod config;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::Parser;
use cli::{suggest_commands, Cli, Commands, OutputFormat, RecordsCommand};
use config::{load_config, mask_database_url, resolve_database_url, Config};
use results::source::FileSourceStore;
use results::{
    ListRecordsRequest, ListRecordsResponse, ReconcileContext, ReconcileOutcome, Result,
    ResultSyncReconciler, ResultsDb, ResultsError,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_cli();
    let label = match &cli.command {
        Commands::Records { .. } => "ListRecords",
        Commands::Sync { .. } => "Sync",
        Commands::InitDb => "InitDb",
    };

    if let Err(e) = run(cli).await {
        eprintln!("{label}: {e}");
        std::process::exit(e.exit_code());
    }
}

fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::InvalidSubcommand => {
            let typo = match e.get(ContextKind::InvalidSubcommand) {
                Some(ContextValue::String(typo)) => typo.clone(),
                _ => String::new(),
            };
            eprintln!("Unknown command '{typo}'");
            if let Some(suggestion) = suggest_commands(&typo).first() {
                eprintln!("Did you mean '{suggestion}'?");
            }
            std::process::exit(2);
        }
        Err(e) => e.exit(),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref()).await?;
    let database_url = resolve_database_url(cli.database_url.as_deref(), &config);
    info!(database = %mask_database_url(&database_url), "Using results database");

    match cli.command {
        Commands::Records {
            command:
                RecordsCommand::List {
                    parent,
                    filter,
                    limit,
                    page_token,
                    format,
                },
        } => {
            let db = ResultsDb::new(&database_url).await?;
            let response = db
                .list_records(&ListRecordsRequest {
                    parent,
                    filter,
                    page_size: limit,
                    page_token,
                })
                .await?;
            print_records(&response, format)
        }

        Commands::Sync {
            source_dir,
            parent,
            keys,
        } => {
            let sources = FileSourceStore::new(resolve_source_dir(source_dir, &config))?;
            let db = ResultsDb::connect_lazy(&database_url)?;
            let reconciler = match parent.or(config.parent) {
                Some(parent) => ResultSyncReconciler::new(db, sources).with_parent(parent),
                None => ResultSyncReconciler::new(db, sources),
            };
            sync_keys(&reconciler, &keys).await
        }

        Commands::InitDb => {
            let db = ResultsDb::new(&database_url).await?;
            db.initialize_schema().await?;
            println!("Initialized results schema");
            Ok(())
        }
    }
}

fn resolve_source_dir(flag: Option<PathBuf>, config: &Config) -> PathBuf {
    flag.or_else(|| config.source_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Runs every key; the first failure is returned once all keys were tried.
async fn sync_keys(
    reconciler: &ResultSyncReconciler<ResultsDb, FileSourceStore>,
    keys: &[String],
) -> Result<()> {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling sync");
            on_interrupt.cancel();
        }
    });

    let ctx = ReconcileContext::new(info_span!("sync"), cancel);
    let mut first_failure: Option<ResultsError> = None;
    for key in keys {
        match reconciler.reconcile(&ctx, key).await {
            Ok(outcome) => println!("{key}: {}", describe(&outcome)),
            Err(e) => {
                error!(key = %key, code = e.code(), "Reconcile failed: {e}");
                println!("{key}: failed ({})", e.code());
                first_failure.get_or_insert(e);
            }
        }
        if ctx.is_cancelled() {
            break;
        }
    }
    first_failure.map_or(Ok(()), Err)
}

fn describe(outcome: &ReconcileOutcome) -> String {
    match outcome {
        ReconcileOutcome::InvalidKey => "invalid key, skipped".to_string(),
        ReconcileOutcome::Gone => "object gone, nothing to do".to_string(),
        ReconcileOutcome::Created { result } => format!("created {result}"),
        ReconcileOutcome::Updated { result, slot } => format!("updated {result} ({slot:?})"),
    }
}

/// Decoded payload, or its raw bytes when they are not JSON.
fn payload_json(record: &str, bytes: &[u8]) -> Value {
    serde_json::from_slice::<Value>(bytes).unwrap_or_else(|e| {
        warn!(record, "Payload is not JSON, printing raw bytes: {e}");
        json!({ "raw": bytes })
    })
}

fn print_records(response: &ListRecordsResponse, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let records: Vec<Value> = response
                .records
                .iter()
                .map(|record| {
                    json!({
                        "name": record.name,
                        "id": record.id,
                        "etag": record.etag,
                        "type": record.data.as_ref().map(|any| any.type_url.as_str()),
                        "data": record.data.as_ref().map(|any| payload_json(&record.name, &any.value)),
                    })
                })
                .collect();
            let output = json!({
                "records": records,
                "nextPageToken": response.next_page_token,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            for record in &response.records {
                let kind = record.data.as_ref().map_or("-", |any| any.type_url.as_str());
                println!("{}\t{kind}\t{}", record.name, record.etag);
            }
            if let Some(token) = &response.next_page_token {
                println!("next page: {token}");
            }
        }
    }
    Ok(())
}

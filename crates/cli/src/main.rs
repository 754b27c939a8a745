use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use vitalog_channel::ChannelClient;
use vitalog_core::Config;
use vitalog_http::{create_router, AppState};
use vitalog_service::{BackupService, MeasurementService, ReportService};
use vitalog_storage::{resolve_backend, BackendInfo, MeasurementStore, StorageBackend};

#[derive(Parser)]
#[command(name = "vitalog")]
#[command(about = "Health measurement tracker with resilient storage and channel backup", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server.
    Serve {
        #[arg(short, long, default_value = "5000")]
        port: u16,
        #[arg(short = 'H', long, default_value = "0.0.0.0")]
        host: String,
    },
    /// Push a backup to the channel now.
    Export,
    /// Restore from the channel if the store is empty.
    Restore,
    /// Show backend and record diagnostics.
    Status,
    /// Replace all data with the canonical test rows.
    Seed,
}

struct App {
    storage: Arc<StorageBackend>,
    backup: Arc<BackupService>,
    info: BackendInfo,
    config: Config,
}

/// Shared startup path: config, backend resolution, schema repair, and
/// the backup controller.
async fn bootstrap() -> Result<App> {
    let config = Config::from_env();
    let resolved = resolve_backend(&config).await;
    let storage = Arc::new(resolved.backend);
    storage.ensure_schema().await?;

    let channel = match config.channel.as_ref() {
        Some(c) => Some(Arc::new(ChannelClient::new(c.bot_token.clone(), c.chat_id.clone())?)),
        None => None,
    };
    let backup = Arc::new(BackupService::new(Arc::clone(&storage), channel));

    Ok(App { storage, backup, info: resolved.info, config })
}

async fn serve(app: App, host: String, port: u16) -> Result<()> {
    // Recovery must complete before the listener accepts writes.
    let outcome = app.backup.run_startup_restore().await?;
    tracing::info!(?outcome, "startup restore finished");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = if app.backup.has_channel() {
        Some(app.backup.spawn_scheduler(
            app.config.backup_hour,
            app.config.backup_minute,
            shutdown_rx,
        ))
    } else {
        tracing::info!("no backup channel configured, daily export disabled");
        None
    };

    let state = Arc::new(AppState {
        measurements: Arc::new(MeasurementService::new(Arc::clone(&app.storage))),
        reports: Arc::new(ReportService::new(Arc::clone(&app.storage))),
        backup: Arc::clone(&app.backup),
        backend: app.info,
    });
    let router = create_router(state);
    let addr = format!("{host}:{port}");
    tracing::info!("starting HTTP server on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = scheduler {
        let _ = handle.await;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    let app = bootstrap().await?;

    match cli.command {
        Commands::Serve { port, host } => serve(app, host, port).await?,
        Commands::Export => {
            let outcome = app.backup.export_snapshot().await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Restore => {
            let outcome = app.backup.run_startup_restore().await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Status => {
            let records = app.storage.count().await?;
            let status = serde_json::json!({
                "backend": app.info,
                "records": records,
                "channel_configured": app.backup.has_channel(),
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Seed => {
            let service = MeasurementService::new(Arc::clone(&app.storage));
            let rows = service.seed_test_data().await?;
            println!("seeded {rows} rows");
        }
    }

    Ok(())
}

mod config;

use archivist_db::Database;
use archivist_engine::run_export;
use archivist_storage::LocalBackend;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "archivist=debug,archivist_engine=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    let job_id = Uuid::new_v4();
    let span = info_span!("export_job", %job_id);

    async move {
        info!(
            window_start = %config.window_start,
            window_end = %config.window_end,
            export_dir = %config.export_dir,
            "Starting export"
        );

        // The engine is synchronous; keep its blocking I/O off the runtime
        let span = tracing::Span::current();
        let outcome = tokio::task::spawn_blocking(move || span.in_scope(|| run_job(&config))).await?;

        match outcome {
            Ok(warnings) if warnings > 0 => {
                warn!(warnings, "Export finished with missing attachments");
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Export failed: {:#}", e);
                Err(e)
            }
        }
    }
    .instrument(span)
    .await
}

/// Run one export; returns the number of warnings recorded.
fn run_job(config: &Config) -> anyhow::Result<u64> {
    let db = Database::open(&config.db_path)?;
    let attachments = LocalBackend::new(config.attachment_dir.clone())?;
    let exports = LocalBackend::new(config.export_root.clone())?;

    let window = config.window();
    let records: Vec<_> = db
        .message_export_records(window.start, window.end)?
        .into_iter()
        .map(|row| row.into_record())
        .collect();
    info!(records = records.len(), "Loaded posts for export window");

    let summary = run_export(&records, window, &db, &exports, &attachments, &config.export_dir)?;

    if let Some(e) = &summary.delivery.manifest_error {
        error!("Warning manifest not written: {}", e);
    }
    info!(
        channels = summary.channels,
        messages = summary.messages,
        attachments = summary.attachments,
        skipped = summary.skipped_records,
        sha256 = %summary.delivery.document_sha256,
        "Export written to {}",
        config.export_root.join(&config.export_dir).display()
    );

    Ok(summary.delivery.warning_count)
}

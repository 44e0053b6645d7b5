/// Compliance export engine.
///
/// Turns the posts of one reporting window into per-channel transcripts:
/// - single pass over the posts: classify, accumulate channel metadata, bucket by channel
/// - membership reconstruction from history rows and post authors
/// - transcript assembly: joins, body in encounter order, sorted leaves
/// - delivery: archive document, attachment copies, warning manifest

pub mod assemble;
pub mod classify;
pub mod delivery;
pub mod error;
pub mod membership;
pub mod metadata;
pub mod store;
pub mod transcript;

#[cfg(test)]
mod testing;

use archivist_storage::FileBackend;
use archivist_types::{MessageExportRecord, TranscriptDocument};
use tracing::info;

pub use assemble::{Assembly, assemble};
pub use classify::{ClassifiedPost, classify};
pub use delivery::{
    DeliveryReport, EXPORT_FILENAME, MISSING_FILE_MESSAGE, WARNING_FILENAME, deliver,
    encode_document,
};
pub use error::ExportError;
pub use membership::{ChannelMember, ChannelMembers, reconstruct};
pub use metadata::{ChannelMetadata, ExportMetadata, ExportWindow};
pub use store::ExportStore;
pub use transcript::build_channel_transcript;

/// What a finished export produced.
#[derive(Debug)]
pub struct ExportSummary {
    pub channels: usize,
    pub messages: u64,
    pub attachments: u64,
    pub skipped_records: u64,
    pub delivery: DeliveryReport,
}

/// Run one export job over `records` and deliver it into `export_dir`.
///
/// Blocking; callers must not run two jobs against the same directory at once.
pub fn run_export(
    records: &[Option<MessageExportRecord>],
    window: ExportWindow,
    store: &dyn ExportStore,
    export_backend: &dyn FileBackend,
    attachment_backend: &dyn FileBackend,
    export_dir: &str,
) -> Result<ExportSummary, ExportError> {
    let mut assembly = assemble(records, window, store)?;
    let transcripts = assembly.build_transcripts(store)?;
    let document = TranscriptDocument::new(transcripts);

    let delivery = deliver(
        &document,
        &assembly.uploaded_files,
        export_backend,
        attachment_backend,
        export_dir,
    )?;

    let metadata = &assembly.metadata;
    info!(
        channels = metadata.channel_count(),
        messages = metadata.messages_count,
        attachments = metadata.attachments_count,
        first_post_at = metadata.start_time.unwrap_or_default(),
        last_post_at = metadata.end_time.unwrap_or_default(),
        warnings = delivery.warning_count,
        "export complete"
    );

    Ok(ExportSummary {
        channels: metadata.channel_count(),
        messages: metadata.messages_count,
        attachments: metadata.attachments_count,
        skipped_records: assembly.skipped_records,
        delivery,
    })
}

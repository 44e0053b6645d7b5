use archivist_storage::BackendError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to load attachments for post {post_id}: {source}")]
    AttachmentLookup {
        post_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to load membership history for channel {channel_id}: {source}")]
    MembershipLookup {
        channel_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to encode export document: {0}")]
    Encode(String),

    #[error("failed to write export document {path}: {source}")]
    WriteDocument {
        path: String,
        #[source]
        source: BackendError,
    },

    #[error("failed to copy attachment to {path}: {source}")]
    CopyAttachment {
        path: String,
        #[source]
        source: BackendError,
    },

    #[error("failed to write warning manifest {path}: {source}")]
    WriteWarnings {
        path: String,
        #[source]
        source: BackendError,
    },
}

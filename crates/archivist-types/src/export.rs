//! Archive document model.
//!
//! Field and element names follow the file-dump schema consumed by compliance
//! archivers: one `Conversation` per channel, participants entered first, then
//! the transcript body, then participants left. The structs serialize with any
//! serde backend; the engine encodes them as XML.

use serde::{Serialize, Serializer};

use crate::models::UserType;

pub const XMLNS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Root of the archive document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename = "FileDump")]
pub struct TranscriptDocument {
    #[serde(rename = "@xmlns:xsi")]
    pub xmlns: String,
    #[serde(rename = "Conversation")]
    pub channels: Vec<ChannelTranscript>,
}

impl TranscriptDocument {
    pub fn new(channels: Vec<ChannelTranscript>) -> Self {
        Self {
            xmlns: XMLNS_XSI.to_string(),
            channels,
        }
    }
}

/// Everything that happened in one channel during the export window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelTranscript {
    /// Human-readable label; archivers ignore its value.
    #[serde(rename = "@Perspective")]
    pub perspective: String,
    #[serde(skip)]
    pub channel_id: String,
    #[serde(rename = "RoomID")]
    pub room_id: String,
    /// Later of the window start and the channel creation time.
    #[serde(rename = "StartTimeUTC")]
    pub start_time: i64,
    #[serde(rename = "ParticipantEntered")]
    pub joins: Vec<Participant>,
    #[serde(rename = "$value")]
    pub events: Vec<TranscriptEvent>,
    #[serde(rename = "ParticipantLeft")]
    pub leaves: Vec<Participant>,
    /// Earlier of the window end and the channel deletion time.
    #[serde(rename = "EndTimeUTC")]
    pub end_time: i64,
}

/// A user entering or leaving a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    #[serde(rename = "LoginName")]
    pub email: String,
    #[serde(rename = "UserType")]
    pub user_type: UserType,
    #[serde(rename = "DateTimeUTC")]
    pub timestamp: i64,
    #[serde(rename = "CorporateEmailID")]
    pub corporate_email: String,
}

impl Participant {
    pub fn new(email: impl Into<String>, user_type: UserType, timestamp: i64) -> Self {
        let email = email.into();
        Self {
            corporate_email: email.clone(),
            email,
            user_type,
            timestamp,
        }
    }
}

/// Body entries of a transcript.
///
/// Deletion notices are encoded as ordinary messages, so several variants
/// share an element name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TranscriptEvent {
    #[serde(rename = "Message")]
    Post(PostEntry),
    #[serde(rename = "Message")]
    PostDelete(PostEntry),
    #[serde(rename = "FileTransferStarted")]
    AttachmentStart(FileTransfer),
    #[serde(rename = "FileTransferEnded")]
    AttachmentStop(FileTransferEnd),
    #[serde(rename = "Message")]
    AttachmentDelete(PostEntry),
}

impl TranscriptEvent {
    /// Login of whoever produced the entry.
    pub fn email(&self) -> &str {
        match self {
            Self::Post(entry) | Self::PostDelete(entry) | Self::AttachmentDelete(entry) => {
                &entry.email
            }
            Self::AttachmentStart(transfer) => &transfer.email,
            Self::AttachmentStop(end) => &end.email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostEntry {
    #[serde(rename = "LoginName")]
    pub email: String,
    #[serde(rename = "UserType")]
    pub user_type: UserType,
    #[serde(rename = "DateTimeUTC")]
    pub timestamp: i64,
    #[serde(rename = "Content")]
    pub message: String,
    /// Id of the post shown by a permalink preview, empty otherwise.
    #[serde(rename = "PreviewsPost")]
    pub previews_post: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileTransfer {
    #[serde(rename = "LoginName")]
    pub email: String,
    #[serde(rename = "DateTimeUTC")]
    pub timestamp: i64,
    #[serde(rename = "UserFileName")]
    pub filename: String,
    /// Storage path, also the file's location relative to the export document.
    #[serde(rename = "FileName")]
    pub file_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileTransferEnd {
    #[serde(rename = "LoginName")]
    pub email: String,
    #[serde(rename = "DateTimeUTC")]
    pub timestamp: i64,
    #[serde(rename = "UserFileName")]
    pub filename: String,
    #[serde(rename = "FileName")]
    pub file_path: String,
    #[serde(rename = "Status")]
    pub status: TransferStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Completed,
    Failed,
}

impl TransferStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }
}

impl Serialize for TransferStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

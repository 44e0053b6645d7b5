pub mod export;
pub mod models;

pub use export::{
    ChannelTranscript, FileTransfer, FileTransferEnd, Participant, PostEntry, TransferStatus,
    TranscriptDocument, TranscriptEvent,
};
pub use models::{
    AttachmentInfo, ChannelType, DeleteMarker, MembershipHistoryRow, MessageExportRecord, PostProps,
    UserType,
};

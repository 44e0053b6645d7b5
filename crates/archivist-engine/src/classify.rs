//! Turns one post into the transcript entries it contributes.

use archivist_types::{
    AttachmentInfo, DeleteMarker, FileTransfer, FileTransferEnd, MessageExportRecord, PostEntry,
    TransferStatus, TranscriptEvent,
};
use tracing::debug;

use crate::error::ExportError;
use crate::store::ExportStore;

/// Prefix marking synthetic deletion entries.
pub const DELETE_PREFIX: &str = "delete ";

/// Entries for one post, in transcript order, plus the files to copy.
#[derive(Debug, Default)]
pub struct ClassifiedPost {
    pub events: Vec<TranscriptEvent>,
    pub uploaded_files: Vec<AttachmentInfo>,
}

#[derive(Debug, Default)]
pub struct AttachmentEntries {
    pub starts: Vec<TranscriptEvent>,
    pub stops: Vec<TranscriptEvent>,
    pub deletes: Vec<TranscriptEvent>,
    pub uploaded_files: Vec<AttachmentInfo>,
}

/// Classify a post: its message, an optional deletion entry, then attachment
/// starts, stops and deletion entries.
pub fn classify(
    record: &MessageExportRecord,
    store: &dyn ExportStore,
) -> Result<ClassifiedPost, ExportError> {
    let mut events = post_entries(record);

    let attachments = attachment_entries(record, store)?;
    events.extend(attachments.starts);
    events.extend(attachments.stops);
    events.extend(attachments.deletes);

    Ok(ClassifiedPost {
        events,
        uploaded_files: attachments.uploaded_files,
    })
}

/// The message itself, followed by a deletion entry when the post was
/// deleted by a user.
pub fn post_entries(record: &MessageExportRecord) -> Vec<TranscriptEvent> {
    let mut events = vec![TranscriptEvent::Post(post_entry(
        record,
        record.post_create_at,
        record.post_message.clone(),
    ))];

    if let Some(deleted_at) = record.deleted_at() {
        match record.props().delete_marker() {
            DeleteMarker::Marked => events.push(TranscriptEvent::PostDelete(post_entry(
                record,
                deleted_at,
                format!("{}{}", DELETE_PREFIX, record.post_message),
            ))),
            DeleteMarker::Unmarked => {}
            DeleteMarker::Unparseable => {
                debug!(post_id = %record.post_id, "unparseable props on deleted post, no delete entry");
            }
        }
    }

    events
}

/// Transfer entries for every file attached to the post.
///
/// Start and stop both use the post creation time; upload duration is not tracked.
pub fn attachment_entries(
    record: &MessageExportRecord,
    store: &dyn ExportStore,
) -> Result<AttachmentEntries, ExportError> {
    if record.post_file_ids.is_empty() {
        return Ok(AttachmentEntries::default());
    }

    let files = store
        .attachments_for_post(&record.post_id)
        .map_err(|source| ExportError::AttachmentLookup {
            post_id: record.post_id.clone(),
            source,
        })?;

    let mut entries = AttachmentEntries::default();
    for file in files {
        entries.starts.push(TranscriptEvent::AttachmentStart(FileTransfer {
            email: record.user_email.clone(),
            timestamp: record.post_create_at,
            filename: file.name.clone(),
            file_path: file.path.clone(),
        }));

        entries.stops.push(TranscriptEvent::AttachmentStop(FileTransferEnd {
            email: record.user_email.clone(),
            timestamp: record.post_create_at,
            filename: file.name.clone(),
            file_path: file.path.clone(),
            status: TransferStatus::Completed,
        }));

        if let (true, Some(deleted_at)) = (file.is_deleted(), record.deleted_at()) {
            entries.deletes.push(TranscriptEvent::AttachmentDelete(post_entry(
                record,
                deleted_at,
                format!("{}{}", DELETE_PREFIX, file.path),
            )));
        }

        entries.uploaded_files.push(file);
    }

    Ok(entries)
}

fn post_entry(record: &MessageExportRecord, timestamp: i64, message: String) -> PostEntry {
    PostEntry {
        email: record.user_email.clone(),
        user_type: record.user_type(),
        timestamp,
        message,
        previews_post: record.props().previewed_post(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, attachment, record};

    #[test]
    fn test_plain_post_is_one_entry() {
        let store = MemoryStore::default();
        let post = record("p1", "c1", "ua", 1200);
        let classified = classify(&post, &store).unwrap();

        assert_eq!(classified.events.len(), 1);
        let TranscriptEvent::Post(entry) = &classified.events[0] else {
            panic!("expected a post entry");
        };
        assert_eq!(entry.timestamp, 1200);
        assert_eq!(entry.message, "message p1");
        assert_eq!(entry.user_type.label(), "user");
        assert!(classified.uploaded_files.is_empty());
    }

    #[test]
    fn test_deleted_post_with_marker() {
        let mut post = record("p1", "c1", "ua", 1200);
        post.post_delete_at = Some(1500);
        post.post_props = Some(r#"{"deleteBy":"ua","previewed_post":"p0"}"#.into());

        let events = post_entries(&post);
        assert_eq!(events.len(), 2);
        let TranscriptEvent::PostDelete(entry) = &events[1] else {
            panic!("expected a delete entry");
        };
        assert_eq!(entry.timestamp, 1500);
        assert_eq!(entry.message, "delete message p1");
        assert_eq!(entry.previews_post, "p0");
    }

    #[test]
    fn test_deleted_post_without_marker() {
        let mut post = record("p1", "c1", "ua", 1200);
        post.post_delete_at = Some(1500);
        post.post_props = Some(r#"{"from_webhook":"true"}"#.into());
        assert_eq!(post_entries(&post).len(), 1);

        post.post_props = None;
        assert_eq!(post_entries(&post).len(), 1);
    }

    #[test]
    fn test_deleted_post_with_garbage_props() {
        let mut post = record("p1", "c1", "ua", 1200);
        post.post_delete_at = Some(1500);
        post.post_props = Some("{not json".into());
        assert_eq!(post_entries(&post).len(), 1);
    }

    #[test]
    fn test_marker_without_delete_time() {
        let mut post = record("p1", "c1", "ua", 1200);
        post.post_props = Some(r#"{"deleteBy":"ua"}"#.into());
        assert_eq!(post_entries(&post).len(), 1);
    }

    #[test]
    fn test_attachment_entries_order() {
        let store = MemoryStore::default();
        store.add_attachment(attachment("f1", "p1", "data/a.txt", None));
        store.add_attachment(attachment("f2", "p1", "data/b.txt", Some(1600)));

        let mut post = record("p1", "c1", "ua", 1200);
        post.post_file_ids = vec!["f1".into(), "f2".into()];
        post.post_delete_at = Some(1700);

        let classified = classify(&post, &store).unwrap();
        let kinds: Vec<&str> = classified
            .events
            .iter()
            .map(|e| match e {
                TranscriptEvent::Post(_) => "post",
                TranscriptEvent::PostDelete(_) => "post-delete",
                TranscriptEvent::AttachmentStart(_) => "start",
                TranscriptEvent::AttachmentStop(_) => "stop",
                TranscriptEvent::AttachmentDelete(_) => "file-delete",
            })
            .collect();
        assert_eq!(kinds, vec!["post", "start", "start", "stop", "stop", "file-delete"]);

        let TranscriptEvent::AttachmentStop(stop) = &classified.events[3] else {
            panic!("expected a stop entry");
        };
        assert_eq!(stop.timestamp, 1200);
        assert_eq!(stop.status, TransferStatus::Completed);

        let TranscriptEvent::AttachmentDelete(notice) = &classified.events[5] else {
            panic!("expected a file delete entry");
        };
        assert_eq!(notice.message, "delete data/b.txt");
        assert_eq!(notice.timestamp, 1700);
        assert_eq!(classified.uploaded_files.len(), 2);
    }

    #[test]
    fn test_deleted_file_on_live_post_has_no_notice() {
        let store = MemoryStore::default();
        store.add_attachment(attachment("f2", "p1", "data/b.txt", Some(1600)));

        let mut post = record("p1", "c1", "ua", 1200);
        post.post_file_ids = vec!["f2".into()];

        let entries = attachment_entries(&post, &store).unwrap();
        assert!(entries.deletes.is_empty());
        assert_eq!(entries.uploaded_files.len(), 1);
    }

    #[test]
    fn test_attachment_lookup_failure_is_fatal() {
        let store = MemoryStore::default();
        store.fail_attachments_for("p1");

        let mut post = record("p1", "c1", "ua", 1200);
        post.post_file_ids = vec!["f1".into()];

        let err = classify(&post, &store).unwrap_err();
        assert!(matches!(err, ExportError::AttachmentLookup { ref post_id, .. } if post_id == "p1"));
    }

    #[test]
    fn test_no_file_ids_skips_lookup() {
        let store = MemoryStore::default();
        store.fail_attachments_for("p1");
        let post = record("p1", "c1", "ua", 1200);
        assert!(attachment_entries(&post, &store).unwrap().starts.is_empty());
    }
}

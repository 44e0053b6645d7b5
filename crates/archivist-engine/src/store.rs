use anyhow::Result;
use archivist_db::Database;
use archivist_types::{AttachmentInfo, MembershipHistoryRow};

/// Read-only lookups the export needs from the record store.
pub trait ExportStore {
    /// All files attached to a post, including deleted ones.
    fn attachments_for_post(&self, post_id: &str) -> Result<Vec<AttachmentInfo>>;

    /// Membership rows of `channel_id` overlapping `[start, end]`.
    fn membership_history(
        &self,
        start: i64,
        end: i64,
        channel_id: &str,
    ) -> Result<Vec<MembershipHistoryRow>>;
}

impl ExportStore for Database {
    fn attachments_for_post(&self, post_id: &str) -> Result<Vec<AttachmentInfo>> {
        Database::attachments_for_post(self, post_id)
    }

    fn membership_history(
        &self,
        start: i64,
        end: i64,
        channel_id: &str,
    ) -> Result<Vec<MembershipHistoryRow>> {
        self.users_in_channel_during(start, end, channel_id)
    }
}

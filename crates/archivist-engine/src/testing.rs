//! Fixtures shared by the unit tests.

use std::cell::RefCell;
use std::collections::HashSet;

use anyhow::{Result, bail};
use archivist_types::{AttachmentInfo, ChannelType, MembershipHistoryRow, MessageExportRecord};

use crate::store::ExportStore;

#[derive(Default)]
pub struct MemoryStore {
    attachments: RefCell<Vec<AttachmentInfo>>,
    history: RefCell<Vec<MembershipHistoryRow>>,
    failing_posts: RefCell<HashSet<String>>,
    failing_channels: RefCell<HashSet<String>>,
}

impl MemoryStore {
    pub fn add_attachment(&self, file: AttachmentInfo) {
        self.attachments.borrow_mut().push(file);
    }

    pub fn add_history(&self, row: MembershipHistoryRow) {
        self.history.borrow_mut().push(row);
    }

    pub fn fail_attachments_for(&self, post_id: &str) {
        self.failing_posts.borrow_mut().insert(post_id.to_string());
    }

    pub fn fail_history_for(&self, channel_id: &str) {
        self.failing_channels.borrow_mut().insert(channel_id.to_string());
    }
}

impl ExportStore for MemoryStore {
    fn attachments_for_post(&self, post_id: &str) -> Result<Vec<AttachmentInfo>> {
        if self.failing_posts.borrow().contains(post_id) {
            bail!("attachment lookup failed for {}", post_id);
        }
        Ok(self
            .attachments
            .borrow()
            .iter()
            .filter(|f| f.post_id == post_id)
            .cloned()
            .collect())
    }

    fn membership_history(
        &self,
        start: i64,
        end: i64,
        channel_id: &str,
    ) -> Result<Vec<MembershipHistoryRow>> {
        if self.failing_channels.borrow().contains(channel_id) {
            bail!("history lookup failed for {}", channel_id);
        }
        Ok(self
            .history
            .borrow()
            .iter()
            .filter(|row| {
                row.channel_id == channel_id
                    && row.join_time <= end
                    && row.leave_time.is_none_or(|t| t >= start)
            })
            .cloned()
            .collect())
    }
}

/// A post in an open channel named `town-square`; the author's email is `<user_id>@example.com`.
pub fn record(post_id: &str, channel_id: &str, user_id: &str, create_at: i64) -> MessageExportRecord {
    MessageExportRecord {
        post_id: post_id.to_string(),
        channel_id: channel_id.to_string(),
        channel_name: "town-square".to_string(),
        channel_display_name: "Town Square".to_string(),
        channel_type: ChannelType::Open,
        channel_create_at: 0,
        channel_delete_at: None,
        team_name: Some("acme".to_string()),
        user_id: user_id.to_string(),
        user_email: format!("{}@example.com", user_id),
        username: user_id.to_string(),
        is_bot: false,
        post_create_at: create_at,
        post_delete_at: None,
        post_message: format!("message {}", post_id),
        post_props: None,
        post_file_ids: Vec::new(),
    }
}

pub fn attachment(id: &str, post_id: &str, path: &str, delete_at: Option<i64>) -> AttachmentInfo {
    AttachmentInfo {
        id: id.to_string(),
        post_id: post_id.to_string(),
        name: path.rsplit('/').next().unwrap_or(path).to_string(),
        path: path.to_string(),
        delete_at,
    }
}

/// History row in channel `c1`.
pub fn history_row(user_id: &str, email: &str, join_time: i64, leave_time: Option<i64>) -> MembershipHistoryRow {
    MembershipHistoryRow {
        channel_id: "c1".to_string(),
        user_id: user_id.to_string(),
        join_time,
        leave_time,
        user_email: Some(email.to_string()),
        username: Some(user_id.to_string()),
        is_bot: Some(false),
        user_delete_at: None,
    }
}

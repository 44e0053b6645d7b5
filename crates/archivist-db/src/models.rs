//! Database row types — these map directly to SQLite rows.
//! Channel and user columns come from LEFT JOINs and may be missing.

use archivist_types::{ChannelType, MessageExportRecord};
use tracing::warn;

pub struct ExportRow {
    pub post_id: String,
    pub channel_id: String,
    pub user_id: String,
    pub message: String,
    pub props: Option<String>,
    pub file_ids: Option<String>,
    pub create_at: i64,
    pub delete_at: Option<i64>,
    pub channel_name: Option<String>,
    pub channel_display_name: Option<String>,
    pub channel_type: Option<String>,
    pub team_name: Option<String>,
    pub channel_create_at: Option<i64>,
    pub channel_delete_at: Option<i64>,
    pub user_email: Option<String>,
    pub username: Option<String>,
    pub is_bot: Option<bool>,
}

impl ExportRow {
    /// Build an export record, or `None` when the post's channel or author
    /// could not be resolved.
    pub fn into_record(self) -> Option<MessageExportRecord> {
        let channel_type = match self.channel_type.as_deref().map(ChannelType::from_code) {
            Some(Some(ty)) => ty,
            _ => {
                warn!(post_id = %self.post_id, channel_id = %self.channel_id, "post has no resolvable channel");
                return None;
            }
        };
        let (Some(channel_name), Some(channel_display_name), Some(channel_create_at)) =
            (self.channel_name, self.channel_display_name, self.channel_create_at)
        else {
            warn!(post_id = %self.post_id, "post channel is missing identity fields");
            return None;
        };
        let (Some(user_email), Some(username)) = (self.user_email, self.username) else {
            warn!(post_id = %self.post_id, user_id = %self.user_id, "post author is missing identity fields");
            return None;
        };

        let post_file_ids = match self.file_ids.as_deref() {
            None | Some("") => Vec::new(),
            Some(raw) => serde_json::from_str(raw).unwrap_or_else(|e| {
                warn!(post_id = %self.post_id, "Corrupt file_ids '{}': {}", raw, e);
                Vec::new()
            }),
        };

        Some(MessageExportRecord {
            post_id: self.post_id,
            channel_id: self.channel_id,
            channel_name,
            channel_display_name,
            channel_type,
            channel_create_at,
            channel_delete_at: self.channel_delete_at,
            team_name: self.team_name,
            user_id: self.user_id,
            user_email,
            username,
            is_bot: self.is_bot.unwrap_or(false),
            post_create_at: self.create_at,
            post_delete_at: self.delete_at,
            post_message: self.message,
            post_props: self.props,
            post_file_ids,
        })
    }
}

use std::collections::HashMap;

use archivist_types::{ChannelType, MessageExportRecord};

/// Requested reporting window, epoch seconds, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportWindow {
    pub start: i64,
    pub end: i64,
}

impl ExportWindow {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }
}

/// Per-channel aggregates gathered while folding posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMetadata {
    pub channel_id: String,
    pub channel_name: String,
    pub channel_display_name: String,
    pub channel_type: ChannelType,
    pub team_name: Option<String>,
    /// Later of the window start and the channel creation time.
    pub start_time: i64,
    /// Earlier of the window end and the channel deletion time, never before `start_time`.
    pub end_time: i64,
    pub messages_count: u64,
    pub attachments_count: u64,
}

impl ChannelMetadata {
    fn new(record: &MessageExportRecord, window: ExportWindow) -> Self {
        let mut channel = Self {
            channel_id: record.channel_id.clone(),
            channel_name: record.channel_name.clone(),
            channel_display_name: record.channel_display_name.clone(),
            channel_type: record.channel_type,
            team_name: record.team_name.clone(),
            start_time: window.start,
            end_time: window.end,
            messages_count: 0,
            attachments_count: 0,
        };
        channel.clamp(record);
        channel
    }

    fn clamp(&mut self, record: &MessageExportRecord) {
        self.start_time = self.start_time.max(record.channel_create_at);
        if let Some(deleted_at) = record.channel_delete_at.filter(|t| *t > 0) {
            self.end_time = self.end_time.min(deleted_at);
        }
        self.end_time = self.end_time.max(self.start_time);
    }

    /// `"<type> - <name> - <id>"`, the room identifier archivers key on.
    pub fn room_id(&self) -> String {
        format!(
            "{} - {} - {}",
            self.channel_type.display_name(),
            self.channel_name,
            self.channel_id
        )
    }
}

/// Channel aggregates plus job-wide totals.
///
/// Channels are kept in the order their first post was seen.
#[derive(Debug, Clone)]
pub struct ExportMetadata {
    window: ExportWindow,
    channels: HashMap<String, ChannelMetadata>,
    channel_order: Vec<String>,
    pub messages_count: u64,
    pub attachments_count: u64,
    /// Creation time of the first post folded in.
    pub start_time: Option<i64>,
    /// Creation time of the last post folded in.
    pub end_time: Option<i64>,
}

impl ExportMetadata {
    pub fn new(window: ExportWindow) -> Self {
        Self {
            window,
            channels: HashMap::new(),
            channel_order: Vec::new(),
            messages_count: 0,
            attachments_count: 0,
            start_time: None,
            end_time: None,
        }
    }

    /// Fold one post in. `attachments_count` is the number of attachments
    /// actually resolved for it, not the length of its file id list.
    pub fn update(&mut self, record: &MessageExportRecord, attachments_count: usize) {
        let window = self.window;
        if !self.channels.contains_key(&record.channel_id) {
            self.channel_order.push(record.channel_id.clone());
        }
        let channel = self
            .channels
            .entry(record.channel_id.clone())
            .and_modify(|channel| channel.clamp(record))
            .or_insert_with(|| ChannelMetadata::new(record, window));

        channel.messages_count += 1;
        channel.attachments_count += attachments_count as u64;
        self.messages_count += 1;
        self.attachments_count += attachments_count as u64;

        if self.start_time.is_none() {
            self.start_time = Some(record.post_create_at);
        }
        self.end_time = Some(record.post_create_at);
    }

    pub fn channel(&self, channel_id: &str) -> Option<&ChannelMetadata> {
        self.channels.get(channel_id)
    }

    /// Channels in first-seen order.
    pub fn channels(&self) -> impl Iterator<Item = &ChannelMetadata> {
        self.channel_order
            .iter()
            .filter_map(|id| self.channels.get(id))
    }

    pub fn channel_count(&self) -> usize {
        self.channel_order.len()
    }
}

use std::collections::HashMap;

use archivist_types::{AttachmentInfo, ChannelTranscript, MessageExportRecord, TranscriptEvent};
use tracing::{info, warn};

use crate::classify::classify;
use crate::error::ExportError;
use crate::membership::{ChannelMember, ChannelMembers};
use crate::metadata::{ExportMetadata, ExportWindow};
use crate::store::ExportStore;
use crate::transcript::build_channel_transcript;

/// Posts bucketed by channel, ready to be turned into transcripts.
#[derive(Debug)]
pub struct Assembly {
    pub metadata: ExportMetadata,
    pub members_by_channel: HashMap<String, ChannelMembers>,
    pub events_by_channel: HashMap<String, Vec<TranscriptEvent>>,
    /// Files to copy into the archive, across all channels.
    pub uploaded_files: Vec<AttachmentInfo>,
    pub skipped_records: u64,
}

impl Assembly {
    pub fn new(window: ExportWindow) -> Self {
        Self {
            metadata: ExportMetadata::new(window),
            members_by_channel: HashMap::new(),
            events_by_channel: HashMap::new(),
            uploaded_files: Vec::new(),
            skipped_records: 0,
        }
    }

    /// Classify one post and fold it into the channel buckets.
    pub fn fold(
        &mut self,
        record: &MessageExportRecord,
        store: &dyn ExportStore,
    ) -> Result<(), ExportError> {
        let classified = classify(record, store)?;

        self.events_by_channel
            .entry(record.channel_id.clone())
            .or_default()
            .extend(classified.events);

        self.metadata.update(record, classified.uploaded_files.len());
        self.uploaded_files.extend(classified.uploaded_files);

        self.members_by_channel
            .entry(record.channel_id.clone())
            .or_default()
            .insert(record.user_id.clone(), ChannelMember::from(record));

        Ok(())
    }

    /// One transcript per channel, in first-seen order.
    pub fn build_transcripts(
        &mut self,
        store: &dyn ExportStore,
    ) -> Result<Vec<ChannelTranscript>, ExportError> {
        let empty = ChannelMembers::new();
        let mut transcripts = Vec::with_capacity(self.metadata.channel_count());
        for channel in self.metadata.channels() {
            let members = self
                .members_by_channel
                .get(&channel.channel_id)
                .unwrap_or(&empty);
            let events = self
                .events_by_channel
                .remove(&channel.channel_id)
                .unwrap_or_default();
            transcripts.push(build_channel_transcript(channel, members, events, store)?);
        }
        Ok(transcripts)
    }
}

/// Fold every record in a single pass. Empty slots are logged and skipped.
pub fn assemble(
    records: &[Option<MessageExportRecord>],
    window: ExportWindow,
    store: &dyn ExportStore,
) -> Result<Assembly, ExportError> {
    let mut assembly = Assembly::new(window);
    for record in records {
        let Some(record) = record else {
            warn!("ignored a missing post record in the list");
            assembly.skipped_records += 1;
            continue;
        };
        assembly.fold(record, store)?;
    }

    info!(
        number_of_channels = assembly.metadata.channel_count(),
        "Exported data for channels"
    );
    Ok(assembly)
}

use archivist_types::{ChannelTranscript, TranscriptEvent};
use tracing::debug;

use crate::error::ExportError;
use crate::membership::{ChannelMembers, reconstruct};
use crate::metadata::ChannelMetadata;
use crate::store::ExportStore;

/// Assemble a channel's transcript: participants entered, the body in
/// encounter order, then participants left.
pub fn build_channel_transcript(
    channel: &ChannelMetadata,
    members: &ChannelMembers,
    events: Vec<TranscriptEvent>,
    store: &dyn ExportStore,
) -> Result<ChannelTranscript, ExportError> {
    let history = store
        .membership_history(channel.start_time, channel.end_time, &channel.channel_id)
        .map_err(|source| ExportError::MembershipLookup {
            channel_id: channel.channel_id.clone(),
            source,
        })?;

    let (joins, leaves) = reconstruct(channel.start_time, channel.end_time, &history, members);

    debug!(
        channel_id = %channel.channel_id,
        team = channel.team_name.as_deref().unwrap_or(""),
        messages = channel.messages_count,
        attachments = channel.attachments_count,
        history_rows = history.len(),
        joins = joins.len(),
        leaves = leaves.len(),
        "built channel transcript"
    );

    Ok(ChannelTranscript {
        perspective: channel.channel_display_name.clone(),
        channel_id: channel.channel_id.clone(),
        room_id: channel.room_id(),
        start_time: channel.start_time,
        joins,
        events,
        leaves,
        end_time: channel.end_time,
    })
}

//! Rebuilds join and leave events for a channel from membership history.
//!
//! History rows are authoritative intervals. Authors seen in the window but
//! absent from history are presumed present for the whole window. Every user
//! still inside the channel once all rows are accounted for gets a leave at
//! the window end, and leaves are sorted by `(timestamp, email)`.

use std::collections::{BTreeMap, HashSet};

use archivist_types::{MembershipHistoryRow, MessageExportRecord, Participant, UserType};
use tracing::warn;

/// Identity of a post author, captured from the record stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMember {
    pub user_id: String,
    pub email: String,
    pub username: String,
    pub is_bot: bool,
}

impl From<&MessageExportRecord> for ChannelMember {
    fn from(record: &MessageExportRecord) -> Self {
        Self {
            user_id: record.user_id.clone(),
            email: record.user_email.clone(),
            username: record.username.clone(),
            is_bot: record.is_bot,
        }
    }
}

/// Authors of one channel keyed by user id.
pub type ChannelMembers = BTreeMap<String, ChannelMember>;

/// A synthesized membership change, before it is folded.
#[derive(Debug, Clone, PartialEq, Eq)]
enum MembershipChange {
    Join { user_id: String, participant: Participant },
    Leave { user_id: String, participant: Participant },
}

/// Last join seen for a user who has not left since.
#[derive(Debug, Clone, Copy)]
struct OpenInterval<'a> {
    since: i64,
    email: &'a str,
    user_type: UserType,
}

/// Join and leave events for one channel over `[start, end]`.
///
/// Joins keep encounter order: history rows first, then authors without
/// history. Leaves are sorted by timestamp, then email.
pub fn reconstruct(
    start: i64,
    end: i64,
    history: &[MembershipHistoryRow],
    members: &ChannelMembers,
) -> (Vec<Participant>, Vec<Participant>) {
    let (joins, leaves) = synthesize(start, end, history, members);

    let still_joined = joins
        .iter()
        .chain(leaves.iter())
        .fold(BTreeMap::<&str, OpenInterval>::new(), |mut open, change| {
            match change {
                MembershipChange::Join { user_id, participant } => {
                    let newer = open
                        .get(user_id.as_str())
                        .is_none_or(|current| participant.timestamp > current.since);
                    if newer {
                        open.insert(
                            user_id.as_str(),
                            OpenInterval {
                                since: participant.timestamp,
                                email: participant.email.as_str(),
                                user_type: participant.user_type,
                            },
                        );
                    }
                }
                MembershipChange::Leave { user_id, participant } => {
                    let closes = open
                        .get(user_id.as_str())
                        .is_some_and(|current| participant.timestamp > current.since);
                    if closes {
                        open.remove(user_id.as_str());
                    }
                }
            }
            open
        });

    let mut leave_events: Vec<Participant> = leaves
        .iter()
        .filter_map(|change| match change {
            MembershipChange::Leave { participant, .. } => Some(participant.clone()),
            MembershipChange::Join { .. } => None,
        })
        .collect();
    leave_events.extend(
        still_joined
            .values()
            .map(|open| Participant::new(open.email, open.user_type, end)),
    );
    sort_leaves(&mut leave_events);

    let join_events = joins
        .into_iter()
        .filter_map(|change| match change {
            MembershipChange::Join { participant, .. } => Some(participant),
            MembershipChange::Leave { .. } => None,
        })
        .collect();

    (join_events, leave_events)
}

/// Order leaves by timestamp, breaking ties by email.
pub fn sort_leaves(leaves: &mut [Participant]) {
    leaves.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.email.cmp(&b.email))
    });
}

fn synthesize(
    start: i64,
    end: i64,
    history: &[MembershipHistoryRow],
    members: &ChannelMembers,
) -> (Vec<MembershipChange>, Vec<MembershipChange>) {
    let mut joins = Vec::new();
    let mut leaves = Vec::new();
    let mut with_history = HashSet::new();

    for row in history {
        if row.user_delete_at.is_some_and(|t| t > 0 && t < start) {
            continue;
        }
        if row.join_time > end || row.leave_time.is_some_and(|t| t < start) {
            continue;
        }
        with_history.insert(row.user_id.as_str());

        let member = members.get(&row.user_id);
        let email = row
            .user_email
            .clone()
            .or_else(|| member.map(|m| m.email.clone()))
            .unwrap_or_default();
        if email.is_empty() {
            let username = row
                .username
                .as_deref()
                .or(member.map(|m| m.username.as_str()))
                .unwrap_or("");
            warn!(user_id = %row.user_id, username, "membership row has no email");
        }
        let is_bot = row.is_bot.or(member.map(|m| m.is_bot)).unwrap_or(false);
        let user_type = UserType::from_bot_flag(is_bot);

        joins.push(MembershipChange::Join {
            user_id: row.user_id.clone(),
            participant: Participant::new(email.clone(), user_type, row.join_time.max(start)),
        });

        let left_at = match row.leave_time {
            Some(t) if t <= end => t,
            _ => end,
        };
        leaves.push(MembershipChange::Leave {
            user_id: row.user_id.clone(),
            participant: Participant::new(email, user_type, left_at),
        });
    }

    for member in members.values() {
        if with_history.contains(member.user_id.as_str()) {
            continue;
        }
        joins.push(MembershipChange::Join {
            user_id: member.user_id.clone(),
            participant: Participant::new(
                member.email.clone(),
                UserType::from_bot_flag(member.is_bot),
                start,
            ),
        });
    }

    (joins, leaves)
}

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Props key set when a post was deleted by a user (as opposed to retention).
pub const PROPS_DELETE_BY: &str = "deleteBy";

/// Props key holding the id of the post shown by a permalink preview.
pub const PROPS_PREVIEWED_POST: &str = "previewed_post";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    #[serde(rename = "O")]
    Open,
    #[serde(rename = "P")]
    Private,
    #[serde(rename = "D")]
    Direct,
    #[serde(rename = "G")]
    Group,
}

impl ChannelType {
    /// Parse the single-letter code stored in the channels table.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "O" => Some(Self::Open),
            "P" => Some(Self::Private),
            "D" => Some(Self::Direct),
            "G" => Some(Self::Group),
            _ => None,
        }
    }

    /// Label used when building room identifiers.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Open => "public",
            Self::Private => "private",
            Self::Direct => "direct",
            Self::Group => "group",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UserType {
    #[default]
    User,
    Bot,
}

impl UserType {
    pub fn from_bot_flag(is_bot: bool) -> Self {
        if is_bot { Self::Bot } else { Self::User }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Written as plain text so every serializer (JSON, XML) sees "user"/"bot".
impl Serialize for UserType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One post joined with its channel and author, as handed to the export engine.
///
/// All timestamps are epoch seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageExportRecord {
    pub post_id: String,
    pub channel_id: String,
    pub channel_name: String,
    pub channel_display_name: String,
    pub channel_type: ChannelType,
    pub channel_create_at: i64,
    pub channel_delete_at: Option<i64>,
    pub team_name: Option<String>,
    pub user_id: String,
    pub user_email: String,
    pub username: String,
    pub is_bot: bool,
    pub post_create_at: i64,
    pub post_delete_at: Option<i64>,
    pub post_message: String,
    pub post_props: Option<String>,
    #[serde(default)]
    pub post_file_ids: Vec<String>,
}

impl MessageExportRecord {
    pub fn user_type(&self) -> UserType {
        UserType::from_bot_flag(self.is_bot)
    }

    /// Deletion time, if the post carries a real one. Zero is treated as "not deleted".
    pub fn deleted_at(&self) -> Option<i64> {
        self.post_delete_at.filter(|t| *t > 0)
    }

    pub fn props(&self) -> PostProps {
        PostProps::parse(self.post_props.as_deref())
    }
}

/// Result of looking inside a post's free-form props blob.
#[derive(Debug, Clone, PartialEq)]
pub enum PostProps {
    /// The post has no props blob.
    Absent,
    /// The blob is not a JSON object.
    Unparseable,
    Parsed(Map<String, Value>),
}

/// Whether a props blob records who deleted the post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMarker {
    Marked,
    Unmarked,
    Unparseable,
}

impl PostProps {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => Self::Absent,
            Some(raw) => match serde_json::from_str::<Map<String, Value>>(raw) {
                Ok(map) => Self::Parsed(map),
                Err(_) => Self::Unparseable,
            },
        }
    }

    pub fn delete_marker(&self) -> DeleteMarker {
        match self {
            Self::Absent => DeleteMarker::Unmarked,
            Self::Unparseable => DeleteMarker::Unparseable,
            Self::Parsed(map) if map.contains_key(PROPS_DELETE_BY) => DeleteMarker::Marked,
            Self::Parsed(_) => DeleteMarker::Unmarked,
        }
    }

    /// Post id referenced by a permalink preview; empty when there is none.
    pub fn previewed_post(&self) -> String {
        match self {
            Self::Parsed(map) => map
                .get(PROPS_PREVIEWED_POST)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        }
    }
}

/// File attached to a post, including ones deleted since.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentInfo {
    pub id: String,
    pub post_id: String,
    pub name: String,
    /// Path relative to the attachment backend root; reused as-is inside the export.
    pub path: String,
    pub delete_at: Option<i64>,
}

impl AttachmentInfo {
    pub fn is_deleted(&self) -> bool {
        self.delete_at.is_some_and(|t| t > 0)
    }
}

/// One interval of a user's presence in a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipHistoryRow {
    pub channel_id: String,
    pub user_id: String,
    pub join_time: i64,
    /// `None` while the user is still a member.
    pub leave_time: Option<i64>,
    pub user_email: Option<String>,
    pub username: Option<String>,
    pub is_bot: Option<bool>,
    pub user_delete_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_marker_states() {
        assert_eq!(PostProps::parse(None).delete_marker(), DeleteMarker::Unmarked);
        assert_eq!(
            PostProps::parse(Some("not json")).delete_marker(),
            DeleteMarker::Unparseable
        );
        assert_eq!(
            PostProps::parse(Some("[1, 2]")).delete_marker(),
            DeleteMarker::Unparseable
        );
        assert_eq!(
            PostProps::parse(Some(r#"{"from_bot":"true"}"#)).delete_marker(),
            DeleteMarker::Unmarked
        );
        assert_eq!(
            PostProps::parse(Some(r#"{"deleteBy":"u1"}"#)).delete_marker(),
            DeleteMarker::Marked
        );
        // A null value still counts as the key being present.
        assert_eq!(
            PostProps::parse(Some(r#"{"deleteBy":null}"#)).delete_marker(),
            DeleteMarker::Marked
        );
    }

    #[test]
    fn test_previewed_post() {
        let props = PostProps::parse(Some(r#"{"previewed_post":"p123"}"#));
        assert_eq!(props.previewed_post(), "p123");
        assert_eq!(PostProps::parse(Some("{}")).previewed_post(), "");
        assert_eq!(PostProps::parse(Some("{")).previewed_post(), "");
        assert_eq!(PostProps::Absent.previewed_post(), "");
    }

    #[test]
    fn test_channel_type_codes() {
        for (code, ty) in [
            ("O", ChannelType::Open),
            ("P", ChannelType::Private),
            ("D", ChannelType::Direct),
            ("G", ChannelType::Group),
        ] {
            assert_eq!(ChannelType::from_code(code), Some(ty));
        }
        assert_eq!(ChannelType::from_code("X"), None);
        assert_eq!(ChannelType::Direct.display_name(), "direct");
    }

    #[test]
    fn test_user_type_serializes_as_label() {
        assert_eq!(serde_json::to_string(&UserType::Bot).unwrap(), "\"bot\"");
        assert_eq!(UserType::from_bot_flag(false).to_string(), "user");
    }
}

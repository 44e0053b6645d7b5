use crate::models::ExportRow;
use crate::Database;
use anyhow::Result;
use archivist_types::{AttachmentInfo, MembershipHistoryRow};
use rusqlite::Connection;

impl Database {
    // -- Posts --

    /// Posts created inside `[start, end]`, oldest first, with their channel and author.
    pub fn message_export_records(&self, start: i64, end: i64) -> Result<Vec<ExportRow>> {
        self.with_conn(|conn| query_export_rows(conn, start, end))
    }

    // -- Attachments --

    /// Every file attached to a post, deleted ones included.
    pub fn attachments_for_post(&self, post_id: &str) -> Result<Vec<AttachmentInfo>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, post_id, name, path, delete_at
                 FROM file_info
                 WHERE post_id = ?1
                 ORDER BY create_at, id",
            )?;

            let rows = stmt
                .query_map([post_id], |row| {
                    Ok(AttachmentInfo {
                        id: row.get(0)?,
                        post_id: row.get(1)?,
                        name: row.get(2)?,
                        path: row.get(3)?,
                        delete_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Membership history --

    /// History rows of a channel whose interval touches `[start, end]`.
    pub fn users_in_channel_during(
        &self,
        start: i64,
        end: i64,
        channel_id: &str,
    ) -> Result<Vec<MembershipHistoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT h.channel_id, h.user_id, h.join_time, h.leave_time,
                        u.email, u.username, u.is_bot, u.delete_at
                 FROM channel_member_history h
                 LEFT JOIN users u ON h.user_id = u.id
                 WHERE h.channel_id = ?3
                   AND h.join_time <= ?2
                   AND (h.leave_time IS NULL OR h.leave_time >= ?1)
                 ORDER BY h.join_time, h.user_id",
            )?;

            let rows = stmt
                .query_map(rusqlite::params![start, end, channel_id], |row| {
                    Ok(MembershipHistoryRow {
                        channel_id: row.get(0)?,
                        user_id: row.get(1)?,
                        join_time: row.get(2)?,
                        leave_time: row.get(3)?,
                        user_email: row.get(4)?,
                        username: row.get(5)?,
                        is_bot: row.get(6)?,
                        user_delete_at: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_export_rows(conn: &Connection, start: i64, end: i64) -> Result<Vec<ExportRow>> {
    // LEFT JOINs so posts with a dangling channel or author still surface and get skipped upstream
    let mut stmt = conn.prepare(
        "SELECT p.id, p.channel_id, p.user_id, p.message, p.props, p.file_ids, p.create_at, p.delete_at,
                c.name, c.display_name, c.type, c.team_name, c.create_at, c.delete_at,
                u.email, u.username, u.is_bot
         FROM posts p
         LEFT JOIN channels c ON p.channel_id = c.id
         LEFT JOIN users u ON p.user_id = u.id
         WHERE p.create_at >= ?1 AND p.create_at <= ?2
         ORDER BY p.create_at, p.id",
    )?;

    let rows = stmt
        .query_map(rusqlite::params![start, end], |row| {
            Ok(ExportRow {
                post_id: row.get(0)?,
                channel_id: row.get(1)?,
                user_id: row.get(2)?,
                message: row.get(3)?,
                props: row.get(4)?,
                file_ids: row.get(5)?,
                create_at: row.get(6)?,
                delete_at: row.get(7)?,
                channel_name: row.get(8)?,
                channel_display_name: row.get(9)?,
                channel_type: row.get(10)?,
                team_name: row.get(11)?,
                channel_create_at: row.get(12)?,
                channel_delete_at: row.get(13)?,
                user_email: row.get(14)?,
                username: row.get(15)?,
                is_bot: row.get(16)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

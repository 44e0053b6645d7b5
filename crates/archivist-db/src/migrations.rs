use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            email       TEXT,
            is_bot      INTEGER NOT NULL DEFAULT 0,
            delete_at   INTEGER
        );

        CREATE TABLE IF NOT EXISTS channels (
            id            TEXT PRIMARY KEY,
            name          TEXT NOT NULL,
            display_name  TEXT NOT NULL,
            type          TEXT NOT NULL,
            team_name     TEXT,
            create_at     INTEGER NOT NULL,
            delete_at     INTEGER
        );

        CREATE TABLE IF NOT EXISTS posts (
            id          TEXT PRIMARY KEY,
            channel_id  TEXT NOT NULL,
            user_id     TEXT NOT NULL,
            message     TEXT NOT NULL DEFAULT '',
            props       TEXT,
            file_ids    TEXT,
            create_at   INTEGER NOT NULL,
            delete_at   INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_posts_create_at
            ON posts(create_at, id);

        CREATE TABLE IF NOT EXISTS file_info (
            id          TEXT PRIMARY KEY,
            post_id     TEXT NOT NULL,
            name        TEXT NOT NULL,
            path        TEXT NOT NULL,
            create_at   INTEGER NOT NULL DEFAULT 0,
            delete_at   INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_file_info_post
            ON file_info(post_id);

        CREATE TABLE IF NOT EXISTS channel_member_history (
            channel_id  TEXT NOT NULL,
            user_id     TEXT NOT NULL,
            join_time   INTEGER NOT NULL,
            leave_time  INTEGER,
            PRIMARY KEY (channel_id, user_id, join_time)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

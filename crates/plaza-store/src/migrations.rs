use rusqlite::Connection;
use tracing::info;

use crate::StoreError;

pub fn run(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            path        TEXT PRIMARY KEY,
            body        TEXT NOT NULL,
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Single-row counter behind generated append keys
        CREATE TABLE IF NOT EXISTS key_sequence (
            id      INTEGER PRIMARY KEY CHECK (id = 0),
            value   INTEGER NOT NULL
        );

        INSERT OR IGNORE INTO key_sequence (id, value) VALUES (0, 0);
        ",
    )?;

    info!("Document store migrations complete");
    Ok(())
}

//! Durable record of every import and of the students each one touched.

use crate::model::{ProvenanceEntry, UploadKind, UploadRecord};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub fn now_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

pub fn insert_upload(
    conn: &Connection,
    filename: &str,
    kind: UploadKind,
    actor: &str,
    content_sha256: Option<&str>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO uploads(filename, upload_type, row_count, created_at, uploader_username, content_sha256)
         VALUES(?, ?, 0, ?, ?, ?)",
        params![filename, kind.as_str(), now_timestamp(), actor, content_sha256],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn bump_row_count(conn: &Connection, upload_id: i64, applied: i64) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE uploads SET row_count = row_count + ? WHERE id = ?",
        params![applied, upload_id],
    )?;
    Ok(())
}

pub fn record_provenance(
    conn: &Connection,
    upload_id: i64,
    roll_no: &str,
    created_new: bool,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO upload_students_map(upload_id, roll_no, created_new) VALUES(?, ?, ?)",
        params![upload_id, roll_no, created_new as i64],
    )?;
    Ok(())
}

fn upload_from_row(r: &Row<'_>) -> rusqlite::Result<UploadRecord> {
    Ok(UploadRecord {
        id: r.get(0)?,
        filename: r.get(1)?,
        kind: r.get(2)?,
        row_count: r.get(3)?,
        created_at: r.get(4)?,
        actor: r.get(5)?,
        content_sha256: r.get(6)?,
    })
}

const UPLOAD_COLUMNS: &str =
    "id, filename, upload_type, row_count, created_at, uploader_username, content_sha256";

pub fn get_upload(conn: &Connection, upload_id: i64) -> rusqlite::Result<Option<UploadRecord>> {
    conn.query_row(
        &format!("SELECT {UPLOAD_COLUMNS} FROM uploads WHERE id = ?"),
        [upload_id],
        upload_from_row,
    )
    .optional()
}

/// Most recent first.
pub fn list_uploads(conn: &Connection, limit: i64) -> rusqlite::Result<Vec<UploadRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {UPLOAD_COLUMNS} FROM uploads ORDER BY id DESC LIMIT ?"
    ))?;
    let rows = stmt
        .query_map([limit], upload_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn provenance_for_upload(
    conn: &Connection,
    upload_id: i64,
) -> rusqlite::Result<Vec<ProvenanceEntry>> {
    let mut stmt = conn.prepare(
        "SELECT upload_id, roll_no, created_new
         FROM upload_students_map
         WHERE upload_id = ?
         ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map([upload_id], |r| {
            Ok(ProvenanceEntry {
                upload_id: r.get(0)?,
                roll_no: r.get(1)?,
                created_new: r.get::<_, i64>(2)? != 0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

use crate::error::{PortalError, Result};
use crate::ledger::now_timestamp;
use crate::model::Remark;
use crate::store;
use rusqlite::{params, Connection};

pub fn add_remark(conn: &Connection, roll_no: &str, text: &str, author: &str) -> Result<Remark> {
    let text = text.trim();
    if text.is_empty() {
        return Err(PortalError::InvalidInput("remark cannot be empty".to_string()));
    }
    if store::get_student(conn, roll_no)?.is_none() {
        return Err(PortalError::NotFound(format!("student {roll_no}")));
    }
    let created_at = now_timestamp();
    conn.execute(
        "INSERT INTO remarks(roll_no, remark_text, author_username, created_at) VALUES(?, ?, ?, ?)",
        params![roll_no, text, author, created_at],
    )?;
    Ok(Remark {
        id: conn.last_insert_rowid(),
        roll_no: roll_no.to_string(),
        text: text.to_string(),
        author: author.to_string(),
        created_at,
    })
}

/// Newest first.
pub fn list_remarks(conn: &Connection, roll_no: &str) -> rusqlite::Result<Vec<Remark>> {
    let mut stmt = conn.prepare(
        "SELECT id, roll_no, remark_text, author_username, created_at
         FROM remarks
         WHERE roll_no = ?
         ORDER BY created_at DESC, id DESC",
    )?;
    let rows = stmt
        .query_map([roll_no], |r| {
            Ok(Remark {
                id: r.get(0)?,
                roll_no: r.get(1)?,
                text: r.get(2)?,
                author: r.get(3)?,
                created_at: r.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

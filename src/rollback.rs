use crate::error::Result;
use crate::ledger;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackSummary {
    pub upload_id: i64,
    pub attendance_removed: usize,
    pub marks_removed: usize,
    pub students_removed: usize,
}

/// Undoes an upload's effects. Returns `None` when the upload id is unknown.
///
/// Attendance and mark rows last written by the upload are deleted. Students
/// the upload created are deleted (cascading to their remaining rows);
/// students that existed beforehand keep their current field values.
pub fn rollback_upload(conn: &Connection, upload_id: i64) -> Result<Option<RollbackSummary>> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    if ledger::get_upload(&tx, upload_id)?.is_none() {
        return Ok(None);
    }

    let attendance_removed = tx.execute(
        "DELETE FROM attendance WHERE source_upload_id = ?",
        [upload_id],
    )?;
    let marks_removed = tx.execute("DELETE FROM marks WHERE source_upload_id = ?", [upload_id])?;

    let students_removed = tx.execute(
        "DELETE FROM students WHERE roll_no IN (
             SELECT roll_no FROM upload_students_map
             WHERE upload_id = ? AND created_new = 1
         )",
        [upload_id],
    )?;

    tx.execute(
        "DELETE FROM upload_students_map WHERE upload_id = ?",
        [upload_id],
    )?;
    tx.execute("DELETE FROM uploads WHERE id = ?", [upload_id])?;
    tx.commit()?;

    let summary = RollbackSummary {
        upload_id,
        attendance_removed,
        marks_removed,
        students_removed,
    };
    tracing::info!(
        upload_id,
        attendance_removed,
        marks_removed,
        students_removed,
        "rolled back upload"
    );
    Ok(Some(summary))
}

//! Import pipeline: load, normalize, coerce, merge, and record provenance.
//!
//! Header validation runs before any write. All row application for one file
//! happens inside a single immediate transaction, so a failed import leaves
//! no upload record and no partial rows behind.

use crate::coerce;
use crate::columns;
use crate::error::Result;
use crate::ledger;
use crate::model::UploadKind;
use crate::store;
use crate::table::{self, RawRow, SourceFormat};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const UPLOADS_DIR: &str = "uploads";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub upload_id: i64,
    pub kind: UploadKind,
    pub filename: String,
    pub rows_applied: i64,
    pub rows_skipped: i64,
    pub students_created: i64,
}

#[derive(Debug, Default)]
struct ApplyOutcome {
    applied: i64,
    skipped: i64,
    created: i64,
}

/// Imports the file at `source_path`, keeping a copy under the workspace
/// uploads directory. The copy is removed again if the import fails.
pub fn import_file(
    conn: &Connection,
    workspace: &Path,
    kind: UploadKind,
    source_path: &Path,
    actor: &str,
) -> Result<ImportSummary> {
    let original = source_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    SourceFormat::from_filename(&original)?;

    let bytes = std::fs::read(source_path)?;
    let (stored_path, stored_name) = store_upload_copy(&workspace.join(UPLOADS_DIR), &original, &bytes)?;

    match import_bytes(conn, kind, &original, &stored_name, &bytes, actor) {
        Ok(summary) => Ok(summary),
        Err(e) => {
            let _ = std::fs::remove_file(&stored_path);
            Err(e)
        }
    }
}

/// Runs the pipeline over in-memory file content. `source_name` selects the
/// parser by extension; `stored_name` is what the upload ledger records.
pub fn import_bytes(
    conn: &Connection,
    kind: UploadKind,
    source_name: &str,
    stored_name: &str,
    bytes: &[u8],
    actor: &str,
) -> Result<ImportSummary> {
    let table = columns::normalize_columns(table::load_table(source_name, bytes)?);
    coerce::check_required_columns(kind, &table.headers)?;
    let digest = sha256_hex(bytes);

    tracing::info!(%kind, file = source_name, rows = table.rows.len(), "import started");

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let upload_id = ledger::insert_upload(&tx, stored_name, kind, actor, Some(&digest))?;
    let outcome = match kind {
        UploadKind::Students => apply_students(&tx, upload_id, &table.rows)?,
        UploadKind::Attendance => apply_attendance(&tx, upload_id, &table.rows)?,
        UploadKind::Marks => apply_marks(&tx, upload_id, &table.rows)?,
    };
    ledger::bump_row_count(&tx, upload_id, outcome.applied)?;
    tx.commit()?;

    tracing::info!(
        %kind,
        upload_id,
        applied = outcome.applied,
        skipped = outcome.skipped,
        created = outcome.created,
        "import finished"
    );
    Ok(ImportSummary {
        upload_id,
        kind,
        filename: stored_name.to_string(),
        rows_applied: outcome.applied,
        rows_skipped: outcome.skipped,
        students_created: outcome.created,
    })
}

fn apply_students(conn: &Connection, upload_id: i64, rows: &[RawRow]) -> Result<ApplyOutcome> {
    let mut out = ApplyOutcome::default();
    for row in rows {
        let Some(student) = coerce::student_from_row(row) else {
            out.skipped += 1;
            continue;
        };
        let created = store::upsert_student(conn, &student)?;
        ledger::record_provenance(conn, upload_id, &student.roll_no, created)?;
        if created {
            out.created += 1;
        }
        out.applied += 1;
    }
    Ok(out)
}

fn apply_attendance(conn: &Connection, upload_id: i64, rows: &[RawRow]) -> Result<ApplyOutcome> {
    let mut out = ApplyOutcome::default();
    for row in rows {
        let Some(record) = coerce::attendance_from_row(row) else {
            out.skipped += 1;
            continue;
        };
        store::upsert_attendance(conn, &record, upload_id)?;
        out.applied += 1;
    }
    Ok(out)
}

fn apply_marks(conn: &Connection, upload_id: i64, rows: &[RawRow]) -> Result<ApplyOutcome> {
    let mut out = ApplyOutcome::default();
    for row in rows {
        let Some(record) = coerce::mark_from_row(row) else {
            out.skipped += 1;
            continue;
        };
        store::upsert_mark(conn, &record, upload_id)?;
        out.applied += 1;
    }
    Ok(out)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Keeps ASCII alphanumerics and `.-_`, turns whitespace runs into `_`,
/// drops everything else and any leading dots.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let joined = base.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let trimmed = kept.trim_start_matches('.').to_string();
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed
    }
}

fn store_upload_copy(dir: &Path, original: &str, bytes: &[u8]) -> Result<(PathBuf, String)> {
    store_upload_copy_at(dir, original, bytes, chrono::Utc::now().timestamp_millis())
}

/// Writes `<stamp>_<name>`, or `<stamp>_<n>_<name>` when that name is taken.
/// Existing copies are never overwritten.
fn store_upload_copy_at(
    dir: &Path,
    original: &str,
    bytes: &[u8],
    stamp: i64,
) -> Result<(PathBuf, String)> {
    std::fs::create_dir_all(dir)?;
    let base = sanitize_filename(original);
    let mut attempt = 0u32;
    loop {
        let stored_name = if attempt == 0 {
            format!("{stamp}_{base}")
        } else {
            format!("{stamp}_{attempt}_{base}")
        };
        let path = dir.join(&stored_name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                if let Err(e) = file.write_all(bytes) {
                    drop(file);
                    let _ = std::fs::remove_file(&path);
                    return Err(e.into());
                }
                return Ok((path, stored_name));
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_millisecond_copies_do_not_collide() {
        let dir = std::env::temp_dir().join(format!("portald-ingest-{}", uuid::Uuid::new_v4()));
        let (first_path, first) =
            store_upload_copy_at(&dir, "marks.csv", b"first", 1_700_000_000_000).expect("first");
        let (second_path, second) =
            store_upload_copy_at(&dir, "marks.csv", b"second", 1_700_000_000_000).expect("second");

        assert_eq!(first, "1700000000000_marks.csv");
        assert_eq!(second, "1700000000000_1_marks.csv");
        assert_ne!(first_path, second_path);

        std::fs::remove_file(&second_path).expect("remove second");
        assert_eq!(std::fs::read(&first_path).expect("first kept"), b"first");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename("Sem 3 marks (final).xlsx"), "Sem_3_marks_final.xlsx");
        assert_eq!(sanitize_filename("../../etc/passwd.csv"), "passwd.csv");
        assert_eq!(sanitize_filename("..hidden.csv"), "hidden.csv");
        assert_eq!(sanitize_filename("???"), "upload");
    }

    #[test]
    fn digest_is_lowercase_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}

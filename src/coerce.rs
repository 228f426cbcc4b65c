//! Conversion of normalized raw rows into typed records.
//!
//! Rows lacking their identifying values are skipped (`None`). Malformed
//! numerics never reject a row: nullable fields become `None` and counters
//! become zero.

use crate::error::{PortalError, Result};
use crate::model::{AttendanceRecord, MarkRecord, StudentRecord, UploadKind};
use crate::table::{RawRow, RawValue};

pub const STUDENT_COLUMNS: &[&str] = &[
    "roll_no",
    "name",
    "email",
    "phone",
    "father_name",
    "father_phone",
    "semester",
];
pub const ATTENDANCE_COLUMNS: &[&str] = &["roll_no", "subject", "attended", "total", "semester"];
pub const MARK_COLUMNS: &[&str] = &[
    "roll_no",
    "exam",
    "subject",
    "max_marks",
    "marks_obtained",
    "credits",
    "semester",
];

/// Columns a file of the given kind must carry.
pub fn required_columns(kind: UploadKind) -> &'static [&'static str] {
    match kind {
        UploadKind::Students => STUDENT_COLUMNS,
        UploadKind::Attendance => &ATTENDANCE_COLUMNS[..4],
        UploadKind::Marks => &MARK_COLUMNS[..5],
    }
}

/// Every column a file of the given kind understands, required ones first.
pub fn template_columns(kind: UploadKind) -> &'static [&'static str] {
    match kind {
        UploadKind::Students => STUDENT_COLUMNS,
        UploadKind::Attendance => ATTENDANCE_COLUMNS,
        UploadKind::Marks => MARK_COLUMNS,
    }
}

pub fn check_required_columns(kind: UploadKind, headers: &[String]) -> Result<()> {
    for col in required_columns(kind) {
        if !headers.iter().any(|h| h == col) {
            return Err(PortalError::MissingColumn {
                kind: kind.to_string(),
                column: col.to_string(),
            });
        }
    }
    Ok(())
}

/// Float-tolerant integer parse: "3", "3.0" and 3.7 all truncate toward zero.
pub fn parse_int_lenient(value: &RawValue) -> Option<i64> {
    let f = match value {
        RawValue::Empty => return None,
        RawValue::Number(n) => *n,
        RawValue::Text(s) => {
            let t = s.trim();
            if t.is_empty() || t.eq_ignore_ascii_case("nan") {
                return None;
            }
            t.parse::<f64>().ok()?
        }
    };
    if f.is_finite() {
        Some(f.trunc() as i64)
    } else {
        None
    }
}

fn text(row: &RawRow, key: &str) -> String {
    row.get(key).map(RawValue::as_text).unwrap_or_default()
}

fn optional_text(row: &RawRow, key: &str) -> Option<String> {
    Some(text(row, key)).filter(|s| !s.is_empty())
}

fn optional_int(row: &RawRow, key: &str) -> Option<i64> {
    row.get(key).and_then(parse_int_lenient)
}

fn count(row: &RawRow, key: &str) -> i64 {
    optional_int(row, key).unwrap_or(0)
}

/// Attendance counts are never negative; a negative value coerces to 0.
fn tally(row: &RawRow, key: &str) -> i64 {
    optional_int(row, key).filter(|n| *n >= 0).unwrap_or(0)
}

pub fn student_from_row(row: &RawRow) -> Option<StudentRecord> {
    let roll_no = optional_text(row, "roll_no")?;
    Some(StudentRecord {
        roll_no,
        name: text(row, "name"),
        email: optional_text(row, "email"),
        phone: optional_text(row, "phone"),
        father_name: optional_text(row, "father_name"),
        father_phone: optional_text(row, "father_phone"),
        semester: optional_int(row, "semester"),
    })
}

pub fn attendance_from_row(row: &RawRow) -> Option<AttendanceRecord> {
    let roll_no = optional_text(row, "roll_no")?;
    let subject = optional_text(row, "subject")?;
    Some(AttendanceRecord {
        roll_no,
        subject,
        attended: tally(row, "attended"),
        total: tally(row, "total"),
        semester: optional_int(row, "semester"),
    })
}

pub fn mark_from_row(row: &RawRow) -> Option<MarkRecord> {
    let roll_no = optional_text(row, "roll_no")?;
    let exam = optional_text(row, "exam")?;
    let subject = optional_text(row, "subject")?;
    Some(MarkRecord {
        roll_no,
        exam,
        subject,
        max_marks: count(row, "max_marks"),
        marks_obtained: count(row, "marks_obtained"),
        credits: optional_int(row, "credits"),
        semester: optional_int(row, "semester"),
    })
}

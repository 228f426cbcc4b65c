//! Keyed merge of typed records into the relational store.
//!
//! Each upsert reads the existing row first and then either inserts or
//! updates, so the per-field merge rules are explicit:
//! - students: full replace of every attribute (last write wins);
//! - attendance: attended/total/source always overwritten, semester kept when
//!   the incoming row has none;
//! - marks: max/obtained/source always overwritten, credits and semester kept
//!   when the incoming row has none.

use crate::model::{AttendanceRecord, MarkRecord, StudentRecord};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

/// Returns `true` when the roll number had no row before this call.
pub fn upsert_student(conn: &Connection, s: &StudentRecord) -> rusqlite::Result<bool> {
    let existed = conn
        .query_row(
            "SELECT 1 FROM students WHERE roll_no = ?",
            [&s.roll_no],
            |r| r.get::<_, i64>(0),
        )
        .optional()?
        .is_some();

    if existed {
        conn.execute(
            "UPDATE students
             SET name = ?, email = ?, phone = ?, father_name = ?, father_phone = ?, semester = ?
             WHERE roll_no = ?",
            params![
                s.name,
                s.email,
                s.phone,
                s.father_name,
                s.father_phone,
                s.semester,
                s.roll_no
            ],
        )?;
    } else {
        conn.execute(
            "INSERT INTO students(roll_no, name, email, phone, father_name, father_phone, semester)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            params![
                s.roll_no,
                s.name,
                s.email,
                s.phone,
                s.father_name,
                s.father_phone,
                s.semester
            ],
        )?;
    }
    Ok(!existed)
}

pub fn upsert_attendance(
    conn: &Connection,
    a: &AttendanceRecord,
    upload_id: i64,
) -> rusqlite::Result<()> {
    let existing: Option<(i64, Option<i64>)> = conn
        .query_row(
            "SELECT id, semester FROM attendance WHERE roll_no = ? AND subject = ?",
            params![a.roll_no, a.subject],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;

    match existing {
        Some((id, prev_semester)) => {
            conn.execute(
                "UPDATE attendance
                 SET attended = ?, total = ?, semester = ?, source_upload_id = ?
                 WHERE id = ?",
                params![a.attended, a.total, a.semester.or(prev_semester), upload_id, id],
            )?;
        }
        None => {
            conn.execute(
                "INSERT INTO attendance(roll_no, subject, attended, total, semester, source_upload_id)
                 VALUES(?, ?, ?, ?, ?, ?)",
                params![a.roll_no, a.subject, a.attended, a.total, a.semester, upload_id],
            )?;
        }
    }
    Ok(())
}

pub fn upsert_mark(conn: &Connection, m: &MarkRecord, upload_id: i64) -> rusqlite::Result<()> {
    let existing: Option<(i64, Option<i64>, Option<i64>)> = conn
        .query_row(
            "SELECT id, credits, semester FROM marks
             WHERE roll_no = ? AND exam = ? AND subject = ?",
            params![m.roll_no, m.exam, m.subject],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;

    match existing {
        Some((id, prev_credits, prev_semester)) => {
            conn.execute(
                "UPDATE marks
                 SET max_marks = ?, marks_obtained = ?, credits = ?, semester = ?, source_upload_id = ?
                 WHERE id = ?",
                params![
                    m.max_marks,
                    m.marks_obtained,
                    m.credits.or(prev_credits),
                    m.semester.or(prev_semester),
                    upload_id,
                    id
                ],
            )?;
        }
        None => {
            conn.execute(
                "INSERT INTO marks(roll_no, exam, subject, max_marks, marks_obtained, credits, semester, source_upload_id)
                 VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    m.roll_no,
                    m.exam,
                    m.subject,
                    m.max_marks,
                    m.marks_obtained,
                    m.credits,
                    m.semester,
                    upload_id
                ],
            )?;
        }
    }
    Ok(())
}

pub fn get_student(conn: &Connection, roll_no: &str) -> rusqlite::Result<Option<StudentRecord>> {
    conn.query_row(
        "SELECT roll_no, name, email, phone, father_name, father_phone, semester
         FROM students WHERE roll_no = ?",
        [roll_no],
        |r| {
            Ok(StudentRecord {
                roll_no: r.get(0)?,
                name: r.get(1)?,
                email: r.get(2)?,
                phone: r.get(3)?,
                father_name: r.get(4)?,
                father_phone: r.get(5)?,
                semester: r.get(6)?,
            })
        },
    )
    .optional()
}

#[derive(Debug, Clone, Serialize)]
pub struct Counts {
    pub students: i64,
    pub attendance: i64,
    pub marks: i64,
}

pub fn counts(conn: &Connection) -> rusqlite::Result<Counts> {
    conn.query_row(
        "SELECT
           (SELECT COUNT(*) FROM students),
           (SELECT COUNT(*) FROM attendance),
           (SELECT COUNT(*) FROM marks)",
        [],
        |r| {
            Ok(Counts {
                students: r.get(0)?,
                attendance: r.get(1)?,
                marks: r.get(2)?,
            })
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ledger::insert_upload;
    use crate::model::UploadKind;

    fn open() -> (std::path::PathBuf, Connection) {
        let dir = std::env::temp_dir().join(format!("portald-store-{}", uuid::Uuid::new_v4()));
        let conn = crate::db::open_db(&dir, &Config::default()).expect("open db");
        (dir, conn)
    }

    fn student(roll: &str, name: &str, email: Option<&str>) -> StudentRecord {
        StudentRecord {
            roll_no: roll.to_string(),
            name: name.to_string(),
            email: email.map(str::to_string),
            phone: None,
            father_name: None,
            father_phone: None,
            semester: Some(2),
        }
    }

    #[test]
    fn student_upsert_replaces_every_field() {
        let (dir, conn) = open();
        assert!(upsert_student(&conn, &student("R1", "Alice", Some("a@x.org"))).expect("insert"));
        let mut second = student("R1", "Alice B", None);
        second.semester = None;
        assert!(!upsert_student(&conn, &second).expect("update"));

        let stored = get_student(&conn, "R1").expect("query").expect("row");
        assert_eq!(stored, second);
        drop(conn);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn mark_upsert_preserves_absent_credits_and_semester() {
        let (dir, conn) = open();
        upsert_student(&conn, &student("R1", "Alice", None)).expect("student");
        let mut m = MarkRecord {
            roll_no: "R1".into(),
            exam: "Final".into(),
            subject: "Math".into(),
            max_marks: 100,
            marks_obtained: 70,
            credits: Some(4),
            semester: Some(1),
        };
        let first = insert_upload(&conn, "a.csv", UploadKind::Marks, "t", None).expect("upload");
        let second = insert_upload(&conn, "b.csv", UploadKind::Marks, "t", None).expect("upload");
        upsert_mark(&conn, &m, first).expect("insert mark");
        m.marks_obtained = 95;
        m.credits = None;
        m.semester = None;
        upsert_mark(&conn, &m, second).expect("update mark");

        let (obtained, credits, semester, source): (i64, Option<i64>, Option<i64>, i64) = conn
            .query_row(
                "SELECT marks_obtained, credits, semester, source_upload_id FROM marks",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .expect("mark row");
        assert_eq!(obtained, 95);
        assert_eq!(credits, Some(4));
        assert_eq!(semester, Some(1));
        assert_eq!(source, second);
        drop(conn);
        let _ = std::fs::remove_dir_all(dir);
    }
}

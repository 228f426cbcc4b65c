use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;

pub const MISSING_CELL: &str = "\u{2014}";

/// Wide-format view: `headers` gives column order, each row maps header to cell.
/// The label column (`Exam` or `Row`) shares the key space with the data
/// columns, so a subject literally named like the label replaces the label cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Grid {
    pub headers: Vec<String>,
    pub rows: Vec<BTreeMap<String, String>>,
}

pub fn letter_grade(pct: f64) -> &'static str {
    if pct >= 85.0 {
        "A+"
    } else if pct >= 75.0 {
        "A"
    } else if pct >= 65.0 {
        "B+"
    } else if pct >= 55.0 {
        "B"
    } else if pct >= 45.0 {
        "C"
    } else if pct >= 35.0 {
        "D"
    } else {
        "F"
    }
}

/// `100 * part / whole`, or 0 when `whole` is 0.
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

#[derive(Debug, Clone)]
pub struct MarkCell {
    pub exam: String,
    pub subject: String,
    pub max_marks: i64,
    pub marks_obtained: i64,
}

#[derive(Debug, Clone)]
pub struct AttendanceCell {
    pub subject: String,
    pub attended: i64,
    pub total: i64,
}

/// Exam rows by subject columns. `cells` must be ordered by exam then subject.
pub fn build_marks_grid(cells: &[MarkCell]) -> Grid {
    if cells.is_empty() {
        return Grid::default();
    }
    let mut subjects: Vec<&str> = cells.iter().map(|c| c.subject.as_str()).collect();
    subjects.sort();
    subjects.dedup();

    let mut exams: Vec<&str> = Vec::new();
    for c in cells {
        if !exams.contains(&c.exam.as_str()) {
            exams.push(&c.exam);
        }
    }

    let rows = exams
        .iter()
        .map(|exam| {
            let mut row = BTreeMap::new();
            row.insert("Exam".to_string(), exam.to_string());
            for subject in &subjects {
                let cell = cells
                    .iter()
                    .find(|c| c.exam == *exam && c.subject == *subject)
                    .map(|c| {
                        let pct = percentage(c.marks_obtained, c.max_marks);
                        format!(
                            "{} ({}/{})",
                            letter_grade(pct),
                            c.marks_obtained,
                            c.max_marks
                        )
                    })
                    .unwrap_or_else(|| MISSING_CELL.to_string());
                row.insert(subject.to_string(), cell);
            }
            row
        })
        .collect();

    let mut headers = vec!["Exam".to_string()];
    headers.extend(subjects.iter().map(|s| s.to_string()));
    Grid { headers, rows }
}

/// A single "Attendance" row with one column per subject.
pub fn build_attendance_grid(cells: &[AttendanceCell]) -> Grid {
    if cells.is_empty() {
        return Grid::default();
    }
    let mut row = BTreeMap::new();
    row.insert("Row".to_string(), "Attendance".to_string());
    let mut headers = vec!["Row".to_string()];
    for c in cells {
        let pct = percentage(c.attended, c.total);
        row.insert(
            c.subject.clone(),
            format!("{}/{} ({:.0}%)", c.attended, c.total, pct),
        );
        headers.push(c.subject.clone());
    }
    Grid {
        headers,
        rows: vec![row],
    }
}

pub fn marks_grid(conn: &Connection, roll_no: &str) -> rusqlite::Result<Grid> {
    let mut stmt = conn.prepare(
        "SELECT exam, subject, max_marks, marks_obtained
         FROM marks
         WHERE roll_no = ?
         ORDER BY exam, subject",
    )?;
    let cells = stmt
        .query_map([roll_no], |r| {
            Ok(MarkCell {
                exam: r.get(0)?,
                subject: r.get(1)?,
                max_marks: r.get(2)?,
                marks_obtained: r.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(build_marks_grid(&cells))
}

pub fn attendance_grid(conn: &Connection, roll_no: &str) -> rusqlite::Result<Grid> {
    let mut stmt = conn.prepare(
        "SELECT subject, attended, total
         FROM attendance
         WHERE roll_no = ?
         ORDER BY subject",
    )?;
    let cells = stmt
        .query_map([roll_no], |r| {
            Ok(AttendanceCell {
                subject: r.get(0)?,
                attended: r.get(1)?,
                total: r.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(build_attendance_grid(&cells))
}

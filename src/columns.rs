use crate::table::{RawRow, RawTable};

/// Source header spellings accepted for each canonical field, applied in order.
const ALIASES: &[(&str, &str)] = &[
    ("roll", "roll_no"),
    ("roll no", "roll_no"),
    ("roll no.", "roll_no"),
    ("rollno", "roll_no"),
    ("rollnumber", "roll_no"),
    ("roll_no.", "roll_no"),
    ("student name", "name"),
    ("student", "name"),
    ("name of student", "name"),
    ("student email", "email"),
    ("mail", "email"),
    ("e-mail", "email"),
    ("student phone number", "phone"),
    ("phone number", "phone"),
    ("mobile", "phone"),
    ("student phone", "phone"),
    ("contact", "phone"),
    ("father name", "father_name"),
    ("father's name", "father_name"),
    ("guardian name", "father_name"),
    ("father phone number", "father_phone"),
    ("father mobile", "father_phone"),
    ("guardian phone", "father_phone"),
    ("sem", "semester"),
    ("sub", "subject"),
    ("subject name", "subject"),
    ("max", "max_marks"),
    ("maxmarks", "max_marks"),
    ("marks", "marks_obtained"),
    ("obtained", "marks_obtained"),
];

fn clean_header(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Maps cleaned headers to canonical names. An alias is only applied when its
/// canonical name is not already present, so an explicit canonical column wins.
pub fn canonical_headers(raw: &[String]) -> Vec<String> {
    let mut cols: Vec<String> = raw.iter().map(|h| clean_header(h)).collect();
    for (alias, canonical) in ALIASES {
        if cols.iter().any(|c| c == canonical) {
            continue;
        }
        if let Some(pos) = cols.iter().position(|c| c == alias) {
            cols[pos] = canonical.to_string();
        }
    }
    cols
}

/// Re-keys every row of the table by canonical column name.
pub fn normalize_columns(table: RawTable) -> RawTable {
    let renamed = canonical_headers(&table.headers);
    let rows: Vec<RawRow> = table
        .rows
        .into_iter()
        .map(|mut row| {
            table
                .headers
                .iter()
                .zip(renamed.iter())
                .filter_map(|(old, new)| row.remove(old).map(|v| (new.clone(), v)))
                .collect::<RawRow>()
        })
        .collect();
    RawTable {
        headers: renamed,
        rows,
    }
}

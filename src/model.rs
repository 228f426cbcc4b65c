use crate::error::PortalError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadKind {
    Students,
    Attendance,
    Marks,
}

impl UploadKind {
    pub const ALL: [UploadKind; 3] = [
        UploadKind::Students,
        UploadKind::Attendance,
        UploadKind::Marks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::Students => "Students",
            UploadKind::Attendance => "Attendance",
            UploadKind::Marks => "Marks",
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadKind {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "students" => Ok(UploadKind::Students),
            "attendance" => Ok(UploadKind::Attendance),
            "marks" => Ok(UploadKind::Marks),
            _ => Err(PortalError::UnknownKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub roll_no: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub father_name: Option<String>,
    pub father_phone: Option<String>,
    pub semester: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub roll_no: String,
    pub subject: String,
    pub attended: i64,
    pub total: i64,
    pub semester: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRecord {
    pub roll_no: String,
    pub exam: String,
    pub subject: String,
    pub max_marks: i64,
    pub marks_obtained: i64,
    pub credits: Option<i64>,
    pub semester: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub id: i64,
    pub filename: String,
    pub kind: String,
    pub row_count: i64,
    pub created_at: String,
    pub actor: String,
    pub content_sha256: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceEntry {
    pub upload_id: i64,
    pub roll_no: String,
    pub created_new: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Remark {
    pub id: i64,
    pub roll_no: String,
    pub text: String,
    pub author: String,
    pub created_at: String,
}

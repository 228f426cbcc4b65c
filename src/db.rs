use crate::config::Config;
use anyhow::Context;
use rusqlite::Connection;
use std::path::Path;

pub const DB_FILE_NAME: &str = "portal.sqlite3";

struct Migration {
    version: i64,
    name: &'static str,
    apply: fn(&Connection) -> anyhow::Result<()>,
}

// Ordered, additive only. Each step must tolerate a database that already has
// its objects (workspaces created before versioning was recorded).
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "core_tables",
        apply: create_core_tables,
    },
    Migration {
        version: 2,
        name: "student_contact_columns",
        apply: add_student_contact_columns,
    },
    Migration {
        version: 3,
        name: "record_source_upload",
        apply: add_record_source_upload,
    },
    Migration {
        version: 4,
        name: "upload_digest_and_indexes",
        apply: add_upload_digest_and_indexes,
    },
];

pub fn open_db(workspace: &Path, cfg: &Config) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)
        .with_context(|| format!("failed to create workspace {}", workspace.display()))?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    configure(&conn, cfg)?;
    migrate(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection, cfg: &Config) -> anyhow::Result<()> {
    conn.busy_timeout(cfg.busy_timeout)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    tracing::debug!(journal_mode = %mode, "database configured");
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

pub fn schema_version(conn: &Connection) -> anyhow::Result<i64> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

fn migrate(conn: &Connection) -> anyhow::Result<()> {
    let current = schema_version(conn)?;
    for m in MIGRATIONS.iter().filter(|m| m.version > current) {
        let tx = conn.unchecked_transaction()?;
        (m.apply)(&tx).with_context(|| format!("migration {} ({}) failed", m.version, m.name))?;
        tx.pragma_update(None, "user_version", m.version)?;
        tx.commit()?;
        tracing::info!(version = m.version, name = m.name, "applied schema migration");
    }
    Ok(())
}

fn create_core_tables(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS uploads(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filename TEXT NOT NULL,
            upload_type TEXT NOT NULL,
            row_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            uploader_username TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            roll_no TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT,
            semester INTEGER
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS upload_students_map(
            upload_id INTEGER NOT NULL,
            roll_no TEXT NOT NULL,
            created_new INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY(upload_id) REFERENCES uploads(id) ON DELETE CASCADE,
            FOREIGN KEY(roll_no) REFERENCES students(roll_no) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            roll_no TEXT NOT NULL,
            subject TEXT NOT NULL,
            attended INTEGER NOT NULL DEFAULT 0,
            total INTEGER NOT NULL DEFAULT 0,
            semester INTEGER,
            UNIQUE(roll_no, subject),
            FOREIGN KEY(roll_no) REFERENCES students(roll_no) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS marks(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            roll_no TEXT NOT NULL,
            exam TEXT NOT NULL,
            subject TEXT NOT NULL,
            max_marks INTEGER NOT NULL,
            marks_obtained INTEGER NOT NULL,
            credits INTEGER,
            semester INTEGER,
            UNIQUE(roll_no, exam, subject),
            FOREIGN KEY(roll_no) REFERENCES students(roll_no) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS remarks(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            roll_no TEXT NOT NULL,
            remark_text TEXT NOT NULL,
            author_username TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(roll_no) REFERENCES students(roll_no) ON DELETE CASCADE
        )",
        [],
    )?;
    Ok(())
}

fn add_student_contact_columns(conn: &Connection) -> anyhow::Result<()> {
    for column in ["phone", "father_name", "father_phone"] {
        if !table_has_column(conn, "students", column)? {
            conn.execute(&format!("ALTER TABLE students ADD COLUMN {} TEXT", column), [])?;
        }
    }
    Ok(())
}

fn add_record_source_upload(conn: &Connection) -> anyhow::Result<()> {
    for table in ["attendance", "marks"] {
        if !table_has_column(conn, table, "source_upload_id")? {
            conn.execute(
                &format!(
                    "ALTER TABLE {} ADD COLUMN source_upload_id INTEGER
                     REFERENCES uploads(id) ON DELETE SET NULL",
                    table
                ),
                [],
            )?;
        }
    }
    Ok(())
}

fn add_upload_digest_and_indexes(conn: &Connection) -> anyhow::Result<()> {
    if !table_has_column(conn, "uploads", "content_sha256")? {
        conn.execute("ALTER TABLE uploads ADD COLUMN content_sha256 TEXT", [])?;
    }
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_upload_students_map_upload ON upload_students_map(upload_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_source_upload ON attendance(source_upload_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_marks_source_upload ON marks(source_upload_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_remarks_roll ON remarks(roll_no)",
        [],
    )?;
    Ok(())
}

pub fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

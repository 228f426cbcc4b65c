mod test_support;

use rusqlite::Connection;
use serde_json::json;
use test_support::{count, open_workspace_db, request_ok, spawn_sidecar, temp_dir, write_file};

fn table_has_column(conn: &Connection, table: &str, column: &str) -> bool {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql).expect("prepare pragma");
    let mut rows = stmt.query([]).expect("query pragma");
    while let Some(row) = rows.next().expect("next row") {
        let name: String = row.get(1).expect("column name");
        if name == column {
            return true;
        }
    }
    false
}

fn user_version(conn: &Connection) -> i64 {
    conn.query_row("PRAGMA user_version", [], |r| r.get(0))
        .expect("user_version")
}

#[test]
fn unversioned_workspace_gains_additive_columns_and_keeps_rows() {
    let workspace = temp_dir("portald-migration-legacy");
    {
        let conn = Connection::open(workspace.join("portal.sqlite3")).expect("create legacy db");
        conn.execute_batch(
            "CREATE TABLE uploads(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT NOT NULL,
                upload_type TEXT NOT NULL,
                row_count INTEGER DEFAULT 0,
                created_at TEXT NOT NULL,
                uploader_username TEXT NOT NULL
             );
             CREATE TABLE students(
                roll_no TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT,
                semester INTEGER
             );
             CREATE TABLE attendance(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                roll_no TEXT NOT NULL,
                subject TEXT NOT NULL,
                attended INTEGER DEFAULT 0,
                total INTEGER DEFAULT 0,
                semester INTEGER,
                UNIQUE(roll_no, subject),
                FOREIGN KEY (roll_no) REFERENCES students(roll_no) ON DELETE CASCADE
             );
             INSERT INTO students(roll_no, name, email, semester) VALUES('L1', 'Legacy', NULL, 5);
             INSERT INTO attendance(roll_no, subject, attended, total) VALUES('L1', 'Math', 9, 10);",
        )
        .expect("legacy schema");
    }

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let conn = open_workspace_db(&workspace);
    assert_eq!(user_version(&conn), 4);
    assert!(table_has_column(&conn, "students", "phone"));
    assert!(table_has_column(&conn, "students", "father_name"));
    assert!(table_has_column(&conn, "students", "father_phone"));
    assert!(table_has_column(&conn, "attendance", "source_upload_id"));
    assert!(table_has_column(&conn, "marks", "source_upload_id"));
    assert!(table_has_column(&conn, "uploads", "content_sha256"));
    assert_eq!(count(&conn, "students"), 1);
    assert_eq!(count(&conn, "attendance"), 1);

    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.open",
        json!({ "rollNo": "L1" }),
    );
    assert_eq!(
        opened["attendanceGrid"]["rows"][0]["Math"].as_str(),
        Some("9/10 (90%)")
    );

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn reopening_a_migrated_workspace_is_a_no_op() {
    let workspace = temp_dir("portald-migration-reopen");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let roster = write_file(
        &workspace,
        "roster.csv",
        "roll_no,name,email,phone,father_name,father_phone,semester\nR1,Alice,,,,,1\n",
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "imports.apply",
        json!({ "kind": "students", "path": roster.to_string_lossy() }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let conn = open_workspace_db(&workspace);
    assert_eq!(user_version(&conn), 4);
    assert_eq!(count(&conn, "students"), 1);
    assert_eq!(count(&conn, "uploads"), 1);

    let _ = std::fs::remove_dir_all(workspace);
}

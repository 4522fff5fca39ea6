//! Filesystem tests for the JSON workbook adapter.

use bastion_audit_domain::model::{Record, Sheet, Workbook};
use bastion_audit_workbook::{JsonWorkbookAdapter, WorkbookAdapter};
use camino::Utf8PathBuf;
use serde_json::json;

fn temp_path(dir: &tempfile::TempDir, name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join(name)).expect("utf8 temp path")
}

#[test]
fn written_workbook_reads_back_unchanged() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = temp_path(&dir, "nested/out.json");

    let workbook = Workbook {
        sheets: vec![Sheet {
            name: "王鹏辉已授权主机".to_string(),
            records: vec![Record::from_fields([
                ("主机IP", json!("192.168.1.10")),
                ("主机名称", json!("prd-api-01")),
                ("端口", json!(22)),
                ("备注", json!(null)),
            ])],
        }],
    };

    JsonWorkbookAdapter.write(&workbook, &path).expect("write");
    let back = JsonWorkbookAdapter.read(&path).expect("read");
    assert_eq!(back, workbook);
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = temp_path(&dir, "absent.json");
    let err = JsonWorkbookAdapter.read(&path).expect_err("missing");
    assert!(format!("{err:#}").contains("absent.json"));
}

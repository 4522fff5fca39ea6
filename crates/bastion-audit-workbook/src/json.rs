use crate::WorkbookAdapter;
use anyhow::Context;
use bastion_audit_domain::model::Workbook;
use std::collections::BTreeSet;

/// `{"sheets":[{"name":..,"records":[{..}]}]}` on disk.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonWorkbookAdapter;

impl WorkbookAdapter for JsonWorkbookAdapter {
    fn parse(&self, bytes: &[u8]) -> anyhow::Result<Workbook> {
        let workbook: Workbook =
            serde_json::from_slice(bytes).context("workbook is not valid JSON")?;

        let mut seen = BTreeSet::new();
        for sheet in &workbook.sheets {
            if !seen.insert(sheet.name.as_str()) {
                anyhow::bail!("duplicate sheet name: {}", sheet.name);
            }
        }
        Ok(workbook)
    }

    fn serialize(&self, workbook: &Workbook) -> anyhow::Result<Vec<u8>> {
        let mut out = serde_json::to_vec_pretty(workbook).context("serialize workbook")?;
        out.push(b'\n');
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_sheets_and_keeps_key_order() {
        let text = r#"{"sheets":[{"name":"张涛已授权主机","records":[{"主机名称":"prd-a","主机IP":"10.0.0.1"}]}]}"#;
        let wb = JsonWorkbookAdapter.parse(text.as_bytes()).expect("parse");
        assert_eq!(wb.sheets.len(), 1);
        let keys: Vec<&str> = wb.sheets[0].records[0]
            .fields()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["主机名称", "主机IP"]);
    }

    #[test]
    fn missing_records_is_an_empty_sheet() {
        let wb = JsonWorkbookAdapter
            .parse(br#"{"sheets":[{"name":"empty"}]}"#)
            .expect("parse");
        assert!(wb.sheets[0].records.is_empty());
    }

    #[test]
    fn rejects_non_object_records() {
        assert!(
            JsonWorkbookAdapter
                .parse(br#"{"sheets":[{"name":"s","records":[1]}]}"#)
                .is_err()
        );
    }

    #[test]
    fn rejects_duplicate_sheet_names() {
        let err = JsonWorkbookAdapter
            .parse(br#"{"sheets":[{"name":"s"},{"name":"s"}]}"#)
            .expect_err("duplicate");
        assert!(err.to_string().contains("duplicate sheet name"));
    }

    proptest! {
        #[test]
        fn parse_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = JsonWorkbookAdapter.parse(&bytes);
        }
    }
}

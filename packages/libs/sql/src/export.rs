//! 목록 결과 내보내기
//!
//! 탭으로 구분된 CSV를 만듭니다. 헤더는 첫 행의 키(사전순)이고,
//! 각 칸에는 값의 JSON 표현이 들어갑니다.

use reqgen_core::{Error, Result};

use crate::mapper::Record;

/// 레코드 목록 -> 탭 구분 CSV
///
/// 행이 없으면 빈 바이트열을 돌려줍니다. 첫 행에 없는 키는 내보내지 않습니다.
pub fn render_csv(rows: &[Record]) -> Result<Vec<u8>> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };

    let mut keys: Vec<&String> = first.keys().collect();
    keys.sort();

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(keys.iter().map(|k| k.as_str())).map_err(export_error)?;

    for row in rows {
        let mut cells = Vec::with_capacity(keys.len());
        for key in &keys {
            let cell = row.get(key.as_str()).unwrap_or(&serde_json::Value::Null);
            cells.push(serde_json::to_string(cell)?);
        }
        writer.write_record(&cells).map_err(export_error)?;
    }

    writer.into_inner().map_err(|e| Error::Export {
        message: e.to_string(),
    })
}

fn export_error(err: csv::Error) -> Error {
    Error::Export {
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn lines(bytes: Vec<u8>) -> Vec<String> {
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect()
    }

    #[test]
    fn test_empty_rows_render_nothing() {
        assert!(render_csv(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_header_is_sorted_and_cells_are_json() {
        let rows = vec![
            record(json!({"name": "bob", "age": 30, "tags": [1, 2]})),
            record(json!({"name": "ann", "age": null, "tags": []})),
        ];
        let lines = lines(render_csv(&rows).unwrap());

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "age\tname\ttags");
        assert_eq!(lines[1], "30\t\"\"\"bob\"\"\"\t[1,2]");
        assert_eq!(lines[2], "null\t\"\"\"ann\"\"\"\t[]");
    }

    #[test]
    fn test_keys_missing_from_later_rows_are_null() {
        let rows = vec![record(json!({"a": 1, "b": 2})), record(json!({"a": 3, "c": 4}))];
        let lines = lines(render_csv(&rows).unwrap());

        assert_eq!(lines[0], "a\tb");
        assert_eq!(lines[2], "3\tnull");
    }
}

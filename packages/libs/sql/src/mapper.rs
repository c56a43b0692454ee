//! 행 매퍼
//!
//! 물리 행 `[primary key, 필드..., JOIN 집계...]`를 논리 레코드(키 -> 값)로 조립합니다.
//! 목록과 단건 조회 모두 같은 매퍼를 사용합니다.

use std::collections::HashSet;

use serde_json::{Map, Value};

use reqgen_core::schema::{FieldDescriptor, JoinSpec, TableDescriptor};
use reqgen_core::{Error, Result};

use crate::params::SelectParams;

/// 논리 레코드
pub type Record = Map<String, Value>;

/// 드라이버가 디코딩한 물리 행
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhysicalRow {
    pub cells: Vec<Value>,
}

impl From<Vec<Value>> for PhysicalRow {
    fn from(cells: Vec<Value>) -> Self {
        Self { cells }
    }
}

/// 행 매퍼
pub struct RowMapper<'a> {
    fields: Vec<&'a FieldDescriptor>,
    joins: Vec<&'a JoinSpec>,
}

impl<'a> RowMapper<'a> {
    /// SELECT와 같은 순서로 슬롯 구성 (투영 필드가 없는 JOIN은 슬롯 없음)
    pub fn new(table: &'a TableDescriptor, params: &'a SelectParams) -> Self {
        Self {
            fields: table.fields_for(&params.fields),
            joins: params.joins.iter().filter(|j| j.is_projected()).collect(),
        }
    }

    /// 기대하는 컬럼 수
    pub fn width(&self) -> usize {
        1 + self.fields.len() + self.joins.len()
    }

    /// 여러 행 (순서 유지)
    pub fn map_rows(&self, rows: Vec<PhysicalRow>) -> Result<Vec<Record>> {
        rows.into_iter().map(|row| self.map_row(row)).collect()
    }

    /// 행 하나
    pub fn map_row(&self, row: PhysicalRow) -> Result<Record> {
        if row.cells.len() < self.width() {
            return Err(Error::RowShape {
                expected: self.width(),
                actual: row.cells.len(),
            });
        }

        let mut cells = row.cells.into_iter();
        // primary key는 필드로 요청된 경우에만 레코드에 포함
        cells.next();

        let mut record = Record::new();

        for field in &self.fields {
            let raw = cells.next().unwrap_or(Value::Null);
            let value = match &field.output_converter {
                Some(convert) => convert(raw),
                None => raw,
            };
            record.insert(field.name.clone(), value);
        }

        for join in &self.joins {
            let payload = cells.next().unwrap_or(Value::Null);
            let items = decode_join(payload, join);
            record.insert(join.result_key.clone(), Value::Array(items));
        }

        Ok(record)
    }
}

/// JOIN 집계 페이로드 -> 서브 레코드 목록
///
/// 스칼라 값이 하나도 없으면 (매칭 행 없음) 빈 목록입니다. 중복 서브 레코드는 첫 등장만 남깁니다.
fn decode_join(payload: Value, join: &JoinSpec) -> Vec<Value> {
    let outer = match payload {
        Value::Null => return Vec::new(),
        Value::Array(items) => items,
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Array(items)) => items,
            Ok(Value::Null) => return Vec::new(),
            _ => {
                tracing::warn!("join '{}' payload is not an array", join.result_key);
                return Vec::new();
            }
        },
        _ => {
            tracing::warn!("join '{}' payload is not an array", join.result_key);
            return Vec::new();
        }
    };

    if presence_signal(&outer).is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for inner in outer {
        let Value::Array(values) = inner else {
            continue;
        };

        let mut item = Map::new();
        for (position, name) in join.fields.iter().enumerate() {
            item.insert(name.clone(), values.get(position).cloned().unwrap_or(Value::Null));
        }

        // serde_json::Map은 키 정렬 상태로 직렬화되므로 그대로 비교 키로 사용
        let fingerprint = Value::Object(item.clone()).to_string();
        if seen.insert(fingerprint) {
            items.push(Value::Object(item));
        }
    }

    items
}

/// null이 아닌 스칼라 값들의 텍스트를 이어붙인 값
fn presence_signal(outer: &[Value]) -> String {
    let mut signal = String::new();
    for inner in outer {
        let Value::Array(values) = inner else {
            continue;
        };
        for value in values {
            match value {
                Value::Null => {}
                Value::String(s) => signal.push_str(s),
                other => signal.push_str(&other.to_string()),
            }
        }
    }
    signal
}

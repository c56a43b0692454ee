//! SQL 문과 바인딩 값

use sea_query::{Value as SqlValue, Values};
use serde_json::Value;

use reqgen_core::schema::FieldType;

/// 실행 가능한 SQL 문 (`$N` placeholder + 순서대로 바인딩할 값)
#[derive(Debug, Clone)]
pub struct Statement {
    pub sql: String,
    pub values: Values,
}

impl Statement {
    pub fn new(sql: impl Into<String>, values: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            values: Values(values),
        }
    }

    /// 바인딩 값
    pub fn params(&self) -> &[SqlValue] {
        &self.values.0
    }
}

/// 식별자 인용 (내부 `"`는 두 번)
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `"schema"."table"`
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

/// `"alias"."column"`
pub fn qualified_column(alias: &str, column: &str) -> String {
    format!("{}.{}", quote_ident(alias), quote_ident(column))
}

/// serde_json::Value를 바인딩 값으로 변환
///
/// NULL은 컬럼 타입을 알면 그 타입으로, 모르면 text로 바인딩됩니다.
pub fn bind_value(value: &Value, field_type: Option<FieldType>) -> SqlValue {
    match value {
        Value::Null => match field_type {
            Some(FieldType::Int) => SqlValue::BigInt(None),
            Some(FieldType::Float) => SqlValue::Double(None),
            Some(FieldType::Array) | Some(FieldType::Object) => SqlValue::Json(None),
            _ => SqlValue::String(None),
        },
        Value::Bool(b) => (*b).into(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into()
            } else if let Some(f) = n.as_f64() {
                f.into()
            } else {
                n.to_string().into()
            }
        }
        Value::String(s) => s.as_str().into(),
        // JSON 타입으로 바인딩
        Value::Array(_) | Value::Object(_) => SqlValue::Json(Some(Box::new(value.clone()))),
    }
}

//! 논리적 필드 타입 정의
//!
//! 필드 타입은 입력 검증, 필터 값 바인딩, defrec 응답에 사용됩니다.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 논리적 필드 타입
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// 문자열 (TEXT/VARCHAR)
    #[default]
    String,

    /// 정수
    Int,

    /// 부동소수점
    Float,

    /// 배열 (JSON 컬럼)
    Array,

    /// 객체 (JSON 컬럼)
    Object,
}

impl FieldType {
    /// 간단한 타입 문자열에서 파싱
    pub fn from_simple_str(s: &str) -> Option<Self> {
        match s {
            "string" | "text" => Some(FieldType::String),
            "int" | "integer" => Some(FieldType::Int),
            "float" | "double" => Some(FieldType::Float),
            "array" => Some(FieldType::Array),
            "object" | "map" => Some(FieldType::Object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }

    /// 문자열 값을 이 타입의 JSON 값으로 변환
    ///
    /// 경로/쿼리 문자열로 들어온 키와 필터 값에 사용합니다.
    /// 변환할 수 없으면 `None`을 반환합니다.
    pub fn coerce(&self, raw: &str) -> Option<Value> {
        match self {
            FieldType::String => Some(Value::String(raw.to_string())),
            FieldType::Int => raw.trim().parse::<i64>().ok().map(Value::from),
            FieldType::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            FieldType::Array | FieldType::Object => serde_json::from_str::<Value>(raw)
                .ok()
                .filter(|v| self.matches(v)),
        }
    }

    /// JSON 값을 이 타입으로 변환 (문자열이면 `coerce`, 그 외는 그대로)
    pub fn coerce_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => self.coerce(s).unwrap_or_else(|| value.clone()),
            other => other.clone(),
        }
    }

    /// JSON 값이 이 타입과 일치하는지
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (FieldType::String, Value::String(_)) => true,
            (FieldType::Int, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (FieldType::Float, Value::Number(_)) => true,
            (FieldType::Array, Value::Array(_)) => true,
            (FieldType::Object, Value::Object(_)) => true,
            _ => false,
        }
    }
}

/// 폼 입력 타입 (defrec 응답용 메타데이터)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormType {
    Text,
    Number,
    Textarea,
    Select,
    Checkbox,
    Multiselect,
    Map,
}

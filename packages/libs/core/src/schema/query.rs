//! 쿼리 구성 요소
//!
//! 액션이 선언하는 WHERE 절, JOIN, 그리고 요청으로 들어오는 필터 맵을 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// WHERE 조건 연결자
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Connector {
    #[default]
    #[serde(rename = "AND", alias = "and")]
    And,
    #[serde(rename = "OR", alias = "or")]
    Or,
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connector::And => write!(f, "AND"),
            Connector::Or => write!(f, "OR"),
        }
    }
}

/// WHERE 절의 필드 항목
///
/// `connector`는 이 항목과 다음 항목 사이에 놓입니다. 마지막 항목의 connector는 무시됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhereField {
    pub name: String,
    #[serde(default)]
    pub connector: Connector,
}

/// 정적/동적 WHERE 절
///
/// `fields[i]`는 `values[i]`와 짝을 이룹니다.
/// 비어있거나 길이가 맞지 않으면 WHERE 절이 없는 것으로 취급합니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhereClause {
    #[serde(default)]
    pub fields: Vec<WhereField>,
    #[serde(default)]
    pub values: Vec<Value>,
}

impl WhereClause {
    /// 빈 WHERE 절
    pub fn empty() -> Self {
        Self::default()
    }

    /// 다음 항목과 AND로 연결되는 equality 조건 추가
    pub fn and(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(field, Connector::And, value)
    }

    /// 다음 항목과 OR로 연결되는 equality 조건 추가
    pub fn or(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(field, Connector::Or, value)
    }

    fn push(mut self, field: impl Into<String>, connector: Connector, value: impl Into<Value>) -> Self {
        self.fields.push(WhereField {
            name: field.into(),
            connector,
        });
        self.values.push(value.into());
        self
    }

    /// SQL로 출력할 수 있는 상태인지
    pub fn is_usable(&self) -> bool {
        !self.fields.is_empty() && self.fields.len() == self.values.len()
    }

    /// (필드, 값, 다음 항목과의 connector) 순회
    ///
    /// 마지막 항목의 connector는 `None`입니다.
    pub fn predicates(&self) -> impl Iterator<Item = (&str, &Value, Option<Connector>)> {
        let last = self.fields.len().saturating_sub(1);
        self.fields
            .iter()
            .zip(self.values.iter())
            .enumerate()
            .map(move |(i, (field, value))| {
                let connector = if i < last { Some(field.connector) } else { None };
                (field.name.as_str(), value, connector)
            })
    }
}

/// JOIN 종류
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    #[default]
    #[serde(rename = "LEFT", alias = "left")]
    Left,
    #[serde(rename = "LEFT OUTER", alias = "left outer", alias = "left_outer")]
    LeftOuter,
    #[serde(rename = "RIGHT", alias = "right")]
    Right,
    #[serde(rename = "RIGHT OUTER", alias = "right outer", alias = "right_outer")]
    RightOuter,
    #[serde(rename = "INNER", alias = "inner")]
    Inner,
}

impl JoinKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Left => "LEFT",
            JoinKind::LeftOuter => "LEFT OUTER",
            JoinKind::Right => "RIGHT",
            JoinKind::RightOuter => "RIGHT OUTER",
            JoinKind::Inner => "INNER",
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// JOIN 정의
///
/// 결과는 `result_key` 아래에 서브 레코드 목록으로 실립니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSpec {
    /// 대상 테이블 (비어있으면 FROM 절에서 생략)
    #[serde(default)]
    pub table: String,

    #[serde(rename = "type", default)]
    pub kind: JoinKind,

    /// 베이스 테이블 쪽 컬럼
    #[serde(rename = "on")]
    pub parent_key: String,

    /// 대상 테이블 쪽 컬럼
    #[serde(rename = "on_key")]
    pub target_key: String,

    /// 투영할 대상 테이블 컬럼 (순서 유지)
    #[serde(default)]
    pub fields: Vec<String>,

    /// 결과 레코드의 키
    #[serde(rename = "as")]
    pub result_key: String,
}

impl JoinSpec {
    pub fn new(
        table: impl Into<String>,
        kind: JoinKind,
        parent_key: impl Into<String>,
        target_key: impl Into<String>,
        fields: &[&str],
        result_key: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            kind,
            parent_key: parent_key.into(),
            target_key: target_key.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            result_key: result_key.into(),
        }
    }

    /// JOIN 목록 내 위치 기반 별칭
    pub fn alias(position: usize) -> String {
        format!("j{position}")
    }

    /// 결과 슬롯을 갖는지 (투영 필드가 있는지)
    pub fn is_projected(&self) -> bool {
        !self.fields.is_empty()
    }
}

/// dotted 필터 키의 prefix를 SQL 별칭으로 해석
///
/// JOIN의 `result_key`와 같으면 해당 JOIN의 위치 별칭, 아니면 prefix 그대로입니다.
pub fn resolve_alias(prefix: &str, joins: &[JoinSpec]) -> String {
    joins
        .iter()
        .position(|join| join.result_key == prefix)
        .map(JoinSpec::alias)
        .unwrap_or_else(|| prefix.to_string())
}

/// 요청 필터 (필드 -> 문자열 값)
///
/// 삽입 순서를 유지합니다. 같은 키를 다시 넣으면 값만 교체됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterMap(Vec<(String, String)>);

impl FilterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `"<alias>.<column>"` 형태의 키를 분리
    pub fn split_dotted(key: &str) -> Option<(&str, &str)> {
        key.split_once('.')
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FilterMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

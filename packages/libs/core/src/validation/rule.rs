//! 검증 규칙 정의
//!
//! 필드별 규칙은 닫힌 variant 집합이며, 각 규칙은 적용될 작업(scenario) 목록을 가집니다.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern is valid")
});

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?i)(?:(?:https?|ftp)://)?(?:[^\s:@/]+(?::[^\s:@/]*)?@)?(?:localhost|[a-z0-9](?:[a-z0-9-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]*[a-z0-9])?)*\.[a-z]{2,}|\d{1,3}(?:\.\d{1,3}){3})(?::\d{1,5})?(?:[/?#]\S*)?$",
    )
    .expect("url pattern is valid")
});

/// 검증이 수행되는 작업
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Add,
    Update,
}

impl Scenario {
    pub fn all() -> Vec<Scenario> {
        vec![Scenario::Add, Scenario::Update]
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::Add => write!(f, "add"),
            Scenario::Update => write!(f, "update"),
        }
    }
}

/// 규칙 종류와 파라미터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RuleKind {
    /// 비어있지 않아야 함
    Required,

    /// 허용 값 목록 중 하나
    OneOf { values: Vec<Value> },

    /// 길이 범위 (0 = 제한 없음)
    Length {
        #[serde(default)]
        min: usize,
        #[serde(default)]
        max: usize,
    },

    /// URL 형식
    Url,

    /// 이메일 형식
    Email,
}

/// 검증 규칙
///
/// `scenarios`에 포함된 작업에서만 적용됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(flatten)]
    pub kind: RuleKind,

    #[serde(rename = "on", default = "Scenario::all")]
    pub scenarios: Vec<Scenario>,
}

impl ValidationRule {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            scenarios: Scenario::all(),
        }
    }

    pub fn required() -> Self {
        Self::new(RuleKind::Required)
    }

    pub fn one_of(values: impl IntoIterator<Item = Value>) -> Self {
        Self::new(RuleKind::OneOf {
            values: values.into_iter().collect(),
        })
    }

    pub fn length(min: usize, max: usize) -> Self {
        Self::new(RuleKind::Length { min, max })
    }

    pub fn url() -> Self {
        Self::new(RuleKind::Url)
    }

    pub fn email() -> Self {
        Self::new(RuleKind::Email)
    }

    /// 적용 작업 제한
    pub fn on(mut self, scenarios: &[Scenario]) -> Self {
        self.scenarios = scenarios.to_vec();
        self
    }

    /// 해당 작업에 적용되는지
    pub fn applies_to(&self, scenario: Scenario) -> bool {
        self.scenarios.contains(&scenario)
    }

    /// 값 검증
    ///
    /// 실패 시 필드 이름과 무관한 메시지를 반환합니다.
    pub fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        match &self.kind {
            RuleKind::Required => {
                if is_empty(value) {
                    Err("cannot be blank".to_string())
                } else {
                    Ok(())
                }
            }
            RuleKind::OneOf { values } => {
                if is_blank(value) {
                    return Ok(());
                }
                let text = value_text(value);
                if values.iter().any(|v| value_text(v) == text) {
                    Ok(())
                } else {
                    let allowed: Vec<String> = values.iter().map(value_text).collect();
                    Err(format!("must be one of [{}]", allowed.join(", ")))
                }
            }
            RuleKind::Length { min, max } => {
                let len = match value {
                    Value::Null => return Ok(()),
                    Value::String(s) => s.chars().count(),
                    Value::Array(items) => items.len(),
                    Value::Object(map) => map.len(),
                    _ => return Err("must be a string, array or object".to_string()),
                };
                if (*min > 0 && len < *min) || (*max > 0 && len > *max) {
                    Err(length_message(*min, *max))
                } else {
                    Ok(())
                }
            }
            RuleKind::Url => match_string(value, &URL_RE, "must be a valid URL"),
            RuleKind::Email => match_string(value, &EMAIL_RE, "must be a valid email address"),
        }
    }
}

fn match_string(value: &Value, pattern: &Regex, message: &str) -> std::result::Result<(), String> {
    match value {
        Value::Null => Ok(()),
        Value::String(s) if s.is_empty() => Ok(()),
        Value::String(s) if pattern.is_match(s) => Ok(()),
        _ => Err(message.to_string()),
    }
}

fn length_message(min: usize, max: usize) -> String {
    match (min, max) {
        (min, max) if min == max => format!("the length must be exactly {min}"),
        (min, 0) => format!("the length must be no less than {min}"),
        (0, max) => format!("the length must be no more than {max}"),
        (min, max) => format!("the length must be between {min} and {max}"),
    }
}

/// null, 빈 문자열/배열/객체, 0, false
pub(crate) fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn is_blank(value: &Value) -> bool {
    matches!(value, Value::Null) || matches!(value, Value::String(s) if s.is_empty())
}

/// 비교/메시지용 문자열 표현
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required() {
        let rule = ValidationRule::required();
        assert!(rule.validate(&json!("x")).is_ok());
        assert!(rule.validate(&json!(5)).is_ok());
        assert_eq!(rule.validate(&json!("")), Err("cannot be blank".to_string()));
        assert!(rule.validate(&Value::Null).is_err());
        assert!(rule.validate(&json!([])).is_err());
        assert!(rule.validate(&json!(0)).is_err());
    }

    #[test]
    fn test_one_of_compares_text_forms() {
        let rule = ValidationRule::one_of(vec![json!("a"), json!(2)]);
        assert!(rule.validate(&json!("a")).is_ok());
        assert!(rule.validate(&json!("2")).is_ok());
        assert!(rule.validate(&json!(2)).is_ok());
        assert!(rule.validate(&json!("")).is_ok());
        assert_eq!(rule.validate(&json!("c")), Err("must be one of [a, 2]".to_string()));
    }

    #[test]
    fn test_length() {
        let rule = ValidationRule::length(3, 5);
        assert!(rule.validate(&json!("abc")).is_ok());
        assert!(rule.validate(&json!("한국어")).is_ok());
        assert!(rule.validate(&Value::Null).is_ok());
        assert_eq!(
            rule.validate(&json!("")),
            Err("the length must be between 3 and 5".to_string())
        );
        assert!(rule.validate(&json!("abcdef")).is_err());
        assert!(rule.validate(&json!([1, 2])).is_err());

        let min_only = ValidationRule::length(2, 0);
        assert_eq!(
            min_only.validate(&json!("a")),
            Err("the length must be no less than 2".to_string())
        );
        assert!(min_only.validate(&json!(12)).is_err());
    }

    #[test]
    fn test_url_and_email() {
        let url = ValidationRule::url();
        assert!(url.validate(&json!("https://example.com/path?q=1")).is_ok());
        assert!(url.validate(&json!("http://localhost:8080")).is_ok());
        assert!(url.validate(&json!("")).is_ok());
        assert!(url.validate(&json!("not a url")).is_err());

        let email = ValidationRule::email();
        assert!(email.validate(&json!("user@example.com")).is_ok());
        assert!(email.validate(&Value::Null).is_ok());
        assert!(email.validate(&json!("user@")).is_err());
        assert!(email.validate(&json!(42)).is_err());
    }

    #[test]
    fn test_scenarios() {
        let rule = ValidationRule::required().on(&[Scenario::Add]);
        assert!(rule.applies_to(Scenario::Add));
        assert!(!rule.applies_to(Scenario::Update));
    }

    #[test]
    fn test_rule_deserialization() {
        let rule: ValidationRule =
            serde_json::from_value(json!({"rule": "length", "min": 2, "max": 4, "on": ["add"]}))
                .unwrap();
        assert_eq!(rule.kind, RuleKind::Length { min: 2, max: 4 });
        assert_eq!(rule.scenarios, vec![Scenario::Add]);

        let rule: ValidationRule = serde_json::from_value(json!({"rule": "email"})).unwrap();
        assert_eq!(rule.scenarios, Scenario::all());
    }
}

//! 요청 컨텍스트
//!
//! 훅, 동적 규칙/옵션 provider, where provider에 명시적으로 전달되는 요청 정보입니다.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// 요청 컨텍스트
///
/// 라우팅 계층이 요청마다 생성하여 서비스 호출에 넘깁니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// 요청 ID (로그 상관관계용)
    pub request_id: String,

    /// 요청 파라미터 (라우팅 계층이 채움)
    #[serde(default)]
    pub params: HashMap<String, Value>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    /// 새 컨텍스트 생성 (요청 ID 자동 발급)
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            params: HashMap::new(),
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// 파라미터 하나 추가
    pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestContext::new();
        let b = RequestContext::new();
        assert_ne!(a.request_id, b.request_id);
        assert_eq!(a.with_request_id("req-1").request_id, "req-1");
    }

    #[test]
    fn test_params() {
        let ctx = RequestContext::new().with_param("tenant", json!("acme"));
        assert_eq!(ctx.param("tenant"), Some(&json!("acme")));
        assert_eq!(ctx.param("missing"), None);
    }

    #[test]
    fn test_deserialize_without_params() {
        let ctx: RequestContext = serde_json::from_value(json!({"request_id": "r-9"})).unwrap();
        assert_eq!(ctx.request_id, "r-9");
        assert!(ctx.params.is_empty());
    }
}

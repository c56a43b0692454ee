//! 필드 정의
//!
//! 테이블 필드의 정적 메타데이터와 요청 시점에 평가되는 함수(변환기, provider)를 정의합니다.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{FieldType, FormType};
use crate::error::Result;
use crate::validation::{RequestContext, ValidationRule};

/// 입력 변환기 (실패 시 검증 메시지)
pub type InputConverter = Arc<dyn Fn(&Value) -> std::result::Result<Value, String> + Send + Sync>;

/// 출력 변환기 (DB에서 읽은 값 -> 응답 값)
pub type OutputConverter = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// 요청별 동적 규칙
pub type RuleProvider = Arc<dyn Fn(&RequestContext) -> Result<Vec<ValidationRule>> + Send + Sync>;

/// 요청별 동적 옵션
pub type OptionsProvider = Arc<dyn Fn(&RequestContext) -> Result<Vec<FieldOption>> + Send + Sync>;

/// 선택지 (select/multiselect 폼용)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: Value,
    pub label: String,
}

impl FieldOption {
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// 필드 정의
#[derive(Clone)]
pub struct FieldDescriptor {
    /// 컬럼 이름
    pub name: String,

    /// 표시 이름
    pub title: String,

    /// 논리 타입
    pub field_type: FieldType,

    /// 폼 입력 타입
    pub form_type: Option<FormType>,

    /// 예시 값
    pub example: Option<String>,

    /// SELECT 시 컬럼을 감쌀 SQL 함수 이름
    pub select_function: Option<String>,

    /// 입력 변환기
    pub input_converter: Option<InputConverter>,

    /// 출력 변환기
    pub output_converter: Option<OutputConverter>,

    /// 정적 규칙
    pub rules: Vec<ValidationRule>,

    /// 동적 규칙
    pub rule_provider: Option<RuleProvider>,

    /// 정적 옵션
    pub options: Vec<FieldOption>,

    /// 동적 옵션
    pub options_provider: Option<OptionsProvider>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            field_type,
            form_type: None,
            example: None,
            select_function: None,
            input_converter: None,
            output_converter: None,
            rules: Vec::new(),
            rule_provider: None,
            options: Vec::new(),
            options_provider: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn form_type(mut self, form_type: FormType) -> Self {
        self.form_type = Some(form_type);
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    pub fn select_function(mut self, function: impl Into<String>) -> Self {
        self.select_function = Some(function.into());
        self
    }

    pub fn rule(mut self, rule: ValidationRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn option(mut self, option: FieldOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn convert_input<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        self.input_converter = Some(Arc::new(f));
        self
    }

    pub fn convert_output<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.output_converter = Some(Arc::new(f));
        self
    }

    pub fn rules_from<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestContext) -> Result<Vec<ValidationRule>> + Send + Sync + 'static,
    {
        self.rule_provider = Some(Arc::new(f));
        self
    }

    pub fn options_from<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestContext) -> Result<Vec<FieldOption>> + Send + Sync + 'static,
    {
        self.options_provider = Some(Arc::new(f));
        self
    }

    /// 정적 옵션 + 동적 옵션
    pub fn options_for(&self, ctx: &RequestContext) -> Result<Vec<FieldOption>> {
        let mut options = self.options.clone();
        if let Some(provider) = &self.options_provider {
            options.extend(provider(ctx)?);
        }
        Ok(options)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("field_type", &self.field_type)
            .field("select_function", &self.select_function)
            .field("rules", &self.rules)
            .field("options", &self.options)
            .field("input_converter", &self.input_converter.is_some())
            .field("output_converter", &self.output_converter.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_defaults_title_to_name() {
        let field = FieldDescriptor::new("email", FieldType::String);
        assert_eq!(field.title, "email");
        assert!(field.rules.is_empty());

        let field = field.title("E-mail").rule(ValidationRule::email());
        assert_eq!(field.title, "E-mail");
        assert_eq!(field.rules.len(), 1);
    }

    #[test]
    fn test_options_merge_static_then_dynamic() {
        let field = FieldDescriptor::new("status", FieldType::String)
            .option(FieldOption::new("draft", "Draft"))
            .options_from(|ctx| {
                let label = if ctx.param("admin").is_some() { "Archived" } else { "Hidden" };
                Ok(vec![FieldOption::new("archived", label)])
            });

        let options = field.options_for(&RequestContext::new()).unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].value, json!("draft"));
        assert_eq!(options[1].label, "Hidden");
    }
}

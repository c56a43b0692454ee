//! 테이블 정의

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use super::action::{
    Actions, AddAction, DefrecAction, DeleteAction, FeatureAction, Features, ListAction,
    UpdateAction, ViewAction,
};
use super::field::{FieldDescriptor, FieldOption};
use super::query::JoinSpec;
use super::types::{FieldType, FormType};
use crate::error::{Error, Result};
use crate::validation::{RequestContext, ValidationRule};

static FUNCTION_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$").expect("valid pattern"));

/// 테이블 정의
///
/// 요청 간에 공유되는 읽기 전용 값입니다. `fields`의 순서가 SELECT 투영 순서입니다.
#[derive(Debug, Clone)]
pub struct TableDescriptor {
    /// 테이블 이름
    pub name: String,

    /// Primary key 컬럼
    pub primary_key: String,

    /// Primary key 타입 (경로 문자열 변환용)
    pub primary_key_type: FieldType,

    /// 필드 목록 (순서 유지)
    pub fields: Vec<FieldDescriptor>,

    /// 활성화된 작업
    pub actions: Actions,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: primary_key.into(),
            primary_key_type: FieldType::Int,
            fields: Vec::new(),
            actions: Actions::default(),
        }
    }

    pub fn primary_key_type(mut self, field_type: FieldType) -> Self {
        self.primary_key_type = field_type;
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn list(mut self, action: ListAction) -> Self {
        self.actions.list = Some(action);
        self
    }

    pub fn view(mut self, action: ViewAction) -> Self {
        self.actions.view = Some(action);
        self
    }

    /// 생성 작업 활성화 (defrec도 함께 활성화)
    pub fn add(mut self, action: AddAction) -> Self {
        self.actions.add = Some(action);
        if self.actions.defrec.is_none() {
            self.actions.defrec = Some(DefrecAction::default());
        }
        self
    }

    pub fn update(mut self, action: UpdateAction) -> Self {
        self.actions.update = Some(action);
        self
    }

    pub fn delete(mut self, action: DeleteAction) -> Self {
        self.actions.delete = Some(action);
        self
    }

    /// defrec 작업 설정 (라벨, 훅)
    pub fn with_defrec(mut self, action: DefrecAction) -> Self {
        self.actions.defrec = Some(action);
        self
    }

    /// 필드 조회
    pub fn get_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.get_field(name).is_some()
    }

    /// 이름 목록에 포함된 필드를 테이블 정의 순서대로 반환
    pub fn fields_for<S: AsRef<str>>(&self, names: &[S]) -> Vec<&FieldDescriptor> {
        self.fields
            .iter()
            .filter(|f| names.iter().any(|n| n.as_ref() == f.name))
            .collect()
    }

    /// 컬럼의 선언 타입 (primary key 포함)
    pub fn column_type(&self, column: &str) -> Option<FieldType> {
        if column == self.primary_key {
            return Some(self.primary_key_type);
        }
        self.get_field(column).map(|f| f.field_type)
    }

    /// 조회 키 값을 컬럼 타입에 맞게 변환
    pub fn coerce_key(&self, column: &str, value: &Value) -> Value {
        match self.column_type(column) {
            Some(field_type) => field_type.coerce_value(value),
            None => value.clone(),
        }
    }

    /// 기능 목록
    pub fn features(&self) -> Features {
        Features {
            table: self.name.clone(),
            actions: self
                .actions
                .enabled()
                .into_iter()
                .map(|(op, label)| {
                    (
                        op,
                        FeatureAction {
                            label: label.to_string(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// 폼 정의(defrec): 필드 정의 순서대로 메타데이터, 옵션, 규칙
    ///
    /// 규칙은 작업 구분 없이 정적 규칙 다음 동적 규칙입니다.
    pub fn defrec(&self, ctx: &RequestContext) -> Result<Vec<FieldSpec>> {
        self.fields
            .iter()
            .map(|field| -> Result<FieldSpec> {
                let mut check = field.rules.clone();
                if let Some(provider) = &field.rule_provider {
                    check.extend(provider(ctx)?);
                }
                FieldSpec::describe(field, check, ctx)
            })
            .collect()
    }

    /// 목록 필터 메타데이터 (정적 규칙만 포함)
    pub fn filter_specs<S: AsRef<str>>(&self, names: &[S], ctx: &RequestContext) -> Result<BTreeMap<String, FieldSpec>> {
        self.fields_for(names)
            .into_iter()
            .map(|field| -> Result<(String, FieldSpec)> {
                Ok((field.name.clone(), FieldSpec::describe(field, field.rules.clone(), ctx)?))
            })
            .collect()
    }

    /// 목록 헤더 (필드 -> 제목)
    pub fn heads<S: AsRef<str>>(&self, names: &[S]) -> BTreeMap<String, String> {
        self.fields_for(names)
            .into_iter()
            .map(|field| (field.name.clone(), field.title.clone()))
            .collect()
    }

    /// 정의 검증
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(invalid("table name cannot be empty".to_string()));
        }
        if self.primary_key.is_empty() {
            return Err(invalid(format!("table '{}' has no primary key", self.name)));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(invalid(format!("table '{}' has a field without a name", self.name)));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(invalid(format!(
                    "table '{}' declares field '{}' twice",
                    self.name, field.name
                )));
            }
            if let Some(function) = &field.select_function {
                if !FUNCTION_NAME_RE.is_match(function) {
                    return Err(invalid(format!(
                        "field '{}' has an invalid select function '{}'",
                        field.name, function
                    )));
                }
            }
        }

        if let Some(list) = &self.actions.list {
            self.check_fields(&list.fields)?;
            self.check_fields(&list.search)?;
            self.check_fields(&list.filter)?;
            check_joins(&list.joins)?;
        }
        if let Some(view) = &self.actions.view {
            self.check_fields(&view.fields)?;
            check_joins(&view.joins)?;
        }
        if let Some(add) = &self.actions.add {
            self.check_fields(&add.fields)?;
        }
        if let Some(update) = &self.actions.update {
            self.check_fields(&update.fields)?;
        }
        Ok(())
    }

    fn check_fields(&self, names: &[String]) -> Result<()> {
        match names.iter().find(|n| !self.has_field(n)) {
            Some(unknown) => Err(Error::UnknownField {
                table: self.name.clone(),
                field: unknown.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn check_joins(joins: &[JoinSpec]) -> Result<()> {
    let mut keys = HashSet::new();
    for join in joins {
        if join.is_projected() && join.table.is_empty() {
            return Err(invalid(format!(
                "join '{}' projects fields but has no target table",
                join.result_key
            )));
        }
        if join.is_projected() && !keys.insert(join.result_key.as_str()) {
            return Err(invalid(format!("duplicate join result key '{}'", join.result_key)));
        }
    }
    Ok(())
}

fn invalid(message: String) -> Error {
    Error::DescriptorValidation { message }
}

/// defrec/필터 응답의 필드 항목
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub title: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_type: Option<FormType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    pub options: Vec<FieldOption>,
    pub check: Vec<ValidationRule>,
}

impl FieldSpec {
    fn describe(field: &FieldDescriptor, check: Vec<ValidationRule>, ctx: &RequestContext) -> Result<Self> {
        Ok(Self {
            name: field.name.clone(),
            title: field.title.clone(),
            field_type: field.field_type,
            form_type: field.form_type,
            example: field.example.clone(),
            options: field.options_for(ctx)?,
            check,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{JoinKind, Operation};
    use crate::validation::Scenario;
    use serde_json::json;

    fn users() -> TableDescriptor {
        TableDescriptor::new("users", "id")
            .field(FieldDescriptor::new("name", FieldType::String).rule(ValidationRule::required()))
            .field(FieldDescriptor::new("age", FieldType::Int))
            .field(
                FieldDescriptor::new("role", FieldType::String)
                    .option(FieldOption::new("admin", "Admin"))
                    .rules_from(|_| Ok(vec![ValidationRule::length(1, 10).on(&[Scenario::Update])])),
            )
    }

    #[test]
    fn test_fields_for_keeps_descriptor_order() {
        let table = users();
        let names: Vec<_> = table
            .fields_for(&["role", "name", "missing"])
            .into_iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["name", "role"]);
    }

    #[test]
    fn test_coerce_key() {
        let table = users();
        assert_eq!(table.coerce_key("id", &json!("12")), json!(12));
        assert_eq!(table.coerce_key("name", &json!("12")), json!("12"));
        assert_eq!(table.coerce_key("age", &json!("x")), json!("x"));
    }

    #[test]
    fn test_validate_rejects_unknown_action_field() {
        let table = users().list(ListAction::new(&["name", "email"]));
        assert!(matches!(
            table.validate(),
            Err(Error::UnknownField { field, .. }) if field == "email"
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_join_keys() {
        let join = JoinSpec::new("posts", JoinKind::Left, "id", "user_id", &["title"], "posts");
        let table = users().list(ListAction::new(&["name"]).join(join.clone()).join(join));
        assert!(matches!(table.validate(), Err(Error::DescriptorValidation { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_select_function() {
        let table = TableDescriptor::new("t", "id")
            .field(FieldDescriptor::new("a", FieldType::String).select_function("lower(x); drop"));
        assert!(table.validate().is_err());

        let table = TableDescriptor::new("t", "id")
            .field(FieldDescriptor::new("a", FieldType::String).select_function("pg_catalog.lower"));
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_add_enables_defrec() {
        let table = users().add(AddAction::new(&["name"]));
        let features = table.features();
        assert!(features.actions.contains_key(&Operation::Add));
        assert!(features.actions.contains_key(&Operation::Defrec));
    }

    #[test]
    fn test_defrec_merges_static_and_dynamic() {
        let table = users();
        let specs = table.defrec(&RequestContext::new()).unwrap();
        let role = &specs[2];
        assert_eq!(role.name, "role");
        assert_eq!(role.options.len(), 1);
        assert_eq!(role.check.len(), 1);
        assert_eq!(specs[0].check, vec![ValidationRule::required()]);

        let json = serde_json::to_value(&specs[1]).unwrap();
        assert_eq!(json["name"], json!("age"));
        assert_eq!(json["type"], json!("int"));
    }

    #[test]
    fn test_defrec_keeps_descriptor_order() {
        let table = TableDescriptor::new("t", "id")
            .field(FieldDescriptor::new("zeta", FieldType::String))
            .field(FieldDescriptor::new("alpha", FieldType::String));
        let names: Vec<_> = table
            .defrec(&RequestContext::new())
            .unwrap()
            .into_iter()
            .map(|spec| spec.name)
            .collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_with_defrec_sets_label() {
        let table = users().with_defrec(DefrecAction {
            label: "Form".to_string(),
            ..Default::default()
        });
        let features = table.features();
        assert_eq!(features.actions[&Operation::Defrec].label, "Form");

        let table = table.add(AddAction::new(&["name"]));
        assert_eq!(table.features().actions[&Operation::Defrec].label, "Form");
    }

    #[test]
    fn test_heads_and_filter_specs() {
        let table = users();
        let heads = table.heads(&["role", "name"]);
        assert_eq!(heads.len(), 2);
        assert_eq!(heads["role"], table.get_field("role").unwrap().title);

        let filters = table.filter_specs(&["role"], &RequestContext::new()).unwrap();
        // 필터에는 정적 규칙만 노출
        assert!(filters["role"].check.is_empty());
        assert_eq!(filters["role"].options.len(), 1);
    }
}

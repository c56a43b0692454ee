//! 검증 엔진
//!
//! 작업(add/update)별 규칙 선택, 입력 검증, 필터 수락, 입력 변환을 담당합니다.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::context::RequestContext;
use super::rule::{Scenario, ValidationRule};
use crate::error::{Error, Result};
use crate::schema::{FieldDescriptor, FilterMap, TableDescriptor};

/// 필드 -> 에러 메시지
pub type ValidationErrors = BTreeMap<String, String>;

/// 테이블 단위 검증기
pub struct Validator<'a> {
    table: &'a TableDescriptor,
}

impl<'a> Validator<'a> {
    pub fn new(table: &'a TableDescriptor) -> Self {
        Self { table }
    }

    /// 해당 작업에 적용되는 규칙 (정적 규칙 다음 동적 규칙, 선언 순서 유지)
    pub fn rules_for(
        &self,
        field: &FieldDescriptor,
        scenario: Scenario,
        ctx: &RequestContext,
    ) -> Result<Vec<ValidationRule>> {
        let mut rules: Vec<ValidationRule> = field
            .rules
            .iter()
            .filter(|r| r.applies_to(scenario))
            .cloned()
            .collect();

        if let Some(provider) = &field.rule_provider {
            rules.extend(provider(ctx)?.into_iter().filter(|r| r.applies_to(scenario)));
        }

        Ok(rules)
    }

    /// 입력 검증
    ///
    /// 필드마다 적용되는 모든 규칙을 순서대로 실행하며, 마지막으로 실패한 규칙의 메시지가 남습니다.
    /// 입력 변환 실패는 규칙 에러를 덮어씁니다. 에러가 없으면 빈 맵을 반환합니다.
    pub fn validate(
        &self,
        fields: &[String],
        scenario: Scenario,
        input: &Map<String, Value>,
        ctx: &RequestContext,
    ) -> Result<ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for field in self.table.fields_for(fields) {
            let value = input.get(&field.name).unwrap_or(&Value::Null);

            for rule in self.rules_for(field, scenario, ctx)? {
                if let Err(message) = rule.validate(value) {
                    errors.insert(field.name.clone(), message);
                }
            }

            if let (Some(convert), false) = (&field.input_converter, value.is_null()) {
                if let Err(message) = convert(value) {
                    errors.insert(field.name.clone(), message);
                }
            }
        }

        if !errors.is_empty() {
            tracing::debug!(
                "validation failed for '{}' ({}): {:?}",
                self.table.name,
                scenario,
                errors
            );
        }

        Ok(errors)
    }

    /// 입력 검증 후 에러가 있으면 `Error::Validation`
    pub fn check(
        &self,
        fields: &[String],
        scenario: Scenario,
        input: &Map<String, Value>,
        ctx: &RequestContext,
    ) -> Result<()> {
        let errors = self.validate(fields, scenario, input, ctx)?;
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation { errors })
        }
    }

    /// 필터 수락
    ///
    /// - 일반 키: 필터 허용 필드이고, 값이 비어있지 않으며, 필드의 정적 규칙을 모두 통과해야 함
    /// - dotted 키(`alias.column`): 검증 없이 통과
    ///
    /// 거부된 항목은 에러 없이 제외됩니다.
    pub fn accept_filters(&self, filterable: &[String], submitted: &FilterMap) -> FilterMap {
        let mut accepted = FilterMap::new();

        for field in self.table.fields_for(filterable) {
            let Some(raw) = submitted.get(&field.name) else {
                continue;
            };
            if raw.is_empty() {
                continue;
            }

            let value = Value::String(raw.to_string());
            match field.rules.iter().find_map(|r| r.validate(&value).err()) {
                Some(message) => {
                    tracing::debug!("filter '{}' dropped: {}", field.name, message);
                }
                None => accepted.insert(field.name.clone(), raw),
            }
        }

        for (key, value) in submitted.iter() {
            if FilterMap::split_dotted(key).is_some() {
                accepted.insert(key, value);
            }
        }

        accepted
    }

    /// 입력 변환
    ///
    /// 작업 필드 중 제출된 것만 남기고 입력 변환기를 적용합니다.
    /// 변환에 실패한 값은 제외됩니다 (검증 단계에서 이미 보고됨).
    pub fn map_input(&self, fields: &[String], input: &Map<String, Value>) -> BTreeMap<String, Value> {
        let mut mapped = BTreeMap::new();

        for field in self.table.fields_for(fields) {
            let Some(value) = input.get(&field.name) else {
                continue;
            };

            match (&field.input_converter, value.is_null()) {
                (Some(convert), false) => match convert(value) {
                    Ok(converted) => {
                        mapped.insert(field.name.clone(), converted);
                    }
                    Err(message) => {
                        tracing::warn!("skipping '{}': {}", field.name, message);
                    }
                },
                _ => {
                    mapped.insert(field.name.clone(), value.clone());
                }
            }
        }

        mapped
    }
}

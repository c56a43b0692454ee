//! 테이블 정의 YAML 파서
//!
//! 정적인 부분(필드, 규칙, 옵션, 액션, JOIN)만 YAML로 선언합니다.
//! 변환기, provider, 훅은 파싱 이후 코드에서 붙입니다.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::action::{
    Actions, AddAction, DefrecAction, DeleteAction, ListAction, UpdateAction, ViewAction,
};
use super::catalog::Catalog;
use super::field::{FieldDescriptor, FieldOption};
use super::query::{Connector, JoinSpec, WhereClause, WhereField};
use super::table::TableDescriptor;
use super::types::{FieldType, FormType};
use crate::error::{Error, Result};
use crate::validation::ValidationRule;

/// 정의 파서
pub struct DescriptorParser;

impl DescriptorParser {
    /// 단일 YAML 문자열 파싱 (테이블 이름순)
    pub fn parse_yaml(yaml: &str) -> Result<Vec<TableDescriptor>> {
        let raw: RawDocument = serde_yaml::from_str(yaml)?;
        let mut tables = Vec::new();
        for (name, raw_table) in raw.tables {
            let table = Self::convert_raw_table(name, raw_table)?;
            table.validate()?;
            tables.push(table);
        }
        Ok(tables)
    }

    /// 여러 YAML 문서를 파싱하여 Catalog 생성
    pub fn parse_multiple(yamls: &[&str]) -> Result<Catalog> {
        let mut catalog = Catalog::new();
        for yaml in yamls {
            for table in Self::parse_yaml(yaml)? {
                catalog.add_table(table)?;
            }
        }
        tracing::debug!("loaded {} table descriptors", catalog.len());
        Ok(catalog)
    }

    fn convert_raw_table(name: String, raw: RawTable) -> Result<TableDescriptor> {
        let primary_key_type = match raw.primary_key_type.as_deref() {
            Some(type_name) => Self::parse_field_type(type_name)?,
            None => FieldType::Int,
        };

        let fields = raw
            .fields
            .into_iter()
            .map(Self::convert_raw_field)
            .collect::<Result<Vec<_>>>()?;

        Ok(TableDescriptor {
            name,
            primary_key: raw.primary_key.unwrap_or_else(|| "id".to_string()),
            primary_key_type,
            fields,
            actions: Self::convert_raw_actions(raw.actions.unwrap_or_default()),
        })
    }

    fn convert_raw_field(raw: RawField) -> Result<FieldDescriptor> {
        let field_type = Self::parse_field_type(raw.field_type.as_deref().unwrap_or("string"))?;
        let mut field = FieldDescriptor::new(raw.name, field_type);
        if let Some(title) = raw.title {
            field.title = title;
        }
        field.form_type = raw.form_type;
        field.example = raw.example;
        field.select_function = raw.select;
        field.rules = raw.check;
        field.options = raw.options;
        Ok(field)
    }

    fn parse_field_type(type_name: &str) -> Result<FieldType> {
        FieldType::from_simple_str(type_name).ok_or_else(|| Error::InvalidFieldType {
            type_name: type_name.to_string(),
        })
    }

    fn convert_raw_actions(raw: RawActions) -> Actions {
        let list = raw.list.map(|l| {
            let mut action = ListAction {
                label: l.label,
                fields: l.fields,
                size: l.size,
                max_size: l.max_size,
                joins: l.join,
                search: l.search,
                filter: l.filter,
                extra: l.extra,
                ..Default::default()
            };
            if let Some(clause) = l.r#where.map(Self::convert_raw_where) {
                action = action.with_where(clause);
            }
            action
        });

        let view = raw.view.map(|v| ViewAction {
            label: v.label,
            fields: v.fields,
            joins: v.join,
            r#where: v.r#where.map(Self::convert_raw_where),
            by: v.by,
            ..Default::default()
        });

        let add = raw.add.map(|a| AddAction {
            label: a.label,
            fields: a.fields,
            ..Default::default()
        });

        let update = raw.update.map(|u| UpdateAction {
            label: u.label,
            fields: u.fields,
            by: u.by,
            ..Default::default()
        });

        let delete = raw.delete.map(|d| DeleteAction {
            label: d.label,
            by: d.by,
            ..Default::default()
        });

        let defrec = match raw.defrec {
            Some(d) => Some(DefrecAction {
                label: d.label,
                ..Default::default()
            }),
            None if add.is_some() => Some(DefrecAction::default()),
            None => None,
        };

        Actions {
            list,
            view,
            add,
            update,
            delete,
            defrec,
        }
    }

    fn convert_raw_where(raw: Vec<RawPredicate>) -> WhereClause {
        let mut clause = WhereClause::empty();
        for predicate in raw {
            clause.fields.push(WhereField {
                name: predicate.field,
                connector: predicate.connector,
            });
            clause.values.push(predicate.value);
        }
        clause
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Raw YAML 구조체 (serde 역직렬화용)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawDocument {
    tables: BTreeMap<String, RawTable>,
}

#[derive(Debug, Deserialize)]
struct RawTable {
    primary_key: Option<String>,
    primary_key_type: Option<String>,
    #[serde(default)]
    fields: Vec<RawField>,
    actions: Option<RawActions>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    field_type: Option<String>,
    title: Option<String>,
    form_type: Option<FormType>,
    example: Option<String>,
    select: Option<String>,
    #[serde(default)]
    check: Vec<ValidationRule>,
    #[serde(default)]
    options: Vec<FieldOption>,
}

#[derive(Debug, Default, Deserialize)]
struct RawActions {
    list: Option<RawList>,
    view: Option<RawView>,
    add: Option<RawAdd>,
    update: Option<RawUpdate>,
    delete: Option<RawDelete>,
    defrec: Option<RawDefrec>,
}

#[derive(Debug, Deserialize)]
struct RawList {
    #[serde(default)]
    label: String,
    #[serde(default)]
    fields: Vec<String>,
    size: Option<u64>,
    max_size: Option<u64>,
    #[serde(default)]
    join: Vec<JoinSpec>,
    #[serde(default)]
    search: Vec<String>,
    #[serde(default)]
    filter: Vec<String>,
    extra: Option<Value>,
    r#where: Option<Vec<RawPredicate>>,
}

#[derive(Debug, Deserialize)]
struct RawView {
    #[serde(default)]
    label: String,
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default)]
    join: Vec<JoinSpec>,
    r#where: Option<Vec<RawPredicate>>,
    #[serde(default)]
    by: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawAdd {
    #[serde(default)]
    label: String,
    #[serde(default)]
    fields: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawUpdate {
    #[serde(default)]
    label: String,
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default)]
    by: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawDelete {
    #[serde(default)]
    label: String,
    #[serde(default)]
    by: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawDefrec {
    #[serde(default)]
    label: String,
}

#[derive(Debug, Deserialize)]
struct RawPredicate {
    field: String,
    value: Value,
    #[serde(default)]
    connector: Connector,
}

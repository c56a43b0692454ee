//! 액션 정의
//!
//! 테이블마다 활성화된 작업(list, view, add, update, delete, defrec)과
//! 각 작업의 필드, JOIN, 훅을 정의합니다.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::query::{JoinSpec, WhereClause};
use crate::error::Result;
use crate::validation::RequestContext;

/// 작업 전 훅 (에러 시 작업 중단)
pub type BeforeHook = Arc<dyn Fn(&RequestContext) -> Result<()> + Send + Sync>;

/// 작업 성공 후 훅
pub type AfterHook = Arc<dyn Fn(&RequestContext) + Send + Sync>;

/// 요청별 WHERE 절 provider
pub type WhereProvider = Arc<dyn Fn(&RequestContext) -> Result<Option<WhereClause>> + Send + Sync>;

/// 작업 이름
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    List,
    View,
    Add,
    Update,
    Delete,
    Defrec,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::View => "view",
            Operation::Add => "add",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Defrec => "defrec",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 작업 전/후 훅
#[derive(Clone, Default)]
pub struct Hooks {
    pub before: Option<BeforeHook>,
    pub after: Option<AfterHook>,
}

impl Hooks {
    pub fn before<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestContext) -> Result<()> + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(f));
        self
    }

    pub fn after<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestContext) + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(f));
        self
    }

    pub fn run_before(&self, ctx: &RequestContext) -> Result<()> {
        match &self.before {
            Some(hook) => hook(ctx),
            None => Ok(()),
        }
    }

    pub fn run_after(&self, ctx: &RequestContext) {
        if let Some(hook) = &self.after {
            hook(ctx);
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

/// 목록 조회
#[derive(Clone, Default)]
pub struct ListAction {
    pub label: String,
    pub fields: Vec<String>,
    /// 기본 페이지 크기
    pub size: Option<u64>,
    /// 최대 페이지 크기
    pub max_size: Option<u64>,
    pub joins: Vec<JoinSpec>,
    pub where_provider: Option<WhereProvider>,
    /// 검색 대상 필드
    pub search: Vec<String>,
    /// 필터 허용 필드
    pub filter: Vec<String>,
    /// 목록 응답에 그대로 실리는 부가 데이터
    pub extra: Option<Value>,
    pub hooks: Hooks,
}

impl ListAction {
    pub fn new(fields: &[&str]) -> Self {
        Self {
            fields: to_strings(fields),
            ..Default::default()
        }
    }

    pub fn join(mut self, join: JoinSpec) -> Self {
        self.joins.push(join);
        self
    }

    pub fn search(mut self, fields: &[&str]) -> Self {
        self.search = to_strings(fields);
        self
    }

    pub fn filter(mut self, fields: &[&str]) -> Self {
        self.filter = to_strings(fields);
        self
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn max_size(mut self, max_size: u64) -> Self {
        self.max_size = Some(max_size);
        self
    }

    pub fn extra(mut self, extra: Value) -> Self {
        self.extra = Some(extra);
        self
    }

    pub fn where_from<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestContext) -> Result<Option<WhereClause>> + Send + Sync + 'static,
    {
        self.where_provider = Some(Arc::new(f));
        self
    }

    /// 고정 WHERE 절
    pub fn with_where(self, clause: WhereClause) -> Self {
        self.where_from(move |_| Ok(Some(clause.clone())))
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// 요청 시점 WHERE 절
    pub fn where_for(&self, ctx: &RequestContext) -> Result<Option<WhereClause>> {
        match &self.where_provider {
            Some(provider) => provider(ctx),
            None => Ok(None),
        }
    }
}

/// 단건 조회
#[derive(Debug, Clone, Default)]
pub struct ViewAction {
    pub label: String,
    pub fields: Vec<String>,
    pub joins: Vec<JoinSpec>,
    pub r#where: Option<WhereClause>,
    /// 조회 키로 허용되는 컬럼
    pub by: Vec<String>,
    pub hooks: Hooks,
}

impl ViewAction {
    pub fn new(fields: &[&str], by: &[&str]) -> Self {
        Self {
            fields: to_strings(fields),
            by: to_strings(by),
            ..Default::default()
        }
    }

    pub fn join(mut self, join: JoinSpec) -> Self {
        self.joins.push(join);
        self
    }

    pub fn with_where(mut self, clause: WhereClause) -> Self {
        self.r#where = Some(clause);
        self
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }
}

/// 생성
#[derive(Debug, Clone, Default)]
pub struct AddAction {
    pub label: String,
    pub fields: Vec<String>,
    pub hooks: Hooks,
}

impl AddAction {
    pub fn new(fields: &[&str]) -> Self {
        Self {
            fields: to_strings(fields),
            ..Default::default()
        }
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }
}

/// 수정
#[derive(Debug, Clone, Default)]
pub struct UpdateAction {
    pub label: String,
    pub fields: Vec<String>,
    pub by: Vec<String>,
    pub hooks: Hooks,
}

impl UpdateAction {
    pub fn new(fields: &[&str], by: &[&str]) -> Self {
        Self {
            fields: to_strings(fields),
            by: to_strings(by),
            ..Default::default()
        }
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }
}

/// 삭제
#[derive(Debug, Clone, Default)]
pub struct DeleteAction {
    pub label: String,
    pub by: Vec<String>,
    pub hooks: Hooks,
}

impl DeleteAction {
    pub fn new(by: &[&str]) -> Self {
        Self {
            by: to_strings(by),
            ..Default::default()
        }
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }
}

/// 폼 정의(defrec) 조회
#[derive(Debug, Clone, Default)]
pub struct DefrecAction {
    pub label: String,
    pub hooks: Hooks,
}

/// 테이블의 활성화된 작업 집합
#[derive(Debug, Clone, Default)]
pub struct Actions {
    pub list: Option<ListAction>,
    pub view: Option<ViewAction>,
    pub add: Option<AddAction>,
    pub update: Option<UpdateAction>,
    pub delete: Option<DeleteAction>,
    pub defrec: Option<DefrecAction>,
}

impl Actions {
    /// 활성화된 작업과 라벨
    pub fn enabled(&self) -> BTreeMap<Operation, &str> {
        let mut enabled = BTreeMap::new();
        if let Some(a) = &self.list {
            enabled.insert(Operation::List, a.label.as_str());
        }
        if let Some(a) = &self.view {
            enabled.insert(Operation::View, a.label.as_str());
        }
        if let Some(a) = &self.add {
            enabled.insert(Operation::Add, a.label.as_str());
        }
        if let Some(a) = &self.update {
            enabled.insert(Operation::Update, a.label.as_str());
        }
        if let Some(a) = &self.delete {
            enabled.insert(Operation::Delete, a.label.as_str());
        }
        if let Some(a) = &self.defrec {
            enabled.insert(Operation::Defrec, a.label.as_str());
        }
        enabled
    }

    pub fn is_enabled(&self, operation: Operation) -> bool {
        self.enabled().contains_key(&operation)
    }
}

impl fmt::Debug for ListAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListAction")
            .field("label", &self.label)
            .field("fields", &self.fields)
            .field("size", &self.size)
            .field("max_size", &self.max_size)
            .field("joins", &self.joins)
            .field("where_provider", &self.where_provider.is_some())
            .field("search", &self.search)
            .field("filter", &self.filter)
            .field("extra", &self.extra)
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// 라우팅 계층에 노출하는 기능 목록
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Features {
    pub table: String,
    pub actions: BTreeMap<Operation, FeatureAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureAction {
    pub label: String,
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

//! 테이블 서비스
//!
//! 라우팅 계층이 호출하는 작업 단위 진입점입니다.
//! 작업 활성화 확인, 조회 키 검사, 훅, 입력 검증/변환, 필터 수락, 페이지네이션 기본값을
//! 처리한 뒤 실행기에 위임합니다.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use reqgen_core::schema::{Features, FieldSpec, FilterMap, Operation, TableDescriptor};
use reqgen_core::validation::{RequestContext, Scenario, Validator};
use reqgen_core::{Error, Result};

use crate::client::SqlClient;
use crate::config::Config;
use crate::executor::{Executor, InsertOutcome};
use crate::export::render_csv;
use crate::mapper::Record;
use crate::params::{Pagination, SelectParams};

/// 목록 요청
#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    /// 0부터 시작 (음수는 0)
    pub page: i64,
    /// 0 이하면 기본 크기
    pub size: i64,
    pub search: Option<String>,
    pub filter: FilterMap,
    /// 응답에 필드 제목(heads) 포함
    pub with_heads: bool,
    /// 응답에 필터 필드 메타데이터 포함
    pub with_filters: bool,
}

/// 목록 응답
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListPage {
    pub count: u64,
    pub page: u64,
    pub size: u64,
    /// 목록 작업에 정의된 부가 데이터 (없으면 null)
    pub extra: Value,
    pub rows: Vec<Record>,
    /// 필드 이름 -> 제목 (요청하지 않으면 비어 있음)
    pub heads: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<BTreeMap<String, FieldSpec>>,
}

impl ListPage {
    /// 행을 탭 구분 CSV로 내보내기
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        render_csv(&self.rows)
    }
}

/// 테이블 하나에 대한 서비스
#[derive(Clone)]
pub struct TableService {
    table: Arc<TableDescriptor>,
    client: Arc<dyn SqlClient>,
    config: Arc<Config>,
}

impl TableService {
    /// 서비스 생성 (테이블 정의를 검증합니다)
    pub fn new(
        table: Arc<TableDescriptor>,
        client: Arc<dyn SqlClient>,
        config: Arc<Config>,
    ) -> Result<Self> {
        table.validate()?;
        Ok(Self { table, client, config })
    }

    pub fn table(&self) -> &TableDescriptor {
        &self.table
    }

    /// 활성화된 작업 목록
    pub fn features(&self) -> Features {
        self.table.features()
    }

    /// 목록 조회
    #[tracing::instrument(skip_all, fields(table = %self.table.name, request_id = %ctx.request_id))]
    pub async fn list(&self, ctx: &RequestContext, request: ListRequest) -> Result<ListPage> {
        let action = self
            .table
            .actions
            .list
            .as_ref()
            .ok_or_else(|| self.disabled(Operation::List))?;

        action.hooks.run_before(ctx)?;

        let pagination = Pagination::normalize(
            request.page,
            request.size,
            action.size.unwrap_or(self.config.default_page_size),
            action.max_size,
        );
        let filter = Validator::new(&self.table).accept_filters(&action.filter, &request.filter);
        let search = request.search.filter(|s| !s.is_empty());

        let params = SelectParams::new(&action.fields)
            .joins(&action.joins)
            .with_where(action.where_for(ctx)?)
            .search(search, &action.search)
            .filter(filter)
            .page(pagination);

        let result = self.executor().list(&self.table, &params).await?;

        let heads = if request.with_heads {
            self.table.heads(&action.fields)
        } else {
            BTreeMap::new()
        };
        let filters = if request.with_filters {
            Some(self.table.filter_specs(&action.filter, ctx)?)
        } else {
            None
        };

        action.hooks.run_after(ctx);

        Ok(ListPage {
            count: result.count,
            page: pagination.page,
            size: pagination.size,
            extra: action.extra.clone().unwrap_or(Value::Null),
            rows: result.rows,
            heads,
            filters,
        })
    }

    /// 단건 조회
    #[tracing::instrument(skip_all, fields(table = %self.table.name, request_id = %ctx.request_id))]
    pub async fn view(&self, ctx: &RequestContext, key: &str, value: &Value) -> Result<Record> {
        let action = self
            .table
            .actions
            .view
            .as_ref()
            .ok_or_else(|| self.disabled(Operation::View))?;

        self.check_lookup(&action.by, key, value)?;
        action.hooks.run_before(ctx)?;

        let params = SelectParams::new(&action.fields)
            .joins(&action.joins)
            .lookup(key, value.clone())
            .with_where(action.r#where.clone());

        let record = self.executor().view(&self.table, &params).await?;

        action.hooks.run_after(ctx);
        Ok(record)
    }

    /// 생성
    #[tracing::instrument(skip_all, fields(table = %self.table.name, request_id = %ctx.request_id))]
    pub async fn add(&self, ctx: &RequestContext, input: &Map<String, Value>) -> Result<InsertOutcome> {
        let action = self
            .table
            .actions
            .add
            .as_ref()
            .ok_or_else(|| self.disabled(Operation::Add))?;

        action.hooks.run_before(ctx)?;

        let validator = Validator::new(&self.table);
        validator.check(&action.fields, Scenario::Add, input, ctx)?;
        let data = validator.map_input(&action.fields, input);

        let outcome = self.executor().insert(&self.table, &data).await?;

        action.hooks.run_after(ctx);
        Ok(outcome)
    }

    /// 수정 후 수정된 레코드 반환
    #[tracing::instrument(skip_all, fields(table = %self.table.name, request_id = %ctx.request_id))]
    pub async fn update(
        &self,
        ctx: &RequestContext,
        key: &str,
        value: &Value,
        input: &Map<String, Value>,
    ) -> Result<Record> {
        let action = self
            .table
            .actions
            .update
            .as_ref()
            .ok_or_else(|| self.disabled(Operation::Update))?;

        self.check_lookup(&action.by, key, value)?;
        action.hooks.run_before(ctx)?;

        let validator = Validator::new(&self.table);
        validator.check(&action.fields, Scenario::Update, input, ctx)?;
        let data = validator.map_input(&action.fields, input);

        let record = self
            .executor()
            .update(&self.table, &action.fields, &data, key, value)
            .await?;

        action.hooks.run_after(ctx);
        Ok(record)
    }

    /// 삭제
    #[tracing::instrument(skip_all, fields(table = %self.table.name, request_id = %ctx.request_id))]
    pub async fn delete(&self, ctx: &RequestContext, key: &str, value: &Value) -> Result<()> {
        let action = self
            .table
            .actions
            .delete
            .as_ref()
            .ok_or_else(|| self.disabled(Operation::Delete))?;

        self.check_lookup(&action.by, key, value)?;
        action.hooks.run_before(ctx)?;

        self.executor().delete(&self.table, key, value).await?;

        action.hooks.run_after(ctx);
        Ok(())
    }

    /// 폼 정의 (필드 선언 순서)
    pub fn defrec(&self, ctx: &RequestContext) -> Result<Vec<FieldSpec>> {
        let action = self
            .table
            .actions
            .defrec
            .as_ref()
            .ok_or_else(|| self.disabled(Operation::Defrec))?;

        action.hooks.run_before(ctx)?;
        let specs = self.table.defrec(ctx)?;
        action.hooks.run_after(ctx);
        Ok(specs)
    }

    fn executor(&self) -> Executor<'_> {
        Executor::new(self.client.as_ref(), &self.config)
    }

    fn disabled(&self, operation: Operation) -> Error {
        Error::OperationDisabled {
            table: self.table.name.clone(),
            operation: operation.to_string(),
        }
    }

    /// 조회 키 검사
    ///
    /// `by`가 비어있으면 primary key만 허용합니다.
    fn check_lookup(&self, by: &[String], key: &str, value: &Value) -> Result<()> {
        let allowed = if by.is_empty() {
            vec![self.table.primary_key.clone()]
        } else {
            by.to_vec()
        };

        if !allowed.iter().any(|k| k == key) {
            return Err(Error::InvalidKey {
                key: key.to_string(),
                allowed,
            });
        }

        let empty = match value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        };
        if empty {
            return Err(Error::BadRequest {
                message: format!("lookup value for '{key}' cannot be empty"),
            });
        }

        Ok(())
    }
}

//! 실행기
//!
//! 빌더, 클라이언트, 매퍼를 묶어 목록/단건 조회와 생성/수정/삭제를 수행합니다.
//! 작업 사이에 트랜잭션은 없습니다.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use reqgen_core::schema::TableDescriptor;
use reqgen_core::{Error, Result};

use crate::builder::{DeleteBuilder, InsertBuilder, UpdateBuilder};
use crate::client::SqlClient;
use crate::config::Config;
use crate::mapper::{PhysicalRow, Record, RowMapper};
use crate::params::{Pagination, SelectParams};
use crate::select::SelectBuilder;

/// 목록 조회 결과
#[derive(Debug, Clone, PartialEq)]
pub struct ListResult {
    pub rows: Vec<Record>,
    pub count: u64,
}

/// 생성 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertOutcome {
    /// 생성된 primary key 값 (DB가 돌려준 타입 그대로)
    pub value: Value,
    /// primary key 컬럼 이름
    pub primary_key: String,
}

/// SQL 실행기
pub struct Executor<'a> {
    client: &'a dyn SqlClient,
    config: &'a Config,
}

impl<'a> Executor<'a> {
    pub fn new(client: &'a dyn SqlClient, config: &'a Config) -> Self {
        Self { client, config }
    }

    /// 목록 조회 + 전체 개수
    #[tracing::instrument(skip_all, fields(table = %table.name))]
    pub async fn list(&self, table: &TableDescriptor, params: &SelectParams) -> Result<ListResult> {
        let builder = SelectBuilder::new(table, &self.config.schema);

        let rows = self.client.fetch_all(&builder.build(params)).await?;
        let rows = RowMapper::new(table, params).map_rows(rows)?;

        let count_rows = self.client.fetch_all(&builder.build_count(params)).await?;
        let count = total_count(&count_rows, !params.joins.is_empty());

        tracing::debug!("listed {} rows (total {})", rows.len(), count);
        Ok(ListResult { rows, count })
    }

    /// 단건 조회 (`params.lookup` 필요)
    #[tracing::instrument(skip_all, fields(table = %table.name))]
    pub async fn view(&self, table: &TableDescriptor, params: &SelectParams) -> Result<Record> {
        if params.lookup.is_none() {
            return Err(Error::BadRequest {
                message: "view requires a lookup key".to_string(),
            });
        }

        let params = params.clone().page(Pagination::single());
        let stmt = SelectBuilder::new(table, &self.config.schema).build(&params);

        let row = self
            .client
            .fetch_all(&stmt)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                table: table.name.clone(),
            })?;

        RowMapper::new(table, &params).map_row(row)
    }

    /// 생성
    #[tracing::instrument(skip_all, fields(table = %table.name))]
    pub async fn insert(&self, table: &TableDescriptor, data: &BTreeMap<String, Value>) -> Result<InsertOutcome> {
        let stmt = InsertBuilder::new(table, self.config).build(data, now())?;
        let row = self.client.fetch_optional(&stmt).await?;

        let value = row
            .and_then(|r| r.cells.into_iter().next())
            .filter(|v| !v.is_null())
            .ok_or_else(|| Error::Database {
                message: format!("insert into '{}' returned no primary key", table.name),
            })?;

        tracing::info!("inserted into '{}' ({} = {})", table.name, table.primary_key, value);

        Ok(InsertOutcome {
            value,
            primary_key: table.primary_key.clone(),
        })
    }

    /// 수정 후 재조회
    ///
    /// 수정된 행이 없으면 `NotFound`. 키 컬럼 자체를 바꾼 경우 새 값으로 재조회합니다.
    #[tracing::instrument(skip_all, fields(table = %table.name))]
    pub async fn update(
        &self,
        table: &TableDescriptor,
        fields: &[String],
        data: &BTreeMap<String, Value>,
        key: &str,
        value: &Value,
    ) -> Result<Record> {
        let stmt = UpdateBuilder::new(table, self.config).build(data, key, value, now());
        let affected = self.client.execute(&stmt).await?;
        if affected == 0 {
            return Err(Error::NotFound {
                table: table.name.clone(),
            });
        }

        tracing::info!("updated {} row(s) in '{}'", affected, table.name);

        let lookup_value = data.get(key).unwrap_or(value).clone();
        let params = SelectParams::new(fields).lookup(key, lookup_value);
        self.view(table, &params).await
    }

    /// 삭제
    #[tracing::instrument(skip_all, fields(table = %table.name))]
    pub async fn delete(&self, table: &TableDescriptor, key: &str, value: &Value) -> Result<()> {
        let stmt = DeleteBuilder::new(table, self.config).build(key, value);
        let affected = self.client.execute(&stmt).await?;
        if affected == 0 {
            return Err(Error::NotFound {
                table: table.name.clone(),
            });
        }

        tracing::info!("deleted {} row(s) from '{}'", affected, table.name);
        Ok(())
    }
}

/// 전체 개수
///
/// JOIN이 있으면 카운트 쿼리의 행 수, 없으면 카운트 값의 합입니다.
fn total_count(rows: &[PhysicalRow], has_joins: bool) -> u64 {
    if has_joins {
        return rows.len() as u64;
    }
    rows.iter()
        .filter_map(|r| r.cells.first())
        .filter_map(Value::as_u64)
        .sum()
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

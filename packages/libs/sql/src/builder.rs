//! INSERT/UPDATE/DELETE SQL 빌더
//!
//! SeaQuery로 SQL을 만들고 값은 모두 `$N` placeholder로 바인딩합니다.
//! 입력 맵은 `BTreeMap`이므로 컬럼 순서는 항상 사전순입니다.

use std::collections::BTreeMap;

use sea_query::{Expr, Iden, PostgresQueryBuilder, Query, SimpleExpr, Value as SqlValue};
use serde_json::Value;

use reqgen_core::schema::TableDescriptor;
use reqgen_core::{Error, Result};

use crate::config::Config;
use crate::statement::{bind_value, quote_ident, Statement};

/// 동적 테이블/컬럼 식별자
#[derive(Debug, Clone)]
struct DynIden(String);

impl Iden for DynIden {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        // String에 쓰는 경우만 있으므로 실패하지 않음
        let _ = write!(s, "{}", self.0);
    }
}

/// INSERT 쿼리 빌더
pub struct InsertBuilder<'a> {
    table: &'a TableDescriptor,
    config: &'a Config,
}

impl<'a> InsertBuilder<'a> {
    pub fn new(table: &'a TableDescriptor, config: &'a Config) -> Self {
        Self { table, config }
    }

    /// SQL 생성
    ///
    /// 데이터 컬럼(사전순) 다음에 생성/수정 시각 컬럼이 붙고, primary key를 RETURNING 합니다.
    pub fn build(&self, data: &BTreeMap<String, Value>, now: i64) -> Result<Statement> {
        let mut query = Query::insert();
        query.into_table((
            DynIden(self.config.schema.clone()),
            DynIden(self.table.name.clone()),
        ));

        let mut columns = Vec::new();
        let mut values: Vec<SimpleExpr> = Vec::new();

        for (col, val) in data {
            columns.push(DynIden(col.clone()));
            values.push(self.value_expr(col, val));
        }

        columns.push(DynIden(self.config.created_column.clone()));
        values.push(SimpleExpr::Value(now.into()));
        columns.push(DynIden(self.config.updated_column.clone()));
        values.push(SimpleExpr::Value(now.into()));

        query.columns(columns);
        query.values(values).map_err(|e| Error::BadRequest {
            message: e.to_string(),
        })?;
        query.returning_col(DynIden(self.table.primary_key.clone()));

        let (sql, values) = query.build(PostgresQueryBuilder);
        Ok(Statement { sql, values })
    }

    fn value_expr(&self, column: &str, value: &Value) -> SimpleExpr {
        SimpleExpr::Value(typed_value(self.table, column, value))
    }
}

/// UPDATE 쿼리 빌더
pub struct UpdateBuilder<'a> {
    table: &'a TableDescriptor,
    config: &'a Config,
}

impl<'a> UpdateBuilder<'a> {
    pub fn new(table: &'a TableDescriptor, config: &'a Config) -> Self {
        Self { table, config }
    }

    /// SQL 생성
    ///
    /// SET 절은 데이터 컬럼(사전순) 다음에 수정 시각, WHERE는 `key = value` 하나입니다.
    pub fn build(&self, data: &BTreeMap<String, Value>, key: &str, value: &Value, now: i64) -> Statement {
        let mut query = Query::update();
        query.table((
            DynIden(self.config.schema.clone()),
            DynIden(self.table.name.clone()),
        ));

        // SET 절
        for (col, val) in data {
            query.value(DynIden(col.clone()), SimpleExpr::Value(typed_value(self.table, col, val)));
        }
        query.value(
            DynIden(self.config.updated_column.clone()),
            SimpleExpr::Value(now.into()),
        );

        // WHERE 절
        query.and_where(key_condition(self.table, key, value));

        let (sql, values) = query.build(PostgresQueryBuilder);
        Statement { sql, values }
    }
}

/// DELETE 쿼리 빌더
pub struct DeleteBuilder<'a> {
    table: &'a TableDescriptor,
    config: &'a Config,
}

impl<'a> DeleteBuilder<'a> {
    pub fn new(table: &'a TableDescriptor, config: &'a Config) -> Self {
        Self { table, config }
    }

    /// SQL 생성
    pub fn build(&self, key: &str, value: &Value) -> Statement {
        let mut query = Query::delete();
        query.from_table((
            DynIden(self.config.schema.clone()),
            DynIden(self.table.name.clone()),
        ));

        // WHERE 절
        query.and_where(key_condition(self.table, key, value));

        let (sql, values) = query.build(PostgresQueryBuilder);
        Statement { sql, values }
    }
}

/// 선언 타입에 맞춘 바인딩 값
fn typed_value(table: &TableDescriptor, column: &str, value: &Value) -> SqlValue {
    let field_type = table.column_type(column);
    match field_type {
        Some(t) => bind_value(&t.coerce_value(value), Some(t)),
        None => bind_value(value, None),
    }
}

/// 조회 키 조건
///
/// 문자열로 남는 키 값은 text로 바인딩되므로 컬럼을 `::text`로 맞춰 비교합니다.
fn key_condition(table: &TableDescriptor, key: &str, value: &Value) -> SimpleExpr {
    let value = table.coerce_key(key, value);
    let bound = SimpleExpr::Value(bind_value(&value, table.column_type(key)));
    if value.is_string() {
        Expr::expr(Expr::cust(format!("{}::text", quote_ident(key)))).eq(bound)
    } else {
        Expr::col(DynIden(key.to_string())).eq(bound)
    }
}

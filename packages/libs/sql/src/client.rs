//! SQL 클라이언트
//!
//! 실행기는 `SqlClient` trait만 알고, 실제 PostgreSQL 연결은 `PgClient`가 담당합니다.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_query_binder::SqlxValues;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};

use reqgen_core::{Error, Result};

use crate::config::Config;
use crate::mapper::PhysicalRow;
use crate::statement::Statement;

/// SQL 실행 추상화
#[async_trait]
pub trait SqlClient: Send + Sync {
    /// 모든 행 조회
    async fn fetch_all(&self, stmt: &Statement) -> Result<Vec<PhysicalRow>>;

    /// 첫 행 조회 (없으면 None)
    async fn fetch_optional(&self, stmt: &Statement) -> Result<Option<PhysicalRow>>;

    /// 실행 후 영향받은 행 수
    async fn execute(&self, stmt: &Statement) -> Result<u64>;
}

/// PostgreSQL 클라이언트
#[derive(Debug, Clone)]
pub struct PgClient {
    pool: PgPool,
    timeout: Option<Duration>,
}

impl PgClient {
    pub fn new(pool: PgPool, timeout: Option<Duration>) -> Self {
        Self { pool, timeout }
    }

    /// 설정으로 커넥션 풀 생성
    pub async fn connect(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .map_err(classify)?;

        tracing::info!("connected to database (max {} connections)", config.max_connections);

        Ok(Self::new(pool, config.statement_timeout()))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn with_timeout<T, F>(&self, sql: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>> + Send,
    {
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                tracing::warn!("statement timed out after {:?}: {}", limit, sql);
                Error::Timeout {
                    message: format!("statement exceeded {limit:?}"),
                }
            })?,
            None => fut.await,
        };
        result.map_err(classify)
    }
}

#[async_trait]
impl SqlClient for PgClient {
    async fn fetch_all(&self, stmt: &Statement) -> Result<Vec<PhysicalRow>> {
        let query = sqlx::query_with(&stmt.sql, SqlxValues(stmt.values.clone()));
        let rows = self.with_timeout(&stmt.sql, query.fetch_all(&self.pool)).await?;
        Ok(rows.iter().map(decode_row).collect())
    }

    async fn fetch_optional(&self, stmt: &Statement) -> Result<Option<PhysicalRow>> {
        let query = sqlx::query_with(&stmt.sql, SqlxValues(stmt.values.clone()));
        let row = self.with_timeout(&stmt.sql, query.fetch_optional(&self.pool)).await?;
        Ok(row.as_ref().map(decode_row))
    }

    async fn execute(&self, stmt: &Statement) -> Result<u64> {
        let query = sqlx::query_with(&stmt.sql, SqlxValues(stmt.values.clone()));
        let done = self.with_timeout(&stmt.sql, query.execute(&self.pool)).await?;
        Ok(done.rows_affected())
    }
}

/// sqlx 에러 분류
pub fn classify(err: sqlx::Error) -> Error {
    match err {
        sqlx::Error::PoolTimedOut => Error::Timeout {
            message: "timed out acquiring a connection".to_string(),
        },
        sqlx::Error::Io(e) => Error::Connection {
            message: e.to_string(),
        },
        sqlx::Error::Tls(e) => Error::Connection {
            message: e.to_string(),
        },
        sqlx::Error::PoolClosed => Error::Connection {
            message: "connection pool is closed".to_string(),
        },
        sqlx::Error::Database(db_err) => {
            // 57014 = query_canceled (statement_timeout)
            if db_err.code().as_deref() == Some("57014") {
                return Error::Timeout {
                    message: db_err.message().to_string(),
                };
            }
            match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation
                | sqlx::error::ErrorKind::ForeignKeyViolation
                | sqlx::error::ErrorKind::NotNullViolation
                | sqlx::error::ErrorKind::CheckViolation => Error::Constraint {
                    message: db_err.message().to_string(),
                },
                _ => Error::Database {
                    message: db_err.message().to_string(),
                },
            }
        }
        other => {
            tracing::error!("database error: {:?}", other);
            Error::Database {
                message: other.to_string(),
            }
        }
    }
}

/// PgRow -> PhysicalRow (컬럼 순서 유지)
fn decode_row(row: &PgRow) -> PhysicalRow {
    let cells = (0..row.columns().len())
        .map(|index| decode_cell(row, index))
        .collect();
    PhysicalRow { cells }
}

fn decode_cell(row: &PgRow, index: usize) -> Value {
    let column = &row.columns()[index];
    let type_name = column.type_info().name().to_ascii_uppercase();

    let value = match type_name.as_str() {
        "INT2" => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map(Value::from),
        "INT4" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map(Value::from),
        "INT8" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::from),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .and_then(|v| serde_json::Number::from_f64(f64::from(v)))
            .map(Value::Number),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        "BOOL" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool),
        "JSON" | "JSONB" => row
            .try_get::<Option<Value>, _>(index)
            .ok()
            .flatten(),
        "UUID" => row
            .try_get::<Option<uuid::Uuid>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string())),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string())),
        "TIME" => row
            .try_get::<Option<chrono::NaiveTime>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string())),
        "NUMERIC" => row
            .try_get::<Option<Decimal>, _>(index)
            .ok()
            .flatten()
            .map(decimal_value),
        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => row
            .try_get::<Option<Vec<String>>, _>(index)
            .ok()
            .flatten()
            .map(Value::from),
        "INT2[]" => row
            .try_get::<Option<Vec<i16>>, _>(index)
            .ok()
            .flatten()
            .map(Value::from),
        "INT4[]" => row
            .try_get::<Option<Vec<i32>>, _>(index)
            .ok()
            .flatten()
            .map(Value::from),
        "INT8[]" => row
            .try_get::<Option<Vec<i64>>, _>(index)
            .ok()
            .flatten()
            .map(Value::from),
        "FLOAT8[]" => row
            .try_get::<Option<Vec<f64>>, _>(index)
            .ok()
            .flatten()
            .map(Value::from),
        "BOOL[]" => row
            .try_get::<Option<Vec<bool>>, _>(index)
            .ok()
            .flatten()
            .map(Value::from),
        "NUMERIC[]" => row
            .try_get::<Option<Vec<Decimal>>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Array(v.into_iter().map(decimal_value).collect())),
        "UUID[]" => row
            .try_get::<Option<Vec<uuid::Uuid>>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Array(v.into_iter().map(|u| Value::String(u.to_string())).collect())),
        "JSON[]" | "JSONB[]" => row
            .try_get::<Option<Vec<Value>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Array),
        _ => raw_text(row, index, &type_name),
    };

    value.unwrap_or(Value::Null)
}

/// NUMERIC은 정밀도를 잃지 않도록 문자열로 내보냄
fn decimal_value(value: Decimal) -> Value {
    Value::String(value.to_string())
}

/// 전용 디코더가 없는 타입 (text 계열, enum 등)
///
/// 원시 바이트가 UTF-8이면 그대로 문자열로 쓰고, 아니면 경고 후 null.
fn raw_text(row: &PgRow, index: usize, type_name: &str) -> Option<Value> {
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return v.map(Value::String);
    }

    let raw = match row.try_get_raw(index) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("column {} ({}) could not be read: {}", index, type_name, e);
            return None;
        }
    };
    if raw.is_null() {
        return None;
    }
    match raw.as_str() {
        Ok(text) => Some(Value::String(text.to_string())),
        Err(e) => {
            tracing::warn!(
                "column '{}' ({}) could not be decoded: {}",
                row.columns()[index].name(),
                type_name,
                e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_pool_errors() {
        assert!(matches!(classify(sqlx::Error::PoolTimedOut), Error::Timeout { .. }));
        assert!(matches!(classify(sqlx::Error::PoolClosed), Error::Connection { .. }));
        assert!(classify(sqlx::Error::PoolTimedOut).is_retryable());
    }

    #[test]
    fn test_classify_io_as_connection() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = classify(sqlx::Error::Io(io));
        assert!(matches!(err, Error::Connection { .. }));
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn test_numeric_keeps_exact_text() {
        let value: Decimal = "12345678901234567890.50".parse().unwrap();
        assert_eq!(decimal_value(value), Value::String("12345678901234567890.50".to_string()));
        assert_eq!(decimal_value(Decimal::new(-5, 2)), Value::String("-0.05".to_string()));
    }

    #[test]
    fn test_classify_other_as_database() {
        let err = classify(sqlx::Error::RowNotFound);
        assert!(matches!(err, Error::Database { .. }));
        assert!(!err.is_retryable());
    }
}

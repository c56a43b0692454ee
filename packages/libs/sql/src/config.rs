//! 런타임 설정

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

/// SQL 계층 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL 접속 URL
    pub database_url: String,

    /// 커넥션 풀 최대 크기
    pub max_connections: u32,

    /// 테이블 스키마 (모든 테이블 참조에 붙음)
    pub schema: String,

    /// 생성 시각 컬럼 (Unix seconds)
    pub created_column: String,

    /// 수정 시각 컬럼 (Unix seconds)
    pub updated_column: String,

    /// 기본 페이지 크기
    pub default_page_size: u64,

    /// 쿼리 타임아웃 (초, 0 = 없음)
    pub statement_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/postgres".to_string(),
            max_connections: 10,
            schema: "public".to_string(),
            created_column: "created_ts".to_string(),
            updated_column: "updated_ts".to_string(),
            default_page_size: 10,
            statement_timeout_secs: 30,
        }
    }
}

impl Config {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 변수 조회 함수로 설정 로드 (없는 변수는 기본값, 숫자 파싱 실패는 에러)
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            database_url: lookup("REQGEN_DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: parse_or(&lookup, "REQGEN_MAX_CONNECTIONS", defaults.max_connections)?,
            schema: lookup("REQGEN_SCHEMA").unwrap_or(defaults.schema),
            created_column: lookup("REQGEN_CREATED_COLUMN").unwrap_or(defaults.created_column),
            updated_column: lookup("REQGEN_UPDATED_COLUMN").unwrap_or(defaults.updated_column),
            default_page_size: parse_or(&lookup, "REQGEN_DEFAULT_PAGE_SIZE", defaults.default_page_size)?,
            statement_timeout_secs: parse_or(
                &lookup,
                "REQGEN_STATEMENT_TIMEOUT_SECS",
                defaults.statement_timeout_secs,
            )?,
        })
    }

    /// 쿼리 타임아웃
    pub fn statement_timeout(&self) -> Option<Duration> {
        match self.statement_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a number, got '{raw}'")),
        None => Ok(default),
    }
}

//! reqgen-sql: 테이블 정의 기반 PostgreSQL 쿼리 생성/실행 라이브러리
//!
//! 테이블 정의와 요청 파라미터로 SQL을 만들고, 실행 결과를 레코드로 조립합니다.
//! 값은 모두 `$N` placeholder로 바인딩됩니다.
//!
//! # 모듈 구조
//!
//! - `select`: 목록/단건/카운트 SELECT 빌더
//! - `builder`: INSERT/UPDATE/DELETE 빌더 (SeaQuery)
//! - `mapper`: 물리 행 -> 레코드
//! - `client`: SQL 클라이언트 trait과 PostgreSQL 구현
//! - `executor`: 작업 실행
//! - `service`: 훅, 검증, 필터, 페이지네이션을 포함한 테이블 단위 진입점
//! - `export`: 목록 결과의 탭 구분 CSV 내보내기
//! - `config`: 런타임 설정

pub mod builder;
pub mod client;
pub mod config;
pub mod executor;
pub mod export;
pub mod mapper;
pub mod params;
pub mod select;
pub mod service;
pub mod statement;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::{DeleteBuilder, InsertBuilder, UpdateBuilder};
pub use client::{PgClient, SqlClient};
pub use config::Config;
pub use executor::{Executor, InsertOutcome, ListResult};
pub use export::render_csv;
pub use mapper::{PhysicalRow, Record, RowMapper};
pub use params::{Lookup, Pagination, SelectParams};
pub use select::SelectBuilder;
pub use service::{ListPage, ListRequest, TableService};
pub use statement::Statement;

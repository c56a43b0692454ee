//! reqgen-core: 선언적 CRUD 엔드포인트 생성기 핵심 라이브러리
//!
//! 이 크레이트는 SQL 계층과 라우팅 계층이 공유하는 테이블 정의와 검증 로직을 제공합니다.
//!
//! # 모듈 구조
//!
//! - `schema`: 테이블/필드/액션 정의, YAML 파싱, 카탈로그
//! - `validation`: 검증 규칙, 요청 컨텍스트, 검증 엔진
//! - `error`: 공통 에러 타입

pub mod error;
pub mod schema;
pub mod validation;

pub use error::{Error, Result};

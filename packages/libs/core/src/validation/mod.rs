//! 요청 검증
//!
//! # 개요
//!
//! 필드 규칙은 작업(add/update)별로 선택되어 순서대로 실행됩니다.
//! 규칙, 변환기, provider는 요청 컨텍스트를 명시적으로 받습니다.
//!
//! # 모듈 구조
//!
//! - `rule`: 검증 규칙 정의
//! - `context`: 요청 컨텍스트
//! - `engine`: 규칙 선택, 입력 검증, 필터 수락, 입력 변환

mod context;
mod engine;
mod rule;

pub use context::RequestContext;
pub use engine::{ValidationErrors, Validator};
pub use rule::{RuleKind, Scenario, ValidationRule};

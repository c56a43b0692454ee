//! 선언적 테이블 정의
//!
//! # 개요
//!
//! 각 테이블은 필드 목록, primary key, 활성화된 작업(액션)으로 정의됩니다.
//! 정의는 코드로 직접 구성하거나 YAML에서 정적인 부분을 읽어 만들 수 있습니다.
//!
//! # 모듈 구조
//!
//! - `types`: 논리적 필드 타입
//! - `field`: 필드 정의 (변환기, 규칙, 옵션)
//! - `query`: WHERE 절, JOIN, 필터 맵
//! - `action`: 작업별 정의와 훅
//! - `table`: 테이블 정의, defrec
//! - `catalog`: 테이블 카탈로그
//! - `parser`: YAML 파싱 로직

mod action;
mod catalog;
mod field;
mod parser;
mod query;
mod table;
mod types;

pub use action::{
    Actions, AddAction, AfterHook, BeforeHook, DefrecAction, DeleteAction, FeatureAction,
    Features, Hooks, ListAction, Operation, UpdateAction, ViewAction, WhereProvider,
};
pub use catalog::Catalog;
pub use field::{
    FieldDescriptor, FieldOption, InputConverter, OptionsProvider, OutputConverter, RuleProvider,
};
pub use parser::DescriptorParser;
pub use query::{resolve_alias, Connector, FilterMap, JoinKind, JoinSpec, WhereClause, WhereField};
pub use table::{FieldSpec, TableDescriptor};
pub use types::{FieldType, FormType};

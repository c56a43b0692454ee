//! 쿼리 파라미터
//!
//! 목록/단건 조회 SELECT를 만들기 위한 입력과 페이지네이션 규칙입니다.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use reqgen_core::schema::{FilterMap, JoinSpec, WhereClause};

/// SELECT 파라미터
#[derive(Debug, Clone, Default)]
pub struct SelectParams {
    /// 투영할 필드 (테이블 정의 순서로 출력됨)
    pub fields: Vec<String>,

    /// JOIN 목록 (위치가 별칭을 결정)
    pub joins: Vec<JoinSpec>,

    /// 단건 조회 키
    pub lookup: Option<Lookup>,

    /// WHERE 절
    pub r#where: Option<WhereClause>,

    /// 검색어
    pub search: Option<String>,

    /// 검색 대상 필드
    pub search_fields: Vec<String>,

    /// 수락된 필터
    pub filter: FilterMap,

    /// 0부터 시작하는 페이지
    pub page: u64,

    /// 페이지 크기
    pub size: u64,
}

impl SelectParams {
    pub fn new(fields: &[String]) -> Self {
        Self {
            fields: fields.to_vec(),
            ..Default::default()
        }
    }

    pub fn joins(mut self, joins: &[JoinSpec]) -> Self {
        self.joins = joins.to_vec();
        self
    }

    pub fn lookup(mut self, column: impl Into<String>, value: Value) -> Self {
        self.lookup = Some(Lookup {
            column: column.into(),
            value,
        });
        self
    }

    pub fn with_where(mut self, clause: Option<WhereClause>) -> Self {
        self.r#where = clause;
        self
    }

    pub fn search(mut self, term: Option<String>, fields: &[String]) -> Self {
        self.search = term;
        self.search_fields = fields.to_vec();
        self
    }

    pub fn filter(mut self, filter: FilterMap) -> Self {
        self.filter = filter;
        self
    }

    pub fn page(mut self, pagination: Pagination) -> Self {
        self.page = pagination.page;
        self.size = pagination.size;
        self
    }
}

/// 단건 조회 키 (`base.column = value`)
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub column: String,
    pub value: Value,
}

/// 페이지네이션
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub size: u64,
}

impl Pagination {
    /// 요청 값 정규화
    ///
    /// 음수 페이지는 0, 0 이하 크기는 기본값, 최대값이 있으면 상한 적용.
    pub fn normalize(page: i64, size: i64, default_size: u64, max_size: Option<u64>) -> Self {
        let page = u64::try_from(page).unwrap_or(0);
        let mut size = match u64::try_from(size) {
            Ok(size) if size > 0 => size,
            _ => default_size,
        };
        if let Some(max) = max_size {
            size = size.min(max);
        }
        Self { page, size }
    }

    /// 단건 조회용
    pub fn single() -> Self {
        Self { page: 0, size: 1 }
    }

    pub fn offset(&self) -> u64 {
        self.size.saturating_mul(self.page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_normalize() {
        assert_eq!(Pagination::normalize(-3, 20, 10, None), Pagination { page: 0, size: 20 });
        assert_eq!(Pagination::normalize(2, 0, 10, None), Pagination { page: 2, size: 10 });
        assert_eq!(Pagination::normalize(1, -5, 15, None), Pagination { page: 1, size: 15 });
        assert_eq!(Pagination::normalize(0, 500, 10, Some(100)), Pagination { page: 0, size: 100 });
    }

    #[test]
    fn test_offset() {
        assert_eq!(Pagination { page: 3, size: 25 }.offset(), 75);
        assert_eq!(Pagination::single().offset(), 0);
    }
}

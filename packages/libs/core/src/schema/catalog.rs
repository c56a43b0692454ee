//! 테이블 정의 카탈로그
//!
//! 서비스 시작 시 한 번 구성되고 이후 요청 간에 읽기 전용으로 공유됩니다.

use std::collections::HashMap;
use std::sync::Arc;

use super::table::TableDescriptor;
use crate::error::{Error, Result};

/// 테이블 이름 -> 정의
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: HashMap<String, Arc<TableDescriptor>>,
}

impl Catalog {
    /// 빈 카탈로그 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 테이블 추가 (정의 검증 + 이름 중복 검사)
    pub fn add_table(&mut self, table: TableDescriptor) -> Result<()> {
        table.validate()?;
        if self.tables.contains_key(&table.name) {
            return Err(Error::DuplicateTable {
                name: table.name.clone(),
            });
        }
        self.tables.insert(table.name.clone(), Arc::new(table));
        Ok(())
    }

    /// 테이블 조회
    pub fn get_table(&self, name: &str) -> Option<Arc<TableDescriptor>> {
        self.tables.get(name).cloned()
    }

    /// 테이블 존재 여부
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// 모든 테이블 이름 (정렬됨)
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

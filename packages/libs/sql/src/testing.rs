//! 테스트용 SqlClient
//!
//! 미리 넣어둔 응답을 순서대로 돌려주고, 실행된 Statement를 기록합니다.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use reqgen_core::{Error, Result};

use crate::client::SqlClient;
use crate::mapper::PhysicalRow;
use crate::statement::Statement;

pub(crate) enum Response {
    Rows(Vec<PhysicalRow>),
    Affected(u64),
    Fail(Error),
}

pub(crate) struct FakeClient {
    responses: Mutex<VecDeque<Response>>,
    statements: Mutex<Vec<Statement>>,
}

impl FakeClient {
    pub(crate) fn new(responses: Vec<Response>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            statements: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn statements(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }

    fn next(&self, stmt: &Statement) -> Result<Response> {
        self.statements.lock().unwrap().push(stmt.clone());
        match self.responses.lock().unwrap().pop_front() {
            Some(Response::Fail(err)) => Err(err),
            Some(response) => Ok(response),
            None => Err(Error::Database {
                message: format!("no canned response for: {}", stmt.sql),
            }),
        }
    }
}

#[async_trait]
impl SqlClient for FakeClient {
    async fn fetch_all(&self, stmt: &Statement) -> Result<Vec<PhysicalRow>> {
        match self.next(stmt)? {
            Response::Rows(rows) => Ok(rows),
            _ => Err(Error::Database {
                message: "expected rows".to_string(),
            }),
        }
    }

    async fn fetch_optional(&self, stmt: &Statement) -> Result<Option<PhysicalRow>> {
        Ok(self.fetch_all(stmt).await?.into_iter().next())
    }

    async fn execute(&self, stmt: &Statement) -> Result<u64> {
        match self.next(stmt)? {
            Response::Affected(n) => Ok(n),
            _ => Err(Error::Database {
                message: "expected affected row count".to_string(),
            }),
        }
    }
}

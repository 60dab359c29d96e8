//! In-memory [`SqlEngine`] that records every statement it receives.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use crate::engine::SqlEngine;
use crate::error::TableError;
use crate::row::{Record, Value};

#[derive(Default)]
pub(crate) struct RecordingEngine {
    statements: RefCell<Vec<String>>,
    params: RefCell<Vec<Vec<Value>>>,
    responses: RefCell<VecDeque<Vec<Record>>>,
    existing: RefCell<HashSet<String>>,
    failure: Option<String>,
}

impl RecordingEngine {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Each `query` call pops the next canned result set.
    pub(crate) fn with_responses(responses: Vec<Vec<Record>>) -> Rc<Self> {
        Rc::new(Self {
            responses: RefCell::new(responses.into()),
            ..Self::default()
        })
    }

    /// Every call fails with [`TableError::Engine`].
    pub(crate) fn failing(message: &str) -> Rc<Self> {
        Rc::new(Self {
            failure: Some(message.to_string()),
            ..Self::default()
        })
    }

    pub(crate) fn with_tables(names: &[&str]) -> Rc<Self> {
        Rc::new(Self {
            existing: RefCell::new(names.iter().map(|n| n.to_string()).collect()),
            ..Self::default()
        })
    }

    pub(crate) fn statements(&self) -> Vec<String> {
        self.statements.borrow().clone()
    }

    pub(crate) fn params(&self) -> Vec<Vec<Value>> {
        self.params.borrow().clone()
    }

    fn record(&self, sql: &str) -> Result<(), TableError> {
        self.statements.borrow_mut().push(sql.to_string());
        match &self.failure {
            Some(message) => Err(TableError::Engine(message.clone())),
            None => Ok(()),
        }
    }
}

impl SqlEngine for RecordingEngine {
    fn execute(&self, sql: &str) -> Result<(), TableError> {
        self.record(sql)
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>, TableError> {
        self.record(sql)?;
        self.params.borrow_mut().push(params.to_vec());
        Ok(self.responses.borrow_mut().pop_front().unwrap_or_default())
    }

    fn table_exists(&self, table_name: &str) -> Result<bool, TableError> {
        Ok(self.existing.borrow().contains(table_name))
    }
}

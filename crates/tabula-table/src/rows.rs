use std::fmt;
use std::iter::FusedIterator;
use std::rc::Rc;

use tracing::debug;

use crate::engine::SqlEngine;
use crate::error::TableError;
use crate::row::{Record, RowData, Value};

/// Lazy, single-pass sequence of result rows.
///
/// The statement runs on the first call to [`next`](Iterator::next), not when
/// the `Rows` is created. That call buffers the whole result set from the
/// engine (see [`SqlEngine::query`]); later calls hand out the buffered rows
/// one at a time. An execution error is yielded once, after which the
/// sequence ends. Once exhausted it stays exhausted; running the statement
/// again means building a new `Rows`.
#[must_use = "rows are fetched lazily; iterate to run the statement"]
pub struct Rows {
    state: State,
}

enum State {
    Pending {
        engine: Rc<dyn SqlEngine>,
        sql: String,
        params: Vec<Value>,
    },
    Streaming(std::vec::IntoIter<Record>),
    Failed(TableError),
    Done,
}

impl Rows {
    pub(crate) fn new(
        engine: Rc<dyn SqlEngine>,
        sql: String,
        params: Vec<Value>,
    ) -> Self {
        Self {
            state: State::Pending {
                engine,
                sql,
                params,
            },
        }
    }

    /// A sequence that yields nothing and never touches an engine.
    pub fn empty() -> Self {
        Self { state: State::Done }
    }

    pub(crate) fn failed(error: TableError) -> Self {
        Self {
            state: State::Failed(error),
        }
    }

    /// Statement text still waiting to run, if any.
    pub fn pending_sql(&self) -> Option<&str> {
        match &self.state {
            State::Pending { sql, .. } => Some(sql.as_str()),
            _ => None,
        }
    }
}

impl Iterator for Rows {
    type Item = Result<RowData, TableError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, State::Done) {
                State::Pending {
                    engine,
                    sql,
                    params,
                } => {
                    debug!(sql = %sql, "running statement");
                    match engine.query(&sql, &params) {
                        Ok(records) => self.state = State::Streaming(records.into_iter()),
                        Err(e) => return Some(Err(e)),
                    }
                }
                State::Streaming(mut records) => {
                    let record = records.next()?;
                    self.state = State::Streaming(records);
                    return Some(Ok(RowData::new(record)));
                }
                State::Failed(e) => return Some(Err(e)),
                State::Done => return None,
            }
        }
    }
}

impl FusedIterator for Rows {}

impl fmt::Debug for Rows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Pending { .. } => "pending",
            State::Streaming(_) => "streaming",
            State::Failed(_) => "failed",
            State::Done => "done",
        };
        f.debug_struct("Rows")
            .field("state", &state)
            .field("sql", &self.pending_sql())
            .finish()
    }
}

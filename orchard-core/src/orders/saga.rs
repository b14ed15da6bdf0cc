//! Compensation saga for the non-atomic persistence path
//!
//! Each forward write registers its undo as a named step. On a later
//! failure the accumulated steps run in reverse order, restoring the state
//! the forward actions changed. A failed undo is the most severe case the
//! pipeline knows: it is logged at error severity and reported back, but
//! the remaining steps still run.

use crate::db::DbResult;
use futures::future::BoxFuture;

type UndoFn = Box<dyn FnOnce() -> BoxFuture<'static, DbResult<()>> + Send>;

/// Ordered list of compensating actions
#[derive(Default)]
pub struct Compensations {
    steps: Vec<(&'static str, UndoFn)>,
}

impl Compensations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the undo for a forward action that just succeeded
    pub fn push<F>(&mut self, name: &'static str, undo: F)
    where
        F: FnOnce() -> BoxFuture<'static, DbResult<()>> + Send + 'static,
    {
        self.steps.push((name, Box::new(undo)));
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every registered compensation in reverse order
    ///
    /// Returns the names of steps whose undo failed; partial state may
    /// remain for those.
    pub async fn run(mut self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        while let Some((name, undo)) = self.steps.pop() {
            match undo().await {
                Ok(()) => {
                    tracing::debug!(step = name, "compensation applied");
                }
                Err(e) => {
                    tracing::error!(
                        step = name,
                        error = %e,
                        "compensation failed, partial state may remain"
                    );
                    failed.push(name);
                }
            }
        }
        failed
    }
}

// src/pool/callbacks.rs

use std::fmt;
use std::sync::Arc;

use crate::pool::record::ExecutionRecord;

/// Callbacks report failure with any error; the pool never inspects it.
pub type CallbackResult = anyhow::Result<()>;

pub type Callback<D> = Arc<dyn Fn(&ExecutionRecord<D>) -> CallbackResult + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackPhase {
    Before,
    After,
}

impl fmt::Display for CallbackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackPhase::Before => f.write_str("before"),
            CallbackPhase::After => f.write_str("after"),
        }
    }
}

/// Ordered before/after observers.
///
/// Callbacks run synchronously on the worker that executes the command, in
/// registration order. Callbacks for different workers may run at the same
/// time, so a callback that touches shared state must lock it itself.
///
/// A callback returning `Err` stops its worker: the error is reported and
/// the rest of that worker's commands are skipped. Other workers keep going.
pub struct CallbackRegistry<D = ()> {
    before: Vec<Callback<D>>,
    after: Vec<Callback<D>>,
}

impl<D> CallbackRegistry<D> {
    pub fn new() -> Self {
        Self {
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    pub fn register_before<F>(&mut self, callback: F)
    where
        F: Fn(&ExecutionRecord<D>) -> CallbackResult + Send + Sync + 'static,
    {
        self.before.push(Arc::new(callback));
    }

    pub fn register_after<F>(&mut self, callback: F)
    where
        F: Fn(&ExecutionRecord<D>) -> CallbackResult + Send + Sync + 'static,
    {
        self.after.push(Arc::new(callback));
    }

    pub fn before_len(&self) -> usize {
        self.before.len()
    }

    pub fn after_len(&self) -> usize {
        self.after.len()
    }

    /// Run every callback of `phase` in order, stopping at the first error.
    pub(crate) fn dispatch(&self, phase: CallbackPhase, record: &ExecutionRecord<D>) -> CallbackResult {
        let callbacks = match phase {
            CallbackPhase::Before => &self.before,
            CallbackPhase::After => &self.after,
        };
        for callback in callbacks {
            callback(record)?;
        }
        Ok(())
    }
}

impl<D> Default for CallbackRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}

// Manual impl: cloning only copies the `Arc`s, so `D` needn't be `Clone`.
impl<D> Clone for CallbackRegistry<D> {
    fn clone(&self) -> Self {
        Self {
            before: self.before.clone(),
            after: self.after.clone(),
        }
    }
}

impl<D> fmt::Debug for CallbackRegistry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .finish()
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::ProbeError;

enum Step<T> {
    Value(T),
    Failure(String),
}

/// A fetch double that replays a fixed script of values and failures.
///
/// Each call to [`ScriptedSource::fetch`] consumes the next step; once the
/// script runs out the last step repeats forever. Calls are counted so tests
/// can check how many attempts a poll loop made.
pub struct ScriptedSource<T> {
    steps: Vec<Step<T>>,
    calls: AtomicUsize,
}

impl<T: Clone> ScriptedSource<T> {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Appends `value`, returned for the next `times` calls.
    pub fn then_value(mut self, value: T, times: usize) -> Self {
        for _ in 0..times {
            self.steps.push(Step::Value(value.clone()));
        }
        self
    }

    /// Appends a single transport failure.
    pub fn then_failure(mut self, message: &str) -> Self {
        self.steps.push(Step::Failure(message.to_string()));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn fetch(&self) -> Result<T, ProbeError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .get(index)
            .or_else(|| self.steps.last())
            .ok_or_else(|| ProbeError::ConnectionError("empty script".to_string()))?;

        match step {
            Step::Value(value) => Ok(value.clone()),
            Step::Failure(message) => Err(ProbeError::ConnectionError(message.clone())),
        }
    }
}

impl<T: Clone> Default for ScriptedSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

use parking_lot::RwLock;

/// Point-in-time copy of the run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub issued: usize,
    /// Zero when the candidate count is unknown (stdin wordlist).
    pub expected: usize,
    pub errors: usize,
}

/// Counters shared by every worker of a run.
///
/// All mutation goes through the write lock; readers such as the progress
/// reporter take the read lock via [`RunState::snapshot`].
#[derive(Debug, Default)]
pub struct RunState {
    inner: RwLock<Progress>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_expected(&self, extra: usize) {
        self.inner.write().expected += extra;
    }

    pub fn increment_issued(&self) {
        self.inner.write().issued += 1;
    }

    /// A failed probe counts as an error rather than an issued request.
    pub fn record_error(&self) {
        let mut guard = self.inner.write();
        guard.errors += 1;
        guard.issued = guard.issued.saturating_sub(1);
    }

    pub fn snapshot(&self) -> Progress {
        *self.inner.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_moves_a_request_from_issued_to_errors() {
        let state = RunState::new();
        state.add_expected(3);
        state.increment_issued();
        state.increment_issued();
        state.record_error();

        let p = state.snapshot();
        assert_eq!(p, Progress { issued: 1, expected: 3, errors: 1 });
    }

    #[test]
    fn issued_never_underflows() {
        let state = RunState::new();
        state.record_error();
        assert_eq!(state.snapshot().issued, 0);
        assert_eq!(state.snapshot().errors, 1);
    }

    #[test]
    fn expected_accumulates_across_sources() {
        let state = RunState::new();
        state.add_expected(2);
        state.add_expected(5);
        assert_eq!(state.snapshot().expected, 7);
    }
}

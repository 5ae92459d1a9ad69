//! Checker roles and the parallel runner.

/// Runs every check of one resource, reporting findings to its context.
pub trait ContentChecker {
    fn run_checks(&self);
}

/// Validates one resource and returns the verdict.
pub trait DocumentValidator {
    /// `true` when the pass added no fatal error, error or warning.
    fn validate(&self) -> bool;
}

/// Run independent checkers on scoped worker threads.
///
/// Checkers usually share a report; each keeps its own context and driver.
pub fn check_all(checkers: &[&(dyn ContentChecker + Sync)]) {
    tracing::debug!(checkers = checkers.len(), "running checks");
    std::thread::scope(|scope| {
        for checker in checkers {
            scope.spawn(move || checker.run_checks());
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting<'a>(&'a AtomicUsize);

    impl ContentChecker for Counting<'_> {
        fn run_checks(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_every_checker_runs_once() {
        let runs = AtomicUsize::new(0);
        let a = Counting(&runs);
        let b = Counting(&runs);
        let c = Counting(&runs);
        check_all(&[&a, &b, &c]);
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_no_checkers() {
        check_all(&[]);
    }
}

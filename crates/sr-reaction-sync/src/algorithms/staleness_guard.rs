//! # Staleness Guard
//!
//! Compare-then-commit for async reads: a result computed under an identity
//! that is no longer current is dropped, never merged.

use crate::domain::IdentitySnapshot;
use std::future::Future;

/// What happened to a guarded operation.
#[derive(Debug, PartialEq, Eq)]
pub enum GuardOutcome<E> {
    /// Result applied.
    Committed,
    /// Identity changed while in flight; result dropped.
    Discarded,
    /// Operation failed.
    Failed(E),
}

/// Run `operation`, then `commit` its result only if `still_current(snapshot)`.
///
/// `still_current` is evaluated after the operation resolves.
pub async fn run_guarded<T, E, F, C, K>(
    snapshot: &IdentitySnapshot,
    operation: F,
    still_current: C,
    commit: K,
) -> GuardOutcome<E>
where
    F: Future<Output = Result<T, E>>,
    C: FnOnce(&IdentitySnapshot) -> bool,
    K: FnOnce(T),
{
    match operation.await {
        Ok(value) if still_current(snapshot) => {
            commit(value);
            GuardOutcome::Committed
        }
        Ok(_) => GuardOutcome::Discarded,
        Err(e) => GuardOutcome::Failed(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Address, NetworkId};
    use std::cell::Cell;

    fn snapshot(chain: u64) -> IdentitySnapshot {
        IdentitySnapshot::new(Some(Address::new([1; 20])), Some(NetworkId(chain)), None)
    }

    #[tokio::test]
    async fn test_commits_when_current() {
        let committed = Cell::new(None);
        let outcome = run_guarded(
            &snapshot(1),
            async { Ok::<_, String>(7) },
            |s| *s == snapshot(1),
            |v| committed.set(Some(v)),
        )
        .await;
        assert_eq!(outcome, GuardOutcome::Committed);
        assert_eq!(committed.get(), Some(7));
    }

    #[tokio::test]
    async fn test_discards_when_stale() {
        let committed = Cell::new(None);
        let outcome = run_guarded(
            &snapshot(1),
            async { Ok::<_, String>(7) },
            |s| *s == snapshot(2),
            |v| committed.set(Some(v)),
        )
        .await;
        assert_eq!(outcome, GuardOutcome::Discarded);
        assert_eq!(committed.get(), None);
    }

    #[test]
    fn test_failure_skips_commit() {
        let committed = Cell::new(false);
        let outcome = tokio_test::block_on(run_guarded(
            &snapshot(1),
            async { Err::<u32, _>("rpc down".to_string()) },
            |_| true,
            |_| committed.set(true),
        ));
        assert_eq!(outcome, GuardOutcome::Failed("rpc down".to_string()));
        assert!(!committed.get());
    }
}

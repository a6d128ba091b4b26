//! Convergence checks between an endpoint and a peer.
//!
//! A peer that reports a fingerprint is either in step with this endpoint,
//! behind it by a state we can still diff against, or too far away for a
//! delta.

use textsync_core::{Differ, Fingerprint};

use crate::endpoint::SyncEndpoint;

/// Result of comparing a remote fingerprint against an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvergenceResult {
    /// Both sides hold the same value.
    Converged,
    /// The remote holds a value from our history; a delta brings it up to date.
    Behind { remote: Fingerprint },
    /// The remote value is unknown here; only a full snapshot can help.
    Diverged {
        local: Fingerprint,
        remote: Fingerprint,
    },
}

impl ConvergenceResult {
    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceResult::Converged)
    }

    pub fn is_behind(&self) -> bool {
        matches!(self, ConvergenceResult::Behind { .. })
    }
}

/// Compare `remote` against the endpoint's current value and history.
///
/// Does not change history recency.
pub fn verify_convergence<D: Differ>(
    endpoint: &SyncEndpoint<D>,
    remote: &Fingerprint,
) -> ConvergenceResult {
    let local = endpoint.fingerprint();

    if local == *remote {
        ConvergenceResult::Converged
    } else if endpoint.has_snapshot(remote) {
        ConvergenceResult::Behind { remote: *remote }
    } else {
        ConvergenceResult::Diverged {
            local,
            remote: *remote,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converged() {
        let endpoint = SyncEndpoint::new("same");
        let result = verify_convergence(&endpoint, &Fingerprint::of("same"));
        assert!(result.is_converged());
        assert!(!result.is_behind());
    }

    #[test]
    fn test_behind() {
        let endpoint = SyncEndpoint::new("v1");
        endpoint.set_local("v2");

        let result = verify_convergence(&endpoint, &Fingerprint::of("v1"));
        assert_eq!(
            result,
            ConvergenceResult::Behind {
                remote: Fingerprint::of("v1")
            }
        );
        assert!(result.is_behind());
    }

    #[test]
    fn test_diverged() {
        let endpoint = SyncEndpoint::new("v1");

        let result = verify_convergence(&endpoint, &Fingerprint::of("elsewhere"));
        assert!(!result.is_converged());
        assert!(!result.is_behind());
    }

    #[test]
    fn test_local_not_yet_recorded_is_still_converged() {
        let endpoint = SyncEndpoint::new("v1");
        endpoint.set_local("v2");

        // "v2" is current but not yet in history.
        let result = verify_convergence(&endpoint, &Fingerprint::of("v2"));
        assert!(result.is_converged());
    }
}

//! End-to-end protocol behavior between two endpoints.

use std::num::NonZeroUsize;

use proptest::prelude::*;
use textsync::{verify_convergence, Fingerprint, SyncCommand, SyncEndpoint, SyncOutcome};
use textsync_testkit::generators::{distinct_snapshots, fingerprint, text};
use textsync_testkit::{init_tracing, EditParams, EndpointPair};

#[test]
fn test_delta_round_trip() -> anyhow::Result<()> {
    init_tracing();
    let a = SyncEndpoint::new("hello");
    let b = SyncEndpoint::new("hello");

    a.set_local("hello world");
    let command = a.handle_outgoing_sync_request(&b.fingerprint())?;
    assert!(command.is_delta());

    let outcome = b.handle_incoming_sync_update(command, None)?;
    assert!(outcome.is_applied());
    assert_eq!(b.content(), "hello world");
    assert!(verify_convergence(&b, &a.fingerprint()).is_converged());
    Ok(())
}

#[test]
fn test_unknown_peer_gets_snapshot() -> anyhow::Result<()> {
    let a = SyncEndpoint::new("hello");
    a.set_local("hello world");

    let command = a.handle_outgoing_sync_request(&Fingerprint::ZERO)?;
    assert_eq!(command, SyncCommand::full_snapshot("hello world"));

    let fresh = SyncEndpoint::new("");
    fresh.handle_incoming_sync_update(command, None)?;
    assert_eq!(fresh.fingerprint(), a.fingerprint());
    Ok(())
}

#[test]
fn test_evicted_base_falls_back_to_snapshot() -> anyhow::Result<()> {
    let a = SyncEndpoint::builder("v0")
        .history_capacity(NonZeroUsize::new(2).unwrap())
        .build();
    let v0 = a.fingerprint();

    for next in ["v1", "v2"] {
        a.set_local(next);
        a.handle_outgoing_sync_request(&Fingerprint::ZERO)?;
    }

    assert!(!a.has_snapshot(&v0));
    assert_eq!(a.history_len(), 2);
    assert_eq!(
        a.handle_outgoing_sync_request(&v0)?,
        SyncCommand::full_snapshot("v2")
    );
    Ok(())
}

#[test]
fn test_many_rounds_converge() -> anyhow::Result<()> {
    init_tracing();
    let pair = EndpointPair::new("");
    let mut text = String::new();

    for round in 0..30 {
        text.push_str(&format!("line {round}\n"));
        if round % 7 == 0 {
            text = text.replacen("line", "LINE", 1);
        }
        pair.sender.set_local(text.as_str());

        let (command, outcome) = pair.sync()?;
        assert!(command.is_delta(), "round {round} sent a snapshot");
        assert!(outcome.is_applied());
        assert!(pair.converged());
    }

    assert_eq!(pair.sender.stats().deltas_sent, 30);
    assert_eq!(pair.receiver.stats().patches_applied, 30);
    Ok(())
}

#[test]
fn test_unchanged_value_sends_empty_delta() -> anyhow::Result<()> {
    let pair = EndpointPair::new("steady");
    pair.sender.set_local("steady");

    let (command, outcome) = pair.sync()?;
    assert!(command.is_delta());
    assert!(matches!(outcome, SyncOutcome::Applied));
    assert_eq!(pair.receiver.content(), "steady");
    Ok(())
}

#[test]
fn test_commands_survive_the_wire() -> anyhow::Result<()> {
    let a = SyncEndpoint::new("the quick fox");
    let base = a.fingerprint();
    a.set_local("the slow fox");

    for reported in [base, Fingerprint::ZERO] {
        let command = a.handle_outgoing_sync_request(&reported)?;
        let decoded = SyncCommand::from_wire(command.to_wire(), a.differ())?;
        assert_eq!(decoded, command);
    }
    Ok(())
}

proptest! {
    #[test]
    fn test_remembered_base_always_converges(params: EditParams) {
        let a = SyncEndpoint::new(params.base.as_str());
        let b = SyncEndpoint::new(params.base.as_str());
        a.set_local(params.target.as_str());

        let command = a.handle_outgoing_sync_request(&b.fingerprint()).unwrap();
        prop_assert!(command.is_delta());

        b.handle_incoming_sync_update(command, None).unwrap();
        prop_assert_eq!(b.content(), params.target);
        prop_assert_eq!(b.fingerprint(), a.fingerprint());
    }

    #[test]
    fn test_unknown_fingerprint_always_gets_snapshot(
        initial in text(32),
        current in text(32),
        reported in fingerprint(),
    ) {
        let a = SyncEndpoint::new(initial.as_str());
        a.set_local(current.as_str());
        prop_assume!(!a.has_snapshot(&reported));

        let command = a.handle_outgoing_sync_request(&reported).unwrap();
        prop_assert_eq!(command, SyncCommand::full_snapshot(current));
    }

    #[test]
    fn test_history_keeps_last_capacity_values(
        snapshots in (1usize..8).prop_flat_map(|capacity| distinct_snapshots(capacity + 1)),
    ) {
        let capacity = snapshots.len() - 1;
        let a = SyncEndpoint::builder(snapshots[0].as_str())
            .history_capacity(NonZeroUsize::new(capacity).unwrap())
            .build();
        for snapshot in &snapshots[1..] {
            a.set_local(snapshot.as_str());
            a.handle_outgoing_sync_request(&Fingerprint::ZERO).unwrap();
        }

        prop_assert!(!a.has_snapshot(&Fingerprint::of(&snapshots[0])));
        for snapshot in &snapshots[1..] {
            prop_assert!(a.has_snapshot(&Fingerprint::of(snapshot)));
        }
        prop_assert_eq!(a.history_len(), capacity);
    }
}

use dom::wire::decode_batch;
use dom::{DomError, Fingerprint};
use dom_test_support::assert_snapshot_eq;
use dom_test_support::scenario::load_scenarios;
use host::{HostError, TickHost};
use std::path::Path;

fn error_name(err: &HostError) -> &'static str {
    match err {
        HostError::Dom(DomError::InvalidBatch(_)) => "InvalidBatch",
        HostError::Dom(DomError::UnknownOpKind(_)) => "UnknownOpKind",
        HostError::Dom(DomError::UnknownNode(_)) => "UnknownNode",
        HostError::Dom(DomError::InvalidNodeId) => "InvalidNodeId",
        HostError::Dom(DomError::MutationOutsideScope) => "MutationOutsideScope",
        HostError::Dom(DomError::CycleDetected { .. }) => "CycleDetected",
        HostError::Dom(DomError::InvalidSnapshot(_)) => "InvalidSnapshot",
        HostError::Dom(DomError::SnapshotEncoding(_)) => "SnapshotEncoding",
        HostError::TickProtocolViolation(_) => "TickProtocolViolation",
        HostError::TokenViolation(_) => "TokenViolation",
        HostError::RollbackOpsNotEmpty { .. } => "RollbackOpsNotEmpty",
        HostError::IdentityExhausted => "IdentityExhausted",
        HostError::Config(_) => "Config",
    }
}

#[test]
fn fixture_scenarios() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/scenarios.toml");
    let scenarios = load_scenarios(&path).unwrap();
    assert!(!scenarios.is_empty());

    for scenario in scenarios {
        let mut host = TickHost::new();
        for (index, tick) in scenario.tick.iter().enumerate() {
            let ctx = format!("{} / tick {index}", scenario.name);
            let token = host.begin_tick().unwrap();
            let outcome = decode_batch(&tick.batch)
                .map_err(HostError::from)
                .and_then(|batch| host.commit(&token, batch));

            match (&tick.expect_error, outcome) {
                (Some(expected), Err(err)) => {
                    assert_eq!(error_name(&err), expected.as_str(), "{ctx}: {err}");
                    host.fallback(&token, &err.to_string()).unwrap();
                }
                (Some(expected), Ok(_)) => panic!("{ctx}: expected {expected}, tick committed"),
                (None, Err(err)) => panic!("{ctx}: unexpected error {err}"),
                (None, Ok(result)) => {
                    if let Some(snapshot) = &tick.expect_snapshot {
                        assert_snapshot_eq(snapshot, result.snapshot.as_str());
                    }
                    if let Some(fingerprint) = &tick.expect_fingerprint {
                        let expected: Fingerprint = fingerprint.parse().unwrap();
                        assert_eq!(result.fingerprint, expected, "{ctx}");
                    }
                }
            }
        }
    }
}

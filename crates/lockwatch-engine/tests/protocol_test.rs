//! Integration Tests - Request/Release Protocol
//!
//! Ledger laws checked after every call of long pseudo-random call
//! sequences, plus the fixed grant/queue and over-release scenarios.

use lockwatch_engine::domain::*;

/// Small deterministic LCG so failures reproduce exactly
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound
    }
}

#[test]
fn test_conservation_under_random_calls() {
    let ledger = Ledger::with_inventory(4, vec![3, 2, 4]).unwrap();
    let mut rng = Lcg(0x5eed);

    for _ in 0..5_000 {
        let process = ProcessId(rng.next(4));
        let resource = ResourceId(rng.next(3));
        let count = rng.next(3) as u32 + 1;
        let before = ledger.snapshot();

        let result = if rng.next(2) == 0 {
            ledger.request(process, resource, count).map(|_| ())
        } else {
            ledger.release(process, resource, count)
        };

        if result.is_err() {
            assert_eq!(ledger.snapshot(), before, "rejected call mutated the ledger");
        }
        assert_eq!(ledger.check_conservation(), Ok(()));
    }
}

#[test]
fn test_grant_and_queue_semantics() {
    let ledger = Ledger::with_inventory(3, vec![2]).unwrap();

    assert_eq!(
        ledger.request(ProcessId(0), ResourceId(0), 2).unwrap(),
        RequestOutcome::Granted
    );
    // Shortfall: nothing moves, demand is recorded
    assert_eq!(
        ledger.request(ProcessId(1), ResourceId(0), 1).unwrap(),
        RequestOutcome::Waiting
    );
    assert_eq!(
        ledger.request(ProcessId(1), ResourceId(0), 2).unwrap(),
        RequestOutcome::Waiting
    );

    let guard = ledger.lock();
    assert_eq!(guard.available(), &[0]);
    assert_eq!(guard.held(ProcessId(0), ResourceId(0)), 2);
    assert_eq!(guard.held(ProcessId(1), ResourceId(0)), 0);
    assert_eq!(guard.pending(ProcessId(1), ResourceId(0)), 3);
}

#[test]
fn test_stale_request_survives_later_grant() {
    let ledger = Ledger::with_inventory(2, vec![1]).unwrap();
    ledger.request(ProcessId(0), ResourceId(0), 1).unwrap();
    ledger.request(ProcessId(1), ResourceId(0), 1).unwrap();
    ledger.release(ProcessId(0), ResourceId(0), 1).unwrap();

    assert_eq!(
        ledger.request(ProcessId(1), ResourceId(0), 1).unwrap(),
        RequestOutcome::Granted
    );
    let guard = ledger.lock();
    assert_eq!(guard.held(ProcessId(1), ResourceId(0)), 1);
    assert_eq!(guard.pending(ProcessId(1), ResourceId(0)), 1);
}

#[test]
fn test_single_waiter_scenario() {
    // N=2, R=1, Available=[1]
    let ledger = Ledger::with_inventory(2, vec![1]).unwrap();

    assert_eq!(
        ledger.request(ProcessId(0), ResourceId(0), 1).unwrap(),
        RequestOutcome::Granted
    );
    assert_eq!(ledger.lock().available(), &[0]);
    assert_eq!(
        ledger.request(ProcessId(1), ResourceId(0), 1).unwrap(),
        RequestOutcome::Waiting
    );
    assert_eq!(ledger.lock().pending(ProcessId(1), ResourceId(0)), 1);

    let snapshot = ledger.snapshot();
    let graph = WaitForGraph::from_snapshot(&snapshot);
    assert_eq!(graph.edges().collect::<Vec<_>>(), vec![(ProcessId(1), ProcessId(0))]);
    assert_eq!(analyze(&snapshot), DetectionReport::NoDeadlock);
}

#[test]
fn test_over_release_scenario() {
    let ledger = Ledger::with_inventory(1, vec![2]).unwrap();
    ledger.request(ProcessId(0), ResourceId(0), 2).unwrap();
    let before = ledger.snapshot();

    let err = ledger.release(ProcessId(0), ResourceId(0), 3).unwrap_err();
    assert_eq!(
        err,
        LedgerError::OverRelease {
            process: ProcessId(0),
            resource: ResourceId(0),
            held: 2,
            requested: 3,
        }
    );
    assert_eq!(err.kind(), LedgerErrorKind::OverRelease);
    assert_eq!(ledger.snapshot(), before);
    assert_eq!(ledger.lock().held(ProcessId(0), ResourceId(0)), 2);
}

#[test]
fn test_argument_errors() {
    let ledger = Ledger::with_inventory(2, vec![1, 1]).unwrap();
    let before = ledger.snapshot();

    let cases = [
        ledger.request(ProcessId(2), ResourceId(0), 1).map(|_| ()),
        ledger.request(ProcessId(0), ResourceId(2), 1).map(|_| ()),
        ledger.request(ProcessId(0), ResourceId(0), 0).map(|_| ()),
        ledger.release(ProcessId(5), ResourceId(0), 1),
        ledger.release(ProcessId(0), ResourceId(0), 0),
    ];
    for result in cases {
        assert!(result.unwrap_err().is_invalid_argument());
    }
    assert_eq!(ledger.snapshot(), before);
}

#[test]
fn test_request_counter_overflow_rejected() {
    let ledger = Ledger::with_inventory(2, vec![0]).unwrap();
    ledger.request(ProcessId(0), ResourceId(0), u32::MAX).unwrap();
    let before = ledger.snapshot();

    let err = ledger.request(ProcessId(0), ResourceId(0), 1).unwrap_err();
    assert!(matches!(err, LedgerError::CountOverflow { .. }));
    assert_eq!(ledger.snapshot(), before);
}

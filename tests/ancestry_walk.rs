//! Ancestor walk behaviour against in-memory and mocked process sources

use ancestry::{
    walk, walk_with_limit, AncestryError, Pid, ProcessRecord, ProcessSource, ProcessState,
    ProcessTable, ProcessTreeError, Termination, ROOT_PID,
};
use mockall::mock;
use mockall::predicate::eq;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;

mock! {
    pub Source {}

    impl ProcessSource for Source {
        fn resolve(&self, pid: Pid) -> Result<ProcessRecord, ProcessTreeError>;
    }
}

fn record(pid: Pid, ppid: Pid, name: &str) -> ProcessRecord {
    ProcessRecord::new(pid, name, ProcessState::Sleeping).with_parent(Some(ppid))
}

fn tree_1_50_120() -> ProcessTable {
    [
        record(ROOT_PID, 0, "init"),
        record(50, 1, "sshd"),
        record(120, 50, "bash"),
        record(121, 50, "bash"),
    ]
    .into_iter()
    .collect()
}

#[test]
fn walk_120_yields_120_50_1() {
    let table = tree_1_50_120();
    let report = walk(&table, 120).expect("walk should start").into_report();

    assert_eq!(report.pids(), vec![120, 50, 1]);
    assert_eq!(report.termination, Termination::RootReached);
    assert_eq!(report.root_pid, Some(ROOT_PID));
    report.validate().expect("report should be valid");
}

#[test]
fn records_link_to_the_next_record() {
    let table = tree_1_50_120();
    let records: Vec<ProcessRecord> = walk(&table, 121).expect("walk should start").collect();

    for pair in records.windows(2) {
        assert_eq!(pair[0].parent_pid, Some(pair[1].pid));
    }
    assert_eq!(records.last().map(|r| r.pid), Some(ROOT_PID));
}

#[test]
fn nonexistent_start_yields_no_records() {
    let table = tree_1_50_120();
    match walk(&table, 4242) {
        Err(AncestryError::InvalidIdentifier { pid }) => assert_eq!(pid, 4242),
        Err(other) => panic!("expected InvalidIdentifier, got {other:?}"),
        Ok(walk) => panic!("expected failure, got {} records", walk.count()),
    }
}

#[test]
fn repeated_walks_agree_on_identity() {
    let table = tree_1_50_120();
    let first: Vec<(Pid, String)> = walk(&table, 120)
        .expect("first walk")
        .map(|r| (r.pid, r.name))
        .collect();
    let second: Vec<(Pid, String)> = walk(&table, 120)
        .expect("second walk")
        .map(|r| (r.pid, r.name))
        .collect();
    assert_eq!(first, second);
}

#[test]
fn ancestor_exiting_mid_walk_ends_the_walk() {
    let mut table = tree_1_50_120();
    table.remove(50);

    let report = walk(&table, 120).expect("start is still alive").into_report();
    assert_eq!(report.pids(), vec![120]);
    assert!(matches!(
        report.termination,
        Termination::ResolutionFailure { pid: 50, .. }
    ));
}

#[test]
fn stopping_early_performs_no_further_lookups() {
    let mut source = MockSource::new();
    source
        .expect_resolve()
        .with(eq(900))
        .times(1)
        .returning(|_| Ok(record(900, 800, "leaf")));
    source.expect_resolve().with(eq(800)).never();

    let mut walk = walk(source, 900).expect("walk should start");
    assert_eq!(walk.next().map(|r| r.pid), Some(900));
    assert!(!walk.is_done());
    assert_eq!(walk.steps(), 1);
}

#[test]
fn permission_denied_on_parent_is_folded_into_termination() {
    let mut source = MockSource::new();
    source
        .expect_resolve()
        .with(eq(30))
        .returning(|_| Ok(record(30, 20, "child")));
    source
        .expect_resolve()
        .with(eq(20))
        .returning(|pid| Err(ProcessTreeError::PermissionDenied(pid)));

    let report = walk(source, 30).expect("walk should start").into_report();
    assert_eq!(report.pids(), vec![30]);
    assert!(matches!(
        report.termination,
        Termination::ResolutionFailure { pid: 20, .. }
    ));
}

#[test]
fn self_parented_process_is_bounded() {
    let table: ProcessTable = [record(7, 7, "loop")].into_iter().collect();
    let report = walk_with_limit(&table, 7, 3)
        .expect("walk should start")
        .into_report();
    assert_eq!(report.pids(), vec![7, 7, 7]);
    assert_eq!(report.termination, Termination::StepLimit { limit: 3 });
}

/// A chain of distinct pids ending at the root; element 0 is the leaf.
fn chain_strategy() -> impl Strategy<Value = Vec<Pid>> {
    prop::collection::hash_set(2u32..100_000, 0..40).prop_map(|set| {
        let mut chain: Vec<Pid> = set.into_iter().collect();
        chain.push(ROOT_PID);
        chain
    })
}

fn table_for(chain: &[Pid]) -> ProcessTable {
    chain
        .iter()
        .enumerate()
        .map(|(i, pid)| {
            let ppid = chain.get(i + 1).copied().unwrap_or(0);
            record(*pid, ppid, &format!("p{pid}"))
        })
        .collect()
}

proptest! {
    #[test]
    fn walk_follows_any_well_formed_chain(chain in chain_strategy()) {
        let table = table_for(&chain);
        let report = walk(&table, chain[0]).expect("leaf resolves").into_report();

        prop_assert_eq!(report.pids(), chain.clone());
        prop_assert_eq!(report.records[0].pid, chain[0]);
        prop_assert_eq!(&report.termination, &Termination::RootReached);
        prop_assert!(report.validate().is_ok());
    }

    #[test]
    fn walk_never_exceeds_step_bound(chain in chain_strategy(), limit in 1usize..64) {
        let table = table_for(&chain);
        let records: Vec<ProcessRecord> = walk_with_limit(&table, chain[0], limit)
            .expect("leaf resolves")
            .collect();

        prop_assert!(records.len() <= limit);
        prop_assert_eq!(records.len(), chain.len().min(limit));
        let unique: HashSet<Pid> = records.iter().map(|r| r.pid).collect();
        prop_assert_eq!(unique.len(), records.len());
    }
}

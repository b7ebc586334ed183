//! Asynchronous runs, progress reporting and cancellation.
//!
//! Cancellation tests hold a run back with a zero-capacity progress
//! subscription so the point at which the flag is observed is deterministic.

use std::collections::BTreeSet;
use std::thread;

use ::mspc::models::{Peak, Sample};
use ::mspc::{Config, MspcError, Mspc, ProgressReport, RunState};
use pretty_assertions::assert_eq;
use rstest::*;

const CHROMOSOMES: [&str; 5] = ["chr1", "chr2", "chr3", "chr4", "chr5"];

#[fixture]
fn mspc() -> Mspc {
    let mut mspc = Mspc::new();
    for key in 0..3u32 {
        let peaks = CHROMOSOMES
            .iter()
            .flat_map(|chr| {
                (0..20u32).map(move |i| {
                    let left = i * 100 + key * 10;
                    Peak::new(chr, left, left + 60, 1e-6 / (key + 1) as f64)
                })
            })
            .collect();
        mspc.add_sample(Sample::from_peaks(key, peaks)).unwrap();
    }
    mspc.set_degree_of_parallelism(1);
    mspc
}

fn steps(reports: &[ProgressReport]) -> BTreeSet<usize> {
    reports.iter().map(|r| r.step).collect()
}

#[rstest]
fn test_async_run_reports_every_chromosome(mut mspc: Mspc) {
    mspc.set_degree_of_parallelism(3);
    let subscription = mspc.subscribe();

    let handle = mspc.run_async(Config::default()).unwrap();
    let progress = handle.progress().clone();
    let analysis = handle.wait().unwrap();

    let reports: Vec<ProgressReport> = progress.try_iter().collect();
    assert_eq!(reports.len(), CHROMOSOMES.len());
    assert_eq!(
        steps(&reports),
        (1..=CHROMOSOMES.len()).collect::<BTreeSet<_>>()
    );
    assert!(reports.iter().all(|r| r.step_count == CHROMOSOMES.len()));

    let subscribed: Vec<ProgressReport> = subscription.try_iter().collect();
    assert_eq!(subscribed.len(), CHROMOSOMES.len());

    assert_eq!(mspc.state(), RunState::Completed);
    assert_eq!(mspc.results(), Some(analysis.clone()));
    assert_eq!(analysis.consensus().len(), CHROMOSOMES.len());
}

#[rstest]
fn test_completion_signal(mspc: Mspc) {
    let handle = mspc.run_async(Config::default()).unwrap();

    // the sender side is dropped when the run ends
    assert!(handle.done().recv().is_err());
    assert!(handle.is_finished());
    assert!(handle.wait().is_ok());
}

#[rstest]
fn test_cancelled_run_exposes_no_results(mspc: Mspc) {
    // a completed run first, so clearing the previous snapshot is observable
    mspc.run(Config::default()).unwrap();
    assert!(mspc.results().is_some());

    let held = mspc.subscribe_bounded(0);
    let handle = mspc.run_async(Config::default()).unwrap();
    assert!(mspc.results().is_none());

    let first = held.recv().unwrap();
    assert_eq!(first.step, 1);
    handle.cancel();
    drop(held);

    assert_eq!(handle.wait().err(), Some(MspcError::Cancelled));
    assert_eq!(mspc.state(), RunState::Cancelled);
    assert!(mspc.results().is_none());
    assert!(mspc.consensus_peaks().is_none());
}

#[rstest]
fn test_driver_cancel_blocks_until_stopped(mspc: Mspc) {
    let held = mspc.subscribe_bounded(0);
    let handle = mspc.run_async(Config::default()).unwrap();
    held.recv().unwrap();

    thread::scope(|s| {
        s.spawn(|| {
            while !handle.is_cancelled() {
                thread::yield_now();
            }
            drop(held);
        });
        mspc.cancel();
        assert_eq!(mspc.state(), RunState::Cancelled);
    });

    assert!(handle.is_finished());
    assert_eq!(handle.wait().err(), Some(MspcError::Cancelled));
}

#[rstest]
fn test_new_async_run_cancels_the_active_one(mspc: Mspc) {
    let held = mspc.subscribe_bounded(0);
    let first = mspc.run_async(Config::default()).unwrap();
    held.recv().unwrap();

    let second = thread::scope(|s| {
        s.spawn(|| {
            while !first.is_cancelled() {
                thread::yield_now();
            }
            drop(held);
        });
        mspc.run_async(Config::default()).unwrap()
    });

    assert_eq!(first.wait().err(), Some(MspcError::Cancelled));
    let analysis = second.wait().unwrap();
    assert_eq!(mspc.state(), RunState::Completed);
    assert_eq!(mspc.results(), Some(analysis));
}

#[rstest]
fn test_rerun_after_cancel(mspc: Mspc) {
    let held = mspc.subscribe_bounded(0);
    let handle = mspc.run_async(Config::default()).unwrap();
    held.recv().unwrap();
    handle.cancel();
    drop(held);
    assert_eq!(handle.wait().err(), Some(MspcError::Cancelled));

    let analysis = mspc.run(Config::default()).unwrap();

    assert_eq!(mspc.state(), RunState::Completed);
    assert_eq!(analysis.samples().len(), 3);
}

#[rstest]
fn test_async_preflight_error(mut mspc: Mspc) {
    let duplicate = mspc.add_sample(Sample::new(0));
    assert_eq!(duplicate, Err(MspcError::DuplicateSample(0)));

    let config = Config {
        minimum_supporting_replicates: 0,
        ..Default::default()
    };
    assert!(matches!(
        mspc.run_async(config),
        Err(MspcError::InvalidConfig(_))
    ));
    assert_eq!(mspc.state(), RunState::Idle);
}

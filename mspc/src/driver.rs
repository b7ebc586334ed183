use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::{debug, info, warn};
use rayon::prelude::*;

use mspc_core::models::Sample;
use mspc_core::{Config, MspcError};

use crate::classify::Classifier;
use crate::consensus::ConsensusPeak;
use crate::processor::{ChromosomeOutcome, process_chromosome};
use crate::progress::{ProgressReport, RunState, progress_bar};
use crate::result::{Analysis, SampleResult};

/// A progress receiver registered with the driver.
///
/// Channels cannot be asked whether their receiver is gone, so a dropped
/// subscriber is noticed on its first failed delivery and removed when the
/// next run starts.
#[derive(Debug)]
struct Subscriber {
    tx: Sender<ProgressReport>,
    connected: AtomicBool,
}

impl Subscriber {
    fn new(tx: Sender<ProgressReport>) -> Arc<Self> {
        Arc::new(Subscriber {
            tx,
            connected: AtomicBool::new(true),
        })
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn send(&self, report: ProgressReport) {
        if self.tx.send(report).is_err() {
            self.connected.store(false, Ordering::Release);
        }
    }
}

/// State shared between the driver and the runs it starts.
#[derive(Debug, Default)]
struct Shared {
    state: RwLock<RunState>,
    latest: RwLock<Option<Arc<Analysis>>>,
}

impl Shared {
    fn state(&self) -> RunState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: RunState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn latest(&self) -> Option<Arc<Analysis>> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_latest(&self, analysis: Option<Arc<Analysis>>) {
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = analysis;
    }
}

/// Cancellation flag and completion signal of the run currently owned by the driver.
#[derive(Debug)]
struct ActiveRun {
    cancel: Arc<AtomicBool>,
    done: Receiver<()>,
}

impl ActiveRun {
    fn is_running(&self) -> bool {
        matches!(self.done.try_recv(), Err(TryRecvError::Empty))
    }

    fn cancel_and_wait(self) {
        self.cancel.store(true, Ordering::SeqCst);
        // the run drops its sender once it reached a terminal state
        let _ = self.done.recv();
    }
}

///
/// Multiple-sample peak caller driver.
///
/// Collects replicate samples, then runs the pipeline over every chromosome
/// present in any sample, either blocking ([`Mspc::run`]) or on a background
/// thread ([`Mspc::run_async`]). Each run produces a fresh immutable
/// [`Analysis`]; the driver keeps the latest one.
///
/// ```rust
/// use mspc::{Attribute, Config, Mspc};
/// use mspc::models::{Peak, Sample};
///
/// let mut mspc = Mspc::new();
/// mspc.add_sample(Sample::from_peaks(0, vec![Peak::new("chr1", 10, 20, 1e-9)])).unwrap();
/// mspc.add_sample(Sample::from_peaks(1, vec![Peak::new("chr1", 15, 25, 1e-10)])).unwrap();
///
/// let analysis = mspc.run(Config::default()).unwrap();
/// assert_eq!(analysis.sample(0).unwrap().get(Attribute::Confirmed).count(), 1);
/// assert_eq!(analysis.consensus_peaks("chr1").len(), 1);
/// ```
///
#[derive(Debug)]
pub struct Mspc {
    samples: Arc<Vec<Sample>>,
    degree_of_parallelism: usize,
    track_supporting: bool,
    show_progress_bar: bool,
    subscribers: Mutex<Vec<Arc<Subscriber>>>,
    active: Mutex<Option<ActiveRun>>,
    shared: Arc<Shared>,
}

impl Default for Mspc {
    fn default() -> Self {
        Mspc::new()
    }
}

impl Mspc {
    pub fn new() -> Self {
        let degree_of_parallelism = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Mspc {
            samples: Arc::new(Vec::new()),
            degree_of_parallelism,
            track_supporting: false,
            show_progress_bar: false,
            subscribers: Mutex::new(Vec::new()),
            active: Mutex::new(None),
            shared: Arc::new(Shared::default()),
        }
    }

    ///
    /// Add a replicate sample. Keys must be unique.
    ///
    pub fn add_sample(&mut self, sample: Sample) -> Result<(), MspcError> {
        if self.samples.iter().any(|s| s.key() == sample.key()) {
            return Err(MspcError::DuplicateSample(sample.key()));
        }
        Arc::make_mut(&mut self.samples).push(sample);
        Ok(())
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn degree_of_parallelism(&self) -> usize {
        self.degree_of_parallelism
    }

    /// Number of chromosomes processed at the same time; at least one.
    pub fn set_degree_of_parallelism(&mut self, degree_of_parallelism: usize) {
        self.degree_of_parallelism = degree_of_parallelism.max(1);
    }

    /// Record, for every processed peak, the peaks of other samples in its cluster.
    pub fn track_supporting_peaks(&mut self, track: bool) {
        self.track_supporting = track;
    }

    /// Draw a terminal progress bar while running.
    pub fn show_progress_bar(&mut self, show: bool) {
        self.show_progress_bar = show;
    }

    ///
    /// Receive a [`ProgressReport`] for every chromosome finished by any later run.
    ///
    pub fn subscribe(&self) -> Receiver<ProgressReport> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.lock_subscribers().push(Subscriber::new(tx));
        rx
    }

    ///
    /// Like [`Mspc::subscribe`], but a full channel holds the run back until
    /// the subscriber catches up. Dropping the receiver releases the run.
    ///
    pub fn subscribe_bounded(&self, capacity: usize) -> Receiver<ProgressReport> {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        self.lock_subscribers().push(Subscriber::new(tx));
        rx
    }

    pub fn state(&self) -> RunState {
        self.shared.state()
    }

    /// The analysis of the last completed run; `None` while running or after a cancelled or failed run.
    pub fn results(&self) -> Option<Arc<Analysis>> {
        self.shared.latest()
    }

    pub fn consensus_peaks(&self) -> Option<BTreeMap<String, Vec<ConsensusPeak>>> {
        self.shared
            .latest()
            .map(|analysis| analysis.consensus().clone())
    }

    ///
    /// Run the pipeline on the calling thread and block until it completes.
    ///
    /// Returns [`MspcError::Cancelled`] when [`Mspc::cancel`] is called from
    /// another thread while running.
    ///
    pub fn run(&self, config: Config) -> Result<Arc<Analysis>, MspcError> {
        self.preflight(&config)?;
        let (job, _) = self.begin(config);
        job.execute()
    }

    ///
    /// Start the pipeline on a background thread.
    ///
    /// A run this driver started earlier is cancelled first.
    ///
    pub fn run_async(&self, config: Config) -> Result<RunHandle, MspcError> {
        self.preflight(&config)?;
        let (job, handle) = self.begin(config);

        let worker = thread::Builder::new()
            .name("mspc-run".to_string())
            .spawn(move || job.execute())
            .map_err(|e| {
                self.shared.set_state(RunState::Failed);
                MspcError::Worker(e.to_string())
            })?;

        Ok(RunHandle {
            cancel: handle.cancel,
            done: handle.done,
            progress: handle.progress,
            worker,
        })
    }

    ///
    /// Request cancellation of the active run and block until it stopped.
    ///
    /// Chromosomes already being processed are finished; no further ones start.
    /// Does nothing when no run is active.
    ///
    pub fn cancel(&self) {
        let active = self.lock_active().take();
        if let Some(active) = active {
            if active.is_running() {
                info!("Cancelling the active run");
            }
            active.cancel_and_wait();
        }
    }

    fn preflight(&self, config: &Config) -> Result<(), MspcError> {
        if self.samples.len() < 2 {
            return Err(MspcError::InsufficientSamples(self.samples.len()));
        }
        config.validate()?;
        for sample in self.samples.iter() {
            sample.validate()?;
        }
        Ok(())
    }

    fn begin(&self, config: Config) -> (Job, PendingHandle) {
        let mut active = self.lock_active();
        if let Some(previous) = active.take() {
            if previous.is_running() {
                warn!("A run is already active; cancelling it before starting a new one");
            }
            previous.cancel_and_wait();
        }

        self.shared.set_latest(None);
        self.shared.set_state(RunState::Running);

        let cancel = Arc::new(AtomicBool::new(false));
        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(0);
        let (progress_tx, progress_rx) = crossbeam_channel::unbounded();
        let mut progress = {
            let mut subscribers = self.lock_subscribers();
            subscribers.retain(|s| s.is_connected());
            subscribers.clone()
        };
        progress.push(Subscriber::new(progress_tx));

        *active = Some(ActiveRun {
            cancel: cancel.clone(),
            done: done_rx.clone(),
        });

        let job = Job {
            samples: self.samples.clone(),
            classifier: Classifier::new(config),
            degree_of_parallelism: self.degree_of_parallelism,
            track_supporting: self.track_supporting,
            show_progress_bar: self.show_progress_bar,
            cancel: cancel.clone(),
            progress,
            shared: self.shared.clone(),
            done: done_tx,
        };
        let handle = PendingHandle {
            cancel,
            done: done_rx,
            progress: progress_rx,
        };

        (job, handle)
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, Option<ActiveRun>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, Vec<Arc<Subscriber>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct PendingHandle {
    cancel: Arc<AtomicBool>,
    done: Receiver<()>,
    progress: Receiver<ProgressReport>,
}

///
/// Handle to a run started with [`Mspc::run_async`].
///
#[derive(Debug)]
pub struct RunHandle {
    cancel: Arc<AtomicBool>,
    done: Receiver<()>,
    progress: Receiver<ProgressReport>,
    worker: JoinHandle<Result<Arc<Analysis>, MspcError>>,
}

impl RunHandle {
    /// Progress of this run, one report per finished chromosome.
    pub fn progress(&self) -> &Receiver<ProgressReport> {
        &self.progress
    }

    /// Request cancellation without waiting for the run to stop.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Whether the run reached a terminal state.
    pub fn is_finished(&self) -> bool {
        matches!(self.done.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Completion signal: disconnects once the run reached a terminal state.
    pub fn done(&self) -> &Receiver<()> {
        &self.done
    }

    /// Block until the run is over.
    pub fn wait(self) -> Result<Arc<Analysis>, MspcError> {
        self.worker
            .join()
            .unwrap_or_else(|_| Err(MspcError::Worker("the run thread panicked".to_string())))
    }
}

/// Everything a single run needs, detached from the driver.
struct Job {
    samples: Arc<Vec<Sample>>,
    classifier: Classifier,
    degree_of_parallelism: usize,
    track_supporting: bool,
    show_progress_bar: bool,
    cancel: Arc<AtomicBool>,
    progress: Vec<Arc<Subscriber>>,
    shared: Arc<Shared>,
    done: Sender<()>,
}

impl Job {
    fn execute(self) -> Result<Arc<Analysis>, MspcError> {
        let outcome = self.process().map(Arc::new);

        match &outcome {
            Ok(analysis) => {
                self.shared.set_latest(Some(analysis.clone()));
                self.shared.set_state(RunState::Completed);
                info!(
                    "Run completed: {} consensus peaks",
                    analysis.consensus_count()
                );
            }
            Err(MspcError::Cancelled) => {
                self.shared.set_state(RunState::Cancelled);
                info!("Run cancelled; partial results discarded");
            }
            Err(e) => {
                self.shared.set_state(RunState::Failed);
                warn!("Run failed: {}", e);
            }
        }

        drop(self.done);
        outcome
    }

    fn process(&self) -> Result<Analysis, MspcError> {
        let chromosomes: Vec<&str> = self
            .samples
            .iter()
            .flat_map(|sample| sample.chromosomes())
            .collect::<BTreeSet<&str>>()
            .into_iter()
            .collect();
        let step_count = chromosomes.len();

        info!(
            "Processing {} samples over {} chromosomes with {} workers",
            self.samples.len(),
            step_count,
            self.degree_of_parallelism
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.degree_of_parallelism)
            .build()
            .map_err(|e| MspcError::Worker(e.to_string()))?;

        let completed = AtomicUsize::new(0);
        let bar = progress_bar(step_count, self.show_progress_bar);

        let outcomes: Vec<Option<Result<ChromosomeOutcome, MspcError>>> = pool.install(|| {
            chromosomes
                .par_iter()
                .map(|chr| {
                    if self.cancel.load(Ordering::SeqCst) {
                        return None;
                    }

                    let outcome = process_chromosome(
                        chr,
                        &self.samples,
                        &self.classifier,
                        self.track_supporting,
                    );
                    let message = match &outcome {
                        Ok(o) => {
                            debug!(
                                "{}: {} clusters, {} consensus peaks",
                                chr,
                                o.cluster_count,
                                o.consensus.len()
                            );
                            format!("Processed {}", chr)
                        }
                        Err(e) => format!("Failed {}: {}", chr, e),
                    };

                    let step = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    self.report(ProgressReport::new(step, step_count, message));
                    bar.inc(1);

                    Some(outcome)
                })
                .collect()
        });
        bar.finish_and_clear();

        if self.cancel.load(Ordering::SeqCst) || outcomes.iter().any(|o| o.is_none()) {
            return Err(MspcError::Cancelled);
        }

        let mut samples: BTreeMap<u32, SampleResult> = self
            .samples
            .iter()
            .map(|sample| (sample.key(), SampleResult::new()))
            .collect();
        let mut consensus: BTreeMap<String, Vec<ConsensusPeak>> = BTreeMap::new();

        for outcome in outcomes.into_iter().flatten() {
            let outcome = outcome?;
            for (key, sets) in outcome.samples.into_iter() {
                samples
                    .entry(key)
                    .or_default()
                    .insert(&outcome.chr, sets);
            }
            if !outcome.consensus.is_empty() {
                consensus.insert(outcome.chr, outcome.consensus);
            }
        }

        Ok(Analysis::new(samples, consensus))
    }

    fn report(&self, report: ProgressReport) {
        // a dropped subscriber is not an error
        for subscriber in self.progress.iter().filter(|s| s.is_connected()) {
            subscriber.send(report.clone());
        }
    }
}

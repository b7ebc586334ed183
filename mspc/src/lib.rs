//! Multiple-sample peak calling: combine the ChIP-seq peaks of replicate
//! samples into classified peaks and consensus peaks.
//!
//! Peaks of all samples are clustered per chromosome and strand; every cluster
//! gets Fisher's combined statistic over its members' p-values; every peak is
//! then classified from its own p-value, its cluster's evidence, and the run
//! [`Config`]. Clusters whose members are Confirmed are merged into consensus
//! peaks.
//!
//! ## Quick Start
//!
//! ```rust
//! use mspc::{Attribute, Config, Mspc, ReplicateType};
//! use mspc::models::{Peak, Sample};
//!
//! let mut mspc = Mspc::new();
//! mspc.add_sample(Sample::from_peaks(0, vec![
//!     Peak::new("chr1", 100, 200, 1e-9),
//!     Peak::new("chr1", 800, 900, 1e-2),
//! ])).unwrap();
//! mspc.add_sample(Sample::from_peaks(1, vec![
//!     Peak::new("chr1", 150, 260, 1e-12),
//! ])).unwrap();
//!
//! let config = Config {
//!     replicate_type: ReplicateType::Technical,
//!     ..Default::default()
//! };
//! let analysis = mspc.run(config).unwrap();
//!
//! let rep1 = analysis.sample(0).unwrap();
//! assert_eq!(rep1.get(Attribute::Confirmed).count(), 1);
//! assert_eq!(rep1.get(Attribute::Background).count(), 1);
//!
//! let consensus = analysis.consensus_peaks("chr1");
//! assert_eq!((consensus[0].left, consensus[0].right), (100, 260));
//! ```

/// Peak classification rules.
pub mod classify;

/// Consensus peaks of confirmed clusters.
pub mod consensus;

/// The orchestration driver.
pub mod driver;

/// Per-chromosome pipeline.
pub mod processor;

pub mod progress;

/// Classified peaks and run snapshots.
pub mod result;

/// Fisher's combined probability.
pub mod statistics;

// re-exports
pub use mspc_core::models;
pub use mspc_core::{
    Config, ConsensusQuorum, MspcError, MultipleIntersections, ReplicateType, ResolvedCandidates,
};
pub use mspc_overlaprs::{Cluster, Clusterer, PeakRef};

pub use self::classify::{Attribute, Classification, Classifier, ClusterEvidence, Rule};
pub use self::consensus::ConsensusPeak;
pub use self::driver::{Mspc, RunHandle};
pub use self::progress::{ProgressReport, RunState};
pub use self::result::{Analysis, AttributeSets, ProcessedPeak, SampleResult, SupportingPeak};
pub use self::statistics::{CombinedScore, fisher_combined};

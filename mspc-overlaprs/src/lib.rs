//! Multi-sample overlap clustering of ChIP-seq peaks.
//!
//! Given the peaks every replicate called on one chromosome, the [`Clusterer`]
//! groups them into maximal mutually overlapping clusters, one sweep per strand.
//! Overlap is half-open: `[a.left, a.right)` and `[b.left, b.right)` overlap
//! when `a.left < b.right && b.left < a.right`.
//!
//! ## Quick Start
//!
//! ```rust
//! use mspc_core::MultipleIntersections;
//! use mspc_core::models::Peak;
//! use mspc_overlaprs::{ChromosomePeaks, Clusterer};
//!
//! let rep1 = vec![Peak::new("chr1", 10, 20, 1e-6), Peak::new("chr1", 50, 60, 1e-3)];
//! let rep2 = vec![Peak::new("chr1", 15, 25, 1e-9)];
//!
//! let mut chr1 = ChromosomePeaks::new();
//! chr1.push(0, &rep1);
//! chr1.push(1, &rep2);
//!
//! let clusters = Clusterer::new(MultipleIntersections::UseLowestPValue).cluster(&chr1);
//! assert_eq!(clusters.len(), 2);
//! assert_eq!(clusters[0].len(), 2); // chr1:10-20 and chr1:15-25
//! assert!(clusters[1].is_singleton()); // chr1:50-60
//! ```

/// Cluster and peak reference types.
pub mod cluster;

/// The sweep-line clusterer.
pub mod clusterer;

// re-exports
pub use self::cluster::{Cluster, PeakRef};
pub use self::clusterer::{ChromosomePeaks, Clusterer};

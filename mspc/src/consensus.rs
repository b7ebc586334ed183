//! Consensus peaks of confirmed clusters.
//!
//! Each cluster that reaches the configured quorum of Confirmed members is
//! merged into one region spanning all of its members, carrying the best
//! member p-value and the cluster's combined statistic.

use std::fmt::{self, Display};

use mspc_core::ConsensusQuorum;
use mspc_core::models::{Peak, Strand};

use crate::statistics::CombinedScore;

/// A merged region annotated with the evidence of the cluster it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusPeak {
    pub chr: String,
    pub strand: Strand,
    pub left: u32,
    pub right: u32,
    /// Smallest p-value among the members.
    pub value: f64,
    /// Number of peaks merged into this region.
    pub member_count: usize,
    pub x_squared: f64,
    pub probability: f64,
    pub name: String,
}

impl ConsensusPeak {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn as_string(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}",
            self.chr, self.left, self.right, self.name, self.x_squared
        )
    }
}

impl Display for ConsensusPeak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

/// Whether `confirmed` Confirmed peaks out of `members` satisfy the quorum.
pub fn quorum_reached(quorum: ConsensusQuorum, confirmed: usize, members: usize) -> bool {
    if members == 0 {
        return false;
    }
    match quorum {
        ConsensusQuorum::All => confirmed == members,
        ConsensusQuorum::Majority => 2 * confirmed > members,
    }
}

/// Merge the members of a cluster. Returns `None` for an empty cluster.
///
/// The consensus is left unnamed; [`finalize`] names it once the chromosome is complete.
pub fn merge(members: &[&Peak], combined: &CombinedScore) -> Option<ConsensusPeak> {
    let first = members.first()?;

    let mut merged = ConsensusPeak {
        chr: first.chr.clone(),
        strand: first.strand,
        left: first.left,
        right: first.right,
        value: first.value,
        member_count: members.len(),
        x_squared: combined.x_squared,
        probability: combined.probability,
        name: String::new(),
    };
    for peak in members.iter().skip(1) {
        merged.left = merged.left.min(peak.left);
        merged.right = merged.right.max(peak.right);
        merged.value = merged.value.min(peak.value);
    }

    Some(merged)
}

/// Sort the consensus peaks of one chromosome by position and name them `mspc_peak_<n>`.
///
/// A cluster closes as soon as a peak misses its shortest member, so a long
/// member can still reach into the next cluster. Overlapping regions on the
/// same strand are folded together; the result keeps the stronger statistic.
pub fn finalize(mut peaks: Vec<ConsensusPeak>) -> Vec<ConsensusPeak> {
    peaks.sort_by(|a, b| {
        a.strand
            .cmp(&b.strand)
            .then(a.left.cmp(&b.left))
            .then(a.right.cmp(&b.right))
    });

    let mut merged: Vec<ConsensusPeak> = Vec::with_capacity(peaks.len());
    for peak in peaks.into_iter() {
        match merged.last_mut() {
            Some(last) if last.strand == peak.strand && peak.left < last.right => {
                last.right = last.right.max(peak.right);
                last.value = last.value.min(peak.value);
                last.member_count += peak.member_count;
                if peak.x_squared > last.x_squared {
                    last.x_squared = peak.x_squared;
                    last.probability = peak.probability;
                }
            }
            _ => merged.push(peak),
        }
    }

    merged.sort_by(|a, b| {
        a.left
            .cmp(&b.left)
            .then(a.right.cmp(&b.right))
            .then(a.strand.cmp(&b.strand))
    });
    for (i, peak) in merged.iter_mut().enumerate() {
        peak.name = format!("mspc_peak_{}", i + 1);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::fisher_combined;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_merge_spans_members() {
        let a = Peak::new("chr1", 10, 20, 1e-6);
        let b = Peak::new("chr1", 5, 12, 1e-9);
        let c = Peak::new("chr1", 11, 30, 1e-7);
        let combined = fisher_combined([1e-6, 1e-9, 1e-7]).unwrap();

        let merged = merge(&[&a, &b, &c], &combined).unwrap();

        assert_eq!(merged.chr, "chr1");
        assert_eq!((merged.left, merged.right), (5, 30));
        assert_eq!(merged.value, 1e-9);
        assert_eq!(merged.member_count, 3);
        assert_eq!(merged.x_squared, combined.x_squared);
        assert_eq!(merged.width(), 25);
    }

    #[rstest]
    fn test_merge_empty_cluster() {
        let combined = fisher_combined([1e-6]).unwrap();
        assert_eq!(merge(&[], &combined), None);
    }

    #[rstest]
    #[case(ConsensusQuorum::All, 3, 3, true)]
    #[case(ConsensusQuorum::All, 2, 3, false)]
    #[case(ConsensusQuorum::Majority, 2, 3, true)]
    #[case(ConsensusQuorum::Majority, 1, 2, false)]
    #[case(ConsensusQuorum::Majority, 0, 0, false)]
    fn test_quorum(
        #[case] quorum: ConsensusQuorum,
        #[case] confirmed: usize,
        #[case] members: usize,
        #[case] expected: bool,
    ) {
        assert_eq!(quorum_reached(quorum, confirmed, members), expected);
    }

    #[rstest]
    fn test_finalize_orders_and_names() {
        let combined = fisher_combined([1e-6]).unwrap();
        let late = Peak::new("chr1", 100, 120, 1e-6);
        let early = Peak::new("chr1", 10, 20, 1e-6);

        let peaks = finalize(vec![
            merge(&[&late], &combined).unwrap(),
            merge(&[&early], &combined).unwrap(),
        ]);

        assert_eq!(peaks[0].left, 10);
        assert_eq!(peaks[0].name, "mspc_peak_1");
        assert_eq!(peaks[1].left, 100);
        assert_eq!(peaks[1].name, "mspc_peak_2");
    }

    #[rstest]
    fn test_finalize_folds_overlapping_regions() {
        let weak = fisher_combined([1e-5, 1e-6]).unwrap();
        let strong = fisher_combined([1e-9, 1e-9]).unwrap();
        let long = Peak::new("chr1", 0, 100, 1e-5);
        let short = Peak::new("chr1", 10, 20, 1e-6);
        let inner = Peak::new("chr1", 30, 40, 1e-9);
        let other_strand = Peak::new("chr1", 50, 60, 1e-9).with_strand(Strand::Negative);

        let peaks = finalize(vec![
            merge(&[&long, &short], &weak).unwrap(),
            merge(&[&inner, &inner], &strong).unwrap(),
            merge(&[&other_strand], &strong).unwrap(),
        ]);

        assert_eq!(peaks.len(), 2);
        assert_eq!((peaks[0].left, peaks[0].right), (0, 100));
        assert_eq!(peaks[0].member_count, 4);
        assert_eq!(peaks[0].value, 1e-9);
        assert_eq!(peaks[0].x_squared, strong.x_squared);
        assert_eq!(peaks[1].strand, Strand::Negative);
        assert_eq!(peaks[1].name, "mspc_peak_2");
    }
}

//! Run parameters of a multiple-sample peak combination.

use crate::errors::MspcError;

/// Kind of replicates being combined.
///
/// Biological replicates additionally split Confirmed peaks into true and
/// false positives using the secondary threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReplicateType {
    #[default]
    Biological,
    Technical,
}

/// Resolution used when one sample contributes several peaks to the same cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MultipleIntersections {
    /// Keep the candidate with the smallest p-value.
    #[default]
    UseLowestPValue,
    /// Keep the candidate with the largest p-value.
    UseHighestPValue,
    /// Keep every candidate as a cluster member.
    KeepAll,
}

/// Fate of same-sample candidates removed by [`MultipleIntersections`] resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResolvedCandidates {
    /// Report them as Background peaks.
    #[default]
    MarkBackground,
    /// Leave them out of the results altogether.
    Drop,
}

/// How many members of a cluster must be Confirmed for it to yield a consensus peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConsensusQuorum {
    #[default]
    All,
    /// Strictly more than half of the members.
    Majority,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    pub replicate_type: ReplicateType,
    /// Peaks with a p-value below this threshold are weak-or-better (τw).
    pub weak_threshold: f64,
    /// Peaks with a p-value at or below this threshold are stringent (τs).
    pub stringent_threshold: f64,
    /// Combined-probability threshold (γ).
    pub combined_significance_threshold: f64,
    /// Minimum number of supporting replicates (c).
    pub minimum_supporting_replicates: usize,
    /// Per-member threshold splitting Biological Confirmed peaks into true/false positives (α).
    pub secondary_threshold: f64,
    pub multiple_intersections: MultipleIntersections,
    pub resolved_candidates: ResolvedCandidates,
    pub consensus_quorum: ConsensusQuorum,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            replicate_type: ReplicateType::Biological,
            weak_threshold: 1e-4,
            stringent_threshold: 1e-8,
            combined_significance_threshold: 1e-8,
            minimum_supporting_replicates: 1,
            secondary_threshold: 0.05,
            multiple_intersections: MultipleIntersections::UseLowestPValue,
            resolved_candidates: ResolvedCandidates::default(),
            consensus_quorum: ConsensusQuorum::default(),
        }
    }
}

impl Config {
    pub fn new(
        replicate_type: ReplicateType,
        weak_threshold: f64,
        stringent_threshold: f64,
        combined_significance_threshold: f64,
        minimum_supporting_replicates: usize,
        secondary_threshold: f64,
        multiple_intersections: MultipleIntersections,
    ) -> Self {
        Config {
            replicate_type,
            weak_threshold,
            stringent_threshold,
            combined_significance_threshold,
            minimum_supporting_replicates,
            secondary_threshold,
            multiple_intersections,
            ..Default::default()
        }
    }

    pub fn with_resolved_candidates(mut self, resolved_candidates: ResolvedCandidates) -> Self {
        self.resolved_candidates = resolved_candidates;
        self
    }

    pub fn with_consensus_quorum(mut self, consensus_quorum: ConsensusQuorum) -> Self {
        self.consensus_quorum = consensus_quorum;
        self
    }

    ///
    /// Check the threshold invariants: every threshold in `(0, 1]`,
    /// `stringent <= weak`, and at least one supporting replicate.
    ///
    pub fn validate(&self) -> Result<(), MspcError> {
        let thresholds = [
            ("weak_threshold", self.weak_threshold),
            ("stringent_threshold", self.stringent_threshold),
            (
                "combined_significance_threshold",
                self.combined_significance_threshold,
            ),
            ("secondary_threshold", self.secondary_threshold),
        ];
        for (field, value) in thresholds {
            if !(value > 0.0 && value <= 1.0) {
                return Err(MspcError::InvalidConfig(format!(
                    "{field} must be in (0, 1], got {value}"
                )));
            }
        }

        if self.stringent_threshold > self.weak_threshold {
            return Err(MspcError::InvalidConfig(format!(
                "stringent_threshold ({}) must not exceed weak_threshold ({})",
                self.stringent_threshold, self.weak_threshold
            )));
        }

        if self.minimum_supporting_replicates < 1 {
            return Err(MspcError::InvalidConfig(
                "minimum_supporting_replicates must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

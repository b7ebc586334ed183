//! Peak classification.
//!
//! Every peak is classified from three things only: the run [`Config`], the
//! peak's own p-value, and the [`ClusterEvidence`] of the cluster it belongs to.
//! The decision is an ordered table of [`Rule`]s; the first rule that matches
//! assigns the primary [`Attribute`].

use std::collections::HashSet;
use std::fmt::{self, Display};

use mspc_core::{Config, MspcError, ReplicateType};

use crate::statistics::{CombinedScore, fisher_combined};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    Background,
    Weak,
    Stringent,
    Confirmed,
    Discarded,
    TruePositive,
    FalsePositive,
}

impl Attribute {
    /// Attributes of which every peak carries exactly one.
    pub const PRIMARY: [Attribute; 5] = [
        Attribute::Background,
        Attribute::Weak,
        Attribute::Stringent,
        Attribute::Confirmed,
        Attribute::Discarded,
    ];

    /// Tags a Confirmed peak of biological replicates additionally carries.
    pub const SECONDARY: [Attribute; 2] = [Attribute::TruePositive, Attribute::FalsePositive];

    pub fn is_primary(&self) -> bool {
        Attribute::PRIMARY.contains(self)
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Attribute::Background => "Background",
            Attribute::Weak => "Weak",
            Attribute::Stringent => "Stringent",
            Attribute::Confirmed => "Confirmed",
            Attribute::Discarded => "Discarded",
            Attribute::TruePositive => "TruePositive",
            Attribute::FalsePositive => "FalsePositive",
        };
        write!(f, "{}", name)
    }
}

/// Cluster-level facts shared by all members of a cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterEvidence {
    /// Peaks in the cluster; drives the degrees of freedom.
    pub member_count: usize,
    /// Distinct samples contributing to the cluster.
    pub sample_count: usize,
    /// Distinct samples with at least one member passing the weak threshold.
    pub weak_supported: usize,
    /// Whether every member's p-value is at or below the secondary threshold (α).
    pub within_secondary: bool,
    pub combined: CombinedScore,
}

/// The rows of the decision table, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// The peak fails the weak threshold and fewer than `c` samples pass it.
    Uncorroborated,
    /// The cluster spans fewer than `c` samples.
    InsufficientReplicates,
    /// The combined probability is at or below γ.
    CombinedSignificance,
    /// The peak alone passes the stringent threshold.
    StringentOnly,
    /// The peak alone passes the weak threshold.
    WeakOnly,
    /// Nothing else matched.
    Fallthrough,
}

impl Rule {
    pub const ORDER: [Rule; 6] = [
        Rule::Uncorroborated,
        Rule::InsufficientReplicates,
        Rule::CombinedSignificance,
        Rule::StringentOnly,
        Rule::WeakOnly,
        Rule::Fallthrough,
    ];
}

/// Primary attribute, optional secondary tag, and the rule that decided them.
///
/// `rule` is `None` for same-sample candidates removed by multiple-intersection
/// resolution, which are Background without consulting the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub attribute: Attribute,
    pub tag: Option<Attribute>,
    pub rule: Option<Rule>,
}

impl Classification {
    pub fn resolved_candidate() -> Self {
        Classification {
            attribute: Attribute::Background,
            tag: None,
            rule: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    config: Config,
}

impl Classifier {
    pub fn new(config: Config) -> Self {
        Classifier { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The weak threshold is an exclusive bound: a p-value equal to τw is background,
    /// unless it also passes the stringent threshold.
    #[inline]
    pub fn passes_weak(&self, value: f64) -> bool {
        value < self.config.weak_threshold || self.passes_stringent(value)
    }

    #[inline]
    pub fn passes_stringent(&self, value: f64) -> bool {
        value <= self.config.stringent_threshold
    }

    /// Gather the cluster-level evidence from the `(sample key, p-value)` of every member.
    ///
    /// Replicate support is counted in samples, so several peaks of one sample
    /// kept in a cluster support it only once.
    pub fn evidence(&self, members: &[(u32, f64)]) -> Result<ClusterEvidence, MspcError> {
        let samples: HashSet<u32> = members.iter().map(|(sample, _)| *sample).collect();
        let weak_samples: HashSet<u32> = members
            .iter()
            .filter(|(_, p)| self.passes_weak(*p))
            .map(|(sample, _)| *sample)
            .collect();

        Ok(ClusterEvidence {
            member_count: members.len(),
            sample_count: samples.len(),
            weak_supported: weak_samples.len(),
            within_secondary: members
                .iter()
                .all(|(_, p)| *p <= self.config.secondary_threshold),
            combined: fisher_combined(members.iter().map(|(_, p)| *p))?,
        })
    }

    /// Evaluate a single rule; `None` when the rule does not match.
    pub fn apply(&self, rule: Rule, value: f64, evidence: &ClusterEvidence) -> Option<Attribute> {
        let c = self.config.minimum_supporting_replicates;
        match rule {
            Rule::Uncorroborated => (!self.passes_weak(value) && evidence.weak_supported < c)
                .then_some(Attribute::Background),
            Rule::InsufficientReplicates => (evidence.sample_count < c).then(|| {
                if self.passes_stringent(value) {
                    Attribute::Stringent
                } else {
                    Attribute::Discarded
                }
            }),
            Rule::CombinedSignificance => (evidence.combined.probability
                <= self.config.combined_significance_threshold)
                .then_some(Attribute::Confirmed),
            Rule::StringentOnly => self
                .passes_stringent(value)
                .then_some(Attribute::Stringent),
            Rule::WeakOnly => self.passes_weak(value).then_some(Attribute::Weak),
            Rule::Fallthrough => Some(Attribute::Discarded),
        }
    }

    pub fn classify(&self, value: f64, evidence: &ClusterEvidence) -> Classification {
        let (rule, attribute) = Rule::ORDER
            .iter()
            .find_map(|rule| self.apply(*rule, value, evidence).map(|a| (*rule, a)))
            .unwrap_or((Rule::Fallthrough, Attribute::Discarded));

        let tag = match (attribute, self.config.replicate_type) {
            (Attribute::Confirmed, ReplicateType::Biological) => Some(if evidence.within_secondary {
                Attribute::TruePositive
            } else {
                Attribute::FalsePositive
            }),
            _ => None,
        };

        Classification {
            attribute,
            tag,
            rule: Some(rule),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mspc_core::MultipleIntersections;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn config() -> Config {
        Config::new(
            ReplicateType::Biological,
            1e-4,
            1e-8,
            1e-4,
            2,
            1e-5,
            MultipleIntersections::UseLowestPValue,
        )
    }

    /// One member per sample.
    fn members(values: &[f64]) -> Vec<(u32, f64)> {
        values
            .iter()
            .enumerate()
            .map(|(i, p)| (i as u32, *p))
            .collect()
    }

    fn classify(config: Config, own: f64, cluster: &[f64]) -> Classification {
        let classifier = Classifier::new(config);
        let evidence = classifier.evidence(&members(cluster)).unwrap();
        classifier.classify(own, &evidence)
    }

    #[rstest]
    fn test_uncorroborated_weak_peak_is_background(config: Config) {
        let result = classify(config, 1e-2, &[1e-2, 1e-4]);
        assert_eq!(result.attribute, Attribute::Background);
        assert_eq!(result.rule, Some(Rule::Uncorroborated));
        assert_eq!(result.tag, None);
    }

    #[rstest]
    fn test_p_value_equal_to_weak_threshold_is_not_weak(config: Config) {
        let classifier = Classifier::new(config);
        assert!(!classifier.passes_weak(1e-4));
        assert!(classifier.passes_weak(9.9e-5));
        assert!(classifier.passes_stringent(1e-8));
    }

    #[rstest]
    #[case(1e-8, Attribute::Stringent)]
    #[case(1e-9, Attribute::Stringent)]
    #[case(1e-6, Attribute::Discarded)]
    fn test_insufficient_replicates(config: Config, #[case] own: f64, #[case] expected: Attribute) {
        let result = classify(config, own, &[own]);
        assert_eq!(result.attribute, expected);
        assert_eq!(result.rule, Some(Rule::InsufficientReplicates));
    }

    #[rstest]
    fn test_combined_significance_confirms(config: Config) {
        // 1e-3 is above α, so the confirmation is flagged as a false positive
        let result = classify(config, 1e-6, &[1e-6, 1e-3]);
        assert_eq!(result.attribute, Attribute::Confirmed);
        assert_eq!(result.rule, Some(Rule::CombinedSignificance));
        assert_eq!(result.tag, Some(Attribute::FalsePositive));
    }

    #[rstest]
    fn test_confirmed_true_positive_when_all_members_pass_alpha(config: Config) {
        let result = classify(config, 1e-6, &[1e-6, 1e-9]);
        assert_eq!(result.attribute, Attribute::Confirmed);
        assert_eq!(result.tag, Some(Attribute::TruePositive));
    }

    #[rstest]
    fn test_technical_replicates_skip_secondary_tag(mut config: Config) {
        config.replicate_type = ReplicateType::Technical;
        let result = classify(config, 1e-6, &[1e-6, 1e-9]);
        assert_eq!(result.attribute, Attribute::Confirmed);
        assert_eq!(result.tag, None);
    }

    #[rstest]
    fn test_rules_after_failed_combination(mut config: Config) {
        config.combined_significance_threshold = 1e-30;

        let stringent = classify(config.clone(), 1e-9, &[1e-9, 1e-5]);
        assert_eq!(stringent.attribute, Attribute::Stringent);
        assert_eq!(stringent.rule, Some(Rule::StringentOnly));

        let weak = classify(config.clone(), 1e-5, &[1e-9, 1e-5]);
        assert_eq!(weak.attribute, Attribute::Weak);
        assert_eq!(weak.rule, Some(Rule::WeakOnly));
    }

    #[rstest]
    fn test_fallthrough_discards(mut config: Config) {
        config.combined_significance_threshold = 1e-30;
        // two weak members corroborate, so the third one is not background
        let result = classify(config, 1e-2, &[1e-5, 1e-6, 1e-2]);
        assert_eq!(result.attribute, Attribute::Discarded);
        assert_eq!(result.rule, Some(Rule::Fallthrough));
    }

    #[rstest]
    fn test_each_rule_in_isolation(config: Config) {
        let classifier = Classifier::new(config);
        let evidence = classifier.evidence(&members(&[1e-2])).unwrap();

        assert_eq!(
            classifier.apply(Rule::Uncorroborated, 1e-2, &evidence),
            Some(Attribute::Background)
        );
        assert_eq!(
            classifier.apply(Rule::InsufficientReplicates, 1e-2, &evidence),
            Some(Attribute::Discarded)
        );
        assert_eq!(classifier.apply(Rule::CombinedSignificance, 1e-2, &evidence), None);
        assert_eq!(classifier.apply(Rule::StringentOnly, 1e-2, &evidence), None);
        assert_eq!(classifier.apply(Rule::WeakOnly, 1e-2, &evidence), None);
        assert_eq!(
            classifier.apply(Rule::Fallthrough, 1e-2, &evidence),
            Some(Attribute::Discarded)
        );
    }

    #[rstest]
    fn test_stringent_equal_to_weak_threshold(mut config: Config) {
        config.weak_threshold = 1e-6;
        config.stringent_threshold = 1e-6;
        let classifier = Classifier::new(config.clone());
        assert!(classifier.passes_weak(1e-6));

        // strong on its own, never background for lacking support
        let result = classify(config, 1e-6, &[1e-6]);
        assert_eq!(result.attribute, Attribute::Stringent);
        assert_eq!(result.rule, Some(Rule::InsufficientReplicates));
    }

    #[rstest]
    fn test_support_is_counted_in_samples(config: Config) {
        let classifier = Classifier::new(config);
        // two overlapping peaks of sample 0 kept together
        let evidence = classifier.evidence(&[(0, 1e-6), (0, 1e-6)]).unwrap();

        assert_eq!(evidence.member_count, 2);
        assert_eq!(evidence.sample_count, 1);
        assert_eq!(evidence.weak_supported, 1);
        assert_eq!(evidence.combined.n, 2);

        let result = classifier.classify(1e-6, &evidence);
        assert_eq!(result.attribute, Attribute::Discarded);
        assert_eq!(result.rule, Some(Rule::InsufficientReplicates));
    }

    #[rstest]
    fn test_exactly_one_primary_attribute() {
        for attribute in Attribute::PRIMARY {
            assert!(attribute.is_primary());
        }
        for attribute in Attribute::SECONDARY {
            assert!(!attribute.is_primary());
        }
    }
}

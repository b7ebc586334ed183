use std::collections::HashMap;

use mspc_core::models::{Peak, Sample};
use mspc_core::{MspcError, ResolvedCandidates};
use mspc_overlaprs::{ChromosomePeaks, Cluster, Clusterer, PeakRef};

use crate::classify::{Attribute, Classification, ClusterEvidence, Classifier};
use crate::consensus::{self, ConsensusPeak};
use crate::result::{AttributeSets, ProcessedPeak, SupportingPeak};

/// Everything one chromosome contributes to a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ChromosomeOutcome {
    pub chr: String,
    /// Processed peaks of every sample with peaks on the chromosome, in input order.
    pub samples: Vec<(u32, AttributeSets)>,
    pub consensus: Vec<ConsensusPeak>,
    pub cluster_count: usize,
}

///
/// Cluster, evaluate, classify and merge the peaks of all samples on one chromosome.
///
/// Chromosomes are independent of each other; this function reads the samples
/// and owns everything it returns.
///
pub fn process_chromosome(
    chr: &str,
    samples: &[Sample],
    classifier: &Classifier,
    track_supporting: bool,
) -> Result<ChromosomeOutcome, MspcError> {
    let config = classifier.config();

    let mut peaks = ChromosomePeaks::new();
    for sample in samples.iter() {
        let sample_peaks = sample.peaks(chr);
        if !sample_peaks.is_empty() {
            peaks.push(sample.key(), sample_peaks);
        }
    }

    let clusters = Clusterer::new(config.multiple_intersections).cluster(&peaks);

    let mut slots: HashMap<u32, Vec<Option<ProcessedPeak>>> = peaks
        .samples()
        .map(|(key, p)| (key, vec![None; p.len()]))
        .collect();
    let mut merged: Vec<ConsensusPeak> = Vec::new();

    for cluster in clusters.iter() {
        let values: Vec<(u32, f64)> = cluster
            .members
            .iter()
            .map(|member| (member.sample, peaks.get(*member).value))
            .collect();
        let evidence = classifier.evidence(&values)?;

        let mut confirmed = 0usize;
        for member in cluster.members.iter() {
            let peak = peaks.get(*member);
            let classification = classifier.classify(peak.value, &evidence);
            if classification.attribute == Attribute::Confirmed {
                confirmed += 1;
            }
            let processed = annotate(
                &peaks,
                cluster,
                *member,
                classification,
                &evidence,
                track_supporting,
            );
            store(&mut slots, *member, processed);
        }

        if config.resolved_candidates == ResolvedCandidates::MarkBackground {
            for candidate in cluster.resolved.iter() {
                let processed = annotate(
                    &peaks,
                    cluster,
                    *candidate,
                    Classification::resolved_candidate(),
                    &evidence,
                    track_supporting,
                );
                store(&mut slots, *candidate, processed);
            }
        }

        if consensus::quorum_reached(config.consensus_quorum, confirmed, cluster.len()) {
            let members: Vec<&Peak> = cluster.members.iter().map(|m| peaks.get(*m)).collect();
            if let Some(peak) = consensus::merge(&members, &evidence.combined) {
                merged.push(peak);
            }
        }
    }

    let mut processed_samples: Vec<(u32, AttributeSets)> = peaks
        .samples()
        .map(|(key, _)| {
            let slots = slots.remove(&key).unwrap_or_default();
            let mut sets = AttributeSets::with_capacity(slots.len());
            for peak in slots.into_iter().flatten() {
                sets.add(peak);
            }
            (key, sets)
        })
        .collect();
    processed_samples.sort_by_key(|(key, _)| *key);

    Ok(ChromosomeOutcome {
        chr: chr.to_string(),
        samples: processed_samples,
        consensus: consensus::finalize(merged),
        cluster_count: clusters.len(),
    })
}

fn annotate(
    peaks: &ChromosomePeaks,
    cluster: &Cluster,
    peak: PeakRef,
    classification: Classification,
    evidence: &ClusterEvidence,
    track_supporting: bool,
) -> ProcessedPeak {
    let supporting = if track_supporting {
        cluster
            .members
            .iter()
            .filter(|member| member.sample != peak.sample)
            .map(|member| SupportingPeak {
                sample: member.sample,
                peak: peaks.get(*member).clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    ProcessedPeak::new(
        peaks.get(peak).clone(),
        classification,
        evidence.combined,
        supporting,
    )
}

fn store(slots: &mut HashMap<u32, Vec<Option<ProcessedPeak>>>, peak: PeakRef, processed: ProcessedPeak) {
    if let Some(slot) = slots.get_mut(&peak.sample).and_then(|s| s.get_mut(peak.index)) {
        *slot = Some(processed);
    }
}

use std::collections::{BTreeMap, HashMap};

use mspc_core::models::Peak;

use crate::classify::{Attribute, Classification, Rule};
use crate::consensus::ConsensusPeak;
use crate::statistics::CombinedScore;

/// A peak of another sample that shares the cluster of a processed peak.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportingPeak {
    pub sample: u32,
    pub peak: Peak,
}

///
/// An input peak annotated with its classification and the combined
/// evidence of its cluster.
///
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedPeak {
    source: Peak,
    classification: Classification,
    combined: CombinedScore,
    supporting: Vec<SupportingPeak>,
}

impl ProcessedPeak {
    pub fn new(
        source: Peak,
        classification: Classification,
        combined: CombinedScore,
        supporting: Vec<SupportingPeak>,
    ) -> Self {
        ProcessedPeak {
            source,
            classification,
            combined,
            supporting,
        }
    }

    /// The peak as it was given in the sample.
    pub fn source(&self) -> &Peak {
        &self.source
    }

    /// The primary attribute.
    pub fn attribute(&self) -> Attribute {
        self.classification.attribute
    }

    /// TruePositive or FalsePositive for Confirmed peaks of biological replicates.
    pub fn tag(&self) -> Option<Attribute> {
        self.classification.tag
    }

    pub fn rule(&self) -> Option<Rule> {
        self.classification.rule
    }

    pub fn has_attribute(&self, attribute: Attribute) -> bool {
        self.attribute() == attribute || self.tag() == Some(attribute)
    }

    /// Fisher's X² of the peak's cluster.
    pub fn combined_score(&self) -> f64 {
        self.combined.x_squared
    }

    /// Right-tail probability of the peak's cluster.
    pub fn combined_probability(&self) -> f64 {
        self.combined.probability
    }

    /// Peaks of the other samples in the same cluster; empty unless tracking was enabled.
    pub fn supporting_peaks(&self) -> &[SupportingPeak] {
        &self.supporting
    }
}

///
/// The processed peaks of one sample on one chromosome, indexed by attribute.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSets {
    peaks: Vec<ProcessedPeak>,
    index: HashMap<Attribute, Vec<usize>>,
}

impl AttributeSets {
    pub fn with_capacity(capacity: usize) -> Self {
        AttributeSets {
            peaks: Vec::with_capacity(capacity),
            index: HashMap::new(),
        }
    }

    pub fn add(&mut self, peak: ProcessedPeak) {
        let idx = self.peaks.len();
        self.index.entry(peak.attribute()).or_default().push(idx);
        if let Some(tag) = peak.tag() {
            self.index.entry(tag).or_default().push(idx);
        }
        self.peaks.push(peak);
    }

    /// Peaks carrying the attribute, either as primary attribute or as tag.
    pub fn get(&self, attribute: Attribute) -> impl Iterator<Item = &ProcessedPeak> {
        self.index
            .get(&attribute)
            .map(|idx| idx.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|i| &self.peaks[*i])
    }

    pub fn count(&self, attribute: Attribute) -> usize {
        self.index.get(&attribute).map_or(0, |idx| idx.len())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProcessedPeak> {
        self.peaks.iter()
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }
}

impl<'a> IntoIterator for &'a AttributeSets {
    type Item = &'a ProcessedPeak;
    type IntoIter = std::slice::Iter<'a, ProcessedPeak>;

    fn into_iter(self) -> Self::IntoIter {
        self.peaks.iter()
    }
}

///
/// Classification of every peak of one sample, by chromosome.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleResult {
    chromosomes: HashMap<String, AttributeSets>,
}

impl SampleResult {
    pub fn new() -> Self {
        SampleResult::default()
    }

    pub fn insert(&mut self, chr: &str, sets: AttributeSets) {
        self.chromosomes.insert(chr.to_string(), sets);
    }

    pub fn chromosome(&self, chr: &str) -> Option<&AttributeSets> {
        self.chromosomes.get(chr)
    }

    /// Chromosome names, sorted.
    pub fn chromosomes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.chromosomes.keys().map(|c| c.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeSets)> {
        self.chromosomes.iter().map(|(chr, sets)| (chr.as_str(), sets))
    }

    /// Peaks with the attribute across all chromosomes.
    pub fn get(&self, attribute: Attribute) -> impl Iterator<Item = &ProcessedPeak> {
        self.chromosomes
            .values()
            .flat_map(move |sets| sets.get(attribute))
    }

    pub fn peak_count(&self) -> usize {
        self.chromosomes.values().map(|sets| sets.len()).sum()
    }

    /// Number of peaks per attribute; attributes nobody carries are reported as zero.
    pub fn attribute_counts(&self) -> BTreeMap<Attribute, usize> {
        Attribute::PRIMARY
            .iter()
            .chain(Attribute::SECONDARY.iter())
            .map(|attribute| {
                let count = self
                    .chromosomes
                    .values()
                    .map(|sets| sets.count(*attribute))
                    .sum();
                (*attribute, count)
            })
            .collect()
    }
}

///
/// Immutable snapshot of a completed run: the result of every sample and the
/// consensus peaks of every chromosome.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    samples: BTreeMap<u32, SampleResult>,
    consensus: BTreeMap<String, Vec<ConsensusPeak>>,
}

impl Analysis {
    pub fn new(
        samples: BTreeMap<u32, SampleResult>,
        consensus: BTreeMap<String, Vec<ConsensusPeak>>,
    ) -> Self {
        Analysis { samples, consensus }
    }

    pub fn sample(&self, key: u32) -> Option<&SampleResult> {
        self.samples.get(&key)
    }

    /// Results keyed by sample key.
    pub fn samples(&self) -> &BTreeMap<u32, SampleResult> {
        &self.samples
    }

    /// Consensus peaks of a chromosome, in ascending position.
    pub fn consensus_peaks(&self, chr: &str) -> &[ConsensusPeak] {
        self.consensus
            .get(chr)
            .map(|peaks| peaks.as_slice())
            .unwrap_or(&[])
    }

    /// Consensus peaks keyed by chromosome.
    pub fn consensus(&self) -> &BTreeMap<String, Vec<ConsensusPeak>> {
        &self.consensus
    }

    pub fn consensus_count(&self) -> usize {
        self.consensus.values().map(|peaks| peaks.len()).sum()
    }
}

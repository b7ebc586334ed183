use std::collections::HashMap;

use crate::errors::MspcError;
use crate::models::Peak;

///
/// Sample struct, the peaks called on one replicate, grouped by chromosome.
///
/// Peaks of each chromosome are kept ordered by position (see [`Peak::cmp_position`]);
/// peaks with identical coordinates keep their insertion order.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    key: u32,
    chromosomes: HashMap<String, Vec<Peak>>,
}

impl Sample {
    pub fn new(key: u32) -> Self {
        Sample {
            key,
            chromosomes: HashMap::new(),
        }
    }

    ///
    /// Create a sample from an unordered list of peaks.
    ///
    pub fn from_peaks(key: u32, peaks: Vec<Peak>) -> Self {
        let mut chromosomes: HashMap<String, Vec<Peak>> = HashMap::new();
        for peak in peaks.into_iter() {
            chromosomes.entry(peak.chr.clone()).or_default().push(peak);
        }
        for peaks in chromosomes.values_mut() {
            peaks.sort_by(|a, b| a.cmp_position(b));
        }

        Sample { key, chromosomes }
    }

    pub fn key(&self) -> u32 {
        self.key
    }

    ///
    /// Insert a peak at its ordered position on its chromosome.
    ///
    pub fn add(&mut self, peak: Peak) {
        let peaks = self.chromosomes.entry(peak.chr.clone()).or_default();
        let idx = peaks.partition_point(|p| p.cmp_position(&peak).is_le());
        peaks.insert(idx, peak);
    }

    ///
    /// Peaks of a chromosome, empty if the sample has none there.
    ///
    pub fn peaks(&self, chr: &str) -> &[Peak] {
        self.chromosomes
            .get(chr)
            .map(|peaks| peaks.as_slice())
            .unwrap_or(&[])
    }

    ///
    /// Chromosome names, sorted.
    ///
    pub fn chromosomes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.chromosomes.keys().map(|chr| chr.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Peak])> {
        self.chromosomes
            .iter()
            .map(|(chr, peaks)| (chr.as_str(), peaks.as_slice()))
    }

    pub fn peak_count(&self) -> usize {
        self.chromosomes.values().map(|peaks| peaks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.peak_count() == 0
    }

    ///
    /// Smallest and largest p-value of the sample, `None` for an empty sample.
    ///
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.chromosomes
            .values()
            .flatten()
            .map(|peak| peak.value)
            .fold(None, |acc, value| match acc {
                None => Some((value, value)),
                Some((min, max)) => Some((min.min(value), max.max(value))),
            })
    }

    ///
    /// Check every peak carries a p-value in `(0, 1]`.
    ///
    /// Chromosomes are visited in sorted order so the reported peak is deterministic.
    ///
    pub fn validate(&self) -> Result<(), MspcError> {
        for chr in self.chromosomes() {
            if let Some(peak) = self.peaks(chr).iter().find(|p| !p.has_valid_value()) {
                return Err(MspcError::InvalidPeakValue {
                    sample: self.key,
                    chr: chr.to_string(),
                    left: peak.left,
                    right: peak.right,
                    value: peak.value,
                });
            }
        }
        Ok(())
    }
}

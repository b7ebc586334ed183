use std::collections::{BTreeSet, HashMap};

use mspc_core::MultipleIntersections;
use mspc_core::models::{Peak, Strand};

use crate::cluster::{Cluster, PeakRef};

/// The peaks every sample called on a single chromosome.
///
/// Borrowed from the samples for the duration of the clustering; [`PeakRef`]s
/// produced by the [`Clusterer`] resolve against it.
#[derive(Debug, Clone, Default)]
pub struct ChromosomePeaks<'a> {
    samples: Vec<(u32, &'a [Peak])>,
}

impl<'a> ChromosomePeaks<'a> {
    pub fn new() -> Self {
        ChromosomePeaks {
            samples: Vec::new(),
        }
    }

    pub fn push(&mut self, sample: u32, peaks: &'a [Peak]) {
        self.samples.push((sample, peaks));
    }

    /// Peaks of a sample, empty if the sample is unknown.
    pub fn peaks(&self, sample: u32) -> &'a [Peak] {
        self.samples
            .iter()
            .find(|(key, _)| *key == sample)
            .map(|(_, peaks)| *peaks)
            .unwrap_or(&[])
    }

    /// Resolve a reference produced by clustering these peaks.
    ///
    /// # Panics
    ///
    /// Panics if the reference does not point into these peaks.
    pub fn get(&self, peak: PeakRef) -> &'a Peak {
        &self.peaks(peak.sample)[peak.index]
    }

    pub fn samples(&self) -> impl Iterator<Item = (u32, &'a [Peak])> + '_ {
        self.samples.iter().copied()
    }

    pub fn peak_count(&self) -> usize {
        self.samples.iter().map(|(_, peaks)| peaks.len()).sum()
    }
}

/// Groups the peaks of all samples on a chromosome into maximal mutually
/// overlapping clusters with a single left-to-right sweep.
///
/// Peaks are visited in position order (ties broken by sample key, then by
/// index). A peak joins the open cluster when it overlaps every peak already in
/// it; since peaks arrive sorted by `left`, that holds exactly when its `left`
/// lies before the smallest `right` of the open cluster. Otherwise the open
/// cluster is closed and the peak starts a new one. A peak without any
/// overlapping partner ends up as a singleton cluster.
#[derive(Debug, Clone, Copy, Default)]
pub struct Clusterer {
    policy: MultipleIntersections,
}

impl Clusterer {
    pub fn new(policy: MultipleIntersections) -> Self {
        Clusterer { policy }
    }

    pub fn policy(&self) -> MultipleIntersections {
        self.policy
    }

    /// Cluster the peaks; clusters come out grouped by strand, each group in ascending position.
    pub fn cluster(&self, peaks: &ChromosomePeaks) -> Vec<Cluster> {
        let strands: BTreeSet<Strand> = peaks
            .samples()
            .flat_map(|(_, p)| p.iter().map(|peak| peak.strand))
            .collect();

        strands
            .into_iter()
            .flat_map(|strand| self.cluster_strand(peaks, strand))
            .collect()
    }

    fn cluster_strand(&self, peaks: &ChromosomePeaks, strand: Strand) -> Vec<Cluster> {
        let mut candidates: Vec<PeakRef> = peaks
            .samples()
            .flat_map(|(sample, p)| {
                p.iter()
                    .enumerate()
                    .filter(move |(_, peak)| peak.strand == strand)
                    .map(move |(index, _)| PeakRef { sample, index })
            })
            .collect();
        candidates.sort_by(|a, b| {
            peaks
                .get(*a)
                .cmp_position(peaks.get(*b))
                .then_with(|| a.cmp(b))
        });

        let mut clusters = Vec::new();
        let mut open: Vec<PeakRef> = Vec::new();
        let mut min_right = 0u32;

        for candidate in candidates.into_iter() {
            let peak = peaks.get(candidate);
            if !open.is_empty() && peak.left < min_right {
                min_right = min_right.min(peak.right);
                open.push(candidate);
                continue;
            }

            if !open.is_empty() {
                clusters.push(self.close(peaks, strand, std::mem::take(&mut open)));
            }
            min_right = peak.right;
            open.push(candidate);
        }
        if !open.is_empty() {
            clusters.push(self.close(peaks, strand, open));
        }

        clusters
    }

    /// Apply the multiple-intersection policy to a finished cluster.
    fn close(&self, peaks: &ChromosomePeaks, strand: Strand, members: Vec<PeakRef>) -> Cluster {
        if self.policy == MultipleIntersections::KeepAll {
            return Cluster {
                strand,
                members,
                resolved: Vec::new(),
            };
        }

        // first candidate wins ties
        let mut representative: HashMap<u32, PeakRef> = HashMap::new();
        for member in members.iter() {
            representative
                .entry(member.sample)
                .and_modify(|current| {
                    if self.prefers(peaks.get(*member), peaks.get(*current)) {
                        *current = *member;
                    }
                })
                .or_insert(*member);
        }

        let (members, resolved): (Vec<PeakRef>, Vec<PeakRef>) = members
            .into_iter()
            .partition(|member| representative[&member.sample] == *member);

        Cluster {
            strand,
            members,
            resolved,
        }
    }

    fn prefers(&self, candidate: &Peak, current: &Peak) -> bool {
        match self.policy {
            MultipleIntersections::UseLowestPValue => candidate.value < current.value,
            MultipleIntersections::UseHighestPValue => candidate.value > current.value,
            MultipleIntersections::KeepAll => false,
        }
    }
}

use mspc_core::models::Strand;

/// Reference to one peak of one sample on the chromosome being clustered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeakRef {
    /// Key of the sample the peak belongs to.
    pub sample: u32,
    /// Index of the peak in that sample's peaks for the chromosome.
    pub index: usize,
}

/// A maximal group of mutually overlapping peaks on one chromosome and strand.
///
/// `members` hold at most one peak per sample unless the clusterer was built
/// with [`MultipleIntersections::KeepAll`](mspc_core::MultipleIntersections::KeepAll).
/// Same-sample candidates that lost the resolution are kept apart in `resolved`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub strand: Strand,
    pub members: Vec<PeakRef>,
    pub resolved: Vec<PeakRef>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

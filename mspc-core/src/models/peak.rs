use std::cmp::Ordering;
use std::fmt::{self, Display};

///
/// Strand of a peak. Peaks are only ever clustered with peaks on the same strand.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strand {
    Positive,
    Negative,
    #[default]
    Unstranded,
}

impl Strand {
    pub fn as_char(&self) -> char {
        match self {
            Strand::Positive => '+',
            Strand::Negative => '-',
            Strand::Unstranded => '*',
        }
    }
}

impl From<char> for Strand {
    fn from(value: char) -> Self {
        match value {
            '+' => Strand::Positive,
            '-' => Strand::Negative,
            _ => Strand::Unstranded,
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

///
/// Peak struct, one called region of a single ChIP-seq sample.
///
/// Coordinates are half-open: `[left, right)`. `value` is the peak's p-value.
///
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Peak {
    pub chr: String,
    pub strand: Strand,
    pub left: u32,
    pub right: u32,
    pub value: f64,

    pub summit: Option<u32>,
    pub name: Option<String>,
}

impl Peak {
    pub fn new(chr: &str, left: u32, right: u32, value: f64) -> Self {
        Peak {
            chr: chr.to_string(),
            strand: Strand::default(),
            left,
            right,
            value,
            summit: None,
            name: None,
        }
    }

    pub fn with_strand(mut self, strand: Strand) -> Self {
        self.strand = strand;
        self
    }

    pub fn with_summit(mut self, summit: u32) -> Self {
        self.summit = Some(summit);
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    ///
    /// Get length of the peak
    ///
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    /// Half-open overlap test on coordinates only; chromosome and strand are not compared.
    #[inline]
    pub fn overlaps(&self, other: &Peak) -> bool {
        self.left < other.right && other.left < self.right
    }

    /// Order by `left`, ties broken by `right`.
    #[inline]
    pub fn cmp_position(&self, other: &Peak) -> Ordering {
        match self.left.cmp(&other.left) {
            Ordering::Equal => self.right.cmp(&other.right),
            ord => ord,
        }
    }

    /// A p-value is usable when it lies in `(0, 1]`.
    pub fn has_valid_value(&self) -> bool {
        self.value > 0.0 && self.value <= 1.0
    }

    ///
    /// Get BED-like string of the peak
    ///
    pub fn as_string(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.chr,
            self.left,
            self.right,
            self.name.as_deref().unwrap_or("."),
            self.value,
            self.strand,
        )
    }
}

impl Display for Peak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

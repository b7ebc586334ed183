use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MspcError {
    #[error("Minimum two samples are required; {0} is given")]
    InsufficientSamples(usize),

    #[error(
        "Invalid p-value {value} for peak {chr}:{left}-{right} of sample {sample}; expected a value in (0, 1]"
    )]
    InvalidPeakValue {
        sample: u32,
        chr: String,
        left: u32,
        right: u32,
        value: f64,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("A sample with key {0} was already added")]
    DuplicateSample(u32),

    #[error("Statistics error: {0}")]
    Statistics(String),

    #[error("Worker failure: {0}")]
    Worker(String),

    /// The run observed a cancellation request. Not a failure: no results are exposed.
    #[error("The run was cancelled")]
    Cancelled,
}

pub mod peak;
pub mod sample;

// re-export for cleaner imports
pub use self::peak::{Peak, Strand};
pub use self::sample::Sample;

use std::fmt::{self, Display};

use indicatif::{ProgressBar, ProgressStyle};

/// Reported once per finished chromosome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressReport {
    /// Chromosomes finished so far, this one included.
    pub step: usize,
    pub step_count: usize,
    pub message: String,
}

impl ProgressReport {
    pub fn new(step: usize, step_count: usize, message: String) -> Self {
        ProgressReport {
            step,
            step_count,
            message,
        }
    }
}

impl Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.step, self.step_count, self.message)
    }
}

/// Lifecycle of the runs of a driver: `Idle -> Running -> {Completed, Cancelled, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Cancelled | RunState::Failed
        )
    }
}

pub(crate) fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
    {
        bar.set_style(style.progress_chars("##-"));
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_report_display() {
        let report = ProgressReport::new(3, 24, "chr3".to_string());
        assert_eq!(report.to_string(), "[3/24] chr3");
    }

    #[rstest]
    #[case(RunState::Idle, false)]
    #[case(RunState::Running, false)]
    #[case(RunState::Completed, true)]
    #[case(RunState::Cancelled, true)]
    #[case(RunState::Failed, true)]
    fn test_terminal_states(#[case] state: RunState, #[case] expected: bool) {
        assert_eq!(state.is_terminal(), expected);
    }
}

/// Job state definitions for tracking a remote crawl job
///
/// `Submitted -> Polling -> {Completed | Failed | TimedOut}`
use std::fmt;

/// Represents the client's view of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    // ===== Active States =====
    /// The service accepted the job and issued an identifier
    Submitted,

    /// The client is querying the job status
    Polling,

    // ===== Terminal States =====
    /// The service finished the job
    Completed,

    /// The service reported the job as failed
    Failed,

    /// The poll budget ran out; terminal for the client only
    TimedOut,
}

impl JobState {
    /// Returns true if no further status queries will be made
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Submitted | Self::Polling)
    }

    /// Returns true if moving from `self` to `next` is a legal step
    pub fn can_transition_to(&self, next: JobState) -> bool {
        match self {
            Self::Submitted => next == Self::Polling,
            Self::Polling => matches!(
                next,
                Self::Polling | Self::Completed | Self::Failed | Self::TimedOut
            ),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Polling => "polling",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

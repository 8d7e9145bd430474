//! State module for tracking crawl job progress
//!
//! # Components
//!
//! - `JobState`: Tracks a single job from submission to its terminal outcome

mod job_state;

pub use job_state::JobState;

//! Output module for presenting crawl results
//!
//! This module handles:
//! - Rendering outcomes and scraped pages for the terminal
//! - Writing a markdown report of a crawl to disk

mod markdown;
mod render;

pub use markdown::{format_markdown_report, write_markdown_report};
pub use render::{
    render_outcome, render_page, render_raw, render_scraped_page, truncate_content,
    RenderOptions, CONTENT_PREVIEW_CHARS,
};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

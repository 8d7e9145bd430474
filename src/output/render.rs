//! Plain-text rendering of crawl results for the terminal

use crate::client::ScrapedPage;
use crate::job::{CrawlOutcome, Page};
use serde_json::Value;
use std::borrow::Cow;

/// Number of characters shown per page before content is cut off
pub const CONTENT_PREVIEW_CHARS: usize = 1000;

const NO_CONTENT: &str = "No content available";
const NO_TITLE: &str = "No title";

/// Controls how much of a result is printed
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Truncate each page's content to this many characters (`None` = full)
    pub preview_chars: Option<usize>,

    /// Append the raw JSON payload after the rendered result
    pub include_raw: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            preview_chars: Some(CONTENT_PREVIEW_CHARS),
            include_raw: false,
        }
    }
}

/// Cuts `content` to at most `max_chars` characters, appending "..." if cut
pub fn truncate_content(content: &str, max_chars: usize) -> Cow<'_, str> {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => Cow::Owned(format!("{}...", &content[..byte_idx])),
        None => Cow::Borrowed(content),
    }
}

/// Renders one page block, numbered from 1
pub fn render_page(number: usize, page: &Page, preview_chars: Option<usize>) -> String {
    let content = page.display_content().unwrap_or(NO_CONTENT);
    let content = match preview_chars {
        Some(max) => truncate_content(content, max),
        None => Cow::Borrowed(content),
    };

    format!(
        "--- Page {}: {} ---\nURL: {}\n\n{}\n",
        number,
        page.title().unwrap_or(NO_TITLE),
        page.source_url().unwrap_or("N/A"),
        content
    )
}

/// Renders a terminal crawl outcome
pub fn render_outcome(outcome: &CrawlOutcome, options: &RenderOptions) -> String {
    let mut out = String::new();

    match outcome {
        CrawlOutcome::Success { pages, .. } => {
            out.push_str(&format!("✓ Crawl completed: found {} pages\n\n", pages.len()));
            for (i, page) in pages.iter().enumerate() {
                out.push_str(&render_page(i + 1, page, options.preview_chars));
                out.push('\n');
            }
        }
        CrawlOutcome::Failure { message, .. } => {
            out.push_str(&format!("✗ Crawl failed: {}\n", message));
        }
        CrawlOutcome::TimedOut {
            handle,
            attempts,
            budget,
            last_status,
            ..
        } => {
            out.push_str(&format!(
                "⚠ Crawl job {} did not finish after {} status checks over {}s (last status: {}).\n",
                handle.id(),
                attempts,
                budget.as_secs(),
                last_status.as_deref().unwrap_or("unknown")
            ));
            out.push_str(&format!(
                "  It may still be running; check it later with `crawl-pilot status {}`.\n",
                handle.id()
            ));
        }
    }

    if options.include_raw {
        if let Some(raw) = outcome.raw() {
            out.push_str("\nRaw response:\n");
            out.push_str(&render_raw(raw));
            out.push('\n');
        }
    }

    out
}

/// Renders a single scraped page with its metadata
pub fn render_scraped_page(scraped: &ScrapedPage, options: &RenderOptions) -> String {
    let mut out = render_page(1, &scraped.page, options.preview_chars);

    if !scraped.page.metadata.is_empty() {
        out.push_str("\nMetadata:\n");
        out.push_str(&render_raw(&Value::Object(scraped.page.metadata.clone())));
        out.push('\n');
    }

    if options.include_raw {
        out.push_str("\nRaw response:\n");
        out.push_str(&render_raw(&scraped.raw));
        out.push('\n');
    }

    out
}

/// Pretty-prints a JSON payload
pub fn render_raw(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

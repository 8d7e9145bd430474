//! Markdown report generation
//!
//! Writes a crawl outcome as a single markdown document: a header with the
//! job result, then one section per page with its full content.

use crate::job::CrawlOutcome;
use crate::output::OutputResult;
use chrono::Utc;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown report of `outcome` to `output_path`
///
/// # Arguments
///
/// * `outcome` - The terminal crawl outcome
/// * `target` - The URL the crawl started from
/// * `output_path` - Path where the markdown file should be written
pub fn write_markdown_report(
    outcome: &CrawlOutcome,
    target: &str,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_report(outcome, target);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl outcome as markdown
pub fn format_markdown_report(outcome: &CrawlOutcome, target: &str) -> String {
    let mut md = String::new();

    md.push_str("# Crawl Report\n\n");
    md.push_str(&format!("- **Target**: {}\n", target));
    md.push_str(&format!("- **Result**: {}\n", outcome.state()));
    md.push_str(&format!("- **Generated**: {}\n\n", Utc::now().to_rfc3339()));

    match outcome {
        CrawlOutcome::Success { pages, .. } => {
            md.push_str(&format!("## Pages ({})\n\n", pages.len()));

            for (i, page) in pages.iter().enumerate() {
                md.push_str(&format!(
                    "### {}. {}\n\n",
                    i + 1,
                    page.title().unwrap_or("No title")
                ));
                if let Some(url) = page.source_url() {
                    md.push_str(&format!("<{}>\n\n", url));
                }
                match page.display_content() {
                    Some(content) => {
                        md.push_str(content.trim_end());
                        md.push_str("\n\n");
                    }
                    None => md.push_str("_No content available_\n\n"),
                }
            }
        }
        CrawlOutcome::Failure { message, .. } => {
            md.push_str("## Error\n\n");
            md.push_str(&format!("{}\n", message));
        }
        CrawlOutcome::TimedOut {
            handle,
            attempts,
            budget,
            last_status,
            ..
        } => {
            md.push_str("## Timed Out\n\n");
            md.push_str(&format!("- **Job ID**: {}\n", handle.id()));
            md.push_str(&format!(
                "- **Submitted**: {}\n",
                handle.issued_at().to_rfc3339()
            ));
            md.push_str(&format!("- **Status checks**: {}\n", attempts));
            md.push_str(&format!("- **Waited up to**: {}s\n", budget.as_secs()));
            md.push_str(&format!(
                "- **Last status**: {}\n",
                last_status.as_deref().unwrap_or("unknown")
            ));
        }
    }

    md
}

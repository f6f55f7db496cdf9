//! Bundle rendering.
//!
//! Thin output layer: concatenates the selected files into one markdown
//! document, each file under its own heading in a fenced block. The caller
//! re-runs the shared token estimator over the rendered text to report the
//! bundle's final token count.

use std::fs;
use std::io;

use tracing::debug;

use crate::select::EstimatedFile;

/// Render the selected files into a single markdown bundle.
///
/// Files are emitted in selection order. Content is read here for the first
/// and only time; selection itself never touches file contents.
pub fn render_markdown(selected: &[EstimatedFile]) -> io::Result<String> {
    let mut bundle = String::from("# Repository Bundle\n");
    bundle.push_str(&format!("\nFiles: {}\n", selected.len()));

    for file in selected {
        let content = fs::read_to_string(&file.file.path)?;
        bundle.push_str(&format!("\n## {}\n\n", file.file.path.display()));
        bundle.push_str(&format!("```{}\n", file.file.extension));
        bundle.push_str(&content);
        if !content.ends_with('\n') {
            bundle.push('\n');
        }
        bundle.push_str("```\n");
    }

    debug!(files = selected.len(), bytes = bundle.len(), "rendered bundle");
    Ok(bundle)
}

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Reads the target list once. Lines are trimmed; blank lines and `#` comments are skipped.
pub fn load_targets(path: &Path) -> Result<Vec<String>> {
    let start_time = Instant::now();
    info!(action = "start", component = "target_loading", file_path = ?path, "Loading target list");

    let content = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read targets from stdin")?;
        buf
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read target file {:?}", path))?
    };

    let targets = parse_targets(&content);

    info!(
        action = "complete",
        component = "target_loading",
        target_count = targets.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Target list loaded"
    );
    Ok(targets)
}

pub fn parse_targets(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

//! Shared progress bar construction.
//!
//! Commands ask for a bar with a known row total; when progress output is off
//! they get a hidden bar, so the calling code never has to branch.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

const ROW_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows ({percent}%) {msg}";

/// Bar counting `total` rows, labelled with `label`
pub fn row_bar(total: u64, label: &str, visible: bool) -> Result<ProgressBar> {
    if !visible {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(total);
    pb.set_style(ProgressStyle::with_template(ROW_TEMPLATE)?.progress_chars("=>-"));
    pb.set_message(label.to_string());
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_bar_still_counts() {
        let pb = row_bar(10, "users", false).unwrap();
        assert!(pb.is_hidden());
        pb.inc(4);
        assert_eq!(pb.position(), 4);
    }

    #[test]
    fn test_visible_bar_has_length() {
        let pb = row_bar(25, "orders", true).unwrap();
        assert_eq!(pb.length(), Some(25));
        pb.finish_and_clear();
    }
}

//! Small string helpers for run summaries.

/// Removes `**` bold markers that agents sprinkle through run summaries.
pub fn strip_emphasis(input: &str) -> String {
    input.replace("**", "")
}

/// First line of a summary with emphasis stripped.
pub fn headline(summary: &str) -> String {
    let stripped = strip_emphasis(summary);
    stripped
        .trim()
        .lines()
        .next()
        .unwrap_or_default()
        .trim_end()
        .to_string()
}

/// Keeps at most `max` characters, without any marker.
pub fn truncate_chars(input: &str, max: usize) -> String {
    input.chars().take(max).collect()
}

/// Keeps at most `max` characters and appends `...` when anything was cut.
pub fn clip_with_ellipsis(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        return input.to_string();
    }
    let prefix: String = input.chars().take(max).collect();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headline_strips_bold_and_keeps_first_line() {
        assert_eq!(
            headline("  **Deploy** finished\nsecond line"),
            "Deploy finished"
        );
        assert_eq!(headline(""), "");
        assert_eq!(headline("\n\n"), "");
    }

    #[test]
    fn clip_appends_ellipsis_only_when_cut() {
        let exact = "a".repeat(200);
        assert_eq!(clip_with_ellipsis(&exact, 200), exact);
        let long = "é".repeat(250);
        let clipped = clip_with_ellipsis(&long, 200);
        assert_eq!(clipped.chars().count(), 203);
        assert!(clipped.ends_with("..."));
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("🚀🚀🚀", 2), "🚀🚀");
        assert_eq!(truncate_chars("short", 120), "short");
    }
}

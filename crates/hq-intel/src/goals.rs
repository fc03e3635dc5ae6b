//! Best-effort parser for per-agent `goals.md` checklists.
//!
//! The file is free-form markdown. Three things are recognised:
//! a `## Blockers` section whose bullets are blockers, and `- [ ]` / `- [x]`
//! checkboxes anywhere else. Everything else is ignored.

use hq_core::GoalSet;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

pub const GOALS_FILE_NAME: &str = "goals.md";

fn blockers_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^##\s*blockers?").expect("valid regex"))
}

fn section_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^##\s").expect("valid regex"))
}

fn bullet() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-*]\s+").expect("valid regex"))
}

fn checkbox() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^-\s*\[([ x])\]\s*(.*)").expect("valid regex"))
}

/// One classified line of a goals document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalLine {
    Blocker(String),
    Active(String),
    Completed(String),
}

pub fn classify_goal_lines(content: &str) -> Vec<GoalLine> {
    let mut out = Vec::new();
    let mut in_blockers = false;
    for raw in content.lines() {
        let line = raw.trim();
        if blockers_header().is_match(line) {
            in_blockers = true;
            continue;
        }
        if in_blockers && section_header().is_match(line) {
            in_blockers = false;
        }
        if in_blockers {
            if let Some(found) = bullet().find(line) {
                out.push(GoalLine::Blocker(line[found.end()..].to_string()));
                continue;
            }
        }
        if let Some(captures) = checkbox().captures(line) {
            let text = captures
                .get(2)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            let done = captures
                .get(1)
                .is_some_and(|mark| mark.as_str().eq_ignore_ascii_case("x"));
            out.push(if done {
                GoalLine::Completed(text)
            } else {
                GoalLine::Active(text)
            });
        }
    }
    out
}

pub fn parse_goals(content: &str) -> GoalSet {
    let mut goals = GoalSet::default();
    for line in classify_goal_lines(content) {
        match line {
            GoalLine::Blocker(text) => goals.blockers.push(text),
            GoalLine::Active(text) => goals.active.push(text),
            GoalLine::Completed(text) => goals.completed.push(text),
        }
    }
    goals
}

/// Reads `{goals_dir}/{agent_id}/goals.md`.
#[derive(Debug, Clone)]
pub struct GoalFileReader {
    goals_dir: PathBuf,
}

impl GoalFileReader {
    pub fn new(goals_dir: impl Into<PathBuf>) -> Self {
        Self {
            goals_dir: goals_dir.into(),
        }
    }

    pub fn goals_path(&self, agent_id: &str) -> PathBuf {
        self.goals_dir.join(agent_id).join(GOALS_FILE_NAME)
    }

    pub fn goals_dir(&self) -> &Path {
        &self.goals_dir
    }

    pub fn parse(&self, agent_id: &str) -> GoalSet {
        let path = self.goals_path(agent_id);
        match fs::read_to_string(&path) {
            Ok(content) => parse_goals(&content),
            Err(err) => {
                debug!(agent_id, path = %path.display(), error = %err, "no goals file");
                GoalSet::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn blockers_section_then_active_section() {
        let goals = parse_goals("## Blockers\n- API key expired\n## Active\n- [ ] ship v2");
        assert_eq!(goals.blockers, vec!["API key expired"]);
        assert_eq!(goals.active, vec!["ship v2"]);
        assert!(goals.completed.is_empty());
    }

    #[test]
    fn checkbox_marks_are_case_insensitive() {
        let goals = parse_goals(
            "# Goals\n- [x] wrote tests\n- [X] fixed ci\n  - [ ] nested still counts\n-[ ] tight\n- plain bullet\n",
        );
        assert_eq!(goals.completed, vec!["wrote tests", "fixed ci"]);
        assert_eq!(goals.active, vec!["nested still counts", "tight"]);
        assert!(goals.blockers.is_empty());
    }

    #[test]
    fn blocker_bullets_accept_star_and_singular_header() {
        let goals = parse_goals(
            "## blocker\n* waiting on CEO sign-off\n- [ ] checkbox inside blockers\nprose is ignored\n### still blockers\n- domain renewal\n## Done\n- [x] shipped\n- not a blocker\n",
        );
        assert_eq!(
            goals.blockers,
            vec![
                "waiting on CEO sign-off",
                "[ ] checkbox inside blockers",
                "domain renewal"
            ]
        );
        assert_eq!(goals.completed, vec!["shipped"]);
        assert!(goals.active.is_empty());
    }

    #[test]
    fn odd_markdown_degrades_to_empty() {
        assert!(parse_goals("").is_empty());
        assert!(parse_goals("## Blockers\n\n\n").is_empty());
        assert!(parse_goals("[ ] no dash\n-- [x] double dash").is_empty());
    }

    #[test]
    fn reader_maps_missing_file_to_empty_set() {
        let dir = TempDir::new().expect("tempdir");
        fs::create_dir_all(dir.path().join("quill")).expect("mkdir");
        fs::write(
            dir.path().join("quill").join(GOALS_FILE_NAME),
            "- [ ] draft launch post\n",
        )
        .expect("write goals");
        let reader = GoalFileReader::new(dir.path());
        assert_eq!(reader.parse("quill").active, vec!["draft launch post"]);
        assert!(reader.parse("scout").is_empty());
    }
}

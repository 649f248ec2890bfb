use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A tag that must never be deleted regardless of age
///
/// Written either as a bare tag name, which applies to every project,
/// or as `projectId:tagName`, which applies only to that project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ExclusionRule {
    Global { tag: String },
    Project { project_id: String, tag: String },
}

impl ExclusionRule {
    pub fn global(tag: impl Into<String>) -> Self {
        Self::Global { tag: tag.into() }
    }

    pub fn project(project_id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::Project {
            project_id: project_id.into(),
            tag: tag.into(),
        }
    }

    /// Whether this rule protects `tag_name` within `project_id`
    pub fn matches(&self, project_id: &str, tag_name: &str) -> bool {
        match self {
            Self::Global { tag } => tag == tag_name,
            Self::Project {
                project_id: pid,
                tag,
            } => pid == project_id && tag == tag_name,
        }
    }
}

impl FromStr for ExclusionRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let rule = s.trim();
        if rule.is_empty() {
            return Err(Error::invalid_exclusion(s, "rule is empty"));
        }
        match rule.split_once(':') {
            None => Ok(Self::global(rule)),
            Some((project_id, tag)) => {
                if project_id.is_empty() {
                    return Err(Error::invalid_exclusion(s, "project id is empty"));
                }
                if tag.is_empty() {
                    return Err(Error::invalid_exclusion(s, "tag name is empty"));
                }
                if tag.contains(':') {
                    return Err(Error::invalid_exclusion(
                        s,
                        "expected 'tagName' or 'projectId:tagName'",
                    ));
                }
                Ok(Self::project(project_id, tag))
            }
        }
    }
}

impl TryFrom<String> for ExclusionRule {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ExclusionRule> for String {
    fn from(rule: ExclusionRule) -> Self {
        rule.to_string()
    }
}

impl fmt::Display for ExclusionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global { tag } => write!(f, "{}", tag),
            Self::Project { project_id, tag } => write!(f, "{}:{}", project_id, tag),
        }
    }
}

/// Why an image was excluded from deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionMatch {
    /// Matched a bare tag rule
    Global,
    /// Matched a `projectId:tagName` rule
    Project,
}

impl fmt::Display for ExclusionMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "globally excluded"),
            Self::Project => write!(f, "excluded for project"),
        }
    }
}

/// The full set of exclusion rules for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExclusionList {
    rules: Vec<ExclusionRule>,
}

impl ExclusionList {
    pub fn new(rules: Vec<ExclusionRule>) -> Self {
        Self { rules }
    }

    /// Parse a list of `tagName` / `projectId:tagName` strings
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
        let rules = entries
            .iter()
            .map(|e| e.as_ref().parse())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Check `tag_name` against both rule forms
    ///
    /// A global match is reported in preference to a project match.
    pub fn find_match(&self, project_id: &str, tag_name: &str) -> Option<ExclusionMatch> {
        let mut found = None;
        for rule in &self.rules {
            if !rule.matches(project_id, tag_name) {
                continue;
            }
            match rule {
                ExclusionRule::Global { .. } => return Some(ExclusionMatch::Global),
                ExclusionRule::Project { .. } => found = Some(ExclusionMatch::Project),
            }
        }
        found
    }

    pub fn is_excluded(&self, project_id: &str, tag_name: &str) -> bool {
        self.find_match(project_id, tag_name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

impl fmt::Display for ExclusionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rules.is_empty() {
            return write!(f, "(none)");
        }
        let joined: Vec<String> = self.rules.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", joined.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_rule() {
        let rule: ExclusionRule = "latest".parse().unwrap();
        assert_eq!(rule, ExclusionRule::global("latest"));
        assert!(rule.matches("any-project", "latest"));
        assert!(!rule.matches("any-project", "stable"));
    }

    #[test]
    fn test_parse_project_rule() {
        let rule: ExclusionRule = "0m8b32xvgm:staging".parse().unwrap();
        assert_eq!(rule, ExclusionRule::project("0m8b32xvgm", "staging"));
        assert!(rule.matches("0m8b32xvgm", "staging"));
        assert!(!rule.matches("ps6ph7mcnp", "staging"));
    }

    #[test]
    fn test_parse_rejects_malformed_rules() {
        assert!("".parse::<ExclusionRule>().is_err());
        assert!("  ".parse::<ExclusionRule>().is_err());
        assert!(":latest".parse::<ExclusionRule>().is_err());
        assert!("p1:".parse::<ExclusionRule>().is_err());
        assert!("p1:a:b".parse::<ExclusionRule>().is_err());
    }

    #[test]
    fn test_display_round_trips_source_form() {
        for src in ["latest", "p1:dev"] {
            let rule: ExclusionRule = src.parse().unwrap();
            assert_eq!(rule.to_string(), src);
        }
    }

    #[test]
    fn test_find_match_prefers_global() {
        let list = ExclusionList::parse(&["p1:latest", "latest"]).unwrap();
        assert_eq!(list.find_match("p1", "latest"), Some(ExclusionMatch::Global));

        let list = ExclusionList::parse(&["p1:dev"]).unwrap();
        assert_eq!(list.find_match("p1", "dev"), Some(ExclusionMatch::Project));
        assert_eq!(list.find_match("p2", "dev"), None);
    }

    #[test]
    fn test_display_joins_rules() {
        let list = ExclusionList::new(vec![
            ExclusionRule::global("latest"),
            ExclusionRule::project("p1", "stable"),
        ]);
        assert_eq!(list.len(), 2);
        assert_eq!(list.to_string(), "latest, p1:stable");
        assert_eq!(ExclusionList::default().to_string(), "(none)");
    }

    #[test]
    fn test_deserialize_from_yaml_strings() {
        let list: ExclusionList = serde_yaml_ng::from_str("- latest\n- p1:dev\n").unwrap();
        assert!(list.is_excluded("p9", "latest"));
        assert!(list.is_excluded("p1", "dev"));

        let bad: std::result::Result<ExclusionList, _> = serde_yaml_ng::from_str("- 'p1:'\n");
        assert!(bad.is_err());
    }
}

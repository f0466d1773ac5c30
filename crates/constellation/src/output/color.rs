//! Color and styling helpers for CLI output.
//!
//! Semantic color theme:
//!   - Success: green (created, deleted)
//!   - Warning: yellow (HIGH criticality, partial results)
//!   - Error: red (CRITICAL criticality, failures)
//!   - Info: cyan (CI and relationship ids)
//!   - Accent: magenta (relationship types)
//!   - Muted: dimmed (field labels, LOW criticality)

use crate::domain::{Criticality, RelationshipType};
use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

/// Color a criticality label by severity.
pub(crate) fn colorize_criticality(criticality: Criticality, config: &OutputConfig) -> String {
    let text = criticality.as_str();
    if !config.use_colors {
        return text.to_string();
    }
    match criticality {
        Criticality::Critical => text.red().bold().to_string(),
        Criticality::High => text.yellow().to_string(),
        Criticality::Medium => text.to_string(),
        Criticality::Low => text.dimmed().to_string(),
    }
}

/// Colorize a CI or relationship id (cyan).
pub(crate) fn colorize_id(id: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return id.to_string();
    }
    id.cyan().to_string()
}

pub(crate) fn colorize_relationship_type(kind: RelationshipType, config: &OutputConfig) -> String {
    if !config.use_colors {
        return kind.as_str().to_string();
    }
    kind.as_str().magenta().to_string()
}

pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn plain() -> OutputConfig {
        OutputConfig::new(80, false)
    }

    #[rstest]
    #[case::critical(Criticality::Critical, "CRITICAL")]
    #[case::high(Criticality::High, "HIGH")]
    #[case::medium(Criticality::Medium, "MEDIUM")]
    #[case::low(Criticality::Low, "LOW")]
    fn criticality_without_colors_is_plain(#[case] criticality: Criticality, #[case] expected: &str) {
        assert_eq!(colorize_criticality(criticality, &plain()), expected);
    }

    #[test]
    fn helpers_pass_text_through_when_colors_disabled() {
        let config = plain();
        assert_eq!(success("ok", &config), "ok");
        assert_eq!(error("bad", &config), "bad");
        assert_eq!(warning("hmm", &config), "hmm");
        assert_eq!(colorize_id("ci-1", &config), "ci-1");
        assert_eq!(
            colorize_relationship_type(RelationshipType::DependsOn, &config),
            "DEPENDS_ON"
        );
    }

    #[test]
    fn colors_add_escape_codes() {
        colored::control::set_override(true);
        let config = OutputConfig::new(80, true);
        let critical = colorize_criticality(Criticality::Critical, &config);
        colored::control::unset_override();
        assert!(critical.contains("CRITICAL"));
        assert_ne!(critical, "CRITICAL");
    }
}

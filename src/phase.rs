//! Generation phases and the lexical phase classifier.
//!
//! Every packet lands in exactly one of five ordered phases:
//!
//! | Rank | Phase         | Typical work                                  |
//! |------|---------------|-----------------------------------------------|
//! | 0    | `scaffold`    | Project setup, tooling, configuration         |
//! | 1    | `shared`      | Utilities, shared types, hooks, UI kits       |
//! | 2    | `features`    | Everything else (the default bucket)          |
//! | 3    | `integration` | Navigation, routing, layout, wiring           |
//! | 4    | `polish`      | Tests, documentation, cleanup                 |
//!
//! Classification looks at the case-folded title and description and takes
//! the first matching keyword group in the order scaffold, shared,
//! integration, polish. Anything unmatched is `features`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the five ordered generation phases.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum GenerationPhase {
    Scaffold,
    Shared,
    #[default]
    Features,
    Integration,
    Polish,
}

impl GenerationPhase {
    pub const ALL: [GenerationPhase; 5] = [
        Self::Scaffold,
        Self::Shared,
        Self::Features,
        Self::Integration,
        Self::Polish,
    ];

    /// Numeric rank used for scheduling (`scaffold` = 0 … `polish` = 4).
    pub fn rank(&self) -> u8 {
        match self {
            Self::Scaffold => 0,
            Self::Shared => 1,
            Self::Features => 2,
            Self::Integration => 3,
            Self::Polish => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scaffold => "scaffold",
            Self::Shared => "shared",
            Self::Features => "features",
            Self::Integration => "integration",
            Self::Polish => "polish",
        }
    }
}

impl fmt::Display for GenerationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GenerationPhase {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scaffold" => Ok(Self::Scaffold),
            "shared" => Ok(Self::Shared),
            "features" | "feature" => Ok(Self::Features),
            "integration" => Ok(Self::Integration),
            "polish" => Ok(Self::Polish),
            _ => anyhow::bail!(
                "Invalid phase '{}'. Valid values: scaffold, shared, features, integration, polish",
                s
            ),
        }
    }
}

const SCAFFOLD_KEYWORDS: &[&str] = &[
    "setup",
    "set up",
    "scaffold",
    "initial",
    "bootstrap",
    "config",
    "install",
    "init project",
];

const SHARED_KEYWORDS: &[&str] = &[
    "shared",
    "util",
    "helper",
    "types",
    "interface",
    "hook",
    "component library",
    "design system",
    "common",
];

const INTEGRATION_KEYWORDS: &[&str] = &[
    "navigation",
    "routing",
    "router",
    "layout",
    "integration",
    "integrate",
    "wire up",
];

const POLISH_KEYWORDS: &[&str] = &[
    "test",
    "documentation",
    "docs",
    "readme",
    "cleanup",
    "clean up",
    "refactor",
    "polish",
];

/// Keyword groups in priority order. `features` has no group: it is the
/// fallback.
const RULES: &[(GenerationPhase, &[&str])] = &[
    (GenerationPhase::Scaffold, SCAFFOLD_KEYWORDS),
    (GenerationPhase::Shared, SHARED_KEYWORDS),
    (GenerationPhase::Integration, INTEGRATION_KEYWORDS),
    (GenerationPhase::Polish, POLISH_KEYWORDS),
];

/// Classify a packet by its title and description.
///
/// Total and pure: the same text always yields the same phase.
pub fn classify(title: &str, description: &str) -> GenerationPhase {
    let text = format!("{} {}", title, description).to_lowercase();

    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| text.contains(kw)))
        .map(|(phase, _)| *phase)
        .unwrap_or(GenerationPhase::Features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_follows_declaration_order() {
        let ranks: Vec<u8> = GenerationPhase::ALL.iter().map(|p| p.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3, 4]);
        assert!(GenerationPhase::Scaffold < GenerationPhase::Polish);
    }

    #[test]
    fn test_classify_scaffold() {
        assert_eq!(
            classify("Project Setup", "Install dependencies"),
            GenerationPhase::Scaffold
        );
        assert_eq!(
            classify("Bootstrap repo", ""),
            GenerationPhase::Scaffold
        );
    }

    #[test]
    fn test_classify_shared() {
        assert_eq!(
            classify("Date utilities", "formatting helpers"),
            GenerationPhase::Shared
        );
        assert_eq!(
            classify("Auth hook", "useAuth for components"),
            GenerationPhase::Shared
        );
    }

    #[test]
    fn test_classify_integration() {
        assert_eq!(
            classify("App navigation", "Tab bar and stack"),
            GenerationPhase::Integration
        );
        assert_eq!(
            classify("Main layout", "header and sidebar"),
            GenerationPhase::Integration
        );
    }

    #[test]
    fn test_classify_polish() {
        assert_eq!(
            classify("Write README", "usage and examples"),
            GenerationPhase::Polish
        );
        assert_eq!(
            classify("Unit tests for cart", ""),
            GenerationPhase::Polish
        );
    }

    #[test]
    fn test_classify_defaults_to_features() {
        assert_eq!(
            classify("Shopping cart", "Add and remove items"),
            GenerationPhase::Features
        );
        assert_eq!(classify("", ""), GenerationPhase::Features);
    }

    #[test]
    fn test_classify_priority_first_match_wins() {
        // Mentions both setup and tests: scaffold is checked first.
        assert_eq!(
            classify("Setup test runner", ""),
            GenerationPhase::Scaffold
        );
        // Shared beats integration.
        assert_eq!(
            classify("Shared layout primitives", ""),
            GenerationPhase::Shared
        );
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(
            classify("ROUTING", ""),
            classify("routing", "")
        );
    }

    #[test]
    fn test_classify_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(
                classify("Profile page", "Edit avatar"),
                GenerationPhase::Features
            );
        }
    }

    #[test]
    fn test_phase_display_and_from_str() {
        for phase in GenerationPhase::ALL {
            let parsed: GenerationPhase = phase.to_string().parse().unwrap();
            assert_eq!(parsed, phase);
        }
        assert!("oven".parse::<GenerationPhase>().is_err());
    }

    #[test]
    fn test_phase_serializes_lowercase() {
        let json = serde_json::to_string(&GenerationPhase::Integration).unwrap();
        assert_eq!(json, "\"integration\"");
    }
}

//! golangci-lint versions recommended for each Go release line.

use crate::version::GoVersion;

struct CompatRule {
    min: GoVersion,
    max: Option<GoVersion>,
    lint_version: &'static str,
}

impl CompatRule {
    fn contains(&self, version: GoVersion) -> bool {
        version >= self.min && self.max.is_none_or(|max| version <= max)
    }
}

/// Ordered rules with inclusive bounds; the first match wins.
const RULES: [CompatRule; 4] = [
    CompatRule {
        min: GoVersion::new(1, 0, 0),
        max: Some(GoVersion::new(1, 20, 99)),
        lint_version: "v1.54.2",
    },
    CompatRule {
        min: GoVersion::new(1, 21, 0),
        max: Some(GoVersion::new(1, 22, 99)),
        lint_version: "v1.57.2",
    },
    CompatRule {
        min: GoVersion::new(1, 23, 0),
        max: Some(GoVersion::new(1, 24, 99)),
        lint_version: "v1.64.8",
    },
    CompatRule {
        min: GoVersion::new(1, 25, 0),
        max: None,
        lint_version: "v2.9.0",
    },
];

const NEWEST: &str = RULES[RULES.len() - 1].lint_version;

/// Returns the golangci-lint version to use with `go_version`.
///
/// Unparseable input and versions outside every rule get the newest
/// recommendation.
#[must_use]
pub fn recommend(go_version: &str) -> &'static str {
    go_version
        .parse::<GoVersion>()
        .ok()
        .and_then(recommend_for)
        .unwrap_or(NEWEST)
}

fn recommend_for(version: GoVersion) -> Option<&'static str> {
    RULES
        .iter()
        .find(|rule| rule.contains(version))
        .map(|rule| rule.lint_version)
}

/// Like [`recommend`] for an already normalized version.
#[must_use]
pub fn recommend_version(version: GoVersion) -> &'static str {
    recommend_for(version).unwrap_or(NEWEST)
}

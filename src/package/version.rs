//! Version constraint evaluation.
//!
//! Ranges use the npm surface syntax: `||` separates alternatives and
//! whitespace separates comparators (`>=1.2.0 <2.0.0`). `*`, `latest` and the
//! empty string accept any version.

use semver::{Version, VersionReq};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    alternatives: Vec<VersionReq>,
}

impl VersionRange {
    pub fn any() -> Self {
        Self {
            alternatives: vec![VersionReq::STAR],
        }
    }

    pub fn parse(range: &str) -> Result<Self, semver::Error> {
        let range = range.trim();
        if matches!(range, "" | "*" | "latest" | "x") {
            return Ok(Self::any());
        }

        let alternatives = range
            .split("||")
            .map(|alt| {
                let comparators: Vec<&str> = alt.split_whitespace().collect();
                VersionReq::parse(&comparators.join(", "))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { alternatives })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }
}

/// Highest version in `versions` satisfying `constraint`.
///
/// Unparsable entries are skipped; an unparsable constraint matches nothing.
pub fn best_match(constraint: Option<&str>, versions: &[String]) -> Option<String> {
    let range = match constraint {
        Some(c) => VersionRange::parse(c).ok()?,
        None => VersionRange::any(),
    };
    versions
        .iter()
        .filter_map(|v| Version::parse(v).ok().map(|parsed| (parsed, v)))
        .filter(|(parsed, _)| range.matches(parsed))
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, v)| v.clone())
}

/// Checks plugin compatibility ranges against the host's own version.
#[derive(Debug, Clone)]
pub struct VersionMatcher {
    host_version: Version,
}

impl VersionMatcher {
    pub fn new(host_version: &str) -> Result<Self, semver::Error> {
        Ok(Self {
            host_version: Version::parse(host_version)?,
        })
    }

    pub fn host_version(&self) -> &Version {
        &self.host_version
    }

    /// Whether the host satisfies `range`. Unparsable ranges are rejected.
    pub fn host_satisfies(&self, range: &str) -> bool {
        match VersionRange::parse(range) {
            Ok(range) => range.matches(&self.host_version),
            Err(e) => {
                tracing::debug!(range, error = %e, "Unparsable compatibility range");
                false
            }
        }
    }
}

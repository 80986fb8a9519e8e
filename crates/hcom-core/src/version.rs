//! Semver comparison helpers
//!
//! Chart versions in the wild carry `v` prefixes and occasional junk, so
//! parsing is lenient. Precedence follows the semver crate: pre-release
//! identifiers order before the release, build metadata is ignored.

use semver::Version;
use serde::{Deserialize, Serialize};

/// Parse a version string, tolerating a leading `v`. Returns None when
/// the string is not a semantic version.
pub fn parse_version(s: &str) -> Option<Version> {
    let trimmed = s.trim();
    if let Ok(v) = Version::parse(trimmed) {
        return Some(v);
    }
    trimmed
        .strip_prefix('v')
        .and_then(|rest| Version::parse(rest).ok())
}

/// Return true if `candidate` is strictly newer than `current`
pub fn is_newer(current: &str, candidate: &str) -> bool {
    match (parse_version(current), parse_version(candidate)) {
        (Some(cur), Some(cand)) => cand.cmp_precedence(&cur) == std::cmp::Ordering::Greater,
        _ => false,
    }
}

/// Which semver component an upgrade would bump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateType {
    Major,
    Minor,
    Patch,
    UpToDate,
    Unknown,
}

impl UpdateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
            Self::UpToDate => "up-to-date",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for UpdateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the update between two version strings
pub fn classify_update(current: &str, latest: &str) -> UpdateType {
    let (Some(cur), Some(lat)) = (parse_version(current), parse_version(latest)) else {
        return UpdateType::Unknown;
    };
    if lat.cmp_precedence(&cur) != std::cmp::Ordering::Greater {
        return UpdateType::UpToDate;
    }
    if lat.major > cur.major {
        UpdateType::Major
    } else if lat.minor > cur.minor {
        UpdateType::Minor
    } else {
        UpdateType::Patch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ordering() {
        assert!(is_newer("1.2.9", "1.2.10"));
        assert!(!is_newer("1.2.10", "1.2.9"));
    }

    #[test]
    fn test_prerelease_orders_before_release() {
        assert!(is_newer("1.0.0-rc.1", "1.0.0"));
        assert!(!is_newer("1.0.0", "1.0.0-rc.1"));
    }

    #[test]
    fn test_build_metadata_ignored() {
        // 1.0.0+build and 1.0.0 have equal precedence
        assert!(!is_newer("1.0.0+build", "1.0.0"));
        assert!(!is_newer("1.0.0", "1.0.0+build"));
        assert_eq!(classify_update("1.0.0+build", "1.0.0"), UpdateType::UpToDate);
    }

    #[test]
    fn test_v_prefix() {
        assert!(is_newer("v1.0.0", "v1.1.0"));
        assert_eq!(parse_version("v2.3.4").unwrap().major, 2);
    }

    #[test]
    fn test_classify_update() {
        assert_eq!(classify_update("1.2.3", "2.0.0"), UpdateType::Major);
        assert_eq!(classify_update("1.2.3", "1.3.0"), UpdateType::Minor);
        assert_eq!(classify_update("1.2.3", "1.2.4"), UpdateType::Patch);
        assert_eq!(classify_update("1.2.3", "1.2.3"), UpdateType::UpToDate);
        assert_eq!(classify_update("1.2.3", "1.0.0"), UpdateType::UpToDate);
        assert_eq!(classify_update("garbage", "1.0.0"), UpdateType::Unknown);
    }

    #[test]
    fn test_unparseable_is_not_newer() {
        assert!(!is_newer("not-a-version", "1.0.0"));
        assert!(!is_newer("1.0.0", "not-a-version"));
    }
}

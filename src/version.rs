//! Semantic versions for store schema migrations

use std::cmp::Ordering;
use std::fmt;

/// Parsed semantic version with optional pre-release tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemVer {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    /// Pre-release tag (e.g., "rc7", "beta1"). None means final release.
    pub prerelease: Option<String>,
}

impl SemVer {
    pub fn parse(version: &str) -> Option<Self> {
        let version = version.trim().trim_start_matches('v');
        let (version_part, prerelease) = match version.split_once('-') {
            Some((v, pre)) => (v, Some(pre.to_string())),
            None => (version, None),
        };

        let parts: Vec<&str> = version_part.split('.').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return None;
        }

        Some(SemVer {
            major: parts.first()?.parse().ok()?,
            minor: parts.get(1)?.parse().ok()?,
            patch: match parts.get(2) {
                Some(p) => p.parse().ok()?,
                None => 0,
            },
            prerelease,
        })
    }

    /// None (final release) > Some (pre-release); same prefix compares numerically
    fn compare_prerelease(a: &Option<String>, b: &Option<String>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => {
                let a_prefix = a.trim_end_matches(|c: char| c.is_ascii_digit());
                let b_prefix = b.trim_end_matches(|c: char| c.is_ascii_digit());

                if a_prefix == b_prefix {
                    let a_num: u32 = a[a_prefix.len()..].parse().unwrap_or(0);
                    let b_num: u32 = b[b_prefix.len()..].parse().unwrap_or(0);
                    a_num.cmp(&b_num)
                } else {
                    a.cmp(b)
                }
            }
        }
    }
}

impl Ord for SemVer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| Self::compare_prerelease(&self.prerelease, &other.prerelease))
    }
}

impl PartialOrd for SemVer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

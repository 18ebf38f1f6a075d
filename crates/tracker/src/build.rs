//! Build number providers.

use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use std::sync::Arc;

/// Build number of an application binary. Monotonically increasing across
/// releases.
pub type BuildNumber = u32;

pub type BuildHandle = Arc<dyn BuildProvider + Send + Sync>;

/// Source of the running application's build number.
///
/// Implementations never fail: anything that can't be turned into a build
/// number resolves to `0`.
#[async_trait]
pub trait BuildProvider: Send + Sync {
    async fn current_build_number(&self) -> BuildNumber;
}

/// A build number known up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBuild(pub BuildNumber);

#[async_trait]
impl BuildProvider for FixedBuild {
    async fn current_build_number(&self) -> BuildNumber {
        self.0
    }
}

/// A build number taken from package metadata, such as `"118"` or the
/// build-metadata part of `"2.3.0+118"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageBuild {
    version: String,
}
impl PackageBuild {
    pub fn new(version: impl Into<String>) -> Self {
        Self { version: version.into() }
    }
}

#[async_trait]
impl BuildProvider for PackageBuild {
    async fn current_build_number(&self) -> BuildNumber {
        parse_build_number(&self.version).unwrap_or_else(|err| {
            tracing::warn!(version = %self.version, error = ?err, "Falling back to build number 0");
            0
        })
    }
}

/// Extract the build number from a package version string.
///
/// # Examples
///
/// ```
/// use firstrun_tracker::parse_build_number;
/// assert_eq!(parse_build_number("118").unwrap(), 118);
/// assert_eq!(parse_build_number("2.3.0+118").unwrap(), 118);
/// assert!(parse_build_number("2.3.0").is_err());
/// ```
pub fn parse_build_number(version: &str) -> Result<BuildNumber> {
    let version = version.trim();
    let number = match version.split_once('+') {
        Some((_, metadata)) => metadata,
        None => version,
    };
    number.parse::<BuildNumber>().or_raise(|| ErrorKind::BuildNumberParse(version.to_string()))
}

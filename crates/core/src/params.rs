// Lenient operation parameters: unknown values fall back to safe defaults

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_BASE_BRANCH: &str = "main";
pub const DEFAULT_RELEASE_LIMIT: u32 = 10;
pub const MIN_RELEASE_LIMIT: u32 = 1;
pub const MAX_RELEASE_LIMIT: u32 = 100;

/// State filter for issue listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
    All,
}

impl IssueState {
    pub const ALLOWED: &'static [&'static str] = &["open", "closed", "all"];

    /// Parse a state filter, falling back to `open` for anything unrecognized.
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "open" => Self::Open,
            "closed" => Self::Closed,
            "all" => Self::All,
            other => {
                tracing::debug!("Unknown issue state {:?}, using open", other);
                Self::default()
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }
}

/// State filter for pull request listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    #[default]
    Open,
    Closed,
    Merged,
    All,
}

impl PrState {
    pub const ALLOWED: &'static [&'static str] = &["open", "closed", "merged", "all"];

    /// Parse a state filter, falling back to `open` for anything unrecognized.
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "open" => Self::Open,
            "closed" => Self::Closed,
            "merged" => Self::Merged,
            "all" => Self::All,
            other => {
                tracing::debug!("Unknown PR state {:?}, using open", other);
                Self::default()
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Merged => "merged",
            Self::All => "all",
        }
    }
}

/// Merge strategy for `gh pr merge`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    #[default]
    Merge,
    Squash,
    Rebase,
}

impl MergeMethod {
    pub const ALLOWED: &'static [&'static str] = &["merge", "squash", "rebase"];

    /// Parse a merge strategy, falling back to `merge` for anything unrecognized.
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "merge" => Self::Merge,
            "squash" => Self::Squash,
            "rebase" => Self::Rebase,
            other => {
                tracing::debug!("Unknown merge method {:?}, using merge", other);
                Self::default()
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Squash => "squash",
            Self::Rebase => "rebase",
        }
    }

    /// The `gh pr merge` flag selecting this strategy
    pub fn flag(&self) -> &'static str {
        match self {
            Self::Merge => "--merge",
            Self::Squash => "--squash",
            Self::Rebase => "--rebase",
        }
    }
}

macro_rules! impl_display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

impl_display_as_str!(IssueState, PrState, MergeMethod);

/// Clamp a release limit into `[1, 100]`.
pub fn clamp_limit(limit: i64) -> u32 {
    limit.clamp(MIN_RELEASE_LIMIT as i64, MAX_RELEASE_LIMIT as i64) as u32
}

/// Parse a loosely typed limit. Non-numeric text yields the default,
/// fractional values are truncated, everything is then clamped.
pub fn parse_limit(raw: &str) -> u32 {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return clamp_limit(n);
    }
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => clamp_limit(n.trunc() as i64),
        _ => DEFAULT_RELEASE_LIMIT,
    }
}

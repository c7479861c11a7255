//! Entity name matching for spotlights and exclusions.

use thiserror::Error;

/// Select entities by name.
///
/// `Exact` compares the whole label. `Substring` matches any label containing
/// the fragment, which also catches composite rows such as
/// `"Germany (until 1990 former territory of the FRG)"`.
///
/// # Examples
/// ```
/// use loopstat_core::EntityMatcher;
///
/// # fn main() -> Result<(), loopstat_core::MatcherError> {
/// let exact = EntityMatcher::exact("Germany")?;
/// let loose = EntityMatcher::substring("Germany")?;
/// let label = "Germany (until 1990 former territory of the FRG)";
/// assert!(!exact.matches(label));
/// assert!(loose.matches(label));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(rename_all = "snake_case", try_from = "MatcherRepr", into = "MatcherRepr")
)]
pub enum EntityMatcher {
    /// Match a label exactly.
    Exact(String),
    /// Match labels containing the fragment.
    Substring(String),
}

/// Errors returned when building an [`EntityMatcher`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatcherError {
    /// The pattern was empty or whitespace.
    #[error("entity pattern must not be blank")]
    BlankPattern,
}

impl EntityMatcher {
    /// Match `name` exactly.
    ///
    /// # Errors
    /// Returns [`MatcherError::BlankPattern`] when `name` is blank.
    pub fn exact(name: impl Into<String>) -> Result<Self, MatcherError> {
        non_blank(name.into()).map(Self::Exact)
    }

    /// Match any entity whose label contains `fragment`.
    ///
    /// # Errors
    /// Returns [`MatcherError::BlankPattern`] when `fragment` is blank.
    pub fn substring(fragment: impl Into<String>) -> Result<Self, MatcherError> {
        non_blank(fragment.into()).map(Self::Substring)
    }

    /// Report whether `entity` matches.
    #[must_use]
    pub fn matches(&self, entity: &str) -> bool {
        match self {
            Self::Exact(name) => entity == name,
            Self::Substring(fragment) => entity.contains(fragment.as_str()),
        }
    }

    /// The configured pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        match self {
            Self::Exact(pattern) | Self::Substring(pattern) => pattern,
        }
    }
}

fn non_blank(pattern: String) -> Result<String, MatcherError> {
    if pattern.trim().is_empty() {
        Err(MatcherError::BlankPattern)
    } else {
        Ok(pattern)
    }
}

/// Unvalidated wire form; routes deserialisation through the constructors.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
enum MatcherRepr {
    Exact(String),
    Substring(String),
}

#[cfg(feature = "serde")]
impl TryFrom<MatcherRepr> for EntityMatcher {
    type Error = MatcherError;

    fn try_from(repr: MatcherRepr) -> Result<Self, Self::Error> {
        match repr {
            MatcherRepr::Exact(name) => Self::exact(name),
            MatcherRepr::Substring(fragment) => Self::substring(fragment),
        }
    }
}

#[cfg(feature = "serde")]
impl From<EntityMatcher> for MatcherRepr {
    fn from(matcher: EntityMatcher) -> Self {
        match matcher {
            EntityMatcher::Exact(name) => Self::Exact(name),
            EntityMatcher::Substring(fragment) => Self::Substring(fragment),
        }
    }
}

//! Engine configuration for matching and transformation limits.

use serde::Deserialize;

/// Engine configuration controlling pass caps, match limits, and quantifier
/// bounds.
///
/// # Defaults
///
/// - `max_passes`: 100
/// - `max_matches`: 10 000
/// - `max_quantifier_bound`: 1 024
/// - `allow_overlap`: `false`
///
/// # Example
///
/// ```
/// use treepace_pattern::EngineConfig;
///
/// let config = EngineConfig::default().with_max_passes(5);
/// assert_eq!(config.max_passes(), 5);
/// assert_eq!(config.max_matches(), 10_000);
/// assert!(!config.allow_overlap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum passes a repeat-mode transformation may apply.
    max_passes: usize,
    /// Maximum matches one matcher run yields before truncation.
    max_matches: usize,
    /// Largest explicit bound accepted in a `{m,n}` quantifier.
    max_quantifier_bound: u32,
    /// Whether matches may share replaced regions.
    allow_overlap: bool,
}

impl EngineConfig {
    /// Creates a configuration with explicit values.
    #[must_use]
    pub const fn new(
        max_passes: usize,
        max_matches: usize,
        max_quantifier_bound: u32,
        allow_overlap: bool,
    ) -> Self {
        Self {
            max_passes,
            max_matches,
            max_quantifier_bound,
            allow_overlap,
        }
    }

    /// Returns the repeat-mode pass cap.
    #[must_use]
    pub const fn max_passes(&self) -> usize {
        self.max_passes
    }

    /// Returns the per-run match limit.
    #[must_use]
    pub const fn max_matches(&self) -> usize {
        self.max_matches
    }

    /// Returns the largest accepted quantifier bound.
    #[must_use]
    pub const fn max_quantifier_bound(&self) -> u32 {
        self.max_quantifier_bound
    }

    /// Returns whether overlapping matches are yielded.
    #[must_use]
    pub const fn allow_overlap(&self) -> bool {
        self.allow_overlap
    }

    /// Sets the repeat-mode pass cap.
    #[must_use]
    pub const fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Sets the per-run match limit.
    #[must_use]
    pub const fn with_max_matches(mut self, max_matches: usize) -> Self {
        self.max_matches = max_matches;
        self
    }

    /// Sets the largest accepted quantifier bound.
    #[must_use]
    pub const fn with_max_quantifier_bound(mut self, bound: u32) -> Self {
        self.max_quantifier_bound = bound;
        self
    }

    /// Enables or disables overlapping matches.
    #[must_use]
    pub const fn with_allow_overlap(mut self, allow_overlap: bool) -> Self {
        self.allow_overlap = allow_overlap;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_passes: 100,
            max_matches: 10_000,
            max_quantifier_bound: 1_024,
            allow_overlap: false,
        }
    }
}

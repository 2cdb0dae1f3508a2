//! Magnet URI validation against the default or user-supplied rules.

use once_cell::sync::Lazy;
use regex_lite::{Regex, RegexBuilder};
use tracing::warn;

/// Default rule: a BitTorrent topic with a 32-40 character hash.
static DEFAULT_RULE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"^magnet:\?xt=urn:btih:[A-Za-z0-9]{32,40}")
        .case_insensitive(true)
        .build()
        .expect("default magnet rule is a valid regex")
});

/// Compiled validation rules.
#[derive(Debug, Clone)]
enum Rules {
    Default,
    /// User patterns in order; `None` marks a pattern that failed to compile.
    Custom(Vec<Option<Regex>>),
}

/// Validates magnet URIs.
///
/// With no custom patterns the default rule applies. Otherwise a URI is valid
/// when at least one pattern matches it case-insensitively; patterns that do
/// not compile never match.
#[derive(Debug, Clone)]
pub struct MagnetValidator {
    rules: Rules,
}

impl Default for MagnetValidator {
    fn default() -> Self {
        Self {
            rules: Rules::Default,
        }
    }
}

impl MagnetValidator {
    /// Compile a validator from regex source strings.
    pub fn new<S: AsRef<str>>(custom_patterns: &[S]) -> Self {
        if custom_patterns.is_empty() {
            return Self::default();
        }

        let compiled = custom_patterns
            .iter()
            .map(|p| {
                let source = p.as_ref();
                match RegexBuilder::new(source).case_insensitive(true).build() {
                    Ok(re) => Some(re),
                    Err(e) => {
                        warn!(pattern = source, error = %e, "Ignoring invalid magnet pattern");
                        None
                    }
                }
            })
            .collect();

        Self {
            rules: Rules::Custom(compiled),
        }
    }

    /// Whether user patterns replace the default rule.
    pub fn uses_custom_patterns(&self) -> bool {
        matches!(self.rules, Rules::Custom(_))
    }

    pub fn is_valid(&self, uri: &str) -> bool {
        match &self.rules {
            Rules::Default => DEFAULT_RULE.is_match(uri),
            Rules::Custom(patterns) => patterns.iter().flatten().any(|re| re.is_match(uri)),
        }
    }
}

/// Validate a magnet URI against `custom_patterns` (or the default rule).
pub fn is_valid_magnet<S: AsRef<str>>(uri: &str, custom_patterns: &[S]) -> bool {
    MagnetValidator::new(custom_patterns).is_valid(uri)
}

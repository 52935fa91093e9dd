//! Pre-compiled format patterns shared by rule evaluation and accuracy checks.

use regex::Regex;

use crate::config::PatternConfig;

/// A compiled pattern, or the reason it failed to compile.
///
/// Invalid patterns are kept instead of rejected so that a bad configuration
/// surfaces as a per-field error during evaluation rather than aborting a run.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    compiled: std::result::Result<Regex, String>,
}

impl CompiledPattern {
    /// Compiles a pattern, capturing compilation failures.
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let compiled = Regex::new(&source).map_err(|e| e.to_string());
        if let Err(ref reason) = compiled {
            tracing::warn!("Pattern '{}' failed to compile: {}", source, reason);
        }
        Self { source, compiled }
    }

    /// Returns the pattern source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the compilation error, if any.
    pub fn error(&self) -> Option<&str> {
        self.compiled.as_ref().err().map(String::as_str)
    }

    /// Tests the pattern against `text`.
    ///
    /// # Errors
    /// Returns the compilation error when the pattern is invalid.
    pub fn is_match(&self, text: &str) -> std::result::Result<bool, String> {
        match &self.compiled {
            Ok(regex) => Ok(regex.is_match(text)),
            Err(reason) => Err(reason.clone()),
        }
    }
}

/// Removes the separators people type into phone numbers: whitespace,
/// parentheses, dashes and dots.
pub fn clean_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '-' | '.'))
        .collect()
}

/// Compiled versions of the configured email and phone patterns.
#[derive(Debug, Clone)]
pub struct CompiledPatterns {
    /// Email address pattern
    pub email: CompiledPattern,
    /// Phone pattern, applied after [`clean_phone`]
    pub phone: CompiledPattern,
}

impl CompiledPatterns {
    /// Compiles all configured patterns.
    ///
    /// This is called once per analyzer, never per record.
    pub fn compile(config: &PatternConfig) -> Self {
        Self {
            email: CompiledPattern::new(&config.email),
            phone: CompiledPattern::new(&config.phone),
        }
    }

    /// Checks an email address.
    pub fn is_email(&self, candidate: &str) -> std::result::Result<bool, String> {
        self.email.is_match(candidate)
    }

    /// Cleans and checks a phone number.
    pub fn is_phone(&self, candidate: &str) -> std::result::Result<bool, String> {
        self.phone.is_match(&clean_phone(candidate))
    }
}

impl Default for CompiledPatterns {
    fn default() -> Self {
        Self::compile(&PatternConfig::default())
    }
}

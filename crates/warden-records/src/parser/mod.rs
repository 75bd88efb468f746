//! Record document parsing strategies.
//!
//! [`RecordParser`] is the seam: [`PatternParser`] extracts records with
//! tag/attribute patterns and is tried first; [`StructuralParser`] walks
//! the element tree and takes over when the pattern parser is unavailable
//! or rejects the document. Both produce the same [`RecordSet`] for a
//! well-formed document.

mod pattern;
mod structural;

pub use pattern::PatternParser;
pub use structural::StructuralParser;

use tracing::warn;

use crate::error::RecordError;
use crate::record::RecordSet;

/// A strategy that turns a record document into a [`RecordSet`].
pub trait RecordParser: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Parse a whole document.
    fn parse(&self, document: &str) -> Result<RecordSet, RecordError>;
}

/// Parsing strategies tried in a fixed order.
pub struct ParserChain {
    strategies: Vec<Box<dyn RecordParser>>,
}

impl ParserChain {
    /// A chain over the given strategies, first to last.
    pub fn new(strategies: Vec<Box<dyn RecordParser>>) -> Self {
        Self { strategies }
    }

    /// Pattern parser first, structural fallback second.
    ///
    /// If the pattern grammar cannot be built the chain runs on the
    /// structural parser alone.
    pub fn standard() -> Self {
        let mut strategies: Vec<Box<dyn RecordParser>> = Vec::with_capacity(2);
        match PatternParser::new() {
            Ok(parser) => strategies.push(Box::new(parser)),
            Err(e) => warn!(error = %e, "pattern record parser unavailable"),
        }
        strategies.push(Box::new(StructuralParser));
        Self::new(strategies)
    }

    /// Names of the configured strategies, in order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Parse with the first strategy that accepts the document.
    ///
    /// Blank documents are an empty record set.
    pub fn parse(&self, document: &str) -> Result<RecordSet, RecordError> {
        if document.trim().is_empty() {
            return Ok(RecordSet::new());
        }

        let mut last_error = RecordError::NoParser;
        for strategy in &self.strategies {
            match strategy.parse(document) {
                Ok(records) => return Ok(records),
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "record parser rejected document");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    /// Parse, substituting an empty record set when every strategy fails.
    pub fn parse_or_empty(&self, document: &str) -> RecordSet {
        self.parse(document).unwrap_or_else(|e| {
            warn!(error = %e, "record document unreadable, treating as empty");
            RecordSet::new()
        })
    }
}

impl Default for ParserChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for ParserChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserChain")
            .field("strategies", &self.strategy_names())
            .finish()
    }
}

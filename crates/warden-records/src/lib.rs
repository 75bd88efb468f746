//! Record-set parsing, diffing, and changelog output for the Warden server editor.
//!
//! A record set is an XML-like "types" document of named entries. When
//! an editor overwrites one, the old and new documents are parsed into
//! [`RecordSet`]s, compared field by field, and the differences are
//! appended to a plain-text changelog:
//!
//! ```text
//! old text --+                                   +--> Vec<ChangeEntry> --> Changelog::append
//!            +--> ParserChain::parse_or_empty ---+
//! new text --+      (pattern, then structural)   +--> diff::diff_record_sets
//! ```
//!
//! A document that neither parser accepts is treated as empty, so every
//! record in the other snapshot shows up as wholesale added or removed.

pub mod changelog;
pub mod diff;
pub mod error;
pub mod parser;
pub mod record;

pub use changelog::{Changelog, DEFAULT_EDITOR_ID};
pub use diff::{ChangeEntry, ChangeKind, diff_documents, diff_record, diff_record_sets};
pub use error::RecordError;
pub use parser::{ParserChain, PatternParser, RecordParser, StructuralParser};
pub use record::{Flag, RecordSet, ScalarField, StructuredRecord};

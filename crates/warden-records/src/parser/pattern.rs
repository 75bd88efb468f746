//! Tag/attribute pattern extraction.

use regex::Regex;

use super::RecordParser;
use crate::error::RecordError;
use crate::record::{RecordSet, StructuredRecord};

const STRATEGY: &str = "pattern";

const COMMENT_PATTERN: &str = r"(?s)<!--.*?-->";
const TYPE_PATTERN: &str = r"(?s)<type\b(?P<attrs>[^>]*?)(?:/>|>(?P<body>.*?)</type\s*>)";
const TYPE_OPEN_PATTERN: &str = r"<type\b";
const CHILD_PATTERN: &str = r"<(?P<tag>[A-Za-z_][\w.-]*)(?P<attrs>[^>]*?)(?:/>|>(?P<text>[^<]*)</(?P<close>[A-Za-z_][\w.-]*)\s*>)";
const CHILD_OPEN_PATTERN: &str = r"<[A-Za-z_]";
const ATTRIBUTE_PATTERN: &str = r#"(?P<key>[A-Za-z_][\w:.-]*)\s*=\s*"(?P<value>[^"]*)""#;

/// Primary strategy: pattern matching over the raw text.
///
/// Rejects documents it cannot account for completely (unbalanced
/// `<type>` elements, nested markup inside a child element, records
/// without a name) so the chain can fall back.
#[derive(Debug, Clone)]
pub struct PatternParser {
    comment: Regex,
    record: Regex,
    record_open: Regex,
    child: Regex,
    child_open: Regex,
    attribute: Regex,
}

impl PatternParser {
    /// Compile the grammar.
    pub fn new() -> Result<Self, RecordError> {
        Ok(Self {
            comment: Regex::new(COMMENT_PATTERN)?,
            record: Regex::new(TYPE_PATTERN)?,
            record_open: Regex::new(TYPE_OPEN_PATTERN)?,
            child: Regex::new(CHILD_PATTERN)?,
            child_open: Regex::new(CHILD_OPEN_PATTERN)?,
            attribute: Regex::new(ATTRIBUTE_PATTERN)?,
        })
    }

    fn attributes<'a>(&self, raw: &'a str) -> Vec<(&'a str, &'a str)> {
        self.attribute
            .captures_iter(raw)
            .filter_map(|caps| Some((caps.name("key")?.as_str(), caps.name("value")?.as_str())))
            .collect()
    }

    fn parse_body(&self, record: &mut StructuredRecord, body: &str) -> Result<(), RecordError> {
        let mut matched = 0_usize;
        for caps in self.child.captures_iter(body) {
            let Some(tag) = caps.name("tag").map(|m| m.as_str()) else {
                continue;
            };
            if let Some(close) = caps.name("close")
                && close.as_str() != tag
            {
                return Err(malformed(format!(
                    "<{tag}> closed by </{}> in {}",
                    close.as_str(),
                    record.name
                )));
            }
            let attributes = caps
                .name("attrs")
                .map(|m| self.attributes(m.as_str()))
                .unwrap_or_default();
            record.apply_child(tag, &attributes, caps.name("text").map(|m| m.as_str()));
            matched = matched.saturating_add(1);
        }

        let opened = self.child_open.find_iter(body).count();
        if opened != matched {
            return Err(malformed(format!(
                "unrecognised markup inside {} ({opened} elements, {matched} understood)",
                record.name
            )));
        }
        Ok(())
    }
}

impl RecordParser for PatternParser {
    fn name(&self) -> &'static str {
        STRATEGY
    }

    fn parse(&self, document: &str) -> Result<RecordSet, RecordError> {
        let document = self.comment.replace_all(document, "");
        let mut records = RecordSet::new();
        let mut matched = 0_usize;

        for caps in self.record.captures_iter(&document) {
            let attrs = caps.name("attrs").map_or("", |m| m.as_str());
            let name = self
                .attributes(attrs)
                .into_iter()
                .find(|(key, _)| *key == "name")
                .map(|(_, value)| value)
                .ok_or_else(|| malformed("<type> without a name".to_owned()))?;

            let mut record = StructuredRecord::new(name);
            if let Some(body) = caps.name("body") {
                self.parse_body(&mut record, body.as_str())?;
            }
            records.insert(record.name.clone(), record);
            matched = matched.saturating_add(1);
        }

        let opened = self.record_open.find_iter(&document).count();
        if opened != matched {
            return Err(malformed(format!(
                "{opened} <type> elements opened, {matched} complete"
            )));
        }
        Ok(records)
    }
}

const fn malformed(reason: String) -> RecordError {
    RecordError::Malformed {
        strategy: STRATEGY,
        reason,
    }
}

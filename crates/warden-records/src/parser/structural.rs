//! Element-tree fallback parser.
//!
//! Scans the document into start, end, and text tokens, checks that
//! elements nest properly, and collects every `<type>` element's direct
//! children. Tolerates single-quoted attributes, processing instructions,
//! doctype declarations, and CDATA sections.

use super::RecordParser;
use crate::error::RecordError;
use crate::record::{RecordSet, StructuredRecord};

const STRATEGY: &str = "structural";

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Open {
        name: &'a str,
        attributes: Vec<(&'a str, &'a str)>,
        self_closing: bool,
    },
    Close(&'a str),
    Text(&'a str),
}

/// Fallback strategy: a small well-formedness-checking element scanner.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralParser;

impl RecordParser for StructuralParser {
    fn name(&self) -> &'static str {
        STRATEGY
    }

    fn parse(&self, document: &str) -> Result<RecordSet, RecordError> {
        let tokens = tokenize(document)?;
        build(&tokens)
    }
}

/// State of the `<type>` element currently being read.
struct OpenRecord<'a> {
    record: StructuredRecord,
    depth: usize,
    child: Option<OpenChild<'a>>,
}

struct OpenChild<'a> {
    name: &'a str,
    attributes: Vec<(&'a str, &'a str)>,
    text: String,
}

fn build(tokens: &[Token<'_>]) -> Result<RecordSet, RecordError> {
    let mut records = RecordSet::new();
    let mut stack: Vec<&str> = Vec::new();
    let mut current: Option<OpenRecord<'_>> = None;

    for token in tokens {
        match token {
            Token::Open {
                name,
                attributes,
                self_closing,
            } => {
                let depth = stack.len();
                match current.as_mut() {
                    None if *name == "type" => {
                        let record_name = attributes
                            .iter()
                            .find(|(key, _)| *key == "name")
                            .map(|(_, value)| *value)
                            .ok_or_else(|| malformed("<type> without a name".to_owned()))?;
                        let record = StructuredRecord::new(record_name);
                        if *self_closing {
                            records.insert(record.name.clone(), record);
                        } else {
                            current = Some(OpenRecord {
                                record,
                                depth,
                                child: None,
                            });
                        }
                    }
                    Some(open) if depth == open.depth.saturating_add(1) => {
                        if *self_closing {
                            open.record.apply_child(name, attributes, None);
                        } else {
                            open.child = Some(OpenChild {
                                name: *name,
                                attributes: attributes.clone(),
                                text: String::new(),
                            });
                        }
                    }
                    _ => {}
                }
                if !*self_closing {
                    stack.push(*name);
                }
            }
            Token::Close(name) => {
                let expected = stack.pop().ok_or_else(|| malformed(format!("stray </{name}>")))?;
                if expected != *name {
                    return Err(malformed(format!("<{expected}> closed by </{name}>")));
                }
                let depth = stack.len();
                if let Some(mut open) = current.take() {
                    if depth == open.depth {
                        records.insert(open.record.name.clone(), open.record);
                        continue;
                    }
                    if depth == open.depth.saturating_add(1)
                        && let Some(child) = open.child.take()
                    {
                        open.record
                            .apply_child(child.name, &child.attributes, Some(child.text.as_str()));
                    }
                    current = Some(open);
                }
            }
            Token::Text(text) => {
                if let Some(child) = current
                    .as_mut()
                    .filter(|open| stack.len() == open.depth.saturating_add(2))
                    .and_then(|open| open.child.as_mut())
                {
                    child.text.push_str(text);
                }
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(malformed(format!("<{open}> never closed")));
    }
    Ok(records)
}

fn tokenize(document: &str) -> Result<Vec<Token<'_>>, RecordError> {
    let mut tokens = Vec::new();
    let mut rest = document;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            tokens.push(Token::Text(rest));
            break;
        };
        let (text, markup) = rest.split_at(lt);
        if !text.is_empty() {
            tokens.push(Token::Text(text));
        }

        if let Some(after) = markup.strip_prefix("<!--") {
            rest = skip_past(after, "-->")?;
        } else if let Some(after) = markup.strip_prefix("<![CDATA[") {
            let end = after
                .find("]]>")
                .ok_or_else(|| malformed("unterminated CDATA section".to_owned()))?;
            let (cdata, tail) = after.split_at(end);
            tokens.push(Token::Text(cdata));
            rest = tail.get(3..).unwrap_or_default();
        } else if let Some(after) = markup.strip_prefix("<?") {
            rest = skip_past(after, "?>")?;
        } else if let Some(after) = markup.strip_prefix("<!") {
            rest = skip_past(after, ">")?;
        } else {
            let after = markup.get(1..).unwrap_or_default();
            let end = tag_end(after).ok_or_else(|| malformed("unterminated tag".to_owned()))?;
            let (inner, tail) = after.split_at(end);
            tokens.push(parse_tag(inner)?);
            rest = tail.get(1..).unwrap_or_default();
        }
    }

    Ok(tokens)
}

fn skip_past<'a>(text: &'a str, terminator: &str) -> Result<&'a str, RecordError> {
    text.find(terminator)
        .and_then(|i| text.get(i.saturating_add(terminator.len())..))
        .ok_or_else(|| malformed(format!("missing {terminator}")))
}

/// Byte offset of the `>` closing a tag, ignoring any inside quotes.
fn tag_end(text: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (None, '>') => return Some(i),
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            _ => {}
        }
    }
    None
}

fn parse_tag(inner: &str) -> Result<Token<'_>, RecordError> {
    if let Some(name) = inner.strip_prefix('/') {
        let name = name.trim();
        if !is_name(name) {
            return Err(malformed(format!("bad closing tag </{name}>")));
        }
        return Ok(Token::Close(name));
    }

    let (body, self_closing) = match inner.trim_end().strip_suffix('/') {
        Some(body) => (body, true),
        None => (inner, false),
    };

    let name_end = body
        .find(|c: char| c.is_whitespace())
        .unwrap_or(body.len());
    let (name, mut rest) = body.split_at(name_end);
    if !is_name(name) {
        return Err(malformed(format!("bad tag <{inner}>")));
    }

    let mut attributes = Vec::new();
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let eq = rest
            .find('=')
            .ok_or_else(|| malformed(format!("attribute without value in <{name}>")))?;
        let (key, after_key) = rest.split_at(eq);
        let key = key.trim();
        let value_part = after_key.get(1..).unwrap_or_default().trim_start();
        let quote = value_part
            .chars()
            .next()
            .filter(|c| *c == '"' || *c == '\'')
            .ok_or_else(|| malformed(format!("unquoted attribute {key} in <{name}>")))?;
        let quoted = value_part.get(1..).unwrap_or_default();
        let close = quoted
            .find(quote)
            .ok_or_else(|| malformed(format!("unterminated attribute {key} in <{name}>")))?;
        let (value, tail) = quoted.split_at(close);
        if !is_name(key) {
            return Err(malformed(format!("bad attribute name {key} in <{name}>")));
        }
        attributes.push((key, value));
        rest = tail.get(1..).unwrap_or_default();
    }

    Ok(Token::Open {
        name,
        attributes,
        self_closing,
    })
}

fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
}

const fn malformed(reason: String) -> RecordError {
    RecordError::Malformed {
        strategy: STRATEGY,
        reason,
    }
}

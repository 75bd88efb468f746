//! Canonical record model.
//!
//! A record set (the economy "types" document) is a list of named
//! entries, each with a handful of scalar elements, one flags element,
//! a category, and three repeatable name lists:
//!
//! ```xml
//! <type name="AKM">
//!     <nominal>10</nominal>
//!     <lifetime>28800</lifetime>
//!     <restock>0</restock>
//!     <min>5</min>
//!     <quantmin>-1</quantmin>
//!     <quantmax>-1</quantmax>
//!     <flags count_in_cargo="0" count_in_hoarder="0" count_in_map="1" count_in_player="0" crafted="0" deloot="0"/>
//!     <category name="weapons"/>
//!     <usage name="Military"/>
//!     <value name="Tier3"/>
//! </type>
//! ```
//!
//! Every parsing strategy feeds child elements through
//! [`StructuredRecord::apply_child`] so they all land on the same shape.

use std::collections::{BTreeMap, BTreeSet};

/// A snapshot of a record set, keyed by record name.
pub type RecordSet = BTreeMap<String, StructuredRecord>;

/// Scalar elements, compared as their literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScalarField {
    /// `<nominal>`
    Nominal,
    /// `<min>`
    Min,
    /// `<lifetime>`
    Lifetime,
    /// `<restock>`
    Restock,
    /// `<quantmin>`
    QuantMin,
    /// `<quantmax>`
    QuantMax,
}

impl ScalarField {
    /// All scalar fields in diff order.
    pub const ALL: [Self; 6] = [
        Self::Nominal,
        Self::Min,
        Self::Lifetime,
        Self::Restock,
        Self::QuantMin,
        Self::QuantMax,
    ];

    /// Element name in the document.
    pub const fn element(self) -> &'static str {
        match self {
            Self::Nominal => "nominal",
            Self::Min => "min",
            Self::Lifetime => "lifetime",
            Self::Restock => "restock",
            Self::QuantMin => "quantmin",
            Self::QuantMax => "quantmax",
        }
    }

    /// Label used in changelog diffs.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Nominal => "Nominal",
            Self::Min => "Min",
            Self::Lifetime => "Lifetime",
            Self::Restock => "Restock",
            Self::QuantMin => "QuantMin",
            Self::QuantMax => "QuantMax",
        }
    }

    fn from_element(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.element() == name)
    }
}

/// The fixed six-flag vocabulary of the `<flags>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Flag {
    /// `count_in_cargo`
    CountInCargo,
    /// `count_in_hoarder`
    CountInHoarder,
    /// `count_in_map`
    CountInMap,
    /// `count_in_player`
    CountInPlayer,
    /// `crafted`
    Crafted,
    /// `deloot`
    Deloot,
}

impl Flag {
    /// All flags in diff order.
    pub const ALL: [Self; 6] = [
        Self::CountInCargo,
        Self::CountInHoarder,
        Self::CountInMap,
        Self::CountInPlayer,
        Self::Crafted,
        Self::Deloot,
    ];

    /// Attribute name on the `<flags>` element.
    pub const fn attribute(self) -> &'static str {
        match self {
            Self::CountInCargo => "count_in_cargo",
            Self::CountInHoarder => "count_in_hoarder",
            Self::CountInMap => "count_in_map",
            Self::CountInPlayer => "count_in_player",
            Self::Crafted => "crafted",
            Self::Deloot => "deloot",
        }
    }

    fn from_attribute(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.attribute() == name)
    }
}

/// One named entry of a record set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredRecord {
    /// Unique name within the snapshot.
    pub name: String,
    /// Category name, empty when absent.
    pub category: String,
    /// Scalar element text, trimmed. Absent elements are not stored.
    pub scalars: BTreeMap<ScalarField, String>,
    /// Flags that are set.
    pub flags: BTreeSet<Flag>,
    /// `<usage name=...>` entries.
    pub usage: BTreeSet<String>,
    /// `<value name=...>` entries.
    pub value: BTreeSet<String>,
    /// `<tag name=...>` entries.
    pub tag: BTreeSet<String>,
}

impl StructuredRecord {
    /// An empty record with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Text of a scalar field, empty when absent.
    pub fn scalar(&self, field: ScalarField) -> &str {
        self.scalars.get(&field).map_or("", String::as_str)
    }

    /// Whether a flag is set.
    pub fn flag(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }

    /// Fold one child element into the record.
    ///
    /// `attributes` are the element's attributes in document order and
    /// `text` is its character content (`None` for self-closing elements).
    /// Unknown elements and attributes are ignored.
    pub fn apply_child(&mut self, element: &str, attributes: &[(&str, &str)], text: Option<&str>) {
        if let Some(field) = ScalarField::from_element(element) {
            self.scalars
                .insert(field, text.unwrap_or_default().trim().to_owned());
            return;
        }

        let name_attribute = || {
            attributes
                .iter()
                .find(|(key, _)| *key == "name")
                .map(|(_, value)| (*value).to_owned())
        };

        match element {
            "category" => {
                if let Some(name) = name_attribute() {
                    self.category = name;
                }
            }
            "flags" => {
                for (key, value) in attributes {
                    if let Some(flag) = Flag::from_attribute(key) {
                        if is_truthy(value) {
                            self.flags.insert(flag);
                        } else {
                            self.flags.remove(&flag);
                        }
                    }
                }
            }
            "usage" => self.usage.extend(name_attribute()),
            "value" => self.value.extend(name_attribute()),
            "tag" => self.tag.extend(name_attribute()),
            _ => {}
        }
    }
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn scalars_are_trimmed_text() {
        let mut record = StructuredRecord::new("AKM");
        record.apply_child("nominal", &[], Some("  010 \n"));
        assert_eq!(record.scalar(ScalarField::Nominal), "010");
        assert_eq!(record.scalar(ScalarField::Min), "");
    }

    #[test]
    fn flags_follow_attribute_values() {
        let mut record = StructuredRecord::new("AKM");
        record.apply_child(
            "flags",
            &[("count_in_map", "1"), ("crafted", "0"), ("deloot", "true"), ("bogus", "1")],
            None,
        );
        assert!(record.flag(Flag::CountInMap));
        assert!(record.flag(Flag::Deloot));
        assert!(!record.flag(Flag::Crafted));
        assert_eq!(record.flags.len(), 2);
    }

    #[test]
    fn name_sets_deduplicate() {
        let mut record = StructuredRecord::new("AKM");
        record.apply_child("usage", &[("name", "Military")], None);
        record.apply_child("usage", &[("name", "Police")], None);
        record.apply_child("usage", &[("name", "Military")], None);
        record.apply_child("value", &[("user", "Custom")], None);
        let usage: Vec<&str> = record.usage.iter().map(String::as_str).collect();
        assert_eq!(usage, vec!["Military", "Police"]);
        assert!(record.value.is_empty());
    }

    #[test]
    fn category_and_unknown_elements() {
        let mut record = StructuredRecord::new("AKM");
        record.apply_child("category", &[("name", "weapons")], None);
        record.apply_child("cost", &[], Some("100"));
        assert_eq!(record.category, "weapons");
        assert!(record.scalars.is_empty());
    }
}

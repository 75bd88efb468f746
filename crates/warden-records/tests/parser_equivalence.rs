//! Both parsing strategies must agree on every well-formed document, and
//! the chain must fall back to the structural parser when the pattern
//! parser gives up.

#![allow(clippy::unwrap_used)]

use warden_records::{
    Flag, ParserChain, PatternParser, RecordParser, RecordSet, ScalarField, StructuralParser,
};

const FIXTURES: &[&str] = &[
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes" ?>
<types>
    <type name="AKM">
        <nominal>10</nominal>
        <lifetime>28800</lifetime>
        <restock>0</restock>
        <min>5</min>
        <quantmin>-1</quantmin>
        <quantmax>-1</quantmax>
        <cost>100</cost>
        <flags count_in_cargo="0" count_in_hoarder="0" count_in_map="1" count_in_player="0" crafted="0" deloot="0"/>
        <category name="weapons"/>
        <usage name="Military"/>
        <value name="Tier3"/>
        <value name="Tier4"/>
    </type>
    <type name="Apple">
        <nominal>40</nominal>
        <lifetime>3600</lifetime>
        <flags count_in_cargo="1" count_in_hoarder="1" count_in_map="1" count_in_player="1" crafted="0" deloot="0"/>
        <category name="food"/>
        <usage name="Farm"/>
        <usage name="Village"/>
        <tag name="floor"/>
    </type>
</types>"#,
    r#"<types>
    <!-- retired
    <type name="Old"><nominal>1</nominal></type>
    -->
    <type name="Empty"/>
    <type name="Spaced" >
        <nominal> 7 </nominal>
        <min>
            2
        </min>
    </type>
</types>"#,
    "<types></types>",
];

fn pattern(doc: &str) -> RecordSet {
    PatternParser::new().unwrap().parse(doc).unwrap()
}

fn structural(doc: &str) -> RecordSet {
    StructuralParser.parse(doc).unwrap()
}

#[test]
fn strategies_agree_on_fixtures() {
    for doc in FIXTURES {
        assert_eq!(pattern(doc), structural(doc), "disagreement on:\n{doc}");
    }
}

#[test]
fn fixture_contents() {
    let records = structural(FIXTURES.first().unwrap());
    let akm = &records["AKM"];
    assert_eq!(akm.scalar(ScalarField::QuantMin), "-1");
    assert_eq!(akm.category, "weapons");
    assert!(akm.flag(Flag::CountInMap));
    assert!(!akm.flag(Flag::Crafted));
    assert_eq!(akm.value.iter().collect::<Vec<_>>(), vec!["Tier3", "Tier4"]);

    let spaced = structural(FIXTURES.get(1).unwrap());
    assert_eq!(spaced.keys().collect::<Vec<_>>(), vec!["Empty", "Spaced"]);
    assert_eq!(spaced["Spaced"].scalar(ScalarField::Min), "2");
}

#[test]
fn chain_falls_back_on_single_quotes() {
    let doc = "<types><type name='AKM'><nominal>3</nominal></type></types>";
    assert!(PatternParser::new().unwrap().parse(doc).is_err());

    let records = ParserChain::standard().parse(doc).unwrap();
    assert_eq!(records["AKM"].scalar(ScalarField::Nominal), "3");
}

#[test]
fn chain_rejects_what_neither_strategy_reads() {
    let chain = ParserChain::standard();
    let doc = r#"<types><type name="AKM"><nominal>3</min></type></types>"#;
    assert!(chain.parse(doc).is_err());
    assert!(chain.parse_or_empty(doc).is_empty());
}

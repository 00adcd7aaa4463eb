//! Insertion points in the classes of `tests/cpp/placement.hpp`.

use implementor_assist::find_suitable_place_in_class_for_public_method;
use implementor_cpp::TranslationUnit;

const PLACEMENT: &str = include_str!("../../../tests/cpp/placement.hpp");

/// The text following the chosen offset, and whether `public:` is needed.
fn place(class: &str) -> (String, bool) {
    let tu = TranslationUnit::parse(PLACEMENT).unwrap();
    let record = tu.find_record(class).unwrap();
    let place =
        find_suitable_place_in_class_for_public_method(PLACEMENT, record, tu.source_manager())
            .unwrap();

    let begin = tu.source_manager().file_offset(record.begin_loc());
    let end = tu.source_manager().file_offset(record.end_loc());
    assert!(
        (begin..=end).contains(&place.offset),
        "{class}: offset {} outside of {begin}..={end}",
        place.offset
    );

    let rest = &PLACEMENT[place.offset as usize..];
    let line = rest.split('\n').next().unwrap_or_default().to_string();
    (line, place.is_public_section_needed)
}

#[test]
fn test_after_three_public_methods() {
    let tu = TranslationUnit::parse(PLACEMENT).unwrap();
    let record = tu.find_record("ThreeMethods").unwrap();
    let place =
        find_suitable_place_in_class_for_public_method(PLACEMENT, record, tu.source_manager())
            .unwrap();
    let before = &PLACEMENT[..place.offset as usize];
    assert!(before.ends_with("    int c(int x);\n"));
    assert!(!place.is_public_section_needed);
}

#[test]
fn test_inline_definition_chain() {
    assert_eq!(place("InlineChain"), ("private:".to_string(), false));
}

#[test]
fn test_public_label() {
    assert_eq!(
        place("LabelOnly"),
        ("    // nothing here yet".to_string(), false)
    );
}

#[test]
fn test_empty_class() {
    assert_eq!(place("Empty"), ("};".to_string(), true));
}

#[test]
fn test_empty_struct() {
    assert_eq!(place("EmptyStruct"), ("};".to_string(), false));
}

#[test]
fn test_private_only_class() {
    assert_eq!(place("PrivateOnly"), ("    void secret();".to_string(), true));
}

#[test]
fn test_label_on_closing_line() {
    assert_eq!(place("OneLine"), (" };".to_string(), false));
}

//! Subcommand handlers. Each returns the text to print on stdout.

use std::path::Path;

use implementor_assist::{
    find_suitable_place_in_class_for_public_method, implement_interface,
    pure_virtual_functions_to_override_declarations_with_options, resolve_base_specifier,
    CodeInsertion, ExpanderOptions, SuitablePublicMethodPlaceInCppFile,
};
use implementor_cpp::{SourceFile, TranslationUnit};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::config::OutputFormat;

/// Settings shared by all subcommands after merging config and flags.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub expander: ExpanderOptions,
    pub format: OutputFormat,
}

pub fn implement(
    file: &Path,
    class: &str,
    interface: &str,
    in_place: bool,
    settings: &Settings,
) -> Result<String> {
    let tu = load(file)?;
    let deriving = tu.find_record(class)?;
    let interface = tu.find_record(interface)?;
    let implementation = implement_interface(&tu, deriving, interface, &settings.expander)?;
    let edited = implementation.apply(tu.source_manager().buffer())?;

    if in_place {
        std::fs::write(file, &edited)
            .map_err(|e| miette::miette!("Failed to write {}: {}", file.display(), e))?;
        tracing::info!(path = %file.display(), "rewrote file");
    }

    match settings.format {
        OutputFormat::Json => to_json(&implementation),
        OutputFormat::Text if in_place => Ok(String::new()),
        OutputFormat::Text => Ok(edited),
    }
}

pub fn overrides(file: &Path, class: &str, settings: &Settings) -> Result<String> {
    let tu = load(file)?;
    let record = tu.find_record(class)?;
    let declarations = pure_virtual_functions_to_override_declarations_with_options(
        &tu,
        record,
        &settings.expander,
    );

    match settings.format {
        OutputFormat::Json => to_json(&declarations),
        OutputFormat::Text => Ok(lines(declarations)),
    }
}

pub fn place(file: &Path, class: &str, settings: &Settings) -> Result<String> {
    let tu = load(file)?;
    let record = tu.find_record(class)?;
    let place = find_suitable_place_in_class_for_public_method(
        tu.source_manager().buffer(),
        record,
        tu.source_manager(),
    )?;

    match settings.format {
        OutputFormat::Json => to_json(&place),
        OutputFormat::Text => Ok(describe_place(&tu, &place)),
    }
}

pub fn base(file: &Path, class: &str, base: &str, settings: &Settings) -> Result<String> {
    let tu = load(file)?;
    let deriving = tu.find_record(class)?;
    let base = tu.find_record(base)?;
    let insertion = resolve_base_specifier(
        tu.source_manager().buffer(),
        deriving,
        base,
        tu.source_manager(),
    )?;

    match settings.format {
        OutputFormat::Json => to_json(&insertion),
        OutputFormat::Text => Ok(describe_insertion(&tu, &insertion)),
    }
}

fn load(path: &Path) -> Result<TranslationUnit> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| miette::miette!("Failed to read {}: {}", path.display(), e))?;
    Ok(TranslationUnit::from_file(SourceFile::new(content).with_path(path))?)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value).into_diagnostic()?;
    json.push('\n');
    Ok(json)
}

fn lines(items: Vec<String>) -> String {
    items.into_iter().map(|item| item + "\n").collect()
}

fn describe_place(tu: &TranslationUnit, place: &SuitablePublicMethodPlaceInCppFile) -> String {
    let (line, column) = tu.source_manager().file().line_col(place.offset);
    format!(
        "offset: {} (line {}, column {})\npublic section needed: {}\n",
        place.offset,
        line + 1,
        column + 1,
        place.is_public_section_needed
    )
}

fn describe_insertion(tu: &TranslationUnit, insertion: &CodeInsertion) -> String {
    let (line, column) = tu.source_manager().file().line_col(insertion.offset);
    format!(
        "offset: {} (line {}, column {})\ninsert: {:?}\n",
        insertion.offset,
        line + 1,
        column + 1,
        insertion.text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lines() {
        assert_eq!(lines(vec![]), "");
        assert_eq!(
            lines(vec!["void a() override;".into(), "void b() override;".into()]),
            "void a() override;\nvoid b() override;\n"
        );
    }

    #[test]
    fn test_describe_insertion() {
        let tu = TranslationUnit::parse("struct I {};\nclass D {\n};\n").unwrap();
        let insertion = CodeInsertion::new(20, " : public I");
        assert_eq!(
            describe_insertion(&tu, &insertion),
            "offset: 20 (line 2, column 8)\ninsert: \" : public I\"\n"
        );
    }
}

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::attribute::{Attribute, FieldKey, SelectionMode};
use crate::collector::CollectedValues;
use crate::error::{FilterError, Result};

pub const NAME_MAX_CHARS: usize = 100;
pub const DOCUMENT_EXTENSION: &str = "yaml";

/// Plain scalars a YAML 1.1 loader resolves to something other than a string:
/// bool, null, int (including sexagesimal and `_` separators), float,
/// timestamp, merge and value keys.
static YAML11_IMPLICIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?:",
        r"y|Y|yes|Yes|YES|n|N|no|No|NO|true|True|TRUE|false|False|FALSE|on|On|ON|off|Off|OFF",
        r"|~|null|Null|NULL",
        r"|[-+]?0b[0-1_]+|[-+]?0[0-7_]+|[-+]?(?:0|[1-9][0-9_]*)|[-+]?0x[0-9a-fA-F_]+",
        r"|[-+]?[1-9][0-9_]*(?::[0-5]?[0-9])+",
        r"|[-+]?[0-9][0-9_]*\.[0-9_]*(?:[eE][-+][0-9]+)?|\.[0-9][0-9_]*(?:[eE][-+][0-9]+)?",
        r"|[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+\.[0-9_]*|[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN)",
        r"|[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}(?:(?:[Tt]|[ \t]+)[0-9]{1,2}:[0-9]{2}:[0-9]{2}.*)?",
        r"|<<|=",
        r")$"
    ))
    .expect("valid regex")
});

/// Validates a submitted filter name: trimmed, required, bounded.
pub fn normalize_name(raw: Option<&str>) -> Result<String> {
    let name = raw.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(FilterError::MissingField("name"));
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(FilterError::FieldTooLong {
            field: "name",
            max: NAME_MAX_CHARS,
        });
    }
    Ok(name.to_string())
}

/// Filter configuration as consumed by PyCantus.
///
/// Field order is the emitted key order. Section keys are canonical attribute
/// names in declaration order; an attribute never maps to an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDocument {
    pub name: String,
    #[serde(default)]
    pub include_values: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub exclude_values: IndexMap<String, Vec<String>>,
}

impl FilterDocument {
    pub fn build(name: &str, values: &CollectedValues) -> Result<Self> {
        let name = normalize_name(Some(name))?;
        Ok(Self {
            name,
            include_values: section(values, SelectionMode::Include),
            exclude_values: section(values, SelectionMode::Exclude),
        })
    }

    pub fn filename(&self) -> String {
        format!("{}.{}", self.name, DOCUMENT_EXTENSION)
    }

    /// Emits the document so that a YAML 1.1 loader reads back the same strings.
    pub fn to_yaml(&self) -> Result<String> {
        let text = serde_yaml::to_string(self)?;
        Ok(quote_implicit_scalars(&text))
    }

    /// Parses an exported document, rejecting a blank name and any key that is
    /// not a canonical attribute name.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let mut doc: FilterDocument = serde_yaml::from_str(text)?;
        doc.name = normalize_name(Some(&doc.name))?;
        for key in doc.include_values.keys().chain(doc.exclude_values.keys()) {
            attribute_for_key(key)?;
        }
        Ok(doc)
    }

    pub fn section(&self, mode: SelectionMode) -> &IndexMap<String, Vec<String>> {
        match mode {
            SelectionMode::Include => &self.include_values,
            SelectionMode::Exclude => &self.exclude_values,
        }
    }

    /// Converts the document back into per-field value sets.
    pub fn to_collected(&self) -> Result<CollectedValues> {
        let mut collected = CollectedValues::new();
        for mode in SelectionMode::ALL {
            for (key, values) in self.section(mode) {
                let attribute = attribute_for_key(key)?;
                collected.extend(FieldKey::new(attribute, mode), values.iter().cloned());
            }
        }
        Ok(collected)
    }

    pub fn is_empty(&self) -> bool {
        self.include_values.is_empty() && self.exclude_values.is_empty()
    }
}

fn attribute_for_key(key: &str) -> Result<Attribute> {
    Attribute::from_key(key).ok_or_else(|| FilterError::UnknownAttribute(key.to_string()))
}

/// Single-quotes the `name` value and list items that a YAML 1.1 loader would
/// not read as strings. Block scalar bodies are passed through untouched.
fn quote_implicit_scalars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut block_parent: Option<usize> = None;
    for line in text.lines() {
        let indent = line.len() - line.trim_start().len();
        if let Some(parent) = block_parent {
            if indent > parent || line.trim().is_empty() {
                out.push_str(line);
                out.push('\n');
                continue;
            }
            block_parent = None;
        }
        let split = if indent == 0 {
            line.strip_prefix("name: ").map(|scalar| ("name: ", scalar))
        } else {
            line.trim_start()
                .strip_prefix("- ")
                .map(|scalar| (&line[..indent + 2], scalar))
        };
        match split {
            Some((_, scalar)) if scalar.starts_with(['|', '>']) => {
                block_parent = Some(indent);
                out.push_str(line);
            }
            Some((head, scalar)) if YAML11_IMPLICIT.is_match(scalar) => {
                out.push_str(head);
                out.push('\'');
                out.push_str(&scalar.replace('\'', "''"));
                out.push('\'');
            }
            _ => out.push_str(line),
        }
        out.push('\n');
    }
    out
}

fn section(values: &CollectedValues, mode: SelectionMode) -> IndexMap<String, Vec<String>> {
    Attribute::ALL
        .into_iter()
        .filter_map(|attribute| {
            values
                .get(FieldKey::new(attribute, mode))
                .map(|set| (attribute.as_str().to_string(), set.iter().cloned().collect()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(attribute: Attribute, mode: SelectionMode) -> FieldKey {
        FieldKey::new(attribute, mode)
    }

    #[test]
    fn builds_example_document() {
        let mut values = CollectedValues::new();
        values.insert(key(Attribute::Genre, SelectionMode::Include), "hymn");
        values.insert(key(Attribute::Genre, SelectionMode::Include), "antiphon");
        let doc = FilterDocument::build("exp1", &values).unwrap();
        assert_eq!(doc.filename(), "exp1.yaml");
        assert_eq!(
            doc.include_values.get("genre"),
            Some(&vec!["hymn".to_string(), "antiphon".to_string()])
        );
        assert!(doc.exclude_values.is_empty());
        let yaml = doc.to_yaml().unwrap();
        assert!(yaml.starts_with("name: exp1\ninclude_values:\n"));
        assert!(yaml.contains("- hymn\n"));
        assert!(yaml.contains("exclude_values: {}"));
    }

    #[test]
    fn sections_follow_canonical_order() {
        let mut values = CollectedValues::new();
        values.insert(key(Attribute::Cursus, SelectionMode::Exclude), "Monastic");
        values.insert(key(Attribute::Office, SelectionMode::Exclude), "V");
        values.insert(key(Attribute::Genre, SelectionMode::Exclude), "R");
        let doc = FilterDocument::build("order", &values).unwrap();
        let keys: Vec<&str> = doc.exclude_values.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["genre", "office", "cursus"]);
        let yaml = doc.to_yaml().unwrap();
        let name_at = yaml.find("name:").unwrap();
        let incl_at = yaml.find("include_values:").unwrap();
        let excl_at = yaml.find("exclude_values:").unwrap();
        assert!(name_at < incl_at && incl_at < excl_at);
    }

    #[test]
    fn empty_sets_are_omitted() {
        let mut values = CollectedValues::new();
        values.extend(key(Attribute::Feast, SelectionMode::Include), Vec::<String>::new());
        let doc = FilterDocument::build("nothing", &values).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn missing_name_is_rejected() {
        let values = CollectedValues::new();
        assert!(matches!(
            FilterDocument::build("   ", &values),
            Err(FilterError::MissingField("name"))
        ));
        assert!(matches!(
            normalize_name(None),
            Err(FilterError::MissingField("name"))
        ));
        let long = "x".repeat(NAME_MAX_CHARS + 1);
        assert!(matches!(
            normalize_name(Some(&long)),
            Err(FilterError::FieldTooLong { .. })
        ));
    }

    #[test]
    fn unicode_is_emitted_literally() {
        let mut values = CollectedValues::new();
        values.insert(key(Attribute::Provenance, SelectionMode::Include), "Kraków");
        let doc = FilterDocument::build("Čechy", &values).unwrap();
        let yaml = doc.to_yaml().unwrap();
        assert!(yaml.contains("Kraków"));
        assert!(yaml.contains("name: Čechy"));
        assert!(!yaml.contains("\\u"));
    }

    #[test]
    fn yaml11_implicit_scalars_are_quoted() {
        let mut values = CollectedValues::new();
        let century = key(Attribute::Century, SelectionMode::Exclude);
        for value in ["yes", "off", "1_0", "1:20", "No", "~", "2024-01-05", "Kraków"] {
            values.insert(century, value);
        }
        let doc = FilterDocument::build("on", &values).unwrap();
        let yaml = doc.to_yaml().unwrap();
        assert!(yaml.starts_with("name: 'on'\n"));
        for quoted in ["'yes'", "'off'", "'1_0'", "'1:20'", "'No'", "'~'", "'2024-01-05'"] {
            assert!(yaml.contains(&format!("- {quoted}\n")), "{quoted} in {yaml}");
        }
        assert!(yaml.contains("- Kraków\n"));
        assert_eq!(FilterDocument::from_yaml(&yaml).unwrap(), doc);
    }

    #[test]
    fn ordinary_text_stays_plain() {
        for value in ["12th", "Monastic", "yesterday", "1:2:x", "0.5th", "V"] {
            assert!(!YAML11_IMPLICIT.is_match(value), "{value}");
        }
        for value in ["12", "0777", "0x1F", "+1_000", "1.5", ".inf", "NULL", "Y", "<<"] {
            assert!(YAML11_IMPLICIT.is_match(value), "{value}");
        }
    }

    #[test]
    fn block_scalars_pass_through() {
        let text = "name: x\ninclude_values:\n  genre:\n  - |-\n    yes\n    - no\n  - 'a'\nexclude_values: {}\n";
        assert_eq!(quote_implicit_scalars(text), text);
    }

    #[test]
    fn parse_rejects_blank_name_and_noncanonical_keys() {
        let blank = "name: '  '\ninclude_values: {}\nexclude_values: {}\n";
        assert!(matches!(
            FilterDocument::from_yaml(blank),
            Err(FilterError::MissingField("name"))
        ));
        let shouting = "name: x\ninclude_values:\n  GENRE:\n  - R\nexclude_values: {}\n";
        assert!(matches!(
            FilterDocument::from_yaml(shouting),
            Err(FilterError::UnknownAttribute(_))
        ));
        let padded = "name: ' exp1 '\ninclude_values: {}\nexclude_values: {}\n";
        assert_eq!(FilterDocument::from_yaml(padded).unwrap().name, "exp1");
    }

    #[test]
    fn parse_rejects_unknown_attribute() {
        let text = "name: x\ninclude_values:\n  colour:\n  - red\nexclude_values: {}\n";
        assert!(matches!(
            FilterDocument::from_yaml(text),
            Err(FilterError::UnknownAttribute(_))
        ));
    }
}

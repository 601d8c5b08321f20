use std::fmt;
use std::str::FromStr;

use crate::error::FilterError;

/// Filterable dimension of a PyCantus dataset.
///
/// Variants are declared in canonical order; documents list attributes in
/// this order no matter how the form submitted them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    Genre,
    Office,
    Feast,
    Db,
    Siglum,
    Title,
    Provenance,
    Century,
    NumCentury,
    Cursus,
}

impl Attribute {
    pub const ALL: [Attribute; 10] = [
        Attribute::Genre,
        Attribute::Office,
        Attribute::Feast,
        Attribute::Db,
        Attribute::Siglum,
        Attribute::Title,
        Attribute::Provenance,
        Attribute::Century,
        Attribute::NumCentury,
        Attribute::Cursus,
    ];

    /// Key used in the exported document.
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Genre => "genre",
            Attribute::Office => "office",
            Attribute::Feast => "feast",
            Attribute::Db => "db",
            Attribute::Siglum => "siglum",
            Attribute::Title => "title",
            Attribute::Provenance => "provenance",
            Attribute::Century => "century",
            Attribute::NumCentury => "num_century",
            Attribute::Cursus => "cursus",
        }
    }

    /// Exact match on the document key, no case folding.
    pub fn from_key(key: &str) -> Option<Attribute> {
        Attribute::ALL.into_iter().find(|attr| attr.as_str() == key)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Attribute::Genre => "Genre",
            Attribute::Office => "Office",
            Attribute::Feast => "Feast",
            Attribute::Db => "Source database of records",
            Attribute::Siglum => "Siglum",
            Attribute::Title => "Title of source",
            Attribute::Provenance => "Provenance of source",
            Attribute::Century => "Century of source",
            Attribute::NumCentury => "Numerical century of source",
            Attribute::Cursus => "Cursus of source",
        }
    }

    /// Reference table the attribute's choices are read from.
    pub fn choice_source(&self) -> ChoiceSource {
        let (file, column) = match self {
            Attribute::Genre => ("genre", "name"),
            Attribute::Office => ("office", "name"),
            Attribute::Feast => ("feast", "name"),
            Attribute::Db => ("db", "shortcut"),
            Attribute::Siglum => ("sources", "siglum"),
            Attribute::Title => ("sources", "title"),
            Attribute::Provenance => ("sources", "provenance"),
            Attribute::Century => ("sources", "century"),
            Attribute::NumCentury => ("sources", "num_century"),
            Attribute::Cursus => ("sources", "cursus"),
        };
        ChoiceSource { file, column }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attribute {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::from_key(&s.trim().to_lowercase())
            .ok_or_else(|| FilterError::UnknownAttribute(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceSource {
    pub file: &'static str,
    pub column: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SelectionMode {
    Include,
    Exclude,
}

impl SelectionMode {
    pub const ALL: [SelectionMode; 2] = [SelectionMode::Include, SelectionMode::Exclude];

    pub fn suffix(&self) -> &'static str {
        match self {
            SelectionMode::Include => "incl",
            SelectionMode::Exclude => "excl",
        }
    }
}

impl FromStr for SelectionMode {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "incl" | "include" => Ok(SelectionMode::Include),
            "excl" | "exclude" => Ok(SelectionMode::Exclude),
            _ => Err(FilterError::UnknownMode(s.to_string())),
        }
    }
}

/// One of the twenty form fields: an attribute paired with a selection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey {
    pub attribute: Attribute,
    pub mode: SelectionMode,
}

impl FieldKey {
    pub fn new(attribute: Attribute, mode: SelectionMode) -> Self {
        Self { attribute, mode }
    }

    /// All fields, include fields first, each block in canonical attribute order.
    pub fn all() -> impl Iterator<Item = FieldKey> {
        SelectionMode::ALL.into_iter().flat_map(|mode| {
            Attribute::ALL
                .into_iter()
                .map(move |attribute| FieldKey::new(attribute, mode))
        })
    }

    /// Form name prefix, e.g. `genre_incl`.
    pub fn prefix(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.attribute.as_str(), self.mode.suffix())
    }
}

impl FromStr for FieldKey {
    type Err = FilterError;

    /// Parses a form prefix such as `num_century_excl`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (attribute, mode) = s
            .rsplit_once('_')
            .ok_or_else(|| FilterError::UnknownAttribute(s.to_string()))?;
        Ok(FieldKey::new(attribute.parse()?, mode.parse()?))
    }
}

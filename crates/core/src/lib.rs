mod attribute;
mod choices;
mod collector;
mod document;
mod error;

pub use attribute::{Attribute, ChoiceSource, FieldKey, SelectionMode};
pub use choices::ChoiceCatalog;
pub use collector::{
    collect_field, stranded_positions, CollectedValues, FieldCollection, FormParams, ParamSource,
    OTHER_SENTINEL,
};
pub use document::{normalize_name, FilterDocument, DOCUMENT_EXTENSION, NAME_MAX_CHARS};
pub use error::{FilterError, Result};

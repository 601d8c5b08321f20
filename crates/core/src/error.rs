use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("field {field} is longer than {max} characters")]
    FieldTooLong { field: &'static str, max: usize },
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),
    #[error("unknown selection mode: {0}")]
    UnknownMode(String),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("csv error in {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FilterError>;

//! Reference choices for the repeatable selection inputs.
//!
//! Each attribute reads the distinct values of one CSV column. The catalog is
//! loaded once and never fails: any problem with a table is logged and the
//! affected attributes simply offer no preset choices.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use tracing::{info, warn};

use crate::attribute::Attribute;
use crate::error::{FilterError, Result};

#[derive(Debug, Clone, Default)]
pub struct ChoiceCatalog {
    choices: HashMap<Attribute, Vec<String>>,
}

impl ChoiceCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads every attribute's choices from `{dir}/{file}.csv`.
    pub fn load(dir: &Path) -> Self {
        let mut tables: HashMap<&'static str, Option<Table>> = HashMap::new();
        let mut choices = HashMap::new();
        for attribute in Attribute::ALL {
            let source = attribute.choice_source();
            let table = tables.entry(source.file).or_insert_with(|| {
                let path = table_path(dir, source.file);
                match Table::read(&path) {
                    Ok(table) => Some(table),
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "reference table unavailable");
                        None
                    }
                }
            });
            let values = match table.as_ref() {
                Some(table) => table.distinct(source.column).unwrap_or_else(|| {
                    warn!(
                        file = source.file,
                        column = source.column,
                        "reference column missing"
                    );
                    Vec::new()
                }),
                None => Vec::new(),
            };
            choices.insert(attribute, values);
        }
        let catalog = Self { choices };
        info!(
            dir = %dir.display(),
            choices = catalog.total(),
            "loaded reference choices"
        );
        catalog
    }

    pub fn with_choices<I, S>(mut self, attribute: Attribute, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        self.choices.insert(attribute, set.into_iter().collect());
        self
    }

    pub fn choices(&self, attribute: Attribute) -> &[String] {
        self.choices
            .get(&attribute)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contains(&self, attribute: Attribute, value: &str) -> bool {
        self.choices(attribute)
            .binary_search_by(|choice| choice.as_str().cmp(value))
            .is_ok()
    }

    pub fn total(&self) -> usize {
        self.choices.values().map(Vec::len).sum()
    }
}

fn table_path(dir: &Path, file: &str) -> PathBuf {
    dir.join(format!("{file}.csv"))
}

struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn read(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let csv_err = |source: csv::Error| FilterError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);
        let headers = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|cell| cell.trim().to_string())
            .collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            rows.push(record.iter().map(|cell| cell.to_string()).collect());
        }
        Ok(Self { headers, rows })
    }

    /// Sorted distinct non-empty values of `column`, or `None` if absent.
    fn distinct(&self, column: &str) -> Option<Vec<String>> {
        let idx = self.headers.iter().position(|header| header == column)?;
        let values: BTreeSet<String> = self
            .rows
            .iter()
            .filter_map(|row| row.get(idx))
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
            .map(str::to_string)
            .collect();
        Some(values.into_iter().collect())
    }
}

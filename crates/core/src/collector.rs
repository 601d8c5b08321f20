//! Field Collector: rebuilds per-field value sets from indexed form entries.
//!
//! The repeatable selection input posts one `{prefix}_{i}` entry per rendered
//! position, starting at 0 with no gaps. Choosing the `other` sentinel moves
//! the value into the companion `{prefix}_other_{i}` text entry.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};

use crate::attribute::FieldKey;

/// Choice token that defers to the free-text companion entry.
pub const OTHER_SENTINEL: &str = "other";

/// Read-only view over request parameters.
pub trait ParamSource {
    fn param(&self, key: &str) -> Option<&str>;

    fn keys(&self) -> Box<dyn Iterator<Item = &str> + '_>;
}

impl<S: BuildHasher> ParamSource for HashMap<String, String, S> {
    fn param(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(HashMap::keys(self).map(String::as_str))
    }
}

impl ParamSource for BTreeMap<String, String> {
    fn param(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(BTreeMap::keys(self).map(String::as_str))
    }
}

impl<S: BuildHasher> ParamSource for IndexMap<String, String, S> {
    fn param(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(IndexMap::keys(self).map(String::as_str))
    }
}

/// Request parameters in submission order.
///
/// A key posted more than once resolves to its last value.
#[derive(Debug, Clone, Default)]
pub struct FormParams {
    pairs: Vec<(String, String)>,
    latest: HashMap<String, usize>,
}

impl FormParams {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let latest = pairs
            .iter()
            .enumerate()
            .map(|(idx, (key, _))| (key.clone(), idx))
            .collect();
        Self { pairs, latest }
    }
}

impl FromIterator<(String, String)> for FormParams {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self::from_pairs(iter.into_iter().collect())
    }
}

impl ParamSource for FormParams {
    fn param(&self, key: &str) -> Option<&str> {
        self.latest
            .get(key)
            .and_then(|idx| self.pairs.get(*idx))
            .map(|(_, value)| value.as_str())
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.pairs.iter().map(|(key, _)| key.as_str()))
    }
}

/// Outcome of scanning one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldCollection {
    pub values: IndexSet<String>,
    /// Number of contiguous positions present, starting at 0.
    pub scanned: usize,
}

/// Scans `{prefix}_0`, `{prefix}_1`, … until the first absent position.
pub fn collect_field<P: ParamSource + ?Sized>(prefix: &str, params: &P) -> FieldCollection {
    let mut values = IndexSet::new();
    let mut index = 0;
    while let Some(raw) = params.param(&format!("{prefix}_{index}")) {
        if raw == OTHER_SENTINEL {
            let custom = params
                .param(&format!("{prefix}_{OTHER_SENTINEL}_{index}"))
                .map(str::trim)
                .unwrap_or_default();
            if !custom.is_empty() {
                values.insert(custom.to_string());
            }
        } else if !raw.is_empty() {
            values.insert(raw.to_string());
        }
        index += 1;
    }
    FieldCollection {
        values,
        scanned: index,
    }
}

/// Positions of `{prefix}_{i}` entries at or beyond `scanned`; these were
/// cut off by an index gap.
pub fn stranded_positions<P: ParamSource + ?Sized>(
    prefix: &str,
    params: &P,
    scanned: usize,
) -> Vec<usize> {
    let head = format!("{prefix}_");
    let mut positions: Vec<usize> = params
        .keys()
        .filter_map(|key| key.strip_prefix(head.as_str()))
        .filter_map(|rest| rest.parse::<usize>().ok())
        .filter(|position| *position >= scanned)
        .collect();
    positions.sort_unstable();
    positions.dedup();
    positions
}

/// Deduplicated values for each of the twenty form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedValues {
    fields: IndexMap<FieldKey, IndexSet<String>>,
}

impl CollectedValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the collector over every field and logs entries stranded by gaps.
    pub fn collect<P: ParamSource + ?Sized>(params: &P) -> Self {
        let mut collected = Self::new();
        for key in FieldKey::all() {
            let prefix = key.prefix();
            let FieldCollection { values, scanned } = collect_field(&prefix, params);
            let stranded = stranded_positions(&prefix, params, scanned);
            if !stranded.is_empty() {
                warn!(
                    field = %prefix,
                    scanned,
                    stranded = ?stranded,
                    "ignoring entries after an index gap"
                );
            }
            if !values.is_empty() {
                debug!(field = %prefix, count = values.len(), "collected values");
            }
            collected.extend(key, values);
        }
        collected
    }

    pub fn insert(&mut self, key: FieldKey, value: impl Into<String>) -> bool {
        self.fields.entry(key).or_default().insert(value.into())
    }

    pub fn extend<I>(&mut self, key: FieldKey, values: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut values = values.into_iter().map(Into::<String>::into).peekable();
        if values.peek().is_none() {
            return;
        }
        self.fields.entry(key).or_default().extend(values);
    }

    pub fn get(&self, key: FieldKey) -> Option<&IndexSet<String>> {
        self.fields.get(&key).filter(|values| !values.is_empty())
    }

    pub fn value_count(&self) -> usize {
        self.fields.values().map(IndexSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.value_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{Attribute, SelectionMode};

    fn params(entries: &[(&str, &str)]) -> FormParams {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn collects_choices_and_trimmed_other() {
        let form = params(&[
            ("genre_incl_0", "hymn"),
            ("genre_incl_1", "other"),
            ("genre_incl_other_1", "antiphon "),
        ]);
        let collected = collect_field("genre_incl", &form);
        assert_eq!(collected.scanned, 2);
        let values: Vec<&str> = collected.values.iter().map(String::as_str).collect();
        assert_eq!(values, vec!["hymn", "antiphon"]);
    }

    #[test]
    fn blank_other_and_blank_choice_contribute_nothing() {
        let form = params(&[
            ("office_excl_0", ""),
            ("office_excl_1", "other"),
            ("office_excl_other_1", "   "),
            ("office_excl_2", "other"),
        ]);
        let collected = collect_field("office_excl", &form);
        assert_eq!(collected.scanned, 3);
        assert!(collected.values.is_empty());
    }

    #[test]
    fn gap_truncates_and_is_reported() {
        let form = params(&[
            ("feast_incl_0", "Pascha"),
            ("feast_incl_2", "Pentecost"),
            ("feast_incl_other_2", "ignored"),
        ]);
        let collected = collect_field("feast_incl", &form);
        assert_eq!(collected.scanned, 1);
        assert_eq!(collected.values.len(), 1);
        assert_eq!(stranded_positions("feast_incl", &form, 1), vec![2]);
    }

    #[test]
    fn duplicates_collapse() {
        let form = params(&[
            ("db_incl_0", "CI"),
            ("db_incl_1", "CI"),
            ("db_incl_2", "other"),
            ("db_incl_other_2", " CI "),
        ]);
        assert_eq!(collect_field("db_incl", &form).values.len(), 1);
    }

    #[test]
    fn last_duplicate_key_wins() {
        let form = params(&[("cursus_incl_0", "Monastic"), ("cursus_incl_0", "Secular")]);
        let collected = collect_field("cursus_incl", &form);
        assert!(collected.values.contains("Secular"));
        assert!(!collected.values.contains("Monastic"));
    }

    #[test]
    fn similar_prefixes_do_not_leak() {
        let form = params(&[("num_century_incl_0", "12"), ("century_incl_0", "12th century")]);
        let collected = CollectedValues::collect(&form);
        let century = collected
            .get(FieldKey::new(Attribute::Century, SelectionMode::Include))
            .unwrap();
        assert_eq!(century.len(), 1);
        assert!(century.contains("12th century"));
        assert!(stranded_positions("century_incl", &form, 1).is_empty());
    }

    #[test]
    fn collect_covers_every_field() {
        let form = params(&[("genre_excl_0", "R"), ("title_incl_0", "Antiphonale")]);
        let collected = CollectedValues::collect(&form);
        assert_eq!(collected.value_count(), 2);
        assert!(collected
            .get(FieldKey::new(Attribute::Genre, SelectionMode::Include))
            .is_none());
        assert!(collected
            .get(FieldKey::new(Attribute::Genre, SelectionMode::Exclude))
            .is_some());
    }

    #[test]
    fn works_over_plain_maps() {
        let mut map = HashMap::new();
        map.insert("siglum_incl_0".to_string(), "A-Gu 29".to_string());
        assert_eq!(collect_field("siglum_incl", &map).values.len(), 1);
    }
}

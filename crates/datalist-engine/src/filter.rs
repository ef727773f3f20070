// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Declarative row filtering: free-text search plus named filter entries,
//! all combined with AND.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::Date;

use crate::error::EngineError;
use crate::model::{Row, SelectOption, Value};
use crate::validation::{parse_bool, parse_date, parse_number};

/// Filter value meaning "no constraint" for select-style filters.
pub const ALL_SENTINEL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    Text,
    Select,
    Number,
    DateRange,
    Boolean,
}

impl FilterKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Select => "select",
            Self::Number => "number",
            Self::DateRange => "daterange",
            Self::Boolean => "boolean",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "select" => Some(Self::Select),
            "number" => Some(Self::Number),
            "daterange" => Some(Self::DateRange),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }
}

/// One advanced or quick filter field. Not every filter is backed by a
/// visible column, so this is declared separately from the column catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterModel {
    pub name: String,
    pub label: String,
    pub kind: FilterKind,
    pub accessor_key: String,
    #[serde(default)]
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub default_value: Option<FilterValue>,
}

impl FilterModel {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FilterKind) -> Self {
        let name = name.into();
        Self {
            accessor_key: name.clone(),
            name,
            label: label.into(),
            kind,
            options: Vec::new(),
            default_value: None,
        }
    }

    pub fn accessor(mut self, key: impl Into<String>) -> Self {
        self.accessor_key = key.into();
        self
    }

    pub fn options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }

    pub fn default_value(mut self, value: FilterValue) -> Self {
        self.default_value = Some(value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Date(Date),
    DateRange {
        from: Option<Date>,
        to: Option<Date>,
    },
    NumberRange {
        min: Option<f64>,
        max: Option<f64>,
    },
}

impl FilterValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn all() -> Self {
        Self::Text(ALL_SENTINEL.to_owned())
    }

    /// True when the value places no constraint on rows.
    pub fn is_unconstrained(&self, all_sentinel: &str) -> bool {
        match self {
            Self::Text(value) => {
                let trimmed = value.trim();
                trimmed.is_empty() || trimmed == all_sentinel
            }
            Self::DateRange { from, to } => from.is_none() && to.is_none(),
            Self::NumberRange { min, max } => min.is_none() && max.is_none(),
            Self::Number(_) | Self::Bool(_) | Self::Date(_) => false,
        }
    }

    /// True when every number the value carries is finite.
    fn is_finite(&self) -> bool {
        match self {
            Self::Number(value) => value.is_finite(),
            Self::NumberRange { min, max } => {
                min.is_none_or(f64::is_finite) && max.is_none_or(f64::is_finite)
            }
            Self::Text(_) | Self::Bool(_) | Self::Date(_) | Self::DateRange { .. } => true,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Number(value) => value.to_string(),
            Self::Bool(value) => value.to_string(),
            Self::Date(value) => value.to_string(),
            Self::DateRange { from, to } => format!("{from:?}..{to:?}"),
            Self::NumberRange { min, max } => format!("{min:?}..{max:?}"),
        }
    }
}

/// Current value per filter name. Absent names and the "all" sentinel both
/// mean "no constraint".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveFilterSet {
    entries: BTreeMap<String, FilterValue>,
}

impl ActiveFilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds entries from each model's default value.
    pub fn from_defaults(models: &[FilterModel]) -> Self {
        let entries = models
            .iter()
            .filter_map(|model| {
                model
                    .default_value
                    .clone()
                    .map(|value| (model.name.clone(), value))
            })
            .collect();
        Self { entries }
    }

    pub fn with(mut self, name: impl Into<String>, value: FilterValue) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: FilterValue) {
        self.entries.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<FilterValue> {
        self.entries.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn active_count(&self, all_sentinel: &str) -> usize {
        self.entries
            .values()
            .filter(|value| !value.is_unconstrained(all_sentinel))
            .count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Constraint {
    Substring { accessor: String, needle: String },
    Exact { accessor: String, expected: String },
    NumberRange {
        accessor: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    DateRange {
        accessor: String,
        from: Option<Date>,
        to: Option<Date>,
    },
    Flag { accessor: String, expected: bool },
}

impl Constraint {
    fn matches<R: Row + ?Sized>(&self, row: &R) -> bool {
        match self {
            Self::Substring { accessor, needle } => row
                .get(accessor)
                .search_terms()
                .iter()
                .any(|term| term.contains(needle.as_str())),
            Self::Exact { accessor, expected } => match row.get(accessor) {
                Value::Tags(tags) => tags.iter().any(|tag| tag == expected),
                value => value.display() == *expected,
            },
            Self::NumberRange { accessor, min, max } => {
                let Some(value) = row.get(accessor).as_number() else {
                    return false;
                };
                min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
            }
            Self::DateRange { accessor, from, to } => {
                let Some(value) = row.get(accessor).as_date() else {
                    return false;
                };
                from.is_none_or(|from| value >= from) && to.is_none_or(|to| value <= to)
            }
            Self::Flag { accessor, expected } => row.get(accessor).as_bool() == Some(*expected),
        }
    }
}

/// A compiled filter set, reusable across rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowPredicate {
    search: Option<String>,
    search_fields: Vec<String>,
    constraints: Vec<Constraint>,
    rejected: Vec<EngineError>,
}

impl RowPredicate {
    pub fn matches<R: Row + ?Sized>(&self, row: &R) -> bool {
        if let Some(needle) = &self.search {
            let found = self.search_fields.iter().any(|field| {
                row.get(field)
                    .search_terms()
                    .iter()
                    .any(|term| term.contains(needle.as_str()))
            });
            if !found {
                return false;
            }
        }
        self.constraints
            .iter()
            .all(|constraint| constraint.matches(row))
    }

    /// Entries that were dropped because they could not be applied.
    pub fn rejected(&self) -> &[EngineError] {
        &self.rejected
    }

    pub fn is_unconstrained(&self) -> bool {
        self.search.is_none() && self.constraints.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterEngine {
    models: Vec<FilterModel>,
    search_fields: Vec<String>,
    all_sentinel: String,
}

impl FilterEngine {
    pub fn new(models: Vec<FilterModel>, search_fields: Vec<String>) -> Self {
        Self {
            models,
            search_fields,
            all_sentinel: ALL_SENTINEL.to_owned(),
        }
    }

    pub fn with_all_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.all_sentinel = sentinel.into();
        self
    }

    pub fn models(&self) -> &[FilterModel] {
        &self.models
    }

    pub fn model(&self, name: &str) -> Option<&FilterModel> {
        self.models.iter().find(|model| model.name == name)
    }

    pub fn search_fields(&self) -> &[String] {
        &self.search_fields
    }

    pub fn all_sentinel(&self) -> &str {
        &self.all_sentinel
    }

    /// Checks a single entry without compiling the whole set.
    pub fn validate(&self, name: &str, value: &FilterValue) -> Result<(), EngineError> {
        let model = self
            .model(name)
            .ok_or_else(|| EngineError::UnknownFilter(name.to_owned()))?;
        self.resolve(model, value).map(|_| ())
    }

    pub fn compile(&self, search: &str, active: &ActiveFilterSet) -> RowPredicate {
        let needle = search.trim().to_lowercase();
        let search = if needle.is_empty() {
            None
        } else if self.search_fields.is_empty() {
            tracing::debug!(query = %needle, "search ignored: no searchable attributes declared");
            None
        } else {
            Some(needle)
        };

        let mut constraints = Vec::new();
        let mut rejected = Vec::new();
        for (name, value) in active.iter() {
            let Some(model) = self.model(name) else {
                tracing::debug!(filter = name, "ignoring unknown filter");
                rejected.push(EngineError::UnknownFilter(name.to_owned()));
                continue;
            };
            match self.resolve(model, value) {
                Ok(Some(constraint)) => constraints.push(constraint),
                Ok(None) => {}
                Err(error) => {
                    tracing::debug!(filter = name, %error, "ignoring malformed filter value");
                    rejected.push(error);
                }
            }
        }

        RowPredicate {
            search,
            search_fields: self.search_fields.clone(),
            constraints,
            rejected,
        }
    }

    /// Keeps the rows matching `search` and every active entry, in input order.
    pub fn apply<'r, R, I>(&self, rows: I, search: &str, active: &ActiveFilterSet) -> Vec<&'r R>
    where
        R: Row + ?Sized + 'r,
        I: IntoIterator<Item = &'r R>,
    {
        let predicate = self.compile(search, active);
        rows.into_iter()
            .filter(|row| predicate.matches(*row))
            .collect()
    }

    fn resolve(
        &self,
        model: &FilterModel,
        value: &FilterValue,
    ) -> Result<Option<Constraint>, EngineError> {
        if value.is_unconstrained(&self.all_sentinel) {
            return Ok(None);
        }
        let accessor = model.accessor_key.clone();
        let invalid = || EngineError::InvalidFilterValue {
            filter: model.name.clone(),
            kind: model.kind.as_str(),
            value: value.describe(),
        };
        if !value.is_finite() {
            return Err(invalid());
        }

        let constraint = match (model.kind, value) {
            (FilterKind::Text, FilterValue::Text(text)) => Constraint::Substring {
                accessor,
                needle: text.trim().to_lowercase(),
            },
            (FilterKind::Text, FilterValue::Number(number)) => Constraint::Substring {
                accessor,
                needle: Value::Number(*number).display(),
            },
            (FilterKind::Select, FilterValue::Text(text)) => Constraint::Exact {
                accessor,
                expected: text.trim().to_owned(),
            },
            (FilterKind::Select, FilterValue::Number(number)) => Constraint::Exact {
                accessor,
                expected: Value::Number(*number).display(),
            },
            (FilterKind::Select, FilterValue::Bool(flag)) => Constraint::Exact {
                accessor,
                expected: flag.to_string(),
            },
            (FilterKind::Number, FilterValue::Number(number)) => Constraint::NumberRange {
                accessor,
                min: Some(*number),
                max: Some(*number),
            },
            (FilterKind::Number, FilterValue::Text(text)) => {
                let number = parse_number(text).map_err(|_| invalid())?;
                Constraint::NumberRange {
                    accessor,
                    min: Some(number),
                    max: Some(number),
                }
            }
            (FilterKind::Number, FilterValue::NumberRange { min, max }) => {
                if let (Some(min), Some(max)) = (min, max)
                    && min > max
                {
                    return Err(invalid());
                }
                Constraint::NumberRange {
                    accessor,
                    min: *min,
                    max: *max,
                }
            }
            (FilterKind::DateRange, FilterValue::DateRange { from, to }) => {
                if let (Some(from), Some(to)) = (from, to)
                    && from > to
                {
                    return Err(invalid());
                }
                Constraint::DateRange {
                    accessor,
                    from: *from,
                    to: *to,
                }
            }
            (FilterKind::DateRange, FilterValue::Date(date)) => Constraint::DateRange {
                accessor,
                from: Some(*date),
                to: Some(*date),
            },
            (FilterKind::DateRange, FilterValue::Text(text)) => {
                let date = parse_date(text).map_err(|_| invalid())?;
                Constraint::DateRange {
                    accessor,
                    from: Some(date),
                    to: Some(date),
                }
            }
            (FilterKind::Boolean, FilterValue::Bool(flag)) => Constraint::Flag {
                accessor,
                expected: *flag,
            },
            (FilterKind::Boolean, FilterValue::Text(text)) => Constraint::Flag {
                accessor,
                expected: parse_bool(text).map_err(|_| invalid())?,
            },
            _ => return Err(invalid()),
        };
        Ok(Some(constraint))
    }
}

#[cfg(test)]
mod tests {
    use super::{ActiveFilterSet, FilterEngine, FilterKind, FilterModel, FilterValue};
    use crate::error::EngineError;
    use crate::model::{Record, Row, Value};
    use time::{Date, Month};

    fn date(year: i32, month: Month, day: u8) -> Date {
        Date::from_calendar_date(year, month, day).expect("valid test date")
    }

    fn rows() -> Vec<Record> {
        vec![
            Record::new("1")
                .with("name", "Mass Spectrometer")
                .with("dept", "Chemistry")
                .with("status", "normal")
                .with("price", 120_000.0)
                .with("shared", true)
                .with("purchased", date(2024, Month::March, 1)),
            Record::new("2")
                .with("name", "Confocal Microscope")
                .with("dept", "Biology")
                .with("status", "repair")
                .with("price", 85_000.0)
                .with("shared", false)
                .with("purchased", date(2025, Month::June, 15)),
            Record::new("3")
                .with("name", "PCR Cycler")
                .with("dept", "biology")
                .with("status", "normal")
                .with("price", 9_500.0)
                .with("shared", true)
                .with("purchased", "2025-11-02")
                .with(
                    "tags",
                    Value::Tags(vec!["Genomics".to_owned(), "Teaching".to_owned()]),
                ),
        ]
    }

    fn engine() -> FilterEngine {
        FilterEngine::new(
            vec![
                FilterModel::new("dept", "Department", FilterKind::Select),
                FilterModel::new("status", "Status", FilterKind::Select),
                FilterModel::new("keyword", "Name contains", FilterKind::Text).accessor("name"),
                FilterModel::new("price", "Price", FilterKind::Number),
                FilterModel::new("purchased", "Purchased", FilterKind::DateRange),
                FilterModel::new("shared", "Shared", FilterKind::Boolean),
            ],
            vec!["name".to_owned(), "dept".to_owned(), "tags".to_owned()],
        )
    }

    fn ids(rows: &[&Record]) -> Vec<String> {
        rows.iter().map(|row| row.row_id().to_string()).collect()
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let rows = rows();
        let engine = engine();
        let filtered = engine.apply(&rows, "  BIOLOGY ", &ActiveFilterSet::new());
        assert_eq!(ids(&filtered), vec!["2", "3"]);

        let by_name = engine.apply(&rows, "micro", &ActiveFilterSet::new());
        assert_eq!(ids(&by_name), vec!["2"]);
    }

    #[test]
    fn search_matches_individual_tags() {
        let rows = rows();
        let filtered = engine().apply(&rows, "genomics", &ActiveFilterSet::new());
        assert_eq!(ids(&filtered), vec!["3"]);
    }

    #[test]
    fn select_filter_is_exact_and_all_is_no_constraint() {
        let rows = rows();
        let engine = engine();
        let biology = ActiveFilterSet::new().with("dept", FilterValue::text("Biology"));
        assert_eq!(ids(&engine.apply(&rows, "", &biology)), vec!["2"]);

        let all = ActiveFilterSet::new().with("dept", FilterValue::all());
        assert_eq!(ids(&engine.apply(&rows, "", &all)), vec!["1", "2", "3"]);
    }

    #[test]
    fn text_filter_is_substring() {
        let rows = rows();
        let active = ActiveFilterSet::new().with("keyword", FilterValue::text("SCOPE"));
        assert_eq!(ids(&engine().apply(&rows, "", &active)), vec!["2"]);
    }

    #[test]
    fn date_range_is_inclusive_and_reads_text_dates() {
        let rows = rows();
        let active = ActiveFilterSet::new().with(
            "purchased",
            FilterValue::DateRange {
                from: Some(date(2025, Month::June, 15)),
                to: Some(date(2025, Month::November, 2)),
            },
        );
        assert_eq!(ids(&engine().apply(&rows, "", &active)), vec!["2", "3"]);

        let open_ended = ActiveFilterSet::new().with(
            "purchased",
            FilterValue::DateRange {
                from: None,
                to: Some(date(2024, Month::December, 31)),
            },
        );
        assert_eq!(ids(&engine().apply(&rows, "", &open_ended)), vec!["1"]);
    }

    #[test]
    fn number_filter_accepts_numeric_text_and_ranges() {
        let rows = rows();
        let engine = engine();
        let exact = ActiveFilterSet::new().with("price", FilterValue::text("9,500"));
        assert_eq!(ids(&engine.apply(&rows, "", &exact)), vec!["3"]);

        let range = ActiveFilterSet::new().with(
            "price",
            FilterValue::NumberRange {
                min: Some(50_000.0),
                max: None,
            },
        );
        assert_eq!(ids(&engine.apply(&rows, "", &range)), vec!["1", "2"]);
    }

    #[test]
    fn malformed_values_are_ignored_and_reported() {
        let rows = rows();
        let engine = engine();
        let active = ActiveFilterSet::new()
            .with("price", FilterValue::text("cheap"))
            .with("status", FilterValue::text("normal"));
        let predicate = engine.compile("", &active);
        assert_eq!(predicate.rejected().len(), 1);
        assert!(matches!(
            predicate.rejected()[0],
            EngineError::InvalidFilterValue { ref filter, .. } if filter == "price"
        ));
        assert_eq!(ids(&engine.apply(&rows, "", &active)), vec!["1", "3"]);
    }

    #[test]
    fn non_finite_numbers_are_malformed() {
        let rows = rows();
        let engine = engine();
        let cases = [
            FilterValue::Number(f64::NAN),
            FilterValue::Number(f64::INFINITY),
            FilterValue::NumberRange {
                min: Some(f64::NEG_INFINITY),
                max: None,
            },
            FilterValue::NumberRange {
                min: Some(1.0),
                max: Some(f64::NAN),
            },
        ];
        for value in cases {
            let active = ActiveFilterSet::new().with("price", value.clone());
            let predicate = engine.compile("", &active);
            assert!(
                matches!(
                    predicate.rejected(),
                    [EngineError::InvalidFilterValue { filter, .. }] if filter == "price"
                ),
                "value={value:?}"
            );
            assert_eq!(engine.apply(&rows, "", &active).len(), 3, "value={value:?}");
        }
    }

    #[test]
    fn unknown_filters_are_ignored() {
        let rows = rows();
        let active = ActiveFilterSet::new().with("owner", FilterValue::text("nobody"));
        let predicate = engine().compile("", &active);
        assert_eq!(
            predicate.rejected(),
            &[EngineError::UnknownFilter("owner".to_owned())]
        );
        assert_eq!(engine().apply(&rows, "", &active).len(), 3);
    }

    #[test]
    fn inverted_ranges_are_invalid() {
        let error = engine()
            .validate(
                "purchased",
                &FilterValue::DateRange {
                    from: Some(date(2026, Month::January, 2)),
                    to: Some(date(2026, Month::January, 1)),
                },
            )
            .expect_err("inverted range should fail");
        assert!(matches!(error, EngineError::InvalidFilterValue { .. }));
    }

    #[test]
    fn boolean_filter_parses_text() {
        let rows = rows();
        let active = ActiveFilterSet::new().with("shared", FilterValue::text("no"));
        assert_eq!(ids(&engine().apply(&rows, "", &active)), vec!["2"]);
    }

    #[test]
    fn constraints_combine_with_and() {
        let rows = rows();
        let active = ActiveFilterSet::new()
            .with("status", FilterValue::text("normal"))
            .with("shared", FilterValue::Bool(true));
        assert_eq!(ids(&engine().apply(&rows, "pcr", &active)), vec!["3"]);
    }

    #[test]
    fn defaults_seed_active_set() {
        let models = vec![
            FilterModel::new("status", "Status", FilterKind::Select)
                .default_value(FilterValue::text("normal")),
            FilterModel::new("dept", "Department", FilterKind::Select),
        ];
        let active = ActiveFilterSet::from_defaults(&models);
        assert_eq!(active.get("status"), Some(&FilterValue::text("normal")));
        assert_eq!(active.get("dept"), None);
        assert_eq!(active.active_count("all"), 1);
    }

    #[test]
    fn filter_kind_parse_round_trip() {
        for kind in [
            FilterKind::Text,
            FilterKind::Select,
            FilterKind::Number,
            FilterKind::DateRange,
            FilterKind::Boolean,
        ] {
            assert_eq!(FilterKind::parse(kind.as_str()), Some(kind));
        }
    }
}

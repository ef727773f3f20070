// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use time::{Date, OffsetDateTime};

use crate::error::EngineError;
use crate::ids::{ColumnId, RowId};
use crate::validation::{parse_date, parse_datetime, parse_number};

/// Read access the engine needs from a caller-owned record.
pub trait Row {
    fn row_id(&self) -> RowId;

    /// Missing attributes read as [`Value::Null`].
    fn get(&self, attribute: &str) -> Value;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Value {
    #[default]
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(Date),
    DateTime(OffsetDateTime),
    Tags(Vec<String>),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn display(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Text(value) => value.clone(),
            Self::Number(value) => {
                if value.fract() == 0.0 && value.abs() < 1e15 {
                    format!("{value:.0}")
                } else {
                    value.to_string()
                }
            }
            Self::Bool(value) => value.to_string(),
            Self::Date(value) => value.to_string(),
            Self::DateTime(value) => format!("{} {}", value.date(), value.time()),
            Self::Tags(tags) => tags.join(", "),
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(value) => value.trim().is_empty(),
            Self::Tags(tags) => tags.is_empty(),
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(value) => parse_number(value).ok(),
            Self::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<Date> {
        match self {
            Self::Date(value) => Some(*value),
            Self::DateTime(value) => Some(value.date()),
            Self::Text(value) => parse_date(value).ok(),
            _ => None,
        }
    }

    /// Nanoseconds since the epoch, for date-like ordering. Dates count
    /// from UTC midnight.
    pub fn as_timestamp(&self) -> Option<i128> {
        match self {
            Self::Date(value) => Some(value.midnight().assume_utc().unix_timestamp_nanos()),
            Self::DateTime(value) => Some(value.unix_timestamp_nanos()),
            Self::Text(value) => parse_datetime(value)
                .ok()
                .map(OffsetDateTime::unix_timestamp_nanos),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Number(value) => Some(*value != 0.0),
            Self::Text(value) => crate::validation::parse_bool(value).ok(),
            _ => None,
        }
    }

    /// Lowercased display text, or each tag lowercased for tag lists.
    pub(crate) fn search_terms(&self) -> Vec<String> {
        match self {
            Self::Tags(tags) => tags.iter().map(|tag| tag.to_lowercase()).collect(),
            other => vec![other.display().to_lowercase()],
        }
    }

    /// Ordering used when no column type is known: numbers numerically,
    /// dates by timestamp, everything else as case-folded text.
    pub fn cmp_value(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(left), Self::Number(right)) => left.total_cmp(right),
            (Self::Bool(left), Self::Bool(right)) => left.cmp(right),
            (Self::Date(_) | Self::DateTime(_), Self::Date(_) | Self::DateTime(_)) => {
                self.as_timestamp().cmp(&other.as_timestamp())
            }
            _ => compare_text(&self.display(), &other.display()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Date> for Value {
    fn from(value: Date) -> Self {
        Self::Date(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Case-folded comparison with the raw text as a secondary key so that
/// strings differing only in case still order deterministically.
pub fn compare_text(left: &str, right: &str) -> Ordering {
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(right))
}

/// A ready-made row for hosts that hold plain attribute maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RowId,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<RowId>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(attribute.into(), value.into());
        self
    }
}

impl Row for Record {
    fn row_id(&self) -> RowId {
        self.id.clone()
    }

    fn get(&self, attribute: &str) -> Value {
        self.fields.get(attribute).cloned().unwrap_or_default()
    }
}

impl<T: Row + ?Sized> Row for &T {
    fn row_id(&self) -> RowId {
        (**self).row_id()
    }

    fn get(&self, attribute: &str) -> Value {
        (**self).get(attribute)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Text,
    Number,
    Select,
    Date,
    Boolean,
    DateTime,
    File,
    Textarea,
    Tags,
    Rating,
    User,
    Status,
}

impl ColumnType {
    pub const ALL: [Self; 12] = [
        Self::Text,
        Self::Number,
        Self::Select,
        Self::Date,
        Self::Boolean,
        Self::DateTime,
        Self::File,
        Self::Textarea,
        Self::Tags,
        Self::Rating,
        Self::User,
        Self::Status,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Select => "select",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::DateTime => "datetime",
            Self::File => "file",
            Self::Textarea => "textarea",
            Self::Tags => "tags",
            Self::Rating => "rating",
            Self::User => "user",
            Self::Status => "status",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value.trim()))
    }

    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::Rating)
    }

    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::Date | Self::DateTime)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub id: ColumnId,
    pub header: String,
    pub accessor_key: String,
    pub column_type: ColumnType,
    pub enable_sorting: bool,
    pub enable_filtering: bool,
    #[serde(default)]
    pub options: Vec<SelectOption>,
}

impl ColumnDef {
    pub fn new(id: impl Into<String>, header: impl Into<String>, column_type: ColumnType) -> Self {
        let id = id.into();
        Self {
            accessor_key: id.clone(),
            id: ColumnId::new(id),
            header: header.into(),
            column_type,
            enable_sorting: true,
            enable_filtering: true,
            options: Vec::new(),
        }
    }

    pub fn accessor(mut self, key: impl Into<String>) -> Self {
        self.accessor_key = key.into();
        self
    }

    pub fn sortable(mut self, enabled: bool) -> Self {
        self.enable_sorting = enabled;
        self
    }

    pub fn filterable(mut self, enabled: bool) -> Self {
        self.enable_filtering = enabled;
        self
    }

    pub fn options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }

    pub fn value_of<R: Row + ?Sized>(&self, row: &R) -> Value {
        row.get(&self.accessor_key)
    }
}

/// Every column a view can show. Built once; a replacement catalog is a new
/// value, never an edit of this one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnCatalog {
    columns: Vec<ColumnDef>,
}

impl ColumnCatalog {
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self, EngineError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.id.clone()) {
                return Err(EngineError::DuplicateColumnId(column.id.clone()));
            }
        }
        Ok(Self { columns })
    }

    pub fn get(&self, id: &ColumnId) -> Option<&ColumnDef> {
        self.columns.iter().find(|column| &column.id == id)
    }

    pub fn contains(&self, id: &ColumnId) -> bool {
        self.get(id).is_some()
    }

    pub fn position(&self, id: &ColumnId) -> Option<usize> {
        self.columns.iter().position(|column| &column.id == id)
    }

    pub fn ids(&self) -> Vec<ColumnId> {
        self.columns.iter().map(|column| column.id.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Row ordering.
//!
//! Two mutually exclusive modes: a single column cycled through
//! asc → desc → unsorted, or a named "smart" sort made of ordered tie-break
//! stages. In both modes the row identifier is the final stage, so two
//! distinct rows never compare equal and repeated sorts agree. The sort
//! itself is stable.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::EngineError;
use crate::ids::{ColumnId, RowId};
use crate::model::{ColumnCatalog, ColumnType, Row, SortDirection, Value, compare_text};

/// Rank given to values a priority map does not mention.
pub const DEFAULT_UNMAPPED_RANK: i64 = 999;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SortState {
    #[default]
    Unsorted,
    Column {
        column_id: ColumnId,
        direction: SortDirection,
    },
    Smart(SmartSort),
}

impl SortState {
    pub fn column(column_id: impl Into<ColumnId>, direction: SortDirection) -> Self {
        Self::Column {
            column_id: column_id.into(),
            direction,
        }
    }

    /// Next state after a header click: the same column cycles
    /// asc → desc → unsorted, any other column starts at asc.
    pub fn toggled(&self, column_id: &ColumnId) -> Self {
        match self {
            Self::Column {
                column_id: current,
                direction: SortDirection::Asc,
            } if current == column_id => Self::column(column_id.clone(), SortDirection::Desc),
            Self::Column {
                column_id: current,
                direction: SortDirection::Desc,
            } if current == column_id => Self::Unsorted,
            _ => Self::column(column_id.clone(), SortDirection::Asc),
        }
    }

    pub fn direction_for(&self, column_id: &ColumnId) -> Option<SortDirection> {
        match self {
            Self::Column {
                column_id: current,
                direction,
            } if current == column_id => Some(*direction),
            _ => None,
        }
    }

    pub fn smart_name(&self) -> Option<&str> {
        match self {
            Self::Smart(smart) => Some(smart.name()),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Unsorted => "unsorted".to_owned(),
            Self::Column {
                column_id,
                direction,
            } => format!("{column_id} {}", direction.as_str()),
            Self::Smart(smart) => format!("smart:{}", smart.name()),
        }
    }
}

/// Header-click transition checked against the catalog.
pub fn toggle_sort(
    catalog: &ColumnCatalog,
    state: &SortState,
    column_id: &ColumnId,
) -> Result<SortState, EngineError> {
    let column = catalog
        .get(column_id)
        .ok_or_else(|| EngineError::UnknownColumnId(column_id.clone()))?;
    if !column.enable_sorting {
        return Err(EngineError::ColumnNotSortable(column_id.clone()));
    }
    Ok(state.toggled(column_id))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityMap {
    ranks: BTreeMap<String, i64>,
    unmapped_rank: i64,
}

impl PriorityMap {
    pub fn new<I, K>(ranks: I) -> Self
    where
        I: IntoIterator<Item = (K, i64)>,
        K: Into<String>,
    {
        Self {
            ranks: ranks
                .into_iter()
                .map(|(key, rank)| (key.into(), rank))
                .collect(),
            unmapped_rank: DEFAULT_UNMAPPED_RANK,
        }
    }

    pub fn with_unmapped_rank(mut self, rank: i64) -> Self {
        self.unmapped_rank = rank;
        self
    }

    pub fn unmapped_rank(&self) -> i64 {
        self.unmapped_rank
    }

    /// Returns the rank and whether the value was mapped.
    pub fn rank(&self, value: &Value) -> (i64, bool) {
        match self.ranks.get(value.display().trim()) {
            Some(rank) => (*rank, true),
            None => (self.unmapped_rank, false),
        }
    }
}

type CompareFn = dyn Fn(&Value, &Value) -> Ordering + Send + Sync;

#[derive(Clone)]
pub struct ValueComparator {
    name: String,
    compare: Arc<CompareFn>,
}

impl ValueComparator {
    pub fn new(
        name: impl Into<String>,
        compare: impl Fn(&Value, &Value) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            compare: Arc::new(compare),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ValueComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueComparator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ValueComparator {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.compare, &other.compare)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StageRule {
    Priority(PriorityMap),
    Natural,
    Custom(ValueComparator),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortStage {
    pub field: String,
    pub rule: StageRule,
    pub direction: SortDirection,
}

impl SortStage {
    pub fn priority(field: impl Into<String>, map: PriorityMap) -> Self {
        Self {
            field: field.into(),
            rule: StageRule::Priority(map),
            direction: SortDirection::Asc,
        }
    }

    pub fn natural(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule: StageRule::Natural,
            direction: SortDirection::Asc,
        }
    }

    pub fn custom(field: impl Into<String>, comparator: ValueComparator) -> Self {
        Self {
            field: field.into(),
            rule: StageRule::Custom(comparator),
            direction: SortDirection::Asc,
        }
    }

    pub fn descending(mut self) -> Self {
        self.direction = SortDirection::Desc;
        self
    }

    fn key(&self, value: Value) -> StageKey {
        match &self.rule {
            StageRule::Priority(map) => {
                let (rank, mapped) = map.rank(&value);
                StageKey::Rank { rank, mapped }
            }
            StageRule::Natural => StageKey::Natural(SortKey::infer(&value)),
            StageRule::Custom(_) => StageKey::Raw(value),
        }
    }

    fn compare_keys(&self, left: &StageKey, right: &StageKey) -> Ordering {
        match (left, right) {
            (
                StageKey::Rank {
                    rank: left_rank,
                    mapped: left_mapped,
                },
                StageKey::Rank {
                    rank: right_rank,
                    mapped: right_mapped,
                },
            ) => right_mapped
                .cmp(left_mapped)
                .then_with(|| self.direction.apply(left_rank.cmp(right_rank))),
            (StageKey::Natural(left), StageKey::Natural(right)) => {
                left.compare(right, self.direction)
            }
            (StageKey::Raw(left), StageKey::Raw(right)) => match &self.rule {
                StageRule::Custom(comparator) => {
                    self.direction.apply((comparator.compare)(left, right))
                }
                _ => Ordering::Equal,
            },
            _ => Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum StageKey {
    Rank { rank: i64, mapped: bool },
    Natural(SortKey),
    Raw(Value),
}

/// A named, ordered list of tie-break stages.
#[derive(Debug, Clone, PartialEq)]
pub struct SmartSort {
    name: String,
    stages: Vec<SortStage>,
}

impl SmartSort {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    pub fn then(mut self, stage: SortStage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[SortStage] {
        &self.stages
    }

    /// Sets the sink rank of every priority stage.
    pub fn with_unmapped_rank(mut self, rank: i64) -> Self {
        for stage in &mut self.stages {
            if let StageRule::Priority(map) = &mut stage.rule {
                map.unmapped_rank = rank;
            }
        }
        self
    }

    fn keys<R: Row + ?Sized>(&self, row: &R) -> Vec<StageKey> {
        self.stages
            .iter()
            .map(|stage| stage.key(row.get(&stage.field)))
            .collect()
    }

    fn compare_keys(&self, left: &[StageKey], right: &[StageKey]) -> Ordering {
        self.stages
            .iter()
            .zip(left.iter().zip(right))
            .map(|(stage, (left, right))| stage.compare_keys(left, right))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

/// Comparable projection of a cell. Missing values always sort last.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Time(i128),
    Flag(bool),
    Text(String),
    Missing,
}

impl SortKey {
    fn for_column(column_type: ColumnType, value: &Value) -> Self {
        if value.is_null() {
            return Self::Missing;
        }
        let key = if column_type.is_numeric() {
            value.as_number().map(Self::Number)
        } else if column_type.is_temporal() {
            value.as_timestamp().map(Self::Time)
        } else if column_type == ColumnType::Boolean {
            value.as_bool().map(Self::Flag)
        } else {
            Some(Self::Text(value.display()))
        };
        key.unwrap_or(Self::Missing)
    }

    fn infer(value: &Value) -> Self {
        match value {
            _ if value.is_null() => Self::Missing,
            Value::Number(number) => Self::Number(*number),
            Value::Date(_) | Value::DateTime(_) => {
                value.as_timestamp().map_or(Self::Missing, Self::Time)
            }
            Value::Bool(flag) => Self::Flag(*flag),
            other => Self::Text(other.display()),
        }
    }

    fn compare(&self, other: &Self, direction: SortDirection) -> Ordering {
        match (self, other) {
            (Self::Missing, Self::Missing) => Ordering::Equal,
            (Self::Missing, _) => Ordering::Greater,
            (_, Self::Missing) => Ordering::Less,
            (Self::Number(left), Self::Number(right)) => direction.apply(left.total_cmp(right)),
            (Self::Time(left), Self::Time(right)) => direction.apply(left.cmp(right)),
            (Self::Flag(left), Self::Flag(right)) => direction.apply(left.cmp(right)),
            (Self::Text(left), Self::Text(right)) => direction.apply(compare_text(left, right)),
            (left, right) => direction.apply(left.rank().cmp(&right.rank())),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Number(_) => 0,
            Self::Time(_) => 1,
            Self::Flag(_) => 2,
            Self::Text(_) => 3,
            Self::Missing => 4,
        }
    }
}

/// Orders `rows` in place according to `state`.
///
/// `Unsorted` keeps the incoming order. A column sort whose column is no
/// longer in the catalog also keeps the incoming order.
pub fn sort_rows<'r, R>(rows: &mut Vec<&'r R>, catalog: &ColumnCatalog, state: &SortState)
where
    R: Row + ?Sized,
{
    match state {
        SortState::Unsorted => {}
        SortState::Column {
            column_id,
            direction,
        } => {
            let Some(column) = catalog.get(column_id) else {
                tracing::debug!(column = %column_id, "sort column missing from catalog");
                return;
            };
            let mut keyed: Vec<(SortKey, RowId, &'r R)> = rows
                .drain(..)
                .map(|row| {
                    let key = SortKey::for_column(column.column_type, &column.value_of(row));
                    (key, row.row_id(), row)
                })
                .collect();
            keyed.sort_by(|left, right| {
                left.0
                    .compare(&right.0, *direction)
                    .then_with(|| left.1.cmp(&right.1))
            });
            rows.extend(keyed.into_iter().map(|(_, _, row)| row));
        }
        SortState::Smart(smart) => {
            let mut keyed: Vec<(Vec<StageKey>, RowId, &'r R)> = rows
                .drain(..)
                .map(|row| (smart.keys(row), row.row_id(), row))
                .collect();
            keyed.sort_by(|left, right| {
                smart
                    .compare_keys(&left.0, &right.0)
                    .then_with(|| left.1.cmp(&right.1))
            });
            rows.extend(keyed.into_iter().map(|(_, _, row)| row));
        }
    }
}

/// Serializable form of a [`SortState`]. Smart sorts are stored by preset
/// name and resolved against the view definition on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SortPreference {
    #[default]
    Unsorted,
    Column {
        column_id: ColumnId,
        direction: SortDirection,
    },
    Smart {
        preset: String,
    },
}

impl From<&SortState> for SortPreference {
    fn from(state: &SortState) -> Self {
        match state {
            SortState::Unsorted => Self::Unsorted,
            SortState::Column {
                column_id,
                direction,
            } => Self::Column {
                column_id: column_id.clone(),
                direction: *direction,
            },
            SortState::Smart(smart) => Self::Smart {
                preset: smart.name().to_owned(),
            },
        }
    }
}

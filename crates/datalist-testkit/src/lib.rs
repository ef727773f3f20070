// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use datalist_engine::{
    ColumnCatalog, ColumnDef, ColumnType, FilterEngine, FilterKind, FilterModel, PriorityMap, Row,
    RowId, SelectOption, SmartSort, SortStage, Value,
};
use time::{Date, Duration, Month};

pub const STATUS_NORMAL: &str = "正常";
pub const STATUS_REPAIR: &str = "维修中";
pub const STATUS_RETIRED: &str = "停用";

const STATUSES: [&str; 3] = [STATUS_NORMAL, STATUS_REPAIR, STATUS_RETIRED];

const DEPARTMENTS: [&str; 6] = [
    "Biology",
    "Chemistry",
    "Physics",
    "Materials Science",
    "Earth Sciences",
    "Neuroscience",
];

const INSTRUMENTS: [&str; 14] = [
    "Mass Spectrometer",
    "Confocal Microscope",
    "PCR Cycler",
    "NMR Spectrometer",
    "Centrifuge",
    "Flow Cytometer",
    "X-ray Diffractometer",
    "Electron Microscope",
    "Fume Hood",
    "Autoclave",
    "Spectrophotometer",
    "Gas Chromatograph",
    "Cryostat",
    "Laser Cutter",
];

const MODEL_SUFFIXES: [&str; 8] = ["A", "B", "Pro", "Mk II", "X", "2000", "S", "Plus"];

const TAGS: [&str; 8] = [
    "Genomics",
    "Imaging",
    "Teaching",
    "Shared",
    "Core Facility",
    "Hazardous",
    "Calibration Due",
    "Grant Funded",
];

/// A piece of research equipment as an equipment-inventory screen lists it.
#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentRow {
    pub id: i64,
    pub name: String,
    pub dept: String,
    pub status: String,
    pub price: f64,
    pub purchase_date: Date,
    pub shared: bool,
    pub tags: Vec<String>,
}

impl EquipmentRow {
    /// A row with only the identifying fields set; the rest are neutral.
    pub fn basic(id: i64, name: &str, dept: &str, status: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            dept: dept.to_owned(),
            status: status.to_owned(),
            price: 0.0,
            purchase_date: fixture_date(),
            shared: false,
            tags: Vec::new(),
        }
    }
}

impl Row for EquipmentRow {
    fn row_id(&self) -> RowId {
        RowId::from(self.id)
    }

    fn get(&self, attribute: &str) -> Value {
        match attribute {
            "id" => Value::from(self.id),
            "name" => Value::from(self.name.as_str()),
            "dept" => Value::from(self.dept.as_str()),
            "status" => Value::from(self.status.as_str()),
            "price" => Value::from(self.price),
            "purchase_date" => Value::from(self.purchase_date),
            "shared" => Value::from(self.shared),
            "tags" => Value::Tags(self.tags.clone()),
            _ => Value::Null,
        }
    }
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator of equipment rows. The same seed always yields the
/// same sequence.
#[derive(Debug, Clone)]
pub struct EquipmentFaker {
    rng: DeterministicRng,
    next_id: i64,
}

impl EquipmentFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 1,
        }
    }

    pub fn equipment(&mut self) -> EquipmentRow {
        let id = self.next_id;
        self.next_id += 1;

        let name = format!(
            "{} {}",
            self.pick(&INSTRUMENTS),
            self.pick(&MODEL_SUFFIXES)
        );
        let dept = self.pick(&DEPARTMENTS).to_owned();
        let status = self.pick(&STATUSES).to_owned();
        let cents = self.rng.int_n(50_000_000) as f64;
        let purchase_date = fixture_date() - Duration::days(self.rng.int_n(3_650) as i64);
        let shared = self.rng.bool();
        let mut tags: Vec<String> = Vec::new();
        for _ in 0..self.rng.int_n(3) {
            let tag = self.pick(&TAGS).to_owned();
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        EquipmentRow {
            id,
            name,
            dept,
            status,
            price: (cents / 100.0).max(1.0),
            purchase_date,
            shared,
            tags,
        }
    }

    pub fn inventory(&mut self, count: usize) -> Vec<EquipmentRow> {
        (0..count).map(|_| self.equipment()).collect()
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

/// Reference "today" used for generated purchase dates.
pub fn fixture_date() -> Date {
    match Date::from_calendar_date(2026, Month::January, 15) {
        Ok(date) => date,
        Err(_) => Date::MIN,
    }
}

pub fn statuses() -> &'static [&'static str] {
    &STATUSES
}

pub fn departments() -> &'static [&'static str] {
    &DEPARTMENTS
}

fn options(values: &[&str]) -> Vec<SelectOption> {
    values
        .iter()
        .map(|value| SelectOption::new(*value, *value))
        .collect()
}

/// The equipment screen's columns, in catalog order.
pub fn equipment_catalog() -> ColumnCatalog {
    let columns = vec![
        ColumnDef::new("name", "Name", ColumnType::Text),
        ColumnDef::new("dept", "Department", ColumnType::Select).options(options(&DEPARTMENTS)),
        ColumnDef::new("status", "Status", ColumnType::Status).options(options(&STATUSES)),
        ColumnDef::new("price", "Price", ColumnType::Number),
        ColumnDef::new("purchase_date", "Purchased", ColumnType::Date),
        ColumnDef::new("shared", "Shared", ColumnType::Boolean),
        ColumnDef::new("tags", "Tags", ColumnType::Tags).sortable(false),
    ];
    match ColumnCatalog::new(columns) {
        Ok(catalog) => catalog,
        Err(error) => panic!("equipment catalog is malformed: {error}"),
    }
}

/// Quick and advanced filters of the equipment screen. Search covers name,
/// department and tags.
pub fn equipment_filters() -> FilterEngine {
    FilterEngine::new(
        vec![
            FilterModel::new("dept", "Department", FilterKind::Select)
                .options(options(&DEPARTMENTS)),
            FilterModel::new("status", "Status", FilterKind::Select).options(options(&STATUSES)),
            FilterModel::new("keyword", "Name contains", FilterKind::Text).accessor("name"),
            FilterModel::new("price", "Price", FilterKind::Number),
            FilterModel::new("purchased", "Purchased", FilterKind::DateRange)
                .accessor("purchase_date"),
            FilterModel::new("shared", "Shared", FilterKind::Boolean),
        ],
        vec!["name".to_owned(), "dept".to_owned(), "tags".to_owned()],
    )
}

/// Normal equipment first, then equipment in repair, then anything else;
/// ties broken by name.
pub fn status_priority_sort() -> SmartSort {
    SmartSort::new("status-priority")
        .then(SortStage::priority(
            "status",
            PriorityMap::new([(STATUS_NORMAL, 1), (STATUS_REPAIR, 3)]),
        ))
        .then(SortStage::natural("name"))
}

#[cfg(test)]
mod tests {
    use super::{
        EquipmentFaker, EquipmentRow, STATUS_NORMAL, departments, equipment_catalog,
        equipment_filters, fixture_date, status_priority_sort, statuses,
    };
    use datalist_engine::{ColumnId, Row, RowId, Value};
    use std::collections::BTreeSet;

    #[test]
    fn same_seed_same_inventory() {
        let left = EquipmentFaker::new(42).inventory(20);
        let right = EquipmentFaker::new(42).inventory(20);
        assert_eq!(left, right);
    }

    #[test]
    fn zero_seed_is_normalized() {
        assert_eq!(
            EquipmentFaker::new(0).inventory(5),
            EquipmentFaker::new(1).inventory(5)
        );
    }

    #[test]
    fn generated_rows_are_plausible() {
        let rows = EquipmentFaker::new(7).inventory(200);
        let ids: BTreeSet<i64> = rows.iter().map(|row| row.id).collect();
        assert_eq!(ids.len(), rows.len());
        for row in &rows {
            assert!(!row.name.is_empty());
            assert!(departments().contains(&row.dept.as_str()));
            assert!(statuses().contains(&row.status.as_str()));
            assert!(row.price >= 1.0);
            assert!(row.purchase_date <= fixture_date());
            assert!(row.tags.len() <= 2);
        }
    }

    #[test]
    fn variety_across_seeds() {
        let names: BTreeSet<String> = (1_u64..=10)
            .map(|seed| EquipmentFaker::new(seed).equipment().name)
            .collect();
        assert!(names.len() > 1);
    }

    #[test]
    fn row_reads_declared_attributes() {
        let row = EquipmentRow::basic(3, "Centrifuge A", "Biology", STATUS_NORMAL);
        assert_eq!(row.row_id(), RowId::from("3"));
        assert_eq!(row.get("name"), Value::from("Centrifuge A"));
        assert_eq!(row.get("missing"), Value::Null);
        assert_eq!(row.get("tags"), Value::Tags(Vec::new()));
    }

    #[test]
    fn catalog_and_filters_line_up() {
        let catalog = equipment_catalog();
        assert_eq!(catalog.len(), 7);
        assert!(catalog.contains(&ColumnId::from("status")));
        let filters = equipment_filters();
        for model in filters.models() {
            assert!(
                catalog.iter().any(|column| column.accessor_key == model.accessor_key),
                "filter {} reads an attribute no column shows",
                model.name
            );
        }
    }

    #[test]
    fn status_priority_sort_has_two_stages() {
        let preset = status_priority_sort();
        assert_eq!(preset.name(), "status-priority");
        assert_eq!(preset.stages().len(), 2);
    }
}

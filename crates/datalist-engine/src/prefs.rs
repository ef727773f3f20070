// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Durable view preferences a host may choose to store.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::ids::ColumnId;
use crate::sort::SortPreference;

pub const PREFERENCES_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewPreferences {
    pub version: u32,
    pub visible_column_ids: Vec<ColumnId>,
    pub column_order: Vec<ColumnId>,
    pub page_size: usize,
    #[serde(default)]
    pub sort: SortPreference,
}

impl ViewPreferences {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("encode view preferences")
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(raw).context("parse view preferences JSON")?;
        let version = value
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .context("view preferences are missing a numeric `version`")?;
        if version != u64::from(PREFERENCES_VERSION) {
            bail!("unsupported view preferences version {version}; expected {PREFERENCES_VERSION}");
        }
        serde_json::from_value(value).context("decode view preferences")
    }
}

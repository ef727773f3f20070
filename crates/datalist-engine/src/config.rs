// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::filter::ALL_SENTINEL;
use crate::pagination::{DEFAULT_MAX_PAGE_LINKS, DEFAULT_PAGE_SIZE};
use crate::sort::DEFAULT_UNMAPPED_RANK;

pub const APP_NAME: &str = "datalist";
pub const CONFIG_PATH_ENV: &str = "DATALIST_CONFIG_PATH";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_PAGE_SIZE_OPTIONS: [usize; 4] = [10, 20, 50, 100];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    pub version: i64,
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub filter: Filter,
    #[serde(default)]
    pub sort: Sort,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            pagination: Pagination::default(),
            filter: Filter::default(),
            sort: Sort::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Pagination {
    pub page_size: Option<usize>,
    pub page_size_options: Option<Vec<usize>>,
    pub max_page_links: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Filter {
    pub all_sentinel: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Sort {
    pub unmapped_rank: Option<i64>,
}

impl EngineConfig {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        Self::parse(&raw, path)
    }

    /// Parses config text; `origin` is only used in error messages.
    pub fn parse(raw: &str, origin: &Path) -> Result<Self> {
        let value: toml::Value = toml::from_str(raw)
            .with_context(|| format!("parse TOML config {}", origin.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [pagination], [filter], and [sort]",
                    origin.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                origin.display()
            );
        }

        let config: EngineConfig = value
            .try_into()
            .with_context(|| format!("decode config {}", origin.display()))?;
        config.validate(origin)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(page_size) = self.pagination.page_size
            && page_size == 0
        {
            bail!(
                "pagination.page_size in {} must be positive, got {}",
                path.display(),
                page_size
            );
        }

        if let Some(options) = &self.pagination.page_size_options {
            if options.is_empty() {
                bail!(
                    "pagination.page_size_options in {} must not be empty",
                    path.display()
                );
            }
            if options.contains(&0) {
                bail!(
                    "pagination.page_size_options in {} must all be positive, got {:?}",
                    path.display(),
                    options
                );
            }
        }

        if let Some(links) = self.pagination.max_page_links
            && links < 3
        {
            bail!(
                "pagination.max_page_links in {} must be at least 3, got {}",
                path.display(),
                links
            );
        }

        if let Some(sentinel) = &self.filter.all_sentinel
            && sentinel.trim().is_empty()
        {
            bail!(
                "filter.all_sentinel in {} must not be blank",
                path.display()
            );
        }

        Ok(())
    }

    pub fn page_size(&self) -> usize {
        self.pagination.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn page_size_options(&self) -> Vec<usize> {
        self.pagination
            .page_size_options
            .clone()
            .unwrap_or_else(|| DEFAULT_PAGE_SIZE_OPTIONS.to_vec())
    }

    pub fn max_page_links(&self) -> usize {
        self.pagination
            .max_page_links
            .unwrap_or(DEFAULT_MAX_PAGE_LINKS)
    }

    pub fn all_sentinel(&self) -> &str {
        self.filter
            .all_sentinel
            .as_deref()
            .map(str::trim)
            .unwrap_or(ALL_SENTINEL)
    }

    pub fn unmapped_rank(&self) -> i64 {
        self.sort.unmapped_rank.unwrap_or(DEFAULT_UNMAPPED_RANK)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# datalist engine config\n# Place this file at: {}\n\nversion = 1\n\n[pagination]\npage_size = {}\npage_size_options = [10, 20, 50, 100]\n# Number of page links shown in the navigation window (at least 3)\nmax_page_links = {}\n\n[filter]\n# Select value meaning \"no constraint\"\nall_sentinel = \"{}\"\n\n[sort]\n# Rank given to values a priority map does not list; they sort last\nunmapped_rank = {}\n",
            path.display(),
            DEFAULT_PAGE_SIZE,
            DEFAULT_MAX_PAGE_LINKS,
            ALL_SENTINEL,
            DEFAULT_UNMAPPED_RANK,
        )
    }
}

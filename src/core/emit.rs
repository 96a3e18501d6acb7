// loganyapp - core/emit.rs
//
// Backend Configuration Emitter. Serialises a compiled matrix and its
// outputs into the backend's native configuration: a TOML document with
// `appenders`, `filters`, and `categories` tables.
//
// Every table is a BTreeMap, so categories come out in lexicographic order
// and each appender and filter appears exactly once. The same text loaded
// back through `BackendConfig::from_text` yields an identical value.

use crate::core::matrix::{FilterKind, Matrix};
use crate::core::model::{OutputKind, OutputSpec, Severity};
use crate::util::error::{BackendError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One activated output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppenderConfig {
    pub level: Severity,
    pub pattern: String,
    #[serde(flatten)]
    pub kind: OutputKind,
}

/// A severity gate attached to one appender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub appender: String,
    #[serde(flatten)]
    pub kind: FilterKind,
}

/// An appender attached to a category, possibly through a filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppenderRef {
    pub appender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// Threshold and appenders of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub level: Severity,
    #[serde(default)]
    pub appenders: Vec<AppenderRef>,
}

/// The complete backend configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub appenders: BTreeMap<String, AppenderConfig>,
    #[serde(default)]
    pub filters: BTreeMap<String, FilterConfig>,
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryConfig>,
}

impl BackendConfig {
    /// Render as the backend's native text.
    pub fn to_text(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|source| BackendError::Serialize { source }.into())
    }

    /// Parse native text and check that every reference resolves.
    pub fn from_text(text: &str) -> Result<Self> {
        let config: BackendConfig =
            toml::from_str(text).map_err(|source| BackendError::Deserialize { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Every category reference must name a defined appender, and every
    /// filter must exist and belong to the appender it is used with.
    pub fn validate(&self) -> Result<()> {
        for (category, entry) in &self.categories {
            for r in &entry.appenders {
                if !self.appenders.contains_key(&r.appender) {
                    return Err(BackendError::DanglingReference {
                        category: category.clone(),
                        name: r.appender.clone(),
                    }
                    .into());
                }
                if let Some(ref filter) = r.filter {
                    match self.filters.get(filter) {
                        Some(f) if f.appender == r.appender => {}
                        _ => {
                            return Err(BackendError::DanglingReference {
                                category: category.clone(),
                                name: filter.clone(),
                            }
                            .into());
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Serialise the matrix and outputs into a backend configuration.
pub fn emit(matrix: &Matrix, specs: &[OutputSpec]) -> Result<BackendConfig> {
    let appenders = specs
        .iter()
        .map(|spec| {
            (
                spec.name.clone(),
                AppenderConfig {
                    level: spec.level,
                    pattern: spec.pattern.clone(),
                    kind: spec.kind.clone(),
                },
            )
        })
        .collect();

    let filters = matrix
        .filters
        .iter()
        .map(|(name, f)| {
            (
                name.clone(),
                FilterConfig {
                    appender: f.output.clone(),
                    kind: f.kind,
                },
            )
        })
        .collect();

    let categories = matrix
        .categories
        .iter()
        .map(|(name, entry)| {
            (
                name.clone(),
                CategoryConfig {
                    level: entry.level,
                    appenders: entry
                        .bindings
                        .iter()
                        .map(|b| AppenderRef {
                            appender: b.output.clone(),
                            filter: b.filter.clone(),
                        })
                        .collect(),
                },
            )
        })
        .collect();

    let config = BackendConfig {
        appenders,
        filters,
        categories,
    };
    config.validate()?;
    tracing::debug!(
        appenders = config.appenders.len(),
        filters = config.filters.len(),
        categories = config.categories.len(),
        "Backend configuration emitted"
    );
    Ok(config)
}

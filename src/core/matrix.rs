// loganyapp - core/matrix.rs
//
// Category/Level Matrix Compiler.
//
// Input: the built outputs, each with a default level at its scope category
// and optional per-category overrides, plus the global per-category
// overrides. Output: for every category that matters, the threshold the
// backend's category gate must apply and, per output, whether that output
// needs its own severity filter on top of the gate.
//
// Levels are compared by verbosity (see `Severity`): a category's threshold
// is the most verbose level any reaching output wants, and an output whose
// own level is stricter than that gets a range filter. An output that is OFF
// at a category stays attached behind an always-reject filter, so the wiring
// exists for later reconfiguration.

use crate::core::alias::{expand_one, AliasTable};
use crate::core::model::{category_chain, is_within, OutputSpec, Severity, ROOT_CATEGORY};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What a filter lets through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "accept", rename_all = "snake_case")]
pub enum FilterKind {
    /// Events at `min` or more severe.
    Range { min: Severity },
    /// Nothing.
    RejectAll,
}

impl FilterKind {
    pub fn accepts(&self, event: Severity) -> bool {
        match self {
            FilterKind::Range { min } => min.admits(event),
            FilterKind::RejectAll => false,
        }
    }
}

/// A filter attached to one output; shared by every category that needs the
/// same (output, threshold) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Filter {
    pub output: String,
    #[serde(flatten)]
    pub kind: FilterKind,
}

/// One output attached to a category, possibly behind a filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    pub output: String,
    pub filter: Option<String>,
}

/// Compiled settings for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryEntry {
    /// Gate applied before any output filter.
    pub level: Severity,
    /// Reaching outputs, in output build order.
    pub bindings: Vec<Binding>,
}

/// The compiled category/level matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Matrix {
    pub categories: BTreeMap<String, CategoryEntry>,
    pub filters: BTreeMap<String, Filter>,
}

impl Matrix {
    /// Entry of the nearest materialised ancestor of `category`.
    pub fn lookup(&self, category: &str) -> Option<(&str, &CategoryEntry)> {
        category_chain(category)
            .into_iter()
            .find_map(|c| self.categories.get_key_value(c))
            .map(|(k, v)| (k.as_str(), v))
    }
}

/// Declared levels of one output, keyed by concrete category.
#[derive(Debug)]
struct OutputTable<'a> {
    spec: &'a OutputSpec,
    /// Scope categories after alias expansion.
    scopes: Vec<String>,
    levels: BTreeMap<String, Severity>,
}

impl OutputTable<'_> {
    /// Level of this output at `category`: the entry of the longest
    /// ancestor that has one. `None` when the category is outside the
    /// output's scope.
    fn effective(&self, category: &str) -> Option<Severity> {
        if !self.in_scope(category) {
            return None;
        }
        category_chain(category)
            .into_iter()
            .find_map(|c| self.levels.get(c).copied())
    }

    fn in_scope(&self, category: &str) -> bool {
        self.scopes.iter().any(|scope| is_within(category, scope))
    }
}

/// Compile the matrix.
///
/// Per output, declared levels are layered: the output's own level at its
/// scope category, then the global `category_level` entries, then the
/// output's own `category_level` entries. Later layers overwrite earlier
/// ones for the same category. Alias keys are expanded, the output's scope
/// category included; entries outside every scope are ignored for that
/// output.
pub fn compile(
    specs: &[OutputSpec],
    global_category_level: &BTreeMap<String, Severity>,
    aliases: &AliasTable,
) -> Matrix {
    // Step 1: per-output declared levels.
    let tables: Vec<OutputTable<'_>> = specs
        .iter()
        .map(|spec| {
            let mut table = OutputTable {
                spec,
                scopes: expand_one(&spec.category, aliases),
                levels: BTreeMap::new(),
            };
            for scope in &table.scopes {
                table.levels.insert(scope.clone(), spec.level);
            }
            for layer in [global_category_level, &spec.category_level] {
                for (key, level) in layer {
                    for category in expand_one(key, aliases) {
                        if table.in_scope(&category) {
                            table.levels.insert(category, *level);
                        }
                    }
                }
            }
            table
        })
        .collect();

    // Steps 2 and 4: every mentioned category plus all of its ancestors.
    let mut categories: BTreeSet<String> = BTreeSet::new();
    categories.insert(ROOT_CATEGORY.to_string());
    for table in &tables {
        for category in table.levels.keys() {
            for c in category_chain(category) {
                categories.insert(c.to_string());
            }
        }
    }

    let mut matrix = Matrix::default();
    for category in categories {
        // Step 3: effective level of every reaching output.
        let reaching: Vec<(&OutputTable<'_>, Severity)> = tables
            .iter()
            .filter_map(|t| t.effective(&category).map(|level| (t, level)))
            .collect();

        // Step 4: threshold is the most verbose wanted level.
        let threshold = reaching
            .iter()
            .map(|(_, level)| *level)
            .fold(Severity::Off, Severity::most_verbose);

        // Step 5: filters where an output wants less than the gate lets in.
        let mut bindings = Vec::with_capacity(reaching.len());
        for (table, level) in reaching {
            let output = table.spec.name.clone();
            let kind = if level == Severity::Off {
                Some(FilterKind::RejectAll)
            } else if level < threshold {
                Some(FilterKind::Range { min: level })
            } else {
                None
            };
            let filter = kind.map(|kind| {
                let name = format!("{output}_{}", level.label());
                matrix.filters.entry(name.clone()).or_insert_with(|| Filter {
                    output: output.clone(),
                    kind,
                });
                name
            });
            bindings.push(Binding { output, filter });
        }

        tracing::trace!(
            category = %category,
            level = %threshold,
            outputs = bindings.len(),
            "Category compiled"
        );
        matrix.categories.insert(
            category,
            CategoryEntry {
                level: threshold,
                bindings,
            },
        );
    }

    tracing::debug!(
        categories = matrix.categories.len(),
        filters = matrix.filters.len(),
        "Matrix compiled"
    );
    matrix
}

// loganyapp - core/alias.rs
//
// Category Alias Expander. An alias names one or more concrete categories;
// expansion is a single level, so alias targets are taken literally even if
// they are themselves alias names.

use crate::core::model::normalize_category;
use std::collections::BTreeMap;

/// Alias name to target categories, in declaration order.
pub type AliasTable = BTreeMap<String, Vec<String>>;

/// Expand `names` into concrete categories.
///
/// Order follows the input, with alias targets spliced in place. A category
/// produced twice is kept only at its first position. `::` separators are
/// normalised to `.`.
pub fn expand<S: AsRef<str>>(names: &[S], aliases: &AliasTable) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |category: String| {
        if !out.contains(&category) {
            out.push(category);
        }
    };

    for name in names {
        let name = name.as_ref();
        match aliases.get(name) {
            Some(targets) => {
                for target in targets {
                    push(normalize_category(target));
                }
            }
            None => push(normalize_category(name)),
        }
    }
    out
}

/// Expand a single name.
pub fn expand_one(name: &str, aliases: &AliasTable) -> Vec<String> {
    expand(&[name], aliases)
}

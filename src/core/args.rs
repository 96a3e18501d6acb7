// loganyapp - core/args.rs
//
// Top-level build arguments. Three ways in, one typed value out:
//
//   - field setters on `BuildArgs::default()`
//   - a flat `-key value -key value` sequence (`BuildArgs::from_flat`)
//   - a key/value table, e.g. a parsed TOML file (`BuildArgs::from_table`)
//
// Output arguments (`file`, `dir`, `screen`, `syslog`) stay loosely typed
// here; `core::output::build` validates them per kind.

use crate::core::alias::AliasTable;
use crate::core::model::{ArgValue, Severity};
use crate::core::output::level_map;
use crate::util::error::{OptionError, Result};
use std::collections::BTreeMap;

/// Every key accepted at the top level.
pub const ARG_KEYS: &[&str] = &[
    "name",
    "level",
    "category_alias",
    "category_level",
    "file",
    "dir",
    "screen",
    "syslog",
    "dump",
    "init",
    "daemon",
];

/// Validated top-level arguments of one configuration build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildArgs {
    /// Program name used in default paths and the syslog ident.
    pub name: Option<String>,
    /// Global level; beats every resolver tier.
    pub level: Option<Severity>,
    pub category_alias: AliasTable,
    pub category_level: BTreeMap<String, Severity>,
    pub file: Option<ArgValue>,
    pub dir: Option<ArgValue>,
    pub screen: Option<ArgValue>,
    pub syslog: Option<ArgValue>,
    /// Print the resolved configuration before activation.
    pub dump: Option<bool>,
    /// Activate the backend. When false the configuration is only built.
    pub init: bool,
    /// Override daemon detection.
    pub daemon: Option<bool>,
}

impl Default for BuildArgs {
    fn default() -> Self {
        Self {
            name: None,
            level: None,
            category_alias: AliasTable::new(),
            category_level: BTreeMap::new(),
            file: None,
            dir: None,
            screen: None,
            syslog: None,
            dump: None,
            init: true,
            daemon: None,
        }
    }
}

impl BuildArgs {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn level(mut self, level: Severity) -> Self {
        self.level = Some(level);
        self
    }

    /// Add an alias naming one or more categories.
    pub fn alias<I, S>(mut self, alias: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.category_alias
            .insert(alias.into(), targets.into_iter().map(Into::into).collect());
        self
    }

    pub fn category_level(mut self, category: impl Into<String>, level: Severity) -> Self {
        self.category_level.insert(category.into(), level);
        self
    }

    pub fn file(mut self, value: impl Into<ArgValue>) -> Self {
        self.file = Some(value.into());
        self
    }

    pub fn dir(mut self, value: impl Into<ArgValue>) -> Self {
        self.dir = Some(value.into());
        self
    }

    pub fn screen(mut self, value: impl Into<ArgValue>) -> Self {
        self.screen = Some(value.into());
        self
    }

    pub fn syslog(mut self, value: impl Into<ArgValue>) -> Self {
        self.syslog = Some(value.into());
        self
    }

    pub fn dump(mut self, dump: bool) -> Self {
        self.dump = Some(dump);
        self
    }

    pub fn init(mut self, init: bool) -> Self {
        self.init = init;
        self
    }

    pub fn daemon(mut self, daemon: bool) -> Self {
        self.daemon = Some(daemon);
        self
    }

    /// Parse a flat `-key value` sequence. The leading `-` is optional.
    pub fn from_flat(items: Vec<ArgValue>) -> Result<Self> {
        let mut args = Self::default();
        let mut iter = items.into_iter();
        while let Some(key) = iter.next() {
            let key = match key {
                ArgValue::Str(s) => s,
                other => {
                    return Err(OptionError::InvalidShape {
                        option: "option key".to_string(),
                        reason: format!("expected a key name, got {}", other.shape()),
                    }
                    .into());
                }
            };
            let key = key.trim_start_matches('-').to_string();
            // Reject an unknown key before complaining about its value.
            check_key(&key)?;
            let value = iter
                .next()
                .ok_or_else(|| OptionError::MissingValue { key: key.clone() })?;
            args.set(&key, value)?;
        }
        Ok(args)
    }

    /// Build from a key/value table such as a parsed config file.
    pub fn from_table(table: BTreeMap<String, ArgValue>) -> Result<Self> {
        let mut args = Self::default();
        for (key, value) in table {
            let key = key.trim_start_matches('-').to_string();
            args.set(&key, value)?;
        }
        Ok(args)
    }

    fn set(&mut self, key: &str, value: ArgValue) -> Result<()> {
        match key {
            "name" => self.name = Some(scalar(key, &value)?),
            "level" => {
                let raw = scalar(key, &value)?;
                self.level = Some(Severity::parse(&raw, "option 'level'")?);
            }
            "category_alias" => self.category_alias = alias_table(&value)?,
            "category_level" => self.category_level = level_map(&value, "category_level")?,
            "file" => self.file = Some(value),
            "dir" => self.dir = Some(value),
            "screen" => self.screen = Some(value),
            "syslog" => self.syslog = Some(value),
            "dump" => self.dump = Some(flag(key, &value)?),
            "init" => self.init = flag(key, &value)?,
            "daemon" => self.daemon = Some(flag(key, &value)?),
            other => check_key(other)?,
        }
        Ok(())
    }
}

fn check_key(key: &str) -> Result<()> {
    if ARG_KEYS.contains(&key) {
        Ok(())
    } else {
        Err(OptionError::UnknownOption {
            key: key.to_string(),
            allowed: ARG_KEYS,
        }
        .into())
    }
}

fn scalar(key: &str, value: &ArgValue) -> Result<String> {
    value.as_scalar().ok_or_else(|| {
        OptionError::InvalidShape {
            option: key.to_string(),
            reason: format!("expected a scalar, got {}", value.shape()),
        }
        .into()
    })
}

fn flag(key: &str, value: &ArgValue) -> Result<bool> {
    match value {
        ArgValue::List(_) | ArgValue::Map(_) => Err(OptionError::InvalidShape {
            option: key.to_string(),
            reason: format!("expected a boolean, got {}", value.shape()),
        }
        .into()),
        scalar => Ok(scalar.is_truthy()),
    }
}

/// Alias targets may be one category or a list of them.
fn alias_table(value: &ArgValue) -> Result<AliasTable> {
    let ArgValue::Map(entries) = value else {
        return Err(OptionError::InvalidShape {
            option: "category_alias".to_string(),
            reason: format!("expected a record of alias to categories, got {}", value.shape()),
        }
        .into());
    };

    let mut table = AliasTable::new();
    for (alias, targets) in entries {
        let option = format!("category_alias key '{alias}'");
        let targets = match targets {
            ArgValue::List(items) => items
                .iter()
                .map(|t| scalar(&option, t))
                .collect::<Result<Vec<_>>>()?,
            single => vec![scalar(&option, single)?],
        };
        table.insert(alias.clone(), targets);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::error::{LevelError, LogAnyAppError};

    #[test]
    fn test_defaults() {
        let args = BuildArgs::default();
        assert!(args.init);
        assert_eq!(args.level, None);
        assert!(args.file.is_none());
    }

    #[test]
    fn test_from_flat_with_and_without_dashes() {
        let args = BuildArgs::from_flat(vec![
            "-level".into(),
            "debug".into(),
            "file".into(),
            "/tmp/app.log".into(),
            "-screen".into(),
            false.into(),
            "-init".into(),
            0i64.into(),
        ])
        .unwrap();
        assert_eq!(args.level, Some(Severity::Debug));
        assert_eq!(args.file, Some(ArgValue::from("/tmp/app.log")));
        assert_eq!(args.screen, Some(ArgValue::Bool(false)));
        assert!(!args.init);
    }

    #[test]
    fn test_from_flat_missing_value() {
        let err = BuildArgs::from_flat(vec!["-level".into()]).unwrap_err();
        assert!(matches!(
            err,
            LogAnyAppError::Option(OptionError::MissingValue { ref key }) if key == "level"
        ));
    }

    #[test]
    fn test_unknown_option_lists_keys() {
        let err = BuildArgs::from_flat(vec!["-colour".into(), "1".into()]).unwrap_err();
        match err {
            LogAnyAppError::Option(OptionError::UnknownOption { key, allowed }) => {
                assert_eq!(key, "colour");
                assert!(allowed.contains(&"category_alias"));
            }
            other => panic!("expected unknown option, got {other:?}"),
        }
        // Unknown beats missing value.
        assert!(matches!(
            BuildArgs::from_flat(vec!["-colour".into()]),
            Err(LogAnyAppError::Option(OptionError::UnknownOption { .. }))
        ));
    }

    #[test]
    fn test_invalid_level_names_option() {
        let err = BuildArgs::from_flat(vec!["-level".into(), "loud".into()]).unwrap_err();
        match err {
            LogAnyAppError::Level(LevelError::Invalid { source, value }) => {
                assert_eq!(source, "option 'level'");
                assert_eq!(value, "loud");
            }
            other => panic!("expected level error, got {other:?}"),
        }
    }

    #[test]
    fn test_alias_scalar_or_list() {
        let aliases: ArgValue = [
            ("-one", ArgValue::from("Foo")),
            ("-many", ArgValue::from(vec!["Bar", "Baz::Qux"])),
        ]
        .into_iter()
        .collect();
        let args =
            BuildArgs::from_flat(vec!["-category_alias".into(), aliases]).unwrap();
        assert_eq!(args.category_alias["-one"], vec!["Foo"]);
        assert_eq!(args.category_alias["-many"], vec!["Bar", "Baz::Qux"]);
    }

    #[test]
    fn test_from_table_category_level() {
        let mut table = BTreeMap::new();
        table.insert(
            "category_level".to_string(),
            [("Foo", ArgValue::from("TRACE"))].into_iter().collect(),
        );
        table.insert("daemon".to_string(), ArgValue::from("yes"));
        let args = BuildArgs::from_table(table).unwrap();
        assert_eq!(args.category_level["Foo"], Severity::Trace);
        assert_eq!(args.daemon, Some(true));
    }

    #[test]
    fn test_flag_rejects_record() {
        let mut table = BTreeMap::new();
        table.insert("dump".to_string(), ArgValue::Map(BTreeMap::new()));
        assert!(matches!(
            BuildArgs::from_table(table),
            Err(LogAnyAppError::Option(OptionError::InvalidShape { .. }))
        ));
    }

    #[test]
    fn test_setters() {
        let args = BuildArgs::default()
            .name("svc")
            .level(Severity::Info)
            .alias("-db", ["Db.Pool", "Db.Query"])
            .category_level("-db", Severity::Trace)
            .file(false)
            .dump(true);
        assert_eq!(args.name.as_deref(), Some("svc"));
        assert_eq!(args.category_alias["-db"].len(), 2);
        assert_eq!(args.file, Some(ArgValue::Bool(false)));
        assert_eq!(args.dump, Some(true));
    }
}

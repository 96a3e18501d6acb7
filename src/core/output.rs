// loganyapp - core/output.rs
//
// Output Specification Builder. Turns one loosely-typed caller argument for
// an output kind into zero or more fully-resolved `OutputSpec`s, layering:
//
//   built-in defaults -> resolved level -> explicit record fields -> pattern
//
// Record fields are validated into a typed per-kind options value first, so
// every field name is matched exhaustively against that kind's field table.

use crate::core::context::ResolutionContext;
use crate::core::model::{
    is_truthy_str, normalize_category, ArgValue, OutputKind, OutputSpec, OutputType, Severity,
    Style, ROOT_CATEGORY,
};
use crate::core::resolver;
use crate::util::constants;
use crate::util::error::{OptionError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Fields accepted by every output kind.
const COMMON_FIELDS: &[&str] = &[
    "level",
    "category",
    "category_level",
    "pattern",
    "pattern_style",
];

const SCREEN_FIELDS: &[&str] = &["color", "stderr"];
const FILE_FIELDS: &[&str] = &["path", "max_size", "max_age", "histories"];
const DIR_FIELDS: &[&str] = &["path", "max_size", "max_age", "histories"];
const SYSLOG_FIELDS: &[&str] = &["ident", "facility"];

fn kind_fields(output: OutputType) -> &'static [&'static str] {
    match output {
        OutputType::Screen => SCREEN_FIELDS,
        OutputType::File => FILE_FIELDS,
        OutputType::Dir => DIR_FIELDS,
        OutputType::Syslog => SYSLOG_FIELDS,
    }
}

/// Every field name valid for `output`, common fields first.
pub fn allowed_fields(output: OutputType) -> Vec<&'static str> {
    COMMON_FIELDS
        .iter()
        .chain(kind_fields(output))
        .copied()
        .collect()
}

// =============================================================================
// Running state
// =============================================================================

/// State shared by all `build` calls of one configuration build: the
/// context, already-resolved globals, and per-kind ordinals for naming.
#[derive(Debug)]
pub struct Running<'a> {
    pub ctx: &'a ResolutionContext,
    pub program_name: String,
    pub global_level: Severity,
    /// Whether syslog is on when the caller says nothing about it.
    pub daemon: bool,
    ordinals: BTreeMap<OutputType, usize>,
}

impl<'a> Running<'a> {
    pub fn new(
        ctx: &'a ResolutionContext,
        program_name: impl Into<String>,
        global_level: Severity,
        daemon: bool,
    ) -> Self {
        Self {
            ctx,
            program_name: program_name.into(),
            global_level,
            daemon,
            ordinals: BTreeMap::new(),
        }
    }

    fn next_name(&mut self, output: OutputType) -> String {
        let ordinal = self.ordinals.entry(output).or_insert(0);
        let name = format!("{}{}", output.name_prefix(), ordinal);
        *ordinal += 1;
        name
    }

    fn enabled_by_default(&self, output: OutputType) -> bool {
        match output {
            OutputType::Screen => true,
            OutputType::File => !self.ctx.is_one_liner(),
            OutputType::Dir => false,
            OutputType::Syslog => self.daemon,
        }
    }
}

// =============================================================================
// Typed options
// =============================================================================

#[derive(Debug, Default)]
struct CommonOptions {
    level: Option<Severity>,
    category: Option<String>,
    category_level: BTreeMap<String, Severity>,
    pattern: Option<String>,
    pattern_style: Option<String>,
}

#[derive(Debug)]
enum KindOptions {
    Screen {
        color: Option<bool>,
        stderr: Option<bool>,
    },
    File {
        path: Option<String>,
        max_size: Option<u64>,
        max_age: Option<u64>,
        histories: Option<u64>,
    },
    Dir {
        path: Option<String>,
        max_size: Option<u64>,
        max_age: Option<u64>,
        histories: Option<u64>,
    },
    Syslog {
        ident: Option<String>,
        facility: Option<String>,
    },
}

impl KindOptions {
    fn empty(output: OutputType) -> Self {
        match output {
            OutputType::Screen => KindOptions::Screen {
                color: None,
                stderr: None,
            },
            OutputType::File => KindOptions::File {
                path: None,
                max_size: None,
                max_age: None,
                histories: None,
            },
            OutputType::Dir => KindOptions::Dir {
                path: None,
                max_size: None,
                max_age: None,
                histories: None,
            },
            OutputType::Syslog => KindOptions::Syslog {
                ident: None,
                facility: None,
            },
        }
    }
}

/// Validated options for one output, before defaults are applied.
#[derive(Debug)]
struct OutputOptions {
    output: OutputType,
    common: CommonOptions,
    kind: KindOptions,
}

impl OutputOptions {
    fn defaults(output: OutputType) -> Self {
        Self {
            output,
            common: CommonOptions::default(),
            kind: KindOptions::empty(output),
        }
    }

    /// Options for a bare scalar: the path or ident of path-bearing kinds.
    fn from_scalar(output: OutputType, value: &str) -> Result<Self> {
        let mut opts = Self::defaults(output);
        match &mut opts.kind {
            KindOptions::File { path, .. } | KindOptions::Dir { path, .. } => {
                *path = Some(value.to_string());
            }
            KindOptions::Syslog { ident, .. } => *ident = Some(value.to_string()),
            KindOptions::Screen { .. } => {
                return Err(OptionError::InvalidShape {
                    option: output.label().to_string(),
                    reason: format!(
                        "'{value}' is not a boolean and screen output takes no path"
                    ),
                }
                .into());
            }
        }
        Ok(opts)
    }

    fn from_record(output: OutputType, record: &BTreeMap<String, ArgValue>) -> Result<Self> {
        let mut opts = Self::defaults(output);
        let label = output.label();

        for (field, value) in record {
            match field.as_str() {
                "level" => {
                    let raw = string_field(label, field, value)?;
                    let source = format!("{label} output field 'level'");
                    opts.common.level = Some(Severity::parse(&raw, source)?);
                }
                "category" => {
                    opts.common.category = Some(string_field(label, field, value)?);
                }
                "category_level" => {
                    opts.common.category_level =
                        level_map(value, &format!("{label} output category_level"))?;
                }
                "pattern" => opts.common.pattern = Some(string_field(label, field, value)?),
                "pattern_style" => {
                    opts.common.pattern_style = Some(string_field(label, field, value)?);
                }
                other => opts.kind_field(other, value)?,
            }
        }
        Ok(opts)
    }

    fn kind_field(&mut self, field: &str, value: &ArgValue) -> Result<()> {
        let label = self.output.label();
        match (&mut self.kind, field) {
            (KindOptions::Screen { color, .. }, "color") => {
                *color = Some(bool_field(label, field, value)?);
            }
            (KindOptions::Screen { stderr, .. }, "stderr") => {
                *stderr = Some(bool_field(label, field, value)?);
            }
            (KindOptions::File { path, .. }, "path") | (KindOptions::Dir { path, .. }, "path") => {
                *path = Some(string_field(label, field, value)?);
            }
            (KindOptions::File { max_size, .. }, "max_size")
            | (KindOptions::Dir { max_size, .. }, "max_size") => {
                *max_size = Some(u64_field(label, field, value)?);
            }
            (KindOptions::File { max_age, .. }, "max_age")
            | (KindOptions::Dir { max_age, .. }, "max_age") => {
                *max_age = Some(u64_field(label, field, value)?);
            }
            (KindOptions::File { histories, .. }, "histories")
            | (KindOptions::Dir { histories, .. }, "histories") => {
                *histories = Some(u64_field(label, field, value)?);
            }
            (KindOptions::Syslog { ident, .. }, "ident") => {
                *ident = Some(string_field(label, field, value)?);
            }
            (KindOptions::Syslog { facility, .. }, "facility") => {
                *facility = Some(string_field(label, field, value)?);
            }
            _ => {
                return Err(OptionError::UnknownField {
                    output: label,
                    field: field.to_string(),
                    allowed: allowed_fields(self.output),
                }
                .into());
            }
        }
        Ok(())
    }
}

fn string_field(output: &'static str, field: &str, value: &ArgValue) -> Result<String> {
    match value {
        ArgValue::Str(s) => Ok(s.clone()),
        ArgValue::Int(i) => Ok(i.to_string()),
        _ => Err(OptionError::InvalidField {
            output,
            field: field.to_string(),
            expected: "a string",
        }
        .into()),
    }
}

fn bool_field(output: &'static str, field: &str, value: &ArgValue) -> Result<bool> {
    match value {
        ArgValue::Bool(_) | ArgValue::Int(_) | ArgValue::Str(_) => Ok(value.is_truthy()),
        _ => Err(OptionError::InvalidField {
            output,
            field: field.to_string(),
            expected: "a boolean",
        }
        .into()),
    }
}

fn u64_field(output: &'static str, field: &str, value: &ArgValue) -> Result<u64> {
    let parsed = match value {
        ArgValue::Int(i) => u64::try_from(*i).ok(),
        ArgValue::Str(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        OptionError::InvalidField {
            output,
            field: field.to_string(),
            expected: "a non-negative integer",
        }
        .into()
    })
}

/// Parse a category-to-level record. Keys are kept as written (they may be
/// aliases); values are validated.
pub fn level_map(value: &ArgValue, what: &str) -> Result<BTreeMap<String, Severity>> {
    let ArgValue::Map(entries) = value else {
        return Err(OptionError::InvalidShape {
            option: what.to_string(),
            reason: format!("expected a record of category to level, got {}", value.shape()),
        }
        .into());
    };
    let mut out = BTreeMap::new();
    for (category, level) in entries {
        let source = format!("{what} key '{category}'");
        let raw = level.as_scalar().ok_or_else(|| OptionError::InvalidShape {
            option: source.clone(),
            reason: format!("expected a level name, got {}", level.shape()),
        })?;
        out.insert(category.clone(), Severity::parse(&raw, source)?);
    }
    Ok(out)
}

// =============================================================================
// Building
// =============================================================================

/// Build the outputs of one kind from the caller's argument.
///
/// `None` means the caller said nothing about this kind, so the kind's
/// default enablement applies.
pub fn build(
    output: OutputType,
    user_arg: Option<&ArgValue>,
    running: &mut Running<'_>,
) -> Result<Vec<OutputSpec>> {
    let Some(arg) = user_arg else {
        if running.enabled_by_default(output) {
            return Ok(vec![build_one(OutputOptions::defaults(output), running)?]);
        }
        tracing::debug!(output = output.label(), "Output disabled by default");
        return Ok(Vec::new());
    };

    match arg {
        ArgValue::List(items) => {
            let mut specs = Vec::with_capacity(items.len());
            for item in items {
                if matches!(item, ArgValue::List(_)) {
                    return Err(OptionError::InvalidShape {
                        option: output.label().to_string(),
                        reason: "lists of outputs cannot be nested".to_string(),
                    }
                    .into());
                }
                specs.extend(build_element(output, item, running)?);
            }
            Ok(specs)
        }
        single => build_element(output, single, running),
    }
}

fn build_element(
    output: OutputType,
    arg: &ArgValue,
    running: &mut Running<'_>,
) -> Result<Vec<OutputSpec>> {
    let opts = match arg {
        ArgValue::Bool(false) | ArgValue::Int(0) => return Ok(Vec::new()),
        ArgValue::Bool(true) | ArgValue::Int(_) => OutputOptions::defaults(output),
        ArgValue::Str(s) if !is_truthy_str(s) => return Ok(Vec::new()),
        ArgValue::Str(s)
            if constants::TRUTHY_ENABLE_STRINGS.contains(&s.trim().to_ascii_lowercase().as_str()) =>
        {
            OutputOptions::defaults(output)
        }
        ArgValue::Str(s) => OutputOptions::from_scalar(output, s)?,
        ArgValue::Map(record) => OutputOptions::from_record(output, record)?,
        ArgValue::List(_) => {
            return Err(OptionError::InvalidShape {
                option: output.label().to_string(),
                reason: "expected a boolean, scalar, or record".to_string(),
            }
            .into());
        }
    };
    Ok(vec![build_one(opts, running)?])
}

fn build_one(opts: OutputOptions, running: &mut Running<'_>) -> Result<OutputSpec> {
    let output = opts.output;
    let ctx = running.ctx;

    let level = match opts.common.level {
        Some(level) => level,
        None => resolver::resolve(ctx, output.label())?
            .map(|r| r.level)
            .unwrap_or(running.global_level),
    };

    let explicit_pattern = opts.common.pattern.filter(|p| !p.is_empty());
    let pattern = match (explicit_pattern, opts.common.pattern_style) {
        (Some(pattern), _) => pattern,
        (None, Some(style)) => Style::from_name(&style)
            .ok_or_else(|| OptionError::UnknownStyle {
                style,
                allowed: Style::names(),
            })?
            .pattern()
            .to_string(),
        (None, None) => output.default_style().pattern().to_string(),
    };

    let kind = match opts.kind {
        KindOptions::Screen { color, stderr } => OutputKind::Screen {
            color: color.unwrap_or_else(|| screen_color_default(ctx)),
            stderr: stderr.unwrap_or(true),
        },
        KindOptions::File {
            path,
            max_size,
            max_age,
            histories,
        } => OutputKind::File {
            path: file_path(path.as_deref(), ctx, &running.program_name),
            max_size: max_size.unwrap_or(0),
            max_age: max_age.unwrap_or(0),
            histories: histories.unwrap_or(0),
        },
        KindOptions::Dir {
            path,
            max_size,
            max_age,
            histories,
        } => OutputKind::Dir {
            path: dir_path(path.as_deref(), ctx, &running.program_name),
            max_size: max_size.unwrap_or(0),
            max_age: max_age.unwrap_or(0),
            histories: histories.unwrap_or(constants::DEFAULT_DIR_HISTORIES),
        },
        KindOptions::Syslog { ident, facility } => {
            let facility = facility
                .unwrap_or_else(|| constants::DEFAULT_SYSLOG_FACILITY.to_string())
                .to_ascii_lowercase();
            if !constants::SYSLOG_FACILITIES.contains(&facility.as_str()) {
                return Err(OptionError::UnknownFacility {
                    facility,
                    allowed: constants::SYSLOG_FACILITIES,
                }
                .into());
            }
            OutputKind::Syslog {
                ident: ident.unwrap_or_else(|| running.program_name.clone()),
                facility,
            }
        }
    };

    let spec = OutputSpec {
        name: running.next_name(output),
        kind,
        level,
        category: normalize_category(opts.common.category.as_deref().unwrap_or(ROOT_CATEGORY)),
        category_level: opts.common.category_level,
        pattern,
    };
    tracing::debug!(
        output = %spec.name,
        level = %spec.level,
        category = %spec.category,
        "Output built"
    );
    Ok(spec)
}

/// `COLOR` forces colour on or off; otherwise follow the terminal.
fn screen_color_default(ctx: &ResolutionContext) -> bool {
    match ctx.env(constants::ENV_COLOR) {
        Some(value) => is_truthy_str(value),
        None => ctx.terminal_colors(),
    }
}

/// Expand a leading `~` to the home directory.
fn expand_home(path: &str, ctx: &ResolutionContext) -> PathBuf {
    match (path.strip_prefix('~'), ctx.home()) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with(['/', MAIN_SEPARATOR]) => {
            home.join(rest.trim_start_matches(['/', MAIN_SEPARATOR]))
        }
        _ => PathBuf::from(path),
    }
}

fn home_or_cwd(ctx: &ResolutionContext) -> PathBuf {
    ctx.home()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn log_file_name(program_name: &str) -> String {
    format!("{program_name}.{}", constants::LOG_FILE_EXTENSION)
}

/// Resolve a file output path. A supplied path ending in a separator names a
/// directory and gets `<name>.log` appended.
fn file_path(supplied: Option<&str>, ctx: &ResolutionContext, program_name: &str) -> PathBuf {
    match supplied {
        Some(path) if path.ends_with('/') || path.ends_with(MAIN_SEPARATOR) => {
            expand_home(path, ctx).join(log_file_name(program_name))
        }
        Some(path) => expand_home(path, ctx),
        None if ctx.is_root() => {
            PathBuf::from(constants::SYSTEM_LOG_DIR).join(log_file_name(program_name))
        }
        None => home_or_cwd(ctx).join(log_file_name(program_name)),
    }
}

fn dir_path(supplied: Option<&str>, ctx: &ResolutionContext, program_name: &str) -> PathBuf {
    match supplied {
        Some(path) => expand_home(path, ctx),
        None if ctx.is_root() => PathBuf::from(constants::SYSTEM_LOG_DIR).join(program_name),
        None => home_or_cwd(ctx)
            .join(constants::USER_LOG_SUBDIR)
            .join(program_name),
    }
}

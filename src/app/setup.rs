// loganyapp - app/setup.rs
//
// Configuration build orchestration. One build runs, in order:
//
//   1. program name and global level
//   2. output specs for screen, file, dir, syslog
//   3. category/level matrix
//   4. backend configuration
//   5. debug dump (if enabled)
//   6. output directories
//   7. backend activation (if enabled)
//
// Any error aborts before step 7, so nothing is half-activated.
// `Initializer` makes activation happen at most once per process.

use crate::backend::{Backend, TracingBackend};
use crate::core::alias::AliasTable;
use crate::core::args::BuildArgs;
use crate::core::context::ResolutionContext;
use crate::core::daemon::{DaemonDetector, MarkerTableDetector};
use crate::core::emit::{emit, BackendConfig};
use crate::core::matrix::{compile, Matrix};
use crate::core::model::{is_truthy_str, ArgValue, OutputSpec, OutputType, Severity};
use crate::core::output::{self, Running};
use crate::core::resolver;
use crate::platform::fs;
use crate::util::constants;
use crate::util::error::{LogAnyAppError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

/// The fully-resolved configuration of one build.
#[derive(Debug, Clone, Serialize)]
pub struct Setup {
    pub name: String,
    pub level: Severity,
    /// Where the global level came from.
    pub level_source: String,
    pub daemon: bool,
    pub dump: bool,
    pub init: bool,
    pub category_alias: AliasTable,
    pub category_level: BTreeMap<String, Severity>,
    pub outputs: Vec<OutputSpec>,
    pub matrix: Matrix,
}

/// A finished build: the resolved setup and the backend configuration
/// generated from it.
#[derive(Debug, Clone)]
pub struct Built {
    pub setup: Setup,
    pub config: BackendConfig,
}

impl Built {
    /// Write the resolved setup as pretty JSON followed by the backend
    /// configuration text.
    pub fn write_dump<W: Write>(&self, out: &mut W) -> Result<()> {
        let text = self.config.to_text()?;
        let json = serde_json::to_string_pretty(&self.setup)
            .map_err(|e| LogAnyAppError::Dump { source: e.into() })?;
        let write = |out: &mut W| -> std::io::Result<()> {
            writeln!(out, "# {} resolved setup", constants::APP_NAME)?;
            writeln!(out, "{json}")?;
            writeln!(out, "# {} backend configuration", constants::APP_NAME)?;
            write!(out, "{text}")?;
            out.flush()
        };
        write(out).map_err(|source| LogAnyAppError::Dump { source })
    }
}

/// Resolve the complete configuration without side effects.
pub fn build(
    args: &BuildArgs,
    ctx: &ResolutionContext,
    detector: &dyn DaemonDetector,
) -> Result<Built> {
    let name = args
        .name
        .clone()
        .or_else(|| ctx.program_name())
        .unwrap_or_else(|| constants::FALLBACK_PROGRAM_NAME.to_string());

    let (level, level_source) = match args.level {
        Some(level) => (level, "option 'level'".to_string()),
        None => match resolver::resolve(ctx, "")? {
            Some(resolved) => (resolved.level, resolved.source),
            None => (
                Severity::parse(constants::DEFAULT_LEVEL, "default level")?,
                "default".to_string(),
            ),
        },
    };

    let daemon = match args.daemon {
        Some(daemon) => daemon,
        None => detector.is_daemon(ctx),
    };
    let dump = match args.dump {
        Some(dump) => dump,
        None => ctx.env(constants::ENV_DUMP).is_some_and(is_truthy_str),
    };

    let mut running = Running::new(ctx, name.clone(), level, daemon);
    let mut outputs = Vec::new();
    for kind in OutputType::all() {
        outputs.extend(output::build(*kind, output_arg(args, *kind), &mut running)?);
    }

    let matrix = compile(&outputs, &args.category_level, &args.category_alias);
    let config = emit(&matrix, &outputs)?;

    tracing::info!(
        name = %name,
        level = %level,
        source = %level_source,
        outputs = outputs.len(),
        categories = matrix.categories.len(),
        "Logging configuration built"
    );

    Ok(Built {
        setup: Setup {
            name,
            level,
            level_source,
            daemon,
            dump,
            init: args.init,
            category_alias: args.category_alias.clone(),
            category_level: args.category_level.clone(),
            outputs,
            matrix,
        },
        config,
    })
}

fn output_arg(args: &BuildArgs, kind: OutputType) -> Option<&ArgValue> {
    match kind {
        OutputType::Screen => args.screen.as_ref(),
        OutputType::File => args.file.as_ref(),
        OutputType::Dir => args.dir.as_ref(),
        OutputType::Syslog => args.syslog.as_ref(),
    }
}

// =============================================================================
// Once-per-process initialisation
// =============================================================================

/// What an initialisation call did.
#[derive(Debug)]
pub enum InitOutcome {
    /// Built and handed to the backend.
    Activated(Box<Built>),
    /// Built only; the `init` option was off.
    BuiltOnly(Box<Built>),
    /// A previous call already activated a configuration. Nothing was done.
    AlreadyInitialized,
}

/// Guards backend activation so it happens at most once.
#[derive(Debug)]
pub struct Initializer {
    activated: AtomicBool,
}

impl Default for Initializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Initializer {
    pub const fn new() -> Self {
        Self {
            activated: AtomicBool::new(false),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.activated.load(Ordering::Acquire)
    }

    /// Build and, if `args.init` is set, activate.
    ///
    /// A build that stops with `init` off does not claim the guard. A
    /// failed build or activation releases it again, so the caller can fix
    /// the input and retry.
    pub fn run<B, W>(
        &self,
        args: &BuildArgs,
        ctx: &ResolutionContext,
        detector: &dyn DaemonDetector,
        backend: &B,
        dump_out: &mut W,
    ) -> Result<InitOutcome>
    where
        B: Backend + ?Sized,
        W: Write,
    {
        if !args.init {
            let built = build(args, ctx, detector)?;
            if built.setup.dump {
                built.write_dump(dump_out)?;
            }
            return Ok(InitOutcome::BuiltOnly(Box::new(built)));
        }

        if self
            .activated
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Logging already initialised; ignoring");
            return Ok(InitOutcome::AlreadyInitialized);
        }

        match Self::build_and_activate(args, ctx, detector, backend, dump_out) {
            Ok(built) => Ok(InitOutcome::Activated(Box::new(built))),
            Err(e) => {
                self.activated.store(false, Ordering::Release);
                Err(e)
            }
        }
    }

    fn build_and_activate<B, W>(
        args: &BuildArgs,
        ctx: &ResolutionContext,
        detector: &dyn DaemonDetector,
        backend: &B,
        dump_out: &mut W,
    ) -> Result<Built>
    where
        B: Backend + ?Sized,
        W: Write,
    {
        let built = build(args, ctx, detector)?;
        if built.setup.dump {
            built.write_dump(dump_out)?;
        }
        fs::prepare_output_dirs(&built.setup.outputs)?;
        backend.activate(&built.config)?;
        Ok(built)
    }
}

static GLOBAL: Initializer = Initializer::new();

/// Build from the real process and install the result as the global
/// `tracing` subscriber. Later calls return `AlreadyInitialized`.
pub fn init(args: &BuildArgs) -> Result<InitOutcome> {
    init_with_context(args, &ResolutionContext::from_process())
}

/// As `init`, with a caller-supplied context.
pub fn init_with_context(args: &BuildArgs, ctx: &ResolutionContext) -> Result<InitOutcome> {
    GLOBAL.run(
        args,
        ctx,
        &MarkerTableDetector::default(),
        &TracingBackend,
        &mut std::io::stderr(),
    )
}

/// Whether `init` has activated a configuration in this process.
pub fn is_initialized() -> bool {
    GLOBAL.is_initialized()
}

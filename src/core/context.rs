// loganyapp - core/context.rs
//
// Immutable snapshot of everything the resolver may consult: argument
// vector, environment, process-global variables, an external option
// registry, and process identity facts.
//
// Built once at the start of a configuration build and passed by reference
// to every stage. Nothing in core reads ambient process state directly;
// `platform::process::capture` is the one place that does.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Read-only inputs to a configuration build.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    program: Option<String>,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    globals: BTreeMap<String, String>,
    options: BTreeMap<String, String>,
    is_root: bool,
    is_one_liner: bool,
    home: Option<PathBuf>,
    terminal_colors: bool,
    loaded_modules: BTreeSet<String>,
}

impl ResolutionContext {
    /// An empty context: no arguments, no environment, not root, no home.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the program path (argv[0]).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// Set the argument vector, excluding the program path.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the environment snapshot.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Replace the process-global variable namespace.
    ///
    /// Names may use TitleCase (`Log_Level`), UPPER_CASE or lower_case. They
    /// are folded into one canonical table here so lookups never probe
    /// variants. When several casings of one name are given, TitleCase wins
    /// over UPPER_CASE, which wins over lower_case.
    pub fn with_globals<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut ranked: BTreeMap<String, (u8, String)> = BTreeMap::new();
        for (name, value) in vars {
            let name = name.into();
            let rank = casing_rank(&name);
            let canonical = name.to_ascii_lowercase();
            match ranked.get(&canonical) {
                Some((existing, _)) if *existing <= rank => {}
                _ => {
                    ranked.insert(canonical, (rank, value.into()));
                }
            }
        }
        self.globals = ranked.into_iter().map(|(k, (_, v))| (k, v)).collect();
        self
    }

    /// Replace the external option registry (e.g. parsed options of a
    /// downstream argument framework), keyed like `log_level` or
    /// `file_debug`.
    pub fn with_options<I, K, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.options = options
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn with_root(mut self, is_root: bool) -> Self {
        self.is_root = is_root;
        self
    }

    /// Mark the invocation as a one-liner with no script file.
    pub fn with_one_liner(mut self, is_one_liner: bool) -> Self {
        self.is_one_liner = is_one_liner;
        self
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Whether the diagnostic terminal supports colour.
    pub fn with_terminal_colors(mut self, supported: bool) -> Self {
        self.terminal_colors = supported;
        self
    }

    /// Names of components loaded in the host process, consulted by daemon
    /// detection.
    pub fn with_loaded_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.loaded_modules = modules.into_iter().map(Into::into).collect();
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn program(&self) -> Option<&str> {
        self.program.as_deref()
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn env(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    /// Look up a process-global by canonical (lower-case) name.
    pub fn global(&self, canonical: &str) -> Option<&str> {
        self.globals.get(canonical).map(String::as_str)
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn is_one_liner(&self) -> bool {
        self.is_one_liner
    }

    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    pub fn terminal_colors(&self) -> bool {
        self.terminal_colors
    }

    pub fn loaded_modules(&self) -> &BTreeSet<String> {
        &self.loaded_modules
    }

    /// Program name for default paths and the syslog ident: the file stem
    /// of argv[0], if any.
    pub fn program_name(&self) -> Option<String> {
        let program = self.program.as_deref()?;
        Path::new(program)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
    }
}

/// 0 = TitleCase, 1 = UPPER_CASE, 2 = lower_case, 3 = anything else.
fn casing_rank(name: &str) -> u8 {
    let has_alpha = name.chars().any(|c| c.is_ascii_alphabetic());
    if !has_alpha {
        return 3;
    }
    let is_title = name.split('_').filter(|seg| !seg.is_empty()).all(|seg| {
        let mut chars = seg.chars();
        chars.next().is_some_and(|c| c.is_ascii_uppercase())
            && chars.all(|c| !c.is_ascii_uppercase())
    });
    if is_title && name.chars().any(|c| c.is_ascii_lowercase()) {
        0
    } else if !name.chars().any(|c| c.is_ascii_lowercase()) {
        1
    } else if !name.chars().any(|c| c.is_ascii_uppercase()) {
        2
    } else {
        3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_casing_rank() {
        assert_eq!(casing_rank("Log_Level"), 0);
        assert_eq!(casing_rank("Debug"), 0);
        assert_eq!(casing_rank("LOG_LEVEL"), 1);
        assert_eq!(casing_rank("DEBUG"), 1);
        assert_eq!(casing_rank("log_level"), 2);
        assert_eq!(casing_rank("lOG_level"), 3);
    }

    #[test]
    fn test_globals_are_canonicalised() {
        let ctx = ResolutionContext::new().with_globals([("File_Log_Level", "debug")]);
        assert_eq!(ctx.global("file_log_level"), Some("debug"));
        assert_eq!(ctx.global("File_Log_Level"), None);
    }

    #[test]
    fn test_title_case_global_wins() {
        let ctx = ResolutionContext::new().with_globals([
            ("log_level", "trace"),
            ("LOG_LEVEL", "info"),
            ("Log_Level", "error"),
        ]);
        assert_eq!(ctx.global("log_level"), Some("error"));

        let ctx = ResolutionContext::new().with_globals([("debug", "1"), ("DEBUG", "0")]);
        assert_eq!(ctx.global("debug"), Some("0"));
    }

    #[test]
    fn test_program_name_is_file_stem() {
        let ctx = ResolutionContext::new().with_program("/usr/local/bin/myapp.exe");
        assert_eq!(ctx.program_name().as_deref(), Some("myapp"));
        assert_eq!(ResolutionContext::new().program_name(), None);
    }
}

use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::vpath::VpathTable;

/// Object-file suffix appended to default targets.
pub const OBJECT_SUFFIX: &str = ".o";

/// The module a build step provides, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleTarget {
    /// Module name as written in the source.
    pub name: String,
    /// Compiled-module-interface file name.
    pub cmi: String,
    /// Header units have no order-only CMI rule.
    pub is_header_unit: bool,
}

/// Ordered registry of what one build step produced and read.
///
/// Every container is append-only and keeps insertion order; the ledger is
/// recreated (or [`clear`](Self::clear)ed) for each build invocation.
///
/// Targets are split by a low-water mark: indices `[0, quote_lwm)` hold the
/// targets that must not be Make-quoted, everything after is quoted.
#[derive(Clone, Debug, Default)]
pub struct DependencyLedger {
    targets: Vec<String>,
    deps: Vec<String>,
    vpath: VpathTable,
    modules: Vec<String>,
    module_target: Option<ModuleTarget>,
    quote_lwm: usize,
}

impl DependencyLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------
    // Targets
    // ---------------------------------------------------------------

    /// Record an output name.
    ///
    /// `quote` marks the name for Make quoting. Unquoted names may arrive
    /// after quoted ones; the lowest quoted entry is then moved to the back
    /// so the unquoted entries stay contiguous at the front.
    pub fn add_target(&mut self, name: &str, quote: bool) {
        let mut target = self.vpath.apply(name).to_string();

        if !quote {
            if self.quote_lwm != self.targets.len() {
                std::mem::swap(&mut self.targets[self.quote_lwm], &mut target);
            }
            self.quote_lwm += 1;
        }

        self.targets.push(target);
    }

    /// Derive a target from an input name when none has been given.
    ///
    /// The directory and extension are dropped and [`OBJECT_SUFFIX`]
    /// appended. An empty name means standard input and yields `-`.
    pub fn add_default_target(&mut self, name: &str) {
        if !self.targets.is_empty() {
            return;
        }

        if name.is_empty() {
            self.targets.push("-".to_string());
            return;
        }

        let base = basename(name);
        let stem = base.rfind('.').map_or(base, |dot| &base[..dot]);
        self.add_target(&format!("{stem}{OBJECT_SUFFIX}"), true);
    }

    /// All targets in output order.
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Number of leading targets exempt from quoting.
    pub fn quote_lwm(&self) -> usize {
        self.quote_lwm
    }

    /// Returns `true` if the target at `index` is written Make-quoted.
    pub fn is_target_quoted(&self, index: usize) -> bool {
        index >= self.quote_lwm
    }

    // ---------------------------------------------------------------
    // Dependencies
    // ---------------------------------------------------------------

    /// Record a dependency path, rewritten through the vpath table.
    pub fn add_dependency(&mut self, path: &str) -> LedgerResult<()> {
        if path.is_empty() {
            return Err(LedgerError::EmptyPath);
        }

        let dep = self.vpath.apply(path);
        debug!(path, recorded = dep, "dependency recorded");
        self.deps.push(dep.to_string());
        Ok(())
    }

    /// All dependencies in discovery order.
    pub fn dependencies(&self) -> &[String] {
        &self.deps
    }

    /// The first dependency, normally the main source file.
    pub fn primary_input(&self) -> Option<&str> {
        self.deps.first().map(String::as_str)
    }

    // ---------------------------------------------------------------
    // Vpath
    // ---------------------------------------------------------------

    /// Register a `:`-separated list of vpath prefixes.
    ///
    /// Rules only affect names recorded after this call.
    pub fn add_vpath(&mut self, spec: &str) {
        self.vpath.add_spec(spec);
    }

    /// The vpath table.
    pub fn vpath(&self) -> &VpathTable {
        &self.vpath
    }

    // ---------------------------------------------------------------
    // Modules
    // ---------------------------------------------------------------

    /// Record the module this step provides. There can only be one.
    pub fn add_module_target(
        &mut self,
        name: &str,
        cmi: &str,
        is_header_unit: bool,
    ) -> LedgerResult<()> {
        if let Some(existing) = &self.module_target {
            return Err(LedgerError::ModuleTargetAlreadySet {
                existing: existing.name.clone(),
            });
        }

        self.module_target = Some(ModuleTarget {
            name: name.to_string(),
            cmi: cmi.to_string(),
            is_header_unit,
        });
        Ok(())
    }

    /// Record an imported module.
    pub fn add_module_dep(&mut self, name: &str) {
        self.modules.push(name.to_string());
    }

    /// The provided module, if any.
    pub fn module_target(&self) -> Option<&ModuleTarget> {
        self.module_target.as_ref()
    }

    /// Imported modules in import order.
    pub fn module_deps(&self) -> &[String] {
        &self.modules
    }

    /// Reset the ledger for a new build invocation.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The final path component, split at any host directory separator.
fn basename(name: &str) -> &str {
    name.rsplit(|c: char| c == '/' || (cfg!(windows) && c == '\\'))
        .next()
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_keep_insertion_order() {
        let mut ledger = DependencyLedger::new();
        ledger.add_target("a.o", true);
        ledger.add_target("b.o", true);
        assert_eq!(ledger.targets(), &["a.o", "b.o"]);
        assert_eq!(ledger.quote_lwm(), 0);
    }

    #[test]
    fn unquoted_after_quoted_swaps_to_front() {
        let mut ledger = DependencyLedger::new();
        ledger.add_target("q1.o", true);
        ledger.add_target("q2.o", true);
        ledger.add_target("u1.o", false);
        assert_eq!(ledger.targets(), &["u1.o", "q2.o", "q1.o"]);
        assert_eq!(ledger.quote_lwm(), 1);
        assert!(!ledger.is_target_quoted(0));
        assert!(ledger.is_target_quoted(1));
        assert!(ledger.is_target_quoted(2));
    }

    #[test]
    fn unquoted_prefix_stays_contiguous() {
        let mut ledger = DependencyLedger::new();
        ledger.add_target("u1", false);
        ledger.add_target("q1", true);
        ledger.add_target("u2", false);
        ledger.add_target("q2", true);
        ledger.add_target("u3", false);
        assert_eq!(ledger.quote_lwm(), 3);
        let (unquoted, quoted) = ledger.targets().split_at(ledger.quote_lwm());
        let mut unquoted = unquoted.to_vec();
        unquoted.sort();
        assert_eq!(unquoted, vec!["u1", "u2", "u3"]);
        let mut quoted = quoted.to_vec();
        quoted.sort();
        assert_eq!(quoted, vec!["q1", "q2"]);
    }

    #[test]
    fn default_target_derived_from_input() {
        let mut ledger = DependencyLedger::new();
        ledger.add_default_target("src/dir/main.c");
        assert_eq!(ledger.targets(), &["main.o"]);
        assert!(ledger.is_target_quoted(0));
    }

    #[test]
    fn default_target_without_extension() {
        let mut ledger = DependencyLedger::new();
        ledger.add_default_target("Makefile");
        assert_eq!(ledger.targets(), &["Makefile.o"]);
    }

    #[test]
    fn default_target_keeps_inner_dots() {
        let mut ledger = DependencyLedger::new();
        ledger.add_default_target("lib.v2.cc");
        assert_eq!(ledger.targets(), &["lib.v2.o"]);
    }

    #[test]
    fn default_target_for_stdin() {
        let mut ledger = DependencyLedger::new();
        ledger.add_default_target("");
        assert_eq!(ledger.targets(), &["-"]);
    }

    #[test]
    fn default_target_noop_when_targets_exist() {
        let mut ledger = DependencyLedger::new();
        ledger.add_target("explicit.o", true);
        ledger.add_default_target("main.c");
        assert_eq!(ledger.targets(), &["explicit.o"]);
    }

    #[test]
    fn empty_dependency_is_rejected() {
        let mut ledger = DependencyLedger::new();
        let err = ledger.add_dependency("").unwrap_err();
        assert!(matches!(err, LedgerError::EmptyPath));
        assert!(ledger.dependencies().is_empty());
    }

    #[test]
    fn dependencies_are_rewritten() {
        let mut ledger = DependencyLedger::new();
        ledger.add_vpath("foo/bar");
        ledger.add_dependency("foo/bar/baz.c").unwrap();
        ledger.add_dependency("foo/bar/../x.c").unwrap();
        ledger.add_dependency("./local.h").unwrap();
        assert_eq!(
            ledger.dependencies(),
            &["baz.c", "foo/bar/../x.c", "local.h"]
        );
        assert_eq!(ledger.primary_input(), Some("baz.c"));
    }

    #[test]
    fn targets_are_rewritten() {
        let mut ledger = DependencyLedger::new();
        ledger.add_vpath("out");
        ledger.add_target("out/main.o", true);
        assert_eq!(ledger.targets(), &["main.o"]);
    }

    #[test]
    fn single_module_target() {
        let mut ledger = DependencyLedger::new();
        ledger
            .add_module_target("hello", "gcm.cache/hello.gcm", false)
            .unwrap();
        let err = ledger
            .add_module_target("other", "gcm.cache/other.gcm", false)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::ModuleTargetAlreadySet { ref existing } if existing == "hello"
        ));
        assert_eq!(ledger.module_target().unwrap().cmi, "gcm.cache/hello.gcm");
    }

    #[test]
    fn module_deps_keep_order() {
        let mut ledger = DependencyLedger::new();
        ledger.add_module_dep("b");
        ledger.add_module_dep("a");
        assert_eq!(ledger.module_deps(), &["b", "a"]);
    }

    #[test]
    fn clear_resets_everything() {
        let mut ledger = DependencyLedger::new();
        ledger.add_vpath("src");
        ledger.add_target("t", false);
        ledger.add_dependency("src/a.c").unwrap();
        ledger.add_module_dep("m");
        ledger.clear();
        assert!(ledger.targets().is_empty());
        assert!(ledger.dependencies().is_empty());
        assert!(ledger.vpath().is_empty());
        assert!(ledger.module_deps().is_empty());
        assert_eq!(ledger.quote_lwm(), 0);
    }
}

//! Make dependency rules.
//!
//! Names are escaped for GNU Make: `$` doubles, `#` gains a backslash, and
//! whitespace follows Make's parity rule (a space preceded by 2N+1
//! backslashes is N backslashes plus a space). Not every character can be
//! quoted; `%`, `*`, `?`, `[` and `~` pass through unchanged.

use std::borrow::Cow;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::LedgerResult;
use crate::ledger::DependencyLedger;

/// Nonzero column widths below this are raised to it.
pub const MIN_COLUMN_WIDTH: usize = 34;

/// Suffix naming a module's phony Make target.
pub const MODULE_SUFFIX: &str = ".c++m";

/// Output options for [`MakeWriter`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MakeOptions {
    /// Wrap lines at this column; `0` disables wrapping.
    pub column_width: usize,
    /// Emit an empty rule for every dependency after the first.
    pub phony_targets: bool,
    /// Emit module dependency rules.
    pub modules: bool,
}

impl MakeOptions {
    /// The wrapping column actually used.
    pub fn effective_width(&self) -> usize {
        match self.column_width {
            0 => 0,
            w => w.max(MIN_COLUMN_WIDTH),
        }
    }
}

/// Apply Make quoting to `name` followed by `trail`.
///
/// Each call builds its own buffer.
pub fn munge(name: &str, trail: Option<&str>) -> String {
    let mut buf = String::with_capacity(name.len() + trail.map_or(0, str::len) + 4);

    for segment in std::iter::once(name).chain(trail) {
        let mut slashes = 0usize;
        for c in segment.chars() {
            match c {
                '\\' => slashes += 1,
                '$' => {
                    buf.push('$');
                    slashes = 0;
                }
                ' ' | '\t' => {
                    buf.extend(std::iter::repeat('\\').take(slashes + 1));
                    slashes = 0;
                }
                '#' => {
                    buf.push('\\');
                    slashes = 0;
                }
                _ => slashes = 0,
            }
            buf.push(c);
        }
    }

    buf
}

/// Writes a ledger as Make rules.
pub struct MakeWriter<W: Write> {
    out: W,
    options: MakeOptions,
    colmax: usize,
}

impl<W: Write> MakeWriter<W> {
    /// Create a writer over `out`.
    pub fn new(out: W, options: MakeOptions) -> Self {
        let colmax = options.effective_width();
        Self {
            out,
            options,
            colmax,
        }
    }

    /// Consume the writer, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Write every rule the ledger calls for.
    pub fn write(&mut self, ledger: &DependencyLedger) -> LedgerResult<()> {
        let deps = ledger.dependencies();
        let cmi = ledger.module_target().map(|m| m.cmi.as_str());

        if !deps.is_empty() {
            let mut column = self.write_names(ledger.targets(), 0, ledger.quote_lwm(), None)?;
            if self.options.modules {
                if let Some(cmi) = cmi {
                    column = self.write_name(cmi, column, true, None)?;
                }
            }
            self.out.write_all(b":")?;
            column += 1;
            self.write_names(deps, column, 0, None)?;
            self.out.write_all(b"\n")?;

            if self.options.phony_targets {
                for dep in &deps[1..] {
                    writeln!(self.out, "{}:", munge(dep, None))?;
                }
            }
        }

        if !self.options.modules {
            return Ok(());
        }

        let imports = ledger.module_deps();
        if !imports.is_empty() {
            let mut column = self.write_names(ledger.targets(), 0, ledger.quote_lwm(), None)?;
            if let Some(cmi) = cmi {
                column = self.write_name(cmi, column, true, None)?;
            }
            self.out.write_all(b":")?;
            column += 1;
            self.write_names(imports, column, 0, Some(MODULE_SUFFIX))?;
            self.out.write_all(b"\n")?;
        }

        if let Some(module) = ledger.module_target() {
            // module-name.c++m: cmi-name
            let column = self.write_name(&module.name, 0, true, Some(MODULE_SUFFIX))?;
            self.out.write_all(b":")?;
            self.write_name(&module.cmi, column + 1, true, None)?;
            self.out.write_all(b"\n")?;

            self.out.write_all(b".PHONY:")?;
            self.write_name(&module.name, ".PHONY:".len(), true, Some(MODULE_SUFFIX))?;
            self.out.write_all(b"\n")?;

            if !module.is_header_unit {
                if let Some(first) = ledger.targets().first() {
                    // Order-only: cmi-name :| first-target
                    let column = self.write_name(&module.cmi, 0, true, None)?;
                    self.out.write_all(b":|")?;
                    self.write_name(first, column + 1, true, None)?;
                    self.out.write_all(b"\n")?;
                }
            }
        }

        if !imports.is_empty() {
            self.out.write_all(b"CXX_IMPORTS +=")?;
            self.write_names(imports, "CXX_IMPORTS +=".len(), 0, Some(MODULE_SUFFIX))?;
            self.out.write_all(b"\n")?;
        }

        Ok(())
    }

    /// Write one name with a leading space unless at column 0, wrapping
    /// first if it would overflow. Returns the new column.
    fn write_name(
        &mut self,
        name: &str,
        mut column: usize,
        quote: bool,
        trail: Option<&str>,
    ) -> LedgerResult<usize> {
        let name: Cow<'_, str> = match (quote, trail) {
            (true, _) => Cow::Owned(munge(name, trail)),
            (false, Some(trail)) => Cow::Owned(format!("{name}{trail}")),
            (false, None) => Cow::Borrowed(name),
        };

        if column > 0 {
            if self.colmax > 0 && column + name.len() > self.colmax {
                self.out.write_all(b" \\\n")?;
                column = 0;
            }
            column += 1;
            self.out.write_all(b" ")?;
        }

        column += name.len();
        self.out.write_all(name.as_bytes())?;
        Ok(column)
    }

    /// Write a list of names; those before `quote_lwm` are left unquoted.
    fn write_names(
        &mut self,
        names: &[String],
        mut column: usize,
        quote_lwm: usize,
        trail: Option<&str>,
    ) -> LedgerResult<usize> {
        for (ix, name) in names.iter().enumerate() {
            column = self.write_name(name, column, ix >= quote_lwm, trail)?;
        }
        Ok(column)
    }
}

//! Persisted dependency list.
//!
//! A snapshot lets a later build (for example one reusing a precompiled
//! header) replay the dependencies of an earlier one.
//!
//! On-disk format, native-endian `usize` words:
//! ```text
//! [count]
//! [len][len bytes of path]   × count
//! ```

use std::io::{self, Read, Write};

use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::DependencyLedger;

/// Longest path accepted from a snapshot.
pub const MAX_RECORD_LEN: usize = 1024 * 1024;

const WORD: usize = std::mem::size_of::<usize>();

/// Write the ledger's dependencies.
pub fn save<W: Write>(ledger: &DependencyLedger, mut out: W) -> LedgerResult<()> {
    let deps = ledger.dependencies();
    out.write_all(&deps.len().to_ne_bytes())?;
    for dep in deps {
        out.write_all(&dep.len().to_ne_bytes())?;
        out.write_all(dep.as_bytes())?;
    }
    out.flush()?;
    debug!(count = deps.len(), "dependency snapshot saved");
    Ok(())
}

/// Read a snapshot back into `ledger`.
///
/// With `self_path` set, every recorded path except `self_path` is added as
/// a dependency (through the ledger's vpath rules). With `None`, the records
/// are read and discarded. Returns the number of dependencies added.
pub fn restore<R: Read>(
    ledger: &mut DependencyLedger,
    mut input: R,
    self_path: Option<&str>,
) -> LedgerResult<usize> {
    let count = read_word(&mut input)?;
    let mut added = 0;
    let mut buf = Vec::new();

    for index in 0..count {
        let len = read_word(&mut input)?;
        if len > MAX_RECORD_LEN {
            return Err(LedgerError::CorruptSnapshot(format!(
                "record {index} claims {len} bytes (max {MAX_RECORD_LEN})"
            )));
        }

        buf.resize(len, 0);
        input.read_exact(&mut buf)?;
        let path = std::str::from_utf8(&buf).map_err(|e| {
            LedgerError::CorruptSnapshot(format!("record {index} is not UTF-8: {e}"))
        })?;

        match self_path {
            Some(skip) if path != skip => {
                ledger.add_dependency(path)?;
                added += 1;
            }
            _ => {}
        }
    }

    debug!(count, added, "dependency snapshot restored");
    Ok(added)
}

fn read_word<R: Read>(input: &mut R) -> io::Result<usize> {
    let mut word = [0u8; WORD];
    input.read_exact(&mut word)?;
    Ok(usize::from_ne_bytes(word))
}

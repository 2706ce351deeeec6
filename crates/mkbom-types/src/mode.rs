use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// How far the build step runs.
///
/// The mode decides which artifact, if any, a build step produces and
/// therefore what name its provenance metadata is filed under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompileMode {
    /// Preprocess only (`-E`): no output file.
    PreprocessOnly,
    /// Stop after compilation proper (`-S`): an assembly file.
    AssembleOnly,
    /// Stop after assembling (`-c`): an object file.
    CompileOnly,
    /// Full build through the linker.
    Link,
}

impl CompileMode {
    /// Default executable name produced by the linker.
    pub const LINK_DEFAULT_OUTPUT: &'static str = "a.out";

    /// Suffix substituted for the input's extension when no output is named.
    pub const fn output_suffix(&self) -> Option<&'static str> {
        match self {
            Self::AssembleOnly => Some(".s"),
            Self::CompileOnly => Some(".o"),
            Self::PreprocessOnly | Self::Link => None,
        }
    }

    /// Returns `true` if this mode writes an output artifact.
    pub const fn produces_output(&self) -> bool {
        !matches!(self, Self::PreprocessOnly)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::PreprocessOnly => "preprocess-only",
            Self::AssembleOnly => "assemble-only",
            Self::CompileOnly => "compile-only",
            Self::Link => "link",
        }
    }
}

impl Default for CompileMode {
    fn default() -> Self {
        Self::CompileOnly
    }
}

impl fmt::Display for CompileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompileMode {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preprocess-only" | "preprocess" | "E" => Ok(Self::PreprocessOnly),
            "assemble-only" | "assemble" | "S" => Ok(Self::AssembleOnly),
            "compile-only" | "compile" | "c" => Ok(Self::CompileOnly),
            "link" => Ok(Self::Link),
            _ => Err(TypeError::UnknownCompileMode(s.to_string())),
        }
    }
}

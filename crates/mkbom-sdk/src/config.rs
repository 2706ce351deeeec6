use std::path::{Path, PathBuf};

use mkbom_ledger::MakeOptions;
use mkbom_types::HashAlgorithm;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Settings for a build step's provenance.
///
/// ```toml
/// algorithms = ["sha1", "sha256"]
/// root = "build/bom"
/// vpath = ["src"]
///
/// [make]
/// column_width = 72
/// phony_targets = true
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BomConfig {
    /// Algorithms to record a BOM for. Empty disables BOM output.
    pub algorithms: Vec<HashAlgorithm>,
    /// Store root. Empty means the current directory.
    pub root: PathBuf,
    /// Vpath specs applied to every name the session records.
    pub vpath: Vec<String>,
    /// Make rule output.
    pub make: MakeOptions,
}

impl Default for BomConfig {
    fn default() -> Self {
        Self {
            algorithms: vec![HashAlgorithm::Sha1],
            root: PathBuf::new(),
            vpath: Vec::new(),
            make: MakeOptions::default(),
        }
    }
}

impl BomConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| SdkError::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SdkError::ConfigFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> SdkResult<String> {
        toml::to_string_pretty(self).map_err(|e| SdkError::Config(format!("cannot serialize: {e}")))
    }

    /// Each algorithm may appear once.
    pub fn validate(&self) -> SdkResult<()> {
        for (ix, alg) in self.algorithms.iter().enumerate() {
            if self.algorithms[..ix].contains(alg) {
                return Err(SdkError::Config(format!("algorithm {alg} listed twice")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BomConfig::default();
        assert_eq!(config.algorithms, vec![HashAlgorithm::Sha1]);
        assert!(config.root.as_os_str().is_empty());
        assert_eq!(config.make.column_width, 0);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(BomConfig::from_toml_str("").unwrap(), BomConfig::default());
    }

    #[test]
    fn parses_full_toml() {
        let config = BomConfig::from_toml_str(
            r#"
            algorithms = ["sha1", "sha256"]
            root = "build/bom"
            vpath = ["src:include"]

            [make]
            column_width = 72
            phony_targets = true
            "#,
        )
        .unwrap();
        assert_eq!(
            config.algorithms,
            vec![HashAlgorithm::Sha1, HashAlgorithm::Sha256]
        );
        assert_eq!(config.root, PathBuf::from("build/bom"));
        assert_eq!(config.vpath, vec!["src:include"]);
        assert_eq!(config.make.column_width, 72);
        assert!(config.make.phony_targets);
        assert!(!config.make.modules);
    }

    #[test]
    fn rejects_duplicate_algorithm() {
        let err = BomConfig::from_toml_str(r#"algorithms = ["sha256", "sha256"]"#).unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }

    #[test]
    fn rejects_unknown_algorithm() {
        assert!(BomConfig::from_toml_str(r#"algorithms = ["md5"]"#).is_err());
    }

    #[test]
    fn toml_roundtrip() {
        let config = BomConfig {
            algorithms: vec![HashAlgorithm::Sha256],
            root: PathBuf::from("out"),
            vpath: vec!["gen".into()],
            make: MakeOptions {
                column_width: 40,
                phony_targets: false,
                modules: true,
            },
        };
        let text = config.to_toml().unwrap();
        assert_eq!(BomConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = BomConfig::from_toml_file(tmp.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, SdkError::ConfigFile { .. }));
    }
}

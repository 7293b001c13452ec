//! Configuration file parsing for mutant generation

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::context::MutationBounds;
use crate::error::MutationError;
use crate::frontend::{SourceLocation, SourceMap, SourceRange};
use crate::operators::lookup;

/// Top-level configuration structure
#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub settings: Settings,
    /// Enabled operators; empty enables the whole catalog
    #[serde(default)]
    pub operators: Vec<OperatorConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            settings: Settings::default(),
            operators: Vec::new(),
        }
    }
}

/// Global settings for mutant generation
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Directory receiving the database and the mutant files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Maximum mutants one operator may emit at one node
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Part of the file that may be mutated; the whole file if omitted
    #[serde(default)]
    pub range: Option<RangeConfig>,
    #[serde(default)]
    pub excluded_lines: Vec<usize>,
    #[serde(default = "default_write_mutant_files")]
    pub write_mutant_files: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            limit: default_limit(),
            range: None,
            excluded_lines: Vec::new(),
            write_mutant_files: default_write_mutant_files(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_limit() -> usize {
    usize::MAX
}

fn default_write_mutant_files() -> bool {
    true
}

/// Mutation range given as line/column positions
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RangeConfig {
    pub start: LineColumn,
    /// End of the file if omitted
    #[serde(default)]
    pub end: Option<LineColumn>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct LineColumn {
    pub line: usize,
    /// Start of the line for a range start, end of the line for a range end
    #[serde(default)]
    pub column: Option<usize>,
}

impl LineColumn {
    fn as_start(self) -> SourceLocation {
        SourceLocation::new(self.line, self.column.unwrap_or(1))
    }

    fn as_end(self) -> SourceLocation {
        match self.column {
            Some(column) => SourceLocation::new(self.line, column),
            None => SourceLocation::new(self.line + 1, 1),
        }
    }
}

/// One enabled operator with optional domain and range overrides
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OperatorConfig {
    pub name: String,
    #[serde(default)]
    pub domain: Vec<String>,
    #[serde(default)]
    pub range: Vec<String>,
}

impl OperatorConfig {
    /// Operator with its default domain and range
    pub fn named(name: &str) -> Self {
        Self::new(name, &[], &[])
    }

    pub fn new(name: &str, domain: &[&str], range: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            domain: domain.iter().map(|t| t.to_string()).collect(),
            range: range.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, MutationError> {
        let content = std::fs::read_to_string(path).map_err(|e| MutationError::ConfigError {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| MutationError::ConfigError {
                message: format!("Failed to parse config file '{}': {}", path.display(), e),
            })?;

        Ok(config)
    }

    /// Validate operators, limit and range
    pub fn validate(&self) -> Result<(), Vec<MutationError>> {
        let mut errors = Vec::new();

        for operator in &self.operators {
            let built = lookup(&operator.name)
                .and_then(|def| def.build(&operator.domain, &operator.range));
            if let Err(e) = built {
                errors.push(e);
            }
        }

        if self.settings.limit == 0 {
            errors.push(MutationError::ConfigError {
                message: "limit must be at least 1".to_string(),
            });
        }

        if let Some(range) = &self.settings.range {
            if range.start.line == 0 || range.start.column == Some(0) {
                errors.push(MutationError::ConfigError {
                    message: "range positions are 1-based".to_string(),
                });
            }
            if let Some(end) = range.end {
                if end.as_end() < range.start.as_start() {
                    errors.push(MutationError::ConfigError {
                        message: format!(
                            "range ends at line {} before it starts at line {}",
                            end.line, range.start.line
                        ),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Mutable part of the file described by `map`
    pub fn bounds(&self, map: &SourceMap) -> MutationBounds {
        let whole = map.full_range();
        let range = match &self.settings.range {
            Some(range) => SourceRange::new(
                range.start.as_start().max(whole.start),
                range.end.map_or(whole.end, LineColumn::as_end),
            ),
            None => whole,
        };
        MutationBounds {
            range,
            excluded_lines: self.settings.excluded_lines.iter().copied().collect::<BTreeSet<_>>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
version: "1.0"
settings:
  output_dir: out
  limit: 5
  range:
    start: { line: 3 }
    end: { line: 10, column: 4 }
  excluded_lines: [4, 7]
operators:
  - name: OAAN
    domain: ["+"]
    range: ["-", "*"]
  - name: SSDL
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.settings.limit, 5);
        assert_eq!(config.settings.output_dir, PathBuf::from("out"));
        assert_eq!(config.operators.len(), 2);
        assert_eq!(config.operators[0], OperatorConfig::new("OAAN", &["+"], &["-", "*"]));
        assert!(config.operators[1].domain.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let yaml = r#"
version: "1.0"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.settings.limit, usize::MAX);
        assert!(config.settings.write_mutant_files);
        assert!(config.operators.is_empty());
        assert!(config.settings.range.is_none());
    }

    #[test]
    fn test_validation_collects_errors() {
        let yaml = r#"
version: "1.0"
settings:
  limit: 0
  range:
    start: { line: 9 }
    end: { line: 2 }
operators:
  - name: NOPE
  - name: OBBN
    range: ["+"]
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(matches!(errors[0], MutationError::UnknownOperator { .. }));
        assert!(matches!(errors[1], MutationError::InvalidRange { .. }));
    }

    #[test]
    fn test_operator_names_ignore_case() {
        let yaml = r#"
version: "1.0"
operators:
  - name: oaan
    domain: ["+"]
  - name: Ssdl
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bounds() {
        let map = SourceMap::new("int a;\nint b;\nint c;\n");
        let mut config = Config::default();
        config.settings.range = Some(RangeConfig {
            start: LineColumn { line: 2, column: None },
            end: Some(LineColumn { line: 2, column: None }),
        });
        config.settings.excluded_lines = vec![3];
        let bounds = config.bounds(&map);
        assert_eq!(bounds.range.start, SourceLocation::new(2, 1));
        assert_eq!(bounds.range.end, SourceLocation::new(3, 1));
        assert!(bounds.excluded_lines.contains(&3));
    }
}

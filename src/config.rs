//! TOML-based analysis configuration.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::align::{MissingPolicy, TimeWindow};
use crate::loader::parse_timestamp;
use crate::taxonomy::{FuelCategory, SourceCategoryMap};

/// Top-level analysis configuration parsed from TOML.
///
/// All fields have defaults matching the Nevada 2030 validation study. Load
/// from TOML with [`AnalysisConfig::from_toml_file`] or use
/// [`AnalysisConfig::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Input file locations.
    #[serde(default)]
    pub inputs: InputsConfig,
    /// Generation comparison window.
    #[serde(default)]
    pub window: WindowConfig,
    /// Comparison layout and options.
    #[serde(default)]
    pub comparison: ComparisonConfig,
    /// Raw generator code to category label. Replaces the built-in map
    /// when non-empty.
    #[serde(default)]
    pub fuel_map: IndexMap<String, String>,
    /// Output location and chart options.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Input file locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputsConfig {
    /// Plexos workbook export.
    pub plexos_workbook: PathBuf,
    /// Folder holding the Sienna CSV exports.
    pub sienna_dir: PathBuf,
    /// Generator attribute table (`gen.csv`).
    pub generator_registry: PathBuf,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            plexos_workbook: PathBuf::from("plexos_results.xlsx"),
            sienna_dir: PathBuf::from("run_output/output_test"),
            generator_registry: PathBuf::from("output_test/gen.csv"),
        }
    }
}

/// Inclusive generation comparison window.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub start: String,
    pub end: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start: "2030-01-01T00:00:00".to_string(),
            end: "2030-01-06T00:00:00".to_string(),
        }
    }
}

/// Comparison layout and options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComparisonConfig {
    /// Fuel category order of the generation charts, bottom of stack first.
    pub column_order: Vec<String>,
    /// Load zones compared between the two sources.
    pub load_zones: Vec<String>,
    /// Sienna purchase generators charted as natural gas instead of PV.
    pub purchase_generators: Vec<String>,
    /// Representation of categories one source does not report.
    pub missing_columns: MissingPolicy,
    /// Number of generators listed in the renewable-output check.
    pub top_n: usize,
    /// Generators whose reported costs are checked against the tranche curve.
    pub cost_curve_generators: Vec<String>,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            column_order: FuelCategory::CHART_ORDER
                .iter()
                .map(|c| c.label().to_string())
                .collect(),
            load_zones: vec!["Nevada Power".to_string(), "Sierra".to_string()],
            purchase_generators: vec![
                "Southern Purchases (NVP)".to_string(),
                "Northern Purchases (Sierra)".to_string(),
            ],
            missing_columns: MissingPolicy::Mark,
            top_n: 20,
            cost_curve_generators: Vec::new(),
        }
    }
}

/// Output location and chart options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory receiving charts and report files.
    pub dir: PathBuf,
    /// Whether to render charts.
    pub charts: bool,
    /// Seed of the hashed palette used for transmission lines.
    pub palette_seed: u64,
    /// Chart width in pixels.
    pub width: u32,
    /// Chart height in pixels.
    pub height: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("validation"),
            charts: true,
            palette_seed: 42,
            width: 900,
            height: 900,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"window.start"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl AnalysisConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Parsed generation comparison window.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if either bound is not a timestamp or the
    /// window is empty.
    pub fn window(&self) -> Result<TimeWindow, ConfigError> {
        let parse = |field: &str, raw: &str| {
            parse_timestamp(raw).ok_or_else(|| ConfigError {
                field: format!("window.{field}"),
                message: format!("\"{raw}\" is not a timestamp"),
            })
        };
        let start = parse("start", &self.window.start)?;
        let end = parse("end", &self.window.end)?;
        if start > end {
            return Err(ConfigError {
                field: "window.start".into(),
                message: "must not be after window.end".into(),
            });
        }
        Ok(TimeWindow::new(start, end))
    }

    /// Category map from `[fuel_map]`, or the built-in Plexos map.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first unknown category label.
    pub fn category_map(&self) -> Result<SourceCategoryMap, ConfigError> {
        if self.fuel_map.is_empty() {
            return Ok(SourceCategoryMap::default());
        }
        SourceCategoryMap::from_labels(
            self.fuel_map
                .iter()
                .map(|(code, label)| (code.as_str(), label.as_str())),
        )
        .map_err(|e| ConfigError {
            field: "fuel_map".into(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if let Err(e) = self.window() {
            errors.push(e);
        }
        if let Err(e) = self.category_map() {
            errors.push(e);
        }

        let c = &self.comparison;
        if c.column_order.is_empty() {
            errors.push(ConfigError {
                field: "comparison.column_order".into(),
                message: "must name at least one category".into(),
            });
        }
        for label in &c.column_order {
            if label.parse::<FuelCategory>().is_err() {
                errors.push(ConfigError {
                    field: "comparison.column_order".into(),
                    message: format!("\"{label}\" is not a fuel category"),
                });
            }
        }
        if let Some(dup) = first_duplicate(&c.column_order) {
            errors.push(ConfigError {
                field: "comparison.column_order".into(),
                message: format!("\"{dup}\" is listed more than once"),
            });
        }
        if c.load_zones.is_empty() {
            errors.push(ConfigError {
                field: "comparison.load_zones".into(),
                message: "must name at least one zone".into(),
            });
        }
        if c.top_n == 0 {
            errors.push(ConfigError {
                field: "comparison.top_n".into(),
                message: "must be > 0".into(),
            });
        }

        let o = &self.output;
        if o.width < 200 || o.height < 200 {
            errors.push(ConfigError {
                field: "output.width".into(),
                message: "chart width and height must be >= 200 pixels".into(),
            });
        }

        errors
    }
}

fn first_duplicate(items: &[String]) -> Option<&str> {
    items
        .iter()
        .enumerate()
        .find(|(i, item)| items[..*i].contains(item))
        .map(|(_, item)| item.as_str())
}

//! Per-generator attributes used to derive fuel categories.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::error::{CompareError, Result};

/// Fuel and unit-type attributes of one generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorAttributes {
    pub fuel: Option<String>,
    pub unit_type: Option<String>,
}

impl GeneratorAttributes {
    /// Raw code used for category mapping: the fuel, else the unit type.
    pub fn raw_code(&self) -> Option<&str> {
        self.fuel.as_deref().or(self.unit_type.as_deref())
    }
}

/// Generator attribute table keyed by generator name.
#[derive(Debug, Clone, Default)]
pub struct GeneratorRegistry {
    generators: IndexMap<String, GeneratorAttributes>,
}

impl GeneratorRegistry {
    /// Reads `gen.csv`: the first column names the generator, and the
    /// `fuel` and `unit_type` columns must both be present.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::InputFormat`] for a missing column, a
    /// duplicate generator, or a generator with neither attribute.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| CompareError::io(path, e))?;
        let registry = Self::from_reader(&path.display().to_string(), file)?;
        info!(path = %path.display(), generators = registry.len(), "loaded generator registry");
        Ok(registry)
    }

    pub fn from_reader(origin: &str, reader: impl Read) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
        let headers = rdr.headers()?.clone();
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| CompareError::input(origin, format!("missing column `{name}`")))
        };
        let fuel_col = find("fuel")?;
        let unit_col = find("unit_type")?;

        let mut generators = IndexMap::new();
        for record in rdr.records() {
            let record = record?;
            let name = record.get(0).unwrap_or("").trim().to_string();
            let attr = |c: usize| {
                record
                    .get(c)
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            };
            let attributes = GeneratorAttributes {
                fuel: attr(fuel_col),
                unit_type: attr(unit_col),
            };
            if attributes.raw_code().is_none() {
                return Err(CompareError::input(
                    origin,
                    format!("generator `{name}` has neither `fuel` nor `unit_type`"),
                ));
            }
            if generators.insert(name.clone(), attributes).is_some() {
                return Err(CompareError::input(
                    origin,
                    format!("generator `{name}` is listed more than once"),
                ));
            }
        }

        let registry = Self { generators };
        debug!(codes = ?registry.raw_codes(), "generator fuel codes");
        Ok(registry)
    }

    pub fn get(&self, generator: &str) -> Option<&GeneratorAttributes> {
        self.generators.get(generator)
    }

    /// Raw mapping code for `generator`, or `None` if it is not registered.
    pub fn raw_code(&self, generator: &str) -> Option<&str> {
        self.get(generator).and_then(GeneratorAttributes::raw_code)
    }

    /// Distinct raw codes in first-seen order.
    pub fn raw_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = Vec::new();
        for code in self.generators.values().filter_map(|g| g.raw_code()) {
            if !codes.contains(&code) {
                codes.push(code);
            }
        }
        codes
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl FromIterator<(String, GeneratorAttributes)> for GeneratorRegistry {
    fn from_iter<I: IntoIterator<Item = (String, GeneratorAttributes)>>(iter: I) -> Self {
        Self {
            generators: iter.into_iter().collect(),
        }
    }
}

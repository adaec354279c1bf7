//! Shared fuel taxonomy and the mapping from raw generator codes into it.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{CompareError, Result};

/// Label of the raw storage aggregate that is split into charge/discharge.
pub const STORAGE_AGGREGATE: &str = "Storage";

/// Canonical fuel category used by both result sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelCategory {
    #[serde(rename = "Natural gas")]
    NaturalGas,
    Hydropower,
    Wind,
    Biopower,
    Geothermal,
    #[serde(rename = "PV")]
    Pv,
    #[serde(rename = "Storage_Charge")]
    StorageCharge,
    #[serde(rename = "Storage_Discharge")]
    StorageDischarge,
    Petroleum,
    Other,
    #[serde(rename = "Unserved Energy")]
    UnservedEnergy,
    Curtailment,
    #[serde(rename = "Over Generation")]
    OverGeneration,
}

impl FuelCategory {
    pub const ALL: [FuelCategory; 13] = [
        FuelCategory::NaturalGas,
        FuelCategory::Hydropower,
        FuelCategory::Wind,
        FuelCategory::Biopower,
        FuelCategory::Geothermal,
        FuelCategory::Pv,
        FuelCategory::StorageCharge,
        FuelCategory::StorageDischarge,
        FuelCategory::Petroleum,
        FuelCategory::Other,
        FuelCategory::UnservedEnergy,
        FuelCategory::Curtailment,
        FuelCategory::OverGeneration,
    ];

    /// Column order of the generation-by-fuel comparison charts, bottom of
    /// the stack first.
    pub const CHART_ORDER: [FuelCategory; 12] = [
        FuelCategory::Geothermal,
        FuelCategory::Biopower,
        FuelCategory::Hydropower,
        FuelCategory::Petroleum,
        FuelCategory::Other,
        FuelCategory::NaturalGas,
        FuelCategory::Wind,
        FuelCategory::Pv,
        FuelCategory::UnservedEnergy,
        FuelCategory::OverGeneration,
        FuelCategory::StorageDischarge,
        FuelCategory::StorageCharge,
    ];

    /// Column label used in result tables.
    pub fn label(self) -> &'static str {
        match self {
            FuelCategory::NaturalGas => "Natural gas",
            FuelCategory::Hydropower => "Hydropower",
            FuelCategory::Wind => "Wind",
            FuelCategory::Biopower => "Biopower",
            FuelCategory::Geothermal => "Geothermal",
            FuelCategory::Pv => "PV",
            FuelCategory::StorageCharge => "Storage_Charge",
            FuelCategory::StorageDischarge => "Storage_Discharge",
            FuelCategory::Petroleum => "Petroleum",
            FuelCategory::Other => "Other",
            FuelCategory::UnservedEnergy => "Unserved Energy",
            FuelCategory::Curtailment => "Curtailment",
            FuelCategory::OverGeneration => "Over Generation",
        }
    }

    /// Fixed chart color as a `#rrggbb` string.
    pub fn color_hex(self) -> &'static str {
        match self {
            FuelCategory::NaturalGas => "#800080",
            FuelCategory::Hydropower => "#1f77b4",
            FuelCategory::Wind => "#87ceeb",
            FuelCategory::Biopower => "#228b22",
            FuelCategory::Geothermal => "#8b4513",
            FuelCategory::Pv => "#ffd700",
            FuelCategory::StorageCharge | FuelCategory::StorageDischarge => "#5dbb26",
            FuelCategory::Petroleum => "#333333",
            FuelCategory::Other => "#bcbd22",
            FuelCategory::UnservedEnergy => "#ff0000",
            FuelCategory::Curtailment => "#ff6347",
            FuelCategory::OverGeneration => "#00ff00",
        }
    }
}

impl fmt::Display for FuelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A label that is not part of the shared taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown fuel category `{0}`")]
pub struct UnknownCategory(pub String);

impl FromStr for FuelCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        FuelCategory::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Where a raw generator code lands before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryTarget {
    Fuel(FuelCategory),
    /// Net storage output, later split by sign.
    Storage,
}

impl CategoryTarget {
    pub fn label(self) -> &'static str {
        match self {
            CategoryTarget::Fuel(c) => c.label(),
            CategoryTarget::Storage => STORAGE_AGGREGATE,
        }
    }
}

impl FromStr for CategoryTarget {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == STORAGE_AGGREGATE {
            Ok(CategoryTarget::Storage)
        } else {
            s.parse().map(CategoryTarget::Fuel)
        }
    }
}

/// Mapping from raw generator codes (fuel or unit type) to category targets.
///
/// Lookups of codes absent from the map fail; a generator is never silently
/// left out of the category totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCategoryMap {
    entries: IndexMap<String, CategoryTarget>,
}

impl Default for SourceCategoryMap {
    fn default() -> Self {
        Self::plexos_codes()
    }
}

impl SourceCategoryMap {
    /// Map for the fuel and prime-mover codes found in the Plexos generator table.
    pub fn plexos_codes() -> Self {
        use CategoryTarget::{Fuel, Storage};
        let entries = [
            ("OIL", Fuel(FuelCategory::Petroleum)),
            ("OTHER", Fuel(FuelCategory::Other)),
            ("HY", Fuel(FuelCategory::Hydropower)),
            ("WT", Fuel(FuelCategory::Wind)),
            ("WOOD_WASTE", Fuel(FuelCategory::Biopower)),
            ("WASTE_HEAT", Fuel(FuelCategory::Other)),
            ("GEOTHERMAL", Fuel(FuelCategory::Geothermal)),
            ("GAS", Fuel(FuelCategory::NaturalGas)),
            ("PV", Fuel(FuelCategory::Pv)),
            ("BA", Storage),
            ("HYDROGEN", Fuel(FuelCategory::Other)),
        ]
        .into_iter()
        .map(|(code, target)| (code.to_string(), target))
        .collect();
        Self { entries }
    }

    /// Builds a map from `code -> category label` pairs.
    ///
    /// # Errors
    ///
    /// Returns the first label that is neither a fuel category nor `Storage`.
    pub fn from_labels<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> std::result::Result<Self, UnknownCategory> {
        let mut entries = IndexMap::new();
        for (code, label) in pairs {
            entries.insert(code.to_string(), label.parse()?);
        }
        Ok(Self { entries })
    }

    pub fn get(&self, code: &str) -> Option<CategoryTarget> {
        self.entries.get(code).copied()
    }

    /// Resolves `code` for `generator`.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::UnmappedCategory`] when the code is unknown.
    pub fn lookup(&self, generator: &str, code: &str) -> Result<CategoryTarget> {
        self.get(code).ok_or_else(|| CompareError::UnmappedCategory {
            generator: generator.to_string(),
            label: code.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

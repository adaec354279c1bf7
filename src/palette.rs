//! Series colors: fixed colors for fuel categories, seeded colors otherwise.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

use crate::taxonomy::{FuelCategory, STORAGE_AGGREGATE};

/// An opaque 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parses `#rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        Some(Self(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Fixed color for a fuel-category label, if it is one.
pub fn fuel_color(label: &str) -> Option<Rgb> {
    if label == STORAGE_AGGREGATE {
        return Rgb::from_hex(FuelCategory::StorageDischarge.color_hex());
    }
    label
        .parse::<FuelCategory>()
        .ok()
        .and_then(|c| Rgb::from_hex(c.color_hex()))
}

/// Deterministic color assignment for arbitrary series labels.
///
/// A label's color depends only on the label and the seed, so the same
/// transmission line keeps its color across charts and runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    seed: u64,
}

impl Palette {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seeded color for `label`, ignoring the fuel colors.
    pub fn hashed(&self, label: &str) -> Rgb {
        let mut rng = StdRng::from_seed(label_seed(self.seed, label));
        Rgb(rng.random(), rng.random(), rng.random())
    }

    /// Fuel color when `label` is a category, seeded color otherwise.
    pub fn color(&self, label: &str) -> Rgb {
        fuel_color(label).unwrap_or_else(|| self.hashed(label))
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(0)
    }
}

// SHA-256 of the palette seed and label; stable across platforms and toolchains.
fn label_seed(seed: u64, label: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(label.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hasher.finalize());
    bytes
}

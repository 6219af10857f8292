//! Persisted financing parameters.
//!
//! Values are stored as percentage strings (`"3.75"`) under fixed keys and
//! turned into fractions exactly once, in [`StoredParameters::to_parameters`].

use async_trait::async_trait;
use tracing::warn;

use crate::error::ParameterError;
use crate::overlay::models::Parameters;

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// String key-value storage that outlives a single page load.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set(&mut self, entries: &[(&str, String)]) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Bounds {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterField {
    InterestRate,
    ClearanceRate,
    Factor,
}

impl ParameterField {
    pub const ALL: [ParameterField; 3] = [Self::InterestRate, Self::ClearanceRate, Self::Factor];

    pub fn key(self) -> &'static str {
        match self {
            Self::InterestRate => "interestRate",
            Self::ClearanceRate => "clearanceRate",
            Self::Factor => "factor",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::InterestRate => "Interest Rate",
            Self::ClearanceRate => "Clearance Rate",
            Self::Factor => "Factor",
        }
    }

    /// Default in stored (percentage) units.
    pub fn default_value(self) -> f64 {
        match self {
            Self::InterestRate => 3.75,
            Self::ClearanceRate => 1.0,
            Self::Factor => 20.0,
        }
    }

    pub fn bounds(self) -> Bounds {
        match self {
            Self::InterestRate | Self::ClearanceRate => Bounds {
                min: 0.0,
                max: 100.0,
                step: 0.01,
            },
            Self::Factor => Bounds {
                min: 1.0,
                max: 100.0,
                step: 1.0,
            },
        }
    }
}

/// Parameters as the user sees and stores them: rates in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoredParameters {
    pub interest_rate: f64,
    pub clearance_rate: f64,
    pub factor: f64,
}

impl Default for StoredParameters {
    fn default() -> Self {
        Self {
            interest_rate: ParameterField::InterestRate.default_value(),
            clearance_rate: ParameterField::ClearanceRate.default_value(),
            factor: ParameterField::Factor.default_value(),
        }
    }
}

impl StoredParameters {
    pub fn get(&self, field: ParameterField) -> f64 {
        match field {
            ParameterField::InterestRate => self.interest_rate,
            ParameterField::ClearanceRate => self.clearance_rate,
            ParameterField::Factor => self.factor,
        }
    }

    pub fn set(&mut self, field: ParameterField, value: f64) {
        match field {
            ParameterField::InterestRate => self.interest_rate = value,
            ParameterField::ClearanceRate => self.clearance_rate = value,
            ParameterField::Factor => self.factor = value,
        }
    }

    pub fn to_parameters(&self) -> Result<Parameters, ParameterError> {
        Parameters::new(
            self.interest_rate / 100.0,
            self.clearance_rate / 100.0,
            self.factor,
        )
    }
}

pub struct Settings<S> {
    store: S,
}

impl<S: KeyValueStore> Settings<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Reads all three fields. Absent, unparsable or out-of-range entries
    /// fall back to the field default.
    pub async fn load(&self) -> anyhow::Result<StoredParameters> {
        let mut stored = StoredParameters::default();
        for field in ParameterField::ALL {
            if let Some(value) = self.read_field(field).await? {
                stored.set(field, value);
            }
        }
        Ok(stored)
    }

    pub async fn save(&mut self, stored: &StoredParameters) -> anyhow::Result<()> {
        let entries: Vec<(&str, String)> = ParameterField::ALL
            .iter()
            .map(|f| (f.key(), stored.get(*f).to_string()))
            .collect();
        self.store.set(&entries).await
    }

    async fn read_field(&self, field: ParameterField) -> anyhow::Result<Option<f64>> {
        let Some(raw) = self.store.get(field.key()).await? else {
            return Ok(None);
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        match raw.parse::<f64>() {
            Ok(value) if field.bounds().contains(value) => Ok(Some(value)),
            Ok(value) => {
                warn!(key = field.key(), value, "Stored value out of range, using default");
                Ok(None)
            }
            Err(_) => {
                warn!(key = field.key(), raw, "Stored value is not a number, using default");
                Ok(None)
            }
        }
    }
}

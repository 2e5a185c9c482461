use serde::{Deserialize, Deserializer};

use crate::error::ReconError;
use crate::model::{AllocationMode, LandedCost, ReconciliationMeta};

// ---------------------------------------------------------------------------
// Runtime options
// ---------------------------------------------------------------------------

/// Change-detection thresholds. A delta strictly greater than the tolerance
/// counts as a change; the default of zero flags any difference.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReconOptions {
    pub qty_tolerance: f64,
    pub price_tolerance: f64,
}

impl ReconOptions {
    pub fn new(qty_tolerance: f64, price_tolerance: f64) -> Result<Self, ReconError> {
        check_tolerance("qty", qty_tolerance)?;
        check_tolerance("price", price_tolerance)?;
        Ok(Self { qty_tolerance, price_tolerance })
    }
}

fn check_tolerance(label: &str, value: f64) -> Result<(), ReconError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ReconError::ConfigValidation(format!(
            "{label} tolerance must be a finite number >= 0, got {value}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Config file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    /// Landed block used when an invoice arrives without one.
    #[serde(default, deserialize_with = "strict_landed")]
    pub landed: Option<LandedCost>,
}

/// `[landed]` as written in a config file. Unlike invoice documents, a
/// config must not coerce typos or junk to zero.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LandedConfig {
    #[serde(default)]
    freight: f64,
    #[serde(default)]
    surcharges: f64,
    #[serde(default)]
    credits: f64,
    #[serde(default)]
    allocation: AllocationMode,
}

impl From<LandedConfig> for LandedCost {
    fn from(c: LandedConfig) -> Self {
        LandedCost {
            freight: c.freight,
            surcharges: c.surcharges,
            credits: c.credits,
            allocation: c.allocation,
        }
    }
}

fn strict_landed<'de, D>(deserializer: D) -> Result<Option<LandedCost>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<LandedConfig>::deserialize(deserializer)?.map(LandedCost::from))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToleranceConfig {
    #[serde(default)]
    pub qty: f64,
    #[serde(default)]
    pub price: f64,
}

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        check_tolerance("qty", self.tolerance.qty)?;
        check_tolerance("price", self.tolerance.price)?;

        if let Some(ref landed) = self.landed {
            for (label, value) in [
                ("freight", landed.freight),
                ("surcharges", landed.surcharges),
                ("credits", landed.credits),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(ReconError::ConfigValidation(format!(
                        "landed {label} must be a finite number >= 0, got {value}"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Replace the config tolerances, e.g. with command-line overrides.
    pub fn set_options(&mut self, options: ReconOptions) {
        self.tolerance = ToleranceConfig {
            qty: options.qty_tolerance,
            price: options.price_tolerance,
        };
    }

    pub fn options(&self) -> ReconOptions {
        ReconOptions {
            qty_tolerance: self.tolerance.qty,
            price_tolerance: self.tolerance.price,
        }
    }

    /// Fill `meta.landed` from the config when the invoice carries none.
    pub fn apply_landed_default(&self, meta: &mut ReconciliationMeta) {
        if meta.landed.is_none() {
            meta.landed = self.landed.clone();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

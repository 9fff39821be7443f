//! Currency exposures of a position in a single option contract.

use std::fmt;
use std::str::FromStr;

use crate::error::{EngineError, EngineResult};
use crate::models::bs::premium_unchecked;
use crate::models::greeks::market_greeks;
use crate::models::types::OptionParameters;

/// Direction of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Side {
    #[default]
    Long,
    Short,
}

impl Side {
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

impl FromStr for Side {
    type Err = EngineError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "Long" | "long" => Ok(Side::Long),
            "Short" | "short" => Ok(Side::Short),
            other => Err(EngineError::invalid(format!(
                "position side must be either long or short, got {other:?}"
            ))),
        }
    }
}

/// A holding of `quantity` contracts, each covering `multiplier` units.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub params: OptionParameters,
    /// Units of underlying per contract (> 0)
    pub multiplier: f64,
    /// Number of contracts (>= 0); direction comes from `side`
    pub quantity: f64,
    pub side: Side,
}

/// Per-position figures in currency terms.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionExposure {
    pub premium: f64,
    /// Delta · S · m · q
    pub delta: f64,
    /// Gamma(1%) · S · m · q
    pub gamma_one_percent: f64,
    pub theta_one_day: f64,
    pub vega_one_percent: f64,
    pub rho_one_percent: f64,
    /// Underlying units to trade for delta neutrality; positive means buy.
    pub hedge_units: f64,
}

impl Position {
    pub fn new(
        params: OptionParameters,
        multiplier: f64,
        quantity: f64,
        side: Side,
    ) -> EngineResult<Self> {
        let position = Self {
            params,
            multiplier,
            quantity,
            side,
        };
        position.validate()?;
        Ok(position)
    }

    pub fn validate(&self) -> EngineResult<()> {
        self.params.validate()?;
        if !self.multiplier.is_finite() || self.multiplier <= 0.0 {
            return Err(EngineError::invalid(format!(
                "contract multiplier must be > 0 and finite, got {}",
                self.multiplier
            )));
        }
        if !self.quantity.is_finite() || self.quantity < 0.0 {
            return Err(EngineError::invalid(format!(
                "quantity must be >= 0 and finite, got {}",
                self.quantity
            )));
        }
        Ok(())
    }

    /// Contracts times multiplier, negative when short.
    pub fn signed_units(&self) -> f64 {
        self.side.sign() * self.quantity * self.multiplier
    }

    pub fn exposure(&self) -> EngineResult<PositionExposure> {
        self.validate()?;
        let greeks = market_greeks(&self.params)?;
        let units = self.signed_units();
        let spot = self.params.spot;

        Ok(PositionExposure {
            premium: premium_unchecked(&self.params) * units,
            delta: greeks.delta * spot * units,
            gamma_one_percent: greeks.gamma_one_percent * spot * units,
            theta_one_day: greeks.theta_one_day * units,
            vega_one_percent: greeks.vega_one_percent * units,
            rho_one_percent: greeks.rho_one_percent * units,
            hedge_units: -greeks.delta * units,
        })
    }
}

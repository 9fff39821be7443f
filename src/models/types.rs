use std::fmt;
use std::str::FromStr;

use crate::error::{EngineError, EngineResult};

/// European option variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OptionType {
    Call,
    Put,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

/// Accepts `Call`, `call`, `C`, `c` and `Put`, `put`, `P`, `p`.
impl FromStr for OptionType {
    type Err = EngineError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "Call" | "call" | "C" | "c" => Ok(OptionType::Call),
            "Put" | "put" | "P" | "p" => Ok(OptionType::Put),
            other => Err(EngineError::invalid(format!(
                "option type must be either call or put, got {other:?}"
            ))),
        }
    }
}

/// The five Black-Scholes inputs plus the option variant.
///
/// Fields are public for ergonomic construction; every pricing entry point
/// re-validates through [`OptionParameters::validate`], so a hand-built value
/// with a bad field is still rejected before any arithmetic happens.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptionParameters {
    /// Underlying price S (> 0)
    pub spot: f64,
    /// Strike K (> 0)
    pub strike: f64,
    /// Time to expiration T in years (> 0)
    pub time_to_expiry: f64,
    /// Continuously compounded risk-free rate r
    pub rate: f64,
    /// Annualised volatility σ (>= 0)
    pub volatility: f64,
    pub option_type: OptionType,
}

impl OptionParameters {
    /// Creates a validated parameter set.
    pub fn new(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        rate: f64,
        volatility: f64,
        option_type: OptionType,
    ) -> EngineResult<Self> {
        let params = Self {
            spot,
            strike,
            time_to_expiry,
            rate,
            volatility,
            option_type,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn call(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        rate: f64,
        volatility: f64,
    ) -> EngineResult<Self> {
        Self::new(spot, strike, time_to_expiry, rate, volatility, OptionType::Call)
    }

    pub fn put(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        rate: f64,
        volatility: f64,
    ) -> EngineResult<Self> {
        Self::new(spot, strike, time_to_expiry, rate, volatility, OptionType::Put)
    }

    /// Checks every field against its domain.
    pub fn validate(&self) -> EngineResult<()> {
        validate_contract(self.spot, self.strike, self.time_to_expiry, self.rate)?;
        if !self.volatility.is_finite() || self.volatility < 0.0 {
            return Err(EngineError::invalid(format!(
                "volatility must be >= 0 and finite, got {}",
                self.volatility
            )));
        }
        Ok(())
    }

    /// Discount factor e^(−rT).
    pub fn discount_factor(&self) -> f64 {
        (-self.rate * self.time_to_expiry).exp()
    }

    pub(crate) fn with_spot(self, spot: f64) -> Self {
        Self { spot, ..self }
    }

    pub(crate) fn with_volatility(self, volatility: f64) -> Self {
        Self { volatility, ..self }
    }

    pub(crate) fn with_rate(self, rate: f64) -> Self {
        Self { rate, ..self }
    }

    pub(crate) fn with_time_to_expiry(self, time_to_expiry: f64) -> Self {
        Self {
            time_to_expiry,
            ..self
        }
    }
}

/// Shared validation for the contract terms common to pricing and IV queries.
pub(crate) fn validate_contract(
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    rate: f64,
) -> EngineResult<()> {
    if !spot.is_finite() || spot <= 0.0 {
        return Err(EngineError::invalid(format!(
            "spot price must be > 0 and finite, got {spot}"
        )));
    }
    if !strike.is_finite() || strike <= 0.0 {
        return Err(EngineError::invalid(format!(
            "strike price must be > 0 and finite, got {strike}"
        )));
    }
    if !time_to_expiry.is_finite() || time_to_expiry <= 0.0 {
        return Err(EngineError::invalid(format!(
            "time to expiry must be > 0 and finite, got {time_to_expiry}"
        )));
    }
    if !rate.is_finite() {
        return Err(EngineError::invalid(format!(
            "risk-free rate must be finite, got {rate}"
        )));
    }
    if !(-rate * time_to_expiry).exp().is_finite() {
        return Err(EngineError::invalid(format!(
            "discount factor overflows for rate {rate} over {time_to_expiry} years"
        )));
    }
    Ok(())
}

/// Analytic Black-Scholes sensitivities.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Greeks {
    /// ∂V/∂S
    pub delta: f64,
    /// ∂²V/∂S²
    pub gamma: f64,
    /// ∂V/∂t (per year unless rescaled)
    pub theta: f64,
    /// ∂V/∂σ (per unit σ unless rescaled)
    pub vega: f64,
    /// ∂V/∂r (per unit r unless rescaled)
    pub rho: f64,
}

/// Unit convention applied to analytic Greeks.
///
/// Scaling is never applied implicitly: [`GreekUnits::Raw`] is the default and
/// returns the partial derivatives as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GreekUnits {
    /// Raw partial derivatives.
    #[default]
    Raw,
    /// Vega and Rho divided by 100 (per vol point / rate point).
    PerPercent,
    /// `PerPercent` plus Theta divided by 252 (per trading day).
    PerPercentPerDay,
}

impl Greeks {
    /// Rescales the raw Greeks into the requested convention.
    pub fn in_units(self, units: GreekUnits) -> Self {
        match units {
            GreekUnits::Raw => self,
            GreekUnits::PerPercent => Self {
                vega: self.vega / 100.0,
                rho: self.rho / 100.0,
                ..self
            },
            GreekUnits::PerPercentPerDay => Self {
                theta: self.theta / crate::models::greeks::TRADING_DAYS,
                vega: self.vega / 100.0,
                rho: self.rho / 100.0,
                ..self
            },
        }
    }
}

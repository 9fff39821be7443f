use crate::error::{EngineError, EngineResult};
use crate::models::bs::premium_unchecked;
use crate::models::greeks::vega_unchecked;
use crate::models::traits::PriceCurve;
use crate::models::types::{validate_contract, OptionParameters, OptionType};
use crate::models::utils::{no_arbitrage_bounds, PremiumBounds};

/// An observed premium to be inverted for volatility.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImpliedVolQuery {
    /// Underlying price S (> 0)
    pub spot: f64,
    /// Strike K (> 0)
    pub strike: f64,
    /// Time to expiration in years (> 0)
    pub time_to_expiry: f64,
    /// Continuously compounded risk-free rate
    pub rate: f64,
    /// Observed option premium (> 0)
    pub market_premium: f64,
    pub option_type: OptionType,
}

impl ImpliedVolQuery {
    pub fn new(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        rate: f64,
        market_premium: f64,
        option_type: OptionType,
    ) -> EngineResult<Self> {
        let query = Self {
            spot,
            strike,
            time_to_expiry,
            rate,
            market_premium,
            option_type,
        };
        query.validate()?;
        Ok(query)
    }

    pub fn call(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        rate: f64,
        market_premium: f64,
    ) -> EngineResult<Self> {
        Self::new(spot, strike, time_to_expiry, rate, market_premium, OptionType::Call)
    }

    pub fn put(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        rate: f64,
        market_premium: f64,
    ) -> EngineResult<Self> {
        Self::new(spot, strike, time_to_expiry, rate, market_premium, OptionType::Put)
    }

    pub fn validate(&self) -> EngineResult<()> {
        validate_contract(self.spot, self.strike, self.time_to_expiry, self.rate)?;
        if !self.market_premium.is_finite() || self.market_premium <= 0.0 {
            return Err(EngineError::invalid(format!(
                "market premium must be > 0 and finite, got {}",
                self.market_premium
            )));
        }
        Ok(())
    }

    /// The full parameter set at volatility `sigma`.
    pub fn parameters(&self, sigma: f64) -> OptionParameters {
        OptionParameters {
            spot: self.spot,
            strike: self.strike,
            time_to_expiry: self.time_to_expiry,
            rate: self.rate,
            volatility: sigma,
            option_type: self.option_type,
        }
    }

    /// Premium range reachable by some σ ≥ 0.
    pub fn bounds(&self) -> EngineResult<PremiumBounds> {
        no_arbitrage_bounds(
            self.option_type,
            self.spot,
            self.strike,
            self.time_to_expiry,
            self.rate,
        )
    }
}

/// Black-Scholes premium and vega along the σ axis of a validated query.
impl PriceCurve for ImpliedVolQuery {
    fn price(&self, sigma: f64) -> f64 {
        premium_unchecked(&self.parameters(sigma))
    }

    fn vega(&self, sigma: f64) -> f64 {
        vega_unchecked(&self.parameters(sigma))
    }
}

/// Which branch of the hybrid solver produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverPhase {
    Newton,
    Bisection,
}

/// States of the implied-volatility state machine.
///
/// `NewtonStep` and `BisectionStep` carry what the next evaluation needs;
/// `Converged` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolverState {
    NewtonStep { sigma: f64 },
    BisectionStep { lower: f64, upper: f64 },
    Converged { sigma: f64, phase: SolverPhase },
    Failed { last_estimate: f64, residual: f64 },
}

impl SolverState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SolverState::Converged { .. } | SolverState::Failed { .. }
        )
    }
}

/// A converged implied volatility with diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImpliedVolReport {
    pub implied_vol: f64,
    /// Price evaluations used.
    pub iterations: usize,
    /// price(implied_vol) − market premium
    pub residual: f64,
    /// Phase in which the tolerance was met.
    pub phase: SolverPhase,
}

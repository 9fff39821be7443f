//! Desk-convention Greeks obtained by bumping and repricing.
//!
//! Each figure is the premium (or delta) change for a one-percent move in the
//! input, or for one trading day passing. Bumps are symmetric where the domain
//! allows it.

use crate::error::EngineResult;
use crate::models::bs::{premium_unchecked, BsTerms};
use crate::models::types::{OptionParameters, OptionType};
use crate::models::utils::intrinsic_value;

use super::TRADING_DAYS;

/// Half of a one-percent bump.
const HALF_BUMP: f64 = 0.005;

/// Finite-difference sensitivities quoted per 1% move or per trading day.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarketGreeks {
    /// Analytic delta.
    pub delta: f64,
    /// Δ(1.005·S) − Δ(0.995·S)
    pub gamma_one_percent: f64,
    /// premium(T − 1 day) − premium(T)
    pub theta_one_day: f64,
    /// premium(σ + 0.5%) − premium(σ − 0.5%)
    pub vega_one_percent: f64,
    /// premium(r + 0.5%) − premium(r − 0.5%)
    pub rho_one_percent: f64,
}

fn delta_unchecked(params: &OptionParameters) -> f64 {
    let cdf_d1 = BsTerms::new(params).cdf_d1;
    match params.option_type {
        OptionType::Call => cdf_d1,
        OptionType::Put => cdf_d1 - 1.0,
    }
}

/// Computes [`MarketGreeks`] by repricing bumped inputs.
///
/// The downward volatility leg is floored at σ = 0 and the difference rescaled
/// to a full one-point move.
pub fn market_greeks(params: &OptionParameters) -> EngineResult<MarketGreeks> {
    params.validate()?;
    let base = premium_unchecked(params);

    let gamma_one_percent = delta_unchecked(&params.with_spot(params.spot * (1.0 + HALF_BUMP)))
        - delta_unchecked(&params.with_spot(params.spot * (1.0 - HALF_BUMP)));

    let remaining = params.time_to_expiry - 1.0 / TRADING_DAYS;
    let tomorrow = if remaining > 0.0 {
        premium_unchecked(&params.with_time_to_expiry(remaining))
    } else {
        intrinsic_value(params.option_type, params.spot, params.strike)
    };
    let theta_one_day = tomorrow - base;

    let vol_up = params.volatility + HALF_BUMP;
    let vol_down = (params.volatility - HALF_BUMP).max(0.0);
    let vega_one_percent = (premium_unchecked(&params.with_volatility(vol_up))
        - premium_unchecked(&params.with_volatility(vol_down)))
        * (2.0 * HALF_BUMP / (vol_up - vol_down));

    let rho_one_percent = premium_unchecked(&params.with_rate(params.rate + HALF_BUMP))
        - premium_unchecked(&params.with_rate(params.rate - HALF_BUMP));

    Ok(MarketGreeks {
        delta: delta_unchecked(params),
        gamma_one_percent,
        theta_one_day,
        vega_one_percent,
        rho_one_percent,
    })
}

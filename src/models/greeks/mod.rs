//! Analytic Black-Scholes Greeks.
//!
//! All five sensitivities are derived from a single [`BsTerms`] evaluation, the
//! same one the premium is computed from.

pub mod market;

use crate::error::EngineResult;
use crate::models::bs::{norm_cdf, BsTerms};
use crate::models::types::{GreekUnits, Greeks, OptionParameters, OptionType};

pub use market::{market_greeks, MarketGreeks};

/// Trading days per year, used for one-day Theta.
pub const TRADING_DAYS: f64 = 252.0;

/// Greeks from precomputed terms.
pub(crate) fn greeks_from_terms(params: &OptionParameters, terms: &BsTerms) -> Greeks {
    let s = params.spot;
    let k = params.strike;
    let t = params.time_to_expiry;
    let r = params.rate;
    let sigma = params.volatility;

    // Gamma blows up at the forward as σ√T → 0 and vanishes elsewhere.
    let gamma = if terms.vol_sqrt_t > 0.0 {
        terms.pdf_d1 / (s * terms.vol_sqrt_t)
    } else if terms.d1 == 0.0 {
        f64::INFINITY
    } else {
        0.0
    };
    let vega = s * terms.pdf_d1 * terms.sqrt_t;
    let decay = -s * terms.pdf_d1 * sigma / (2.0 * terms.sqrt_t);
    let k_disc = k * terms.discount;

    match params.option_type {
        OptionType::Call => Greeks {
            delta: terms.cdf_d1,
            gamma,
            theta: decay - r * k_disc * terms.cdf_d2,
            vega,
            rho: k_disc * t * terms.cdf_d2,
        },
        OptionType::Put => {
            let cdf_minus_d2 = norm_cdf(-terms.d2);
            Greeks {
                delta: terms.cdf_d1 - 1.0,
                gamma,
                theta: decay + r * k_disc * cdf_minus_d2,
                vega,
                rho: -k_disc * t * cdf_minus_d2,
            }
        }
    }
}

/// Vega (per unit σ) for parameters already validated.
pub(crate) fn vega_unchecked(params: &OptionParameters) -> f64 {
    let terms = BsTerms::new(params);
    params.spot * terms.pdf_d1 * terms.sqrt_t
}

/// Raw analytic Greeks.
///
/// # Errors
///
/// [`crate::EngineError::InvalidParameter`] under the same conditions as pricing.
pub fn greeks(params: &OptionParameters) -> EngineResult<Greeks> {
    greeks_in_units(params, GreekUnits::Raw)
}

/// Analytic Greeks rescaled into `units`.
pub fn greeks_in_units(params: &OptionParameters, units: GreekUnits) -> EngineResult<Greeks> {
    params.validate()?;
    let terms = BsTerms::new(params);
    Ok(greeks_from_terms(params, &terms).in_units(units))
}

impl OptionParameters {
    pub fn greeks(&self) -> EngineResult<Greeks> {
        greeks(self)
    }

    pub fn market_greeks(&self) -> EngineResult<MarketGreeks> {
        market_greeks(self)
    }
}

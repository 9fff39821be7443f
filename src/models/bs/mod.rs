//! Closed-form Black-Scholes pricing for European calls and puts.
//!
//! The intermediate quantities (d1, d2, N(d1), N(d2), n(d1), e^(−rT)) are
//! gathered in [`BsTerms`] so the Greeks reuse exactly what the premium used.

use statrs::consts::SQRT_2PI;

use crate::error::EngineResult;
use crate::models::types::{OptionParameters, OptionType};

/// Standard normal cumulative distribution function.
///
/// Uses `erfc` so the lower tail keeps full relative precision.
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * libm::erfc(-x / std::f64::consts::SQRT_2)
}

/// Standard normal probability density n(x) = N'(x).
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / SQRT_2PI
}

/// Per-call Black-Scholes intermediates. Never cached across calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BsTerms {
    pub d1: f64,
    pub d2: f64,
    /// √T
    pub sqrt_t: f64,
    /// σ·√T
    pub vol_sqrt_t: f64,
    /// e^(−rT)
    pub discount: f64,
    /// N(d1)
    pub cdf_d1: f64,
    /// N(d2)
    pub cdf_d2: f64,
    /// n(d1)
    pub pdf_d1: f64,
}

impl BsTerms {
    /// Computes the intermediates for already-validated parameters.
    ///
    /// At σ = 0 the standardised variables degenerate to ±∞ depending on the
    /// sign of the forward moneyness, or to 0 exactly at the forward.
    pub fn new(params: &OptionParameters) -> Self {
        let OptionParameters {
            spot: s,
            strike: k,
            time_to_expiry: t,
            rate: r,
            volatility: sigma,
            ..
        } = *params;

        let sqrt_t = t.sqrt();
        let vol_sqrt_t = sigma * sqrt_t;
        // ln(F/K) without the variance term, which would overflow for huge σ
        let drift = (s / k).ln() + r * t;

        let (d1, d2) = if vol_sqrt_t.is_infinite() {
            (f64::INFINITY, f64::NEG_INFINITY)
        } else if vol_sqrt_t > 0.0 {
            let d1 = drift / vol_sqrt_t + 0.5 * vol_sqrt_t;
            (d1, d1 - vol_sqrt_t)
        } else if drift > 0.0 {
            (f64::INFINITY, f64::INFINITY)
        } else if drift < 0.0 {
            (f64::NEG_INFINITY, f64::NEG_INFINITY)
        } else {
            (0.0, 0.0)
        };

        Self {
            d1,
            d2,
            sqrt_t,
            vol_sqrt_t,
            discount: (-r * t).exp(),
            cdf_d1: norm_cdf(d1),
            cdf_d2: norm_cdf(d2),
            pdf_d1: norm_pdf(d1),
        }
    }
}

/// Premium from precomputed terms. Clamped at zero against cancellation.
pub(crate) fn premium_from_terms(params: &OptionParameters, terms: &BsTerms) -> f64 {
    let s = params.spot;
    let k_disc = params.strike * terms.discount;
    let price = match params.option_type {
        OptionType::Call => s * terms.cdf_d1 - k_disc * terms.cdf_d2,
        // N(−x) = 1 − N(x) loses the tail; evaluate the reflected CDF directly.
        OptionType::Put => k_disc * norm_cdf(-terms.d2) - s * norm_cdf(-terms.d1),
    };
    debug_assert!(!price.is_nan(), "NaN premium for {params:?}");
    price.max(0.0)
}

/// Premium for parameters the caller has already validated.
pub(crate) fn premium_unchecked(params: &OptionParameters) -> f64 {
    premium_from_terms(params, &BsTerms::new(params))
}

/// Black-Scholes premium of a European option.
///
/// # Errors
///
/// [`crate::EngineError::InvalidParameter`] if any input is outside its domain.
pub fn price(params: &OptionParameters) -> EngineResult<f64> {
    params.validate()?;
    Ok(premium_unchecked(params))
}

impl OptionParameters {
    /// Black-Scholes premium; see [`price`].
    pub fn premium(&self) -> EngineResult<f64> {
        price(self)
    }
}

/// Price of a European call option under Black-Scholes assumptions.
#[allow(non_snake_case)]
pub fn bs_call_price(S: f64, K: f64, T: f64, r: f64, sigma: f64) -> EngineResult<f64> {
    price(&OptionParameters::call(S, K, T, r, sigma)?)
}

/// Price of a European put option under Black-Scholes assumptions.
#[allow(non_snake_case)]
pub fn bs_put_price(S: f64, K: f64, T: f64, r: f64, sigma: f64) -> EngineResult<f64> {
    price(&OptionParameters::put(S, K, T, r, sigma)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm_cdf_reference_points() {
        assert!((norm_cdf(0.0) - 0.5).abs() < 1e-15);
        assert!((norm_cdf(1.0) - 0.841_344_746_068_542_9).abs() < 1e-15);
        assert!((norm_cdf(-1.959_963_984_540_054) - 0.025).abs() < 1e-15);
        assert_eq!(norm_cdf(f64::INFINITY), 1.0);
        assert_eq!(norm_cdf(f64::NEG_INFINITY), 0.0);
        // deep lower tail keeps relative precision
        let tail = norm_cdf(-10.0);
        assert!((tail / 7.619_853_024_160_527e-24 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_norm_pdf_peak() {
        assert!((norm_pdf(0.0) - 0.398_942_280_401_432_7).abs() < 1e-15);
        assert_eq!(norm_pdf(f64::INFINITY), 0.0);
        assert!((norm_pdf(1.3) - norm_pdf(-1.3)).abs() < 1e-18);
    }

    #[test]
    fn test_call_reference_premium() {
        let premium = bs_call_price(100.0, 105.0, 60.0 / 252.0, 0.02, 0.3).unwrap();
        assert!(
            (premium - 3.982_731_793_716_823).abs() < 1e-6,
            "got {premium}"
        );
    }

    #[test]
    fn test_textbook_atm_premiums() {
        let call = bs_call_price(100.0, 100.0, 1.0, 0.05, 0.2).unwrap();
        let put = bs_put_price(100.0, 100.0, 1.0, 0.05, 0.2).unwrap();
        assert!((call - 10.450_583_572_185_565).abs() < 1e-9, "call {call}");
        assert!((put - 5.573_526_022_256_971).abs() < 1e-9, "put {put}");
    }

    #[test]
    fn test_zero_volatility_is_discounted_intrinsic() {
        let params = OptionParameters::call(110.0, 100.0, 0.5, 0.04, 0.0).unwrap();
        let terms = BsTerms::new(&params);
        assert_eq!(terms.d1, f64::INFINITY);
        let expected = 110.0 - 100.0 * (-0.04_f64 * 0.5).exp();
        assert!((price(&params).unwrap() - expected).abs() < 1e-12);

        let otm_put = OptionParameters::put(110.0, 100.0, 0.5, 0.04, 0.0).unwrap();
        assert_eq!(price(&otm_put).unwrap(), 0.0);
    }

    #[test]
    fn test_zero_volatility_at_the_forward() {
        // S = K·e^(−rT) makes the drift vanish exactly when r = 0 and S = K.
        let params = OptionParameters::call(100.0, 100.0, 1.0, 0.0, 0.0).unwrap();
        let terms = BsTerms::new(&params);
        assert_eq!(terms.d1, 0.0);
        assert_eq!(price(&params).unwrap(), 0.0);
    }

    #[test]
    fn test_huge_volatility_approaches_upper_bound() {
        let call = |sigma| bs_call_price(100.0, 100.0, 1.0, 0.05, sigma).unwrap();
        assert!((call(1e160) - 100.0).abs() < 1e-9, "call {}", call(1e160));
        assert!((call(1e300) - 100.0).abs() < 1e-9);
        assert!(call(10.0) < call(1e160));
        assert!(call(1e154) <= call(1e160));

        let put = bs_put_price(100.0, 100.0, 1.0, 0.05, 1e160).unwrap();
        assert!((put - 100.0 * (-0.05_f64).exp()).abs() < 1e-9, "put {put}");

        // σ√T itself overflows
        let params = OptionParameters::call(100.0, 100.0, 1e20, 0.0, 1e300).unwrap();
        let terms = BsTerms::new(&params);
        assert_eq!((terms.d1, terms.d2), (f64::INFINITY, f64::NEG_INFINITY));
        assert_eq!(price(&params).unwrap(), 100.0);
    }

    #[test]
    fn test_invalid_inputs_never_yield_nan() {
        assert!(bs_call_price(100.0, 100.0, 0.0, 0.05, 0.2).is_err());
        assert!(bs_call_price(100.0, 100.0, 1.0, 0.05, -0.1).is_err());
        assert!(bs_put_price(-100.0, 100.0, 1.0, 0.05, 0.2).is_err());
        assert!(bs_put_price(100.0, 0.0, 1.0, 0.05, 0.2).is_err());
        // e^(−rT) overflows
        assert!(bs_call_price(100.0, 100.0, 1e4, -0.1, 0.2).is_err());
    }
}

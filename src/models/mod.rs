pub mod bs;
pub mod greeks;
pub mod types;

/// Common traits shared by the pricing models and the solver
pub mod traits {
    /// Premium and its σ-derivative as functions of volatility alone.
    ///
    /// The implied-volatility state machine only sees this seam, which keeps it
    /// testable against synthetic curves independently of Black-Scholes.
    pub trait PriceCurve {
        /// Model premium at volatility `sigma`.
        fn price(&self, sigma: f64) -> f64;
        /// ∂premium/∂σ at volatility `sigma`.
        fn vega(&self, sigma: f64) -> f64;
    }
}

/// Utility functions for option pricing and calculations
pub mod utils {
    use crate::error::EngineResult;
    use crate::models::types::{validate_contract, OptionType};

    /// Calculate log-moneyness: ln(K/S)
    pub fn log_moneyness(strike: f64, spot: f64) -> f64 {
        (strike / spot).ln()
    }

    /// Undiscounted payoff if exercised now.
    pub fn intrinsic_value(option_type: OptionType, spot: f64, strike: f64) -> f64 {
        match option_type {
            OptionType::Call => (spot - strike).max(0.0),
            OptionType::Put => (strike - spot).max(0.0),
        }
    }

    /// Range of premiums attainable by a European option for some σ ≥ 0.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct PremiumBounds {
        /// Discounted intrinsic value (the σ → 0 limit).
        pub lower: f64,
        /// S for calls, K·e^(−rT) for puts (the σ → ∞ limit, never attained).
        pub upper: f64,
    }

    impl PremiumBounds {
        /// Whether `premium` lies in `[lower - slack, upper)`.
        pub fn admits(&self, premium: f64, slack: f64) -> bool {
            premium >= self.lower - slack && premium < self.upper
        }
    }

    /// No-arbitrage bounds on the premium of a European option.
    pub fn no_arbitrage_bounds(
        option_type: OptionType,
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        rate: f64,
    ) -> EngineResult<PremiumBounds> {
        validate_contract(spot, strike, time_to_expiry, rate)?;
        let k_disc = strike * (-rate * time_to_expiry).exp();
        let bounds = match option_type {
            OptionType::Call => PremiumBounds {
                lower: (spot - k_disc).max(0.0),
                upper: spot,
            },
            OptionType::Put => PremiumBounds {
                lower: (k_disc - spot).max(0.0),
                upper: k_disc,
            },
        };
        Ok(bounds)
    }

    /// Moneyness bucket from the holder's point of view.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub enum Moneyness {
        InTheMoney,
        AtTheMoney,
        OutOfTheMoney,
    }

    /// Classifies the contract and returns |K − S| / S in percent.
    pub fn moneyness(option_type: OptionType, spot: f64, strike: f64) -> (Moneyness, f64) {
        let distance_pct = (strike - spot).abs() * 100.0 / spot;
        let bucket = if strike == spot {
            Moneyness::AtTheMoney
        } else if (option_type == OptionType::Call) == (spot > strike) {
            Moneyness::InTheMoney
        } else {
            Moneyness::OutOfTheMoney
        };
        (bucket, distance_pct)
    }

}

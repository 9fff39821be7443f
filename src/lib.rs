//! # BS-Engine: Black-Scholes Pricing, Greeks and Implied Volatility
//!
//! `bs-engine` is a small, deterministic numerical library for European options under
//! Black-Scholes assumptions. It prices calls and puts in closed form, computes their
//! sensitivities from the same intermediate quantities, and inverts observed premiums
//! for implied volatility with a hybrid Newton-Raphson / bisection solver.
//!
//! ## Core Features
//!
//! - **Pricing Engine**: closed-form premium with exact σ = 0 limits
//! - **Greeks Calculator**: analytic Delta, Gamma, Theta, Vega, Rho plus desk-style
//!   finite-difference Greeks quoted per 1% move or per trading day
//! - **Implied Volatility**: explicit state machine with a permanent bisection fallback
//!   when vega collapses, no-arbitrage pre-checks and typed failures
//! - **Positions**: currency exposures and delta hedge for a signed holding
//!
//! ## Quick Start
//!
//! ```rust
//! use bs_engine::{default_configs, greeks, implied_volatility, premium, OptionType};
//!
//! let call = premium(100.0, 105.0, 60.0 / 252.0, 0.02, 0.3, OptionType::Call)?;
//! let sensitivities = greeks(100.0, 105.0, 60.0 / 252.0, 0.02, 0.3, OptionType::Call)?;
//! assert!(sensitivities.delta > 0.0 && sensitivities.delta < 1.0);
//!
//! let config = default_configs::production();
//! let sigma = implied_volatility(100.0, 105.0, 60.0 / 252.0, 0.02, call, OptionType::Call, &config)?;
//! assert!((sigma - 0.3).abs() < 1e-6);
//! # Ok::<(), bs_engine::EngineError>(())
//! ```
//!
//! ## Errors
//!
//! Every fallible entry point returns [`EngineResult`]. Invalid inputs are rejected with
//! [`EngineError::InvalidParameter`] before any arithmetic, so no function ever returns NaN
//! for a bad argument.
//!
//! ## Configuration Presets
//!
//! The solver ships several configuration presets:
//! - `production()`: tight tolerance for live pricing
//! - `fast()`: the defaults
//! - `research()`: near machine precision
//! - `minimal()`: quick validation settings
//! - `bracketed()`: pure bisection on the classical [0.01%, 200%] bracket

// ================================================================================================
// MODULES
// ================================================================================================

pub mod error;
pub mod implied_vol;
pub mod models;
pub mod position;

// ================================================================================================
// IMPORTS
// ================================================================================================

use std::cmp::Ordering;

use tracing::debug;

use models::utils::{log_moneyness, moneyness};

// ================================================================================================
// PUBLIC RE-EXPORTS
// ================================================================================================

// Errors
pub use error::{EngineError, EngineResult};

// Contract description and outputs
pub use models::types::{GreekUnits, Greeks, OptionParameters, OptionType};

// Pricing and Greeks
pub use models::bs::{bs_call_price, bs_put_price, norm_cdf, norm_pdf, BsTerms};
pub use models::greeks::{greeks_in_units, market_greeks, MarketGreeks, TRADING_DAYS};
pub use models::utils::{no_arbitrage_bounds, Moneyness, PremiumBounds};

// Implied volatility
pub use implied_vol::{
    HybridSolver, ImpliedVolQuery, ImpliedVolReport, InitialGuess, SolverConfig, SolverMethod,
    SolverPhase, SolverState,
};

// Positions
pub use position::{Position, PositionExposure, Side};

// ================================================================================================
// DEFAULT CONFIGURATIONS
// ================================================================================================

/// Pre-configured solver settings for common use cases.
///
/// # Available Configurations
///
/// - [`production()`]: tight tolerance for live pricing
/// - [`fast()`]: the library defaults
/// - [`research()`]: near machine-precision inversion
/// - [`minimal()`]: quick validation settings
/// - [`bracketed()`]: bisection only
pub mod default_configs {
    use crate::implied_vol::SolverConfig;

    /// Production-grade configuration for live pricing.
    ///
    /// **Characteristics:**
    /// - Maximum iterations: 200
    /// - Convergence tolerance: 1e-8 on the premium
    /// - Hybrid Newton-Raphson / bisection from σ₀ = 0.2
    ///
    /// **Use Cases:**
    /// - Marking option books
    /// - Feeding implied volatilities into risk systems
    ///
    /// # Example
    ///
    /// ```rust
    /// use bs_engine::default_configs;
    ///
    /// let config = default_configs::production();
    /// assert_eq!(config.max_iterations, 200);
    /// ```
    pub fn production() -> SolverConfig {
        SolverConfig::production()
    }

    /// The library defaults.
    ///
    /// **Characteristics:**
    /// - Maximum iterations: 100
    /// - Convergence tolerance: 1e-6
    /// - Bracket: [1e-6, 5.0]
    ///
    /// # Example
    ///
    /// ```rust
    /// use bs_engine::default_configs;
    ///
    /// let config = default_configs::fast();
    /// assert_eq!(config.tolerance, 1e-6);
    /// ```
    pub fn fast() -> SolverConfig {
        SolverConfig::fast()
    }

    /// High-precision configuration for research and model validation.
    ///
    /// **Characteristics:**
    /// - Maximum iterations: 500
    /// - Convergence tolerance: 1e-10
    /// - Brenner-Subrahmanyam seed
    pub fn research() -> SolverConfig {
        SolverConfig::research()
    }

    /// Minimal configuration for quick checks.
    ///
    /// **Characteristics:**
    /// - Maximum iterations: 50
    /// - Convergence tolerance: 1e-4
    pub fn minimal() -> SolverConfig {
        SolverConfig::minimal()
    }

    /// Bisection only, on the volatility bracket [1e-4, 2.0].
    ///
    /// Slower than the hybrid solver but never depends on vega.
    pub fn bracketed() -> SolverConfig {
        SolverConfig::bracketed()
    }
}

/// Black-Scholes premium of a European option.
///
/// # Arguments
///
/// * `spot` - Underlying price S (> 0)
/// * `strike` - Strike K (> 0)
/// * `time_to_expiry` - Time to expiration T in years (> 0)
/// * `rate` - Continuously compounded risk-free rate r
/// * `volatility` - Annualised volatility σ (>= 0; σ = 0 gives the discounted intrinsic value)
/// * `option_type` - [`OptionType::Call`] or [`OptionType::Put`]
///
/// # Errors
///
/// [`EngineError::InvalidParameter`] if any input is outside its domain.
///
/// # Example
///
/// ```rust
/// use bs_engine::{premium, OptionType};
///
/// let p = premium(100.0, 105.0, 60.0 / 252.0, 0.02, 0.3, OptionType::Call)?;
/// assert!((p - 3.982731793716823).abs() < 1e-6);
/// # Ok::<(), bs_engine::EngineError>(())
/// ```
pub fn premium(
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    rate: f64,
    volatility: f64,
    option_type: OptionType,
) -> EngineResult<f64> {
    OptionParameters::new(spot, strike, time_to_expiry, rate, volatility, option_type)?.premium()
}

/// Analytic Greeks in raw units (per unit of S, per year, per unit of σ and r).
///
/// Use [`greeks_in_units`] for per-percent or per-day scaling.
///
/// # Errors
///
/// [`EngineError::InvalidParameter`] under the same conditions as [`premium`].
pub fn greeks(
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    rate: f64,
    volatility: f64,
    option_type: OptionType,
) -> EngineResult<Greeks> {
    OptionParameters::new(spot, strike, time_to_expiry, rate, volatility, option_type)?.greeks()
}

/// Implied volatility of an observed premium.
///
/// # Errors
///
/// * [`EngineError::InvalidParameter`] for inputs outside their domain or an invalid `config`
/// * [`EngineError::ArbitrageViolation`] if the premium is outside the no-arbitrage bounds
/// * [`EngineError::ConvergenceFailure`] if `config.max_iterations` is exhausted
///
/// # Example
///
/// ```rust
/// use bs_engine::{implied_volatility, OptionType, SolverConfig};
///
/// let sigma = implied_volatility(
///     10046.0, 11000.0, 27.0 / 252.0, 0.02, 38.0,
///     OptionType::Call,
///     &SolverConfig::default(),
/// )?;
/// assert!((sigma - 0.2170691314697266).abs() < 1e-4);
/// # Ok::<(), bs_engine::EngineError>(())
/// ```
pub fn implied_volatility(
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    rate: f64,
    market_premium: f64,
    option_type: OptionType,
    config: &SolverConfig,
) -> EngineResult<f64> {
    implied_volatility_report(
        spot,
        strike,
        time_to_expiry,
        rate,
        market_premium,
        option_type,
        config,
    )
    .map(|report| report.implied_vol)
}

/// Like [`implied_volatility`], returning the iteration count, final residual and the
/// phase in which the solver converged.
pub fn implied_volatility_report(
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    rate: f64,
    market_premium: f64,
    option_type: OptionType,
    config: &SolverConfig,
) -> EngineResult<ImpliedVolReport> {
    ImpliedVolQuery::new(
        spot,
        strike,
        time_to_expiry,
        rate,
        market_premium,
        option_type,
    )?
    .solve(config)
}

/// Outcome of one quote in [`solve_chain`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChainResult {
    pub query: ImpliedVolQuery,
    /// ln(K/S)
    pub log_moneyness: f64,
    pub moneyness: Moneyness,
    /// |K − S| / S in percent
    pub moneyness_pct: f64,
    pub result: EngineResult<ImpliedVolReport>,
}

/// Inverts a batch of quotes.
///
/// A failure on one quote does not affect the others: each [`ChainResult`] carries its
/// own result. Results are sorted by strike in ascending order.
///
/// # Example
///
/// ```rust
/// use bs_engine::{default_configs, solve_chain, ImpliedVolQuery};
///
/// let quotes = vec![
///     ImpliedVolQuery::call(100.0, 110.0, 0.5, 0.01, 2.5)?,
///     ImpliedVolQuery::call(100.0, 90.0, 0.5, 0.01, 13.0)?,
/// ];
/// let chain = solve_chain(quotes, &default_configs::fast());
/// assert_eq!(chain[0].query.strike, 90.0);
/// assert!(chain.iter().all(|row| row.result.is_ok()));
/// # Ok::<(), bs_engine::EngineError>(())
/// ```
pub fn solve_chain(quotes: Vec<ImpliedVolQuery>, config: &SolverConfig) -> Vec<ChainResult> {
    let mut results = Vec::with_capacity(quotes.len());

    for query in quotes {
        let result = query.solve(config);
        if let Err(err) = &result {
            debug!(
                strike = query.strike,
                option_type = %query.option_type,
                error = %err,
                "quote failed to invert"
            );
        }
        let (bucket, distance_pct) = moneyness(query.option_type, query.spot, query.strike);

        results.push(ChainResult {
            query,
            log_moneyness: log_moneyness(query.strike, query.spot),
            moneyness: bucket,
            moneyness_pct: distance_pct,
            result,
        });
    }

    results.sort_by(|a, b| {
        a.query
            .strike
            .partial_cmp(&b.query.strike)
            .unwrap_or(Ordering::Equal)
    });
    results
}

//! Typed failures for pricing, Greeks and implied-volatility inversion.
//!
//! Every public operation returns [`EngineResult`]. Input validation always runs
//! before any arithmetic, so a malformed input surfaces as
//! [`EngineError::InvalidParameter`] rather than a `NaN` premium.

/// Errors produced by the pricing engine and the implied-volatility solver.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// An input was outside its domain (S, K, T not positive, σ negative,
    /// non-finite values, unknown option variant token, invalid solver config).
    #[error("invalid parameter: {message}")]
    InvalidParameter {
        /// Description of the offending parameter.
        message: String,
    },

    /// The observed premium cannot be produced by any non-negative volatility.
    #[error("premium {premium:.6} violates no-arbitrage bounds [{lower:.6}, {upper:.6})")]
    ArbitrageViolation {
        /// Observed market premium.
        premium: f64,
        /// Lower bound (discounted intrinsic value).
        lower: f64,
        /// Upper bound (S for calls, K·e^(−rT) for puts).
        upper: f64,
    },

    /// The solver exhausted its iteration budget without meeting the tolerance.
    #[error(
        "solver did not converge after {iterations} iterations, last estimate {last_estimate:.6}, residual {residual:.3e}"
    )]
    ConvergenceFailure {
        /// Number of iterations attempted.
        iterations: usize,
        /// Last volatility estimate before giving up.
        last_estimate: f64,
        /// `price(last_estimate) - market_premium`.
        residual: f64,
    },
}

impl EngineError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        EngineError::InvalidParameter {
            message: message.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::invalid("spot must be positive, got -1");
        assert_eq!(
            err.to_string(),
            "invalid parameter: spot must be positive, got -1"
        );

        let err = EngineError::ArbitrageViolation {
            premium: 120.0,
            lower: 0.0,
            upper: 100.0,
        };
        assert!(err.to_string().contains("no-arbitrage"));
        assert!(err.to_string().contains("120.000000"));

        let err = EngineError::ConvergenceFailure {
            iterations: 100,
            last_estimate: 0.25,
            residual: 1e-3,
        };
        let text = err.to_string();
        assert!(text.contains("100 iterations"));
        assert!(text.contains("0.250000"));
    }
}

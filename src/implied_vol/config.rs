use statrs::consts::SQRT_2PI;

use crate::error::{EngineError, EngineResult};

/// How the first volatility estimate is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InitialGuess {
    /// A fixed starting volatility.
    Fixed(f64),
    /// Brenner-Subrahmanyam: σ₀ ≈ √(2π/T) · premium / S, exact for ATM-forward options.
    BrennerSubrahmanyam,
}

impl InitialGuess {
    /// Raw seed before clamping into the bracket.
    pub fn seed(&self, spot: f64, time_to_expiry: f64, market_premium: f64) -> f64 {
        match *self {
            InitialGuess::Fixed(sigma) => sigma,
            InitialGuess::BrennerSubrahmanyam => {
                SQRT_2PI / time_to_expiry.sqrt() * market_premium / spot
            }
        }
    }
}

/// Root-finding strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SolverMethod {
    /// Newton-Raphson with a permanent switch to bisection when vega collapses.
    #[default]
    Hybrid,
    /// Bisection on the bracket from the first step.
    Bisection,
}

/// Implied-volatility solver configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct SolverConfig {
    /// Convergence threshold on |price(σ) − premium|
    #[cfg_attr(feature = "serde", serde(default = "default_tolerance"))]
    pub tolerance: f64,

    /// Iteration budget; each price evaluation counts as one iteration
    #[cfg_attr(feature = "serde", serde(default = "default_max_iterations"))]
    pub max_iterations: usize,

    #[cfg_attr(feature = "serde", serde(default = "default_initial_guess"))]
    pub initial_guess: InitialGuess,

    /// Admissible volatility range [σ_min, σ_max]
    #[cfg_attr(feature = "serde", serde(default = "default_bracket"))]
    pub bracket: (f64, f64),

    /// Below this |vega| Newton-Raphson is abandoned for bisection
    #[cfg_attr(feature = "serde", serde(default = "default_min_vega"))]
    pub min_vega: f64,

    #[cfg_attr(feature = "serde", serde(default))]
    pub method: SolverMethod,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
            initial_guess: default_initial_guess(),
            bracket: default_bracket(),
            min_vega: default_min_vega(),
            method: SolverMethod::default(),
        }
    }
}

impl SolverConfig {
    /// Tight tolerance with a generous budget for live pricing
    pub fn production() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 200,
            ..Self::default()
        }
    }

    /// The defaults: tolerance 1e-6, 100 iterations, seed 0.2
    pub fn fast() -> Self {
        Self::default()
    }

    /// Near machine-precision fit for research and validation
    pub fn research() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 500,
            initial_guess: InitialGuess::BrennerSubrahmanyam,
            ..Self::default()
        }
    }

    /// Loose tolerance for quick checks
    pub fn minimal() -> Self {
        Self {
            tolerance: 1e-4,
            max_iterations: 50,
            ..Self::default()
        }
    }

    /// Pure bisection on the classical [0.01%, 200%] volatility bracket
    pub fn bracketed() -> Self {
        Self {
            bracket: (1e-4, 2.0),
            method: SolverMethod::Bisection,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[must_use]
    pub fn with_initial_guess(mut self, initial_guess: InitialGuess) -> Self {
        self.initial_guess = initial_guess;
        self
    }

    #[must_use]
    pub fn with_bracket(mut self, min_vol: f64, max_vol: f64) -> Self {
        self.bracket = (min_vol, max_vol);
        self
    }

    #[must_use]
    pub fn with_min_vega(mut self, min_vega: f64) -> Self {
        self.min_vega = min_vega;
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: SolverMethod) -> Self {
        self.method = method;
        self
    }

    /// Checks that the configuration describes a runnable solve.
    pub fn validate(&self) -> EngineResult<()> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(EngineError::invalid(format!(
                "solver tolerance must be > 0 and finite, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(EngineError::invalid("solver max_iterations must be >= 1"));
        }
        let (lo, hi) = self.bracket;
        if !lo.is_finite() || !hi.is_finite() || lo < 0.0 || lo >= hi {
            return Err(EngineError::invalid(format!(
                "volatility bracket must satisfy 0 <= min < max, got [{lo}, {hi}]"
            )));
        }
        if self.min_vega.is_nan() || self.min_vega < 0.0 {
            return Err(EngineError::invalid(format!(
                "min_vega must be >= 0, got {}",
                self.min_vega
            )));
        }
        if let InitialGuess::Fixed(sigma) = self.initial_guess {
            if !sigma.is_finite() || sigma < 0.0 {
                return Err(EngineError::invalid(format!(
                    "initial volatility guess must be >= 0 and finite, got {sigma}"
                )));
            }
        }
        Ok(())
    }

    /// Parses and validates a TOML document; missing keys take their defaults.
    #[cfg(feature = "serde")]
    pub fn from_toml_str(source: &str) -> anyhow::Result<Self> {
        use anyhow::Context;

        let config: Self = toml::from_str(source).context("failed to parse solver config")?;
        config.validate().context("invalid solver config")?;
        Ok(config)
    }

    /// Reads a TOML solver configuration from disk.
    #[cfg(feature = "serde")]
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read solver config {}", path.display()))?;
        Self::from_toml_str(&source).with_context(|| format!("in {}", path.display()))
    }
}

fn default_tolerance() -> f64 {
    1e-6
}

fn default_max_iterations() -> usize {
    100
}

fn default_initial_guess() -> InitialGuess {
    InitialGuess::Fixed(0.2)
}

fn default_bracket() -> (f64, f64) {
    (1e-6, 5.0)
}

fn default_min_vega() -> f64 {
    1e-8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.tolerance, 1e-6);
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.initial_guess, InitialGuess::Fixed(0.2));
        assert_eq!(config.bracket, (1e-6, 5.0));
        assert_eq!(config.method, SolverMethod::Hybrid);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        for config in [
            SolverConfig::production(),
            SolverConfig::fast(),
            SolverConfig::research(),
            SolverConfig::minimal(),
            SolverConfig::bracketed(),
        ] {
            assert!(config.validate().is_ok(), "{config:?}");
        }
    }

    #[test]
    fn test_validation_rejects_bad_settings() {
        assert!(SolverConfig::default().with_tolerance(0.0).validate().is_err());
        assert!(SolverConfig::default().with_max_iterations(0).validate().is_err());
        assert!(SolverConfig::default().with_bracket(1.0, 0.5).validate().is_err());
        assert!(SolverConfig::default().with_bracket(-0.1, 0.5).validate().is_err());
        assert!(SolverConfig::default().with_min_vega(f64::NAN).validate().is_err());
        assert!(SolverConfig::default()
            .with_initial_guess(InitialGuess::Fixed(-0.2))
            .validate()
            .is_err());
    }

    #[test]
    fn test_brenner_subrahmanyam_seed() {
        // ATM-forward call: premium ≈ 0.4·S·σ·√T, so the seed recovers σ closely
        let seed = InitialGuess::BrennerSubrahmanyam.seed(100.0, 1.0, 7.965_567_455_405_798);
        assert!((seed - 0.2).abs() < 1e-3, "seed {seed}");
        assert_eq!(InitialGuess::Fixed(0.3).seed(100.0, 1.0, 5.0), 0.3);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_toml_str() {
        let config = SolverConfig::from_toml_str(
            r#"
            tolerance = 1e-8
            max_iterations = 60
            initial_guess = "brenner_subrahmanyam"
            bracket = [0.001, 3.0]
            method = "hybrid"
            "#,
        )
        .unwrap();
        assert_eq!(config.tolerance, 1e-8);
        assert_eq!(config.max_iterations, 60);
        assert_eq!(config.initial_guess, InitialGuess::BrennerSubrahmanyam);
        assert_eq!(config.bracket, (0.001, 3.0));
        assert_eq!(config.min_vega, 1e-8);

        let fixed = SolverConfig::from_toml_str("initial_guess = { fixed = 0.35 }").unwrap();
        assert_eq!(fixed.initial_guess, InitialGuess::Fixed(0.35));

        assert!(SolverConfig::from_toml_str("tolerance = -1.0").is_err());
        assert!(SolverConfig::from_toml_str("tolerence = 1e-6").is_err());
        assert_eq!(SolverConfig::from_toml_str("").unwrap(), SolverConfig::default());
    }
}

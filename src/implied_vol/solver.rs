//! Hybrid Newton-Raphson / bisection inversion of a premium curve.
//!
//! The solver is a small state machine. Each call to [`HybridSolver::step`]
//! performs exactly one price evaluation and returns the next state:
//!
//! ```text
//!   NewtonStep ──(|residual| < tol)──────────────▶ Converged
//!       │  └───(vega usable, step inside bracket)──▶ NewtonStep
//!       └──────(vega collapsed / step escaped)────▶ BisectionStep
//!   BisectionStep ──(|residual| < tol)───────────▶ Converged
//!       └────────────────────────────────────────▶ BisectionStep
//!   any non-terminal state, budget spent ────────▶ Failed
//! ```
//!
//! Every evaluation, Newton or bisection, tightens a tracked bracket using the
//! monotonicity of the premium in σ, so a switch to bisection never discards
//! what Newton-Raphson has already learned.

use tracing::{debug, trace};

use crate::error::{EngineError, EngineResult};
use crate::implied_vol::config::{SolverConfig, SolverMethod};
use crate::implied_vol::types::{ImpliedVolQuery, ImpliedVolReport, SolverPhase, SolverState};
use crate::models::traits::PriceCurve;

/// Drives [`SolverState`] transitions for one target premium.
pub struct HybridSolver<'a, C: PriceCurve> {
    curve: &'a C,
    target: f64,
    config: &'a SolverConfig,
    lower: f64,
    upper: f64,
    last_sigma: f64,
    last_residual: f64,
    iterations: usize,
}

impl<'a, C: PriceCurve> HybridSolver<'a, C> {
    pub fn new(curve: &'a C, target: f64, config: &'a SolverConfig) -> Self {
        let (lower, upper) = config.bracket;
        Self {
            curve,
            target,
            config,
            lower,
            upper,
            last_sigma: f64::NAN,
            last_residual: f64::NAN,
            iterations: 0,
        }
    }

    /// Price evaluations performed so far.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Tightest bracket known to contain the root.
    pub fn bracket(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    /// First state for a raw seed, clamped into the configured bracket.
    pub fn initial_state(&mut self, seed: f64) -> SolverState {
        let (min_vol, max_vol) = self.config.bracket;
        let sigma = if seed.is_finite() {
            seed.clamp(min_vol, max_vol)
        } else {
            0.5 * (min_vol + max_vol)
        };
        self.last_sigma = sigma;
        match self.config.method {
            SolverMethod::Hybrid => SolverState::NewtonStep { sigma },
            SolverMethod::Bisection => SolverState::BisectionStep {
                lower: min_vol,
                upper: max_vol,
            },
        }
    }

    /// Evaluates the curve at `sigma` and folds the result into the bracket.
    fn evaluate(&mut self, sigma: f64) -> f64 {
        let residual = self.curve.price(sigma) - self.target;
        self.iterations += 1;
        self.last_sigma = sigma;
        self.last_residual = residual;
        if residual > 0.0 {
            self.upper = self.upper.min(sigma);
        } else {
            self.lower = self.lower.max(sigma);
        }
        residual
    }

    fn switch_to_bisection(&self, reason: &'static str) -> SolverState {
        debug!(
            reason,
            iteration = self.iterations,
            lower = self.lower,
            upper = self.upper,
            "switching to bisection"
        );
        SolverState::BisectionStep {
            lower: self.lower,
            upper: self.upper,
        }
    }

    /// Advances the machine by one price evaluation.
    ///
    /// Terminal states are returned unchanged. A non-terminal state with the
    /// iteration budget already spent becomes [`SolverState::Failed`].
    pub fn step(&mut self, state: SolverState) -> SolverState {
        if state.is_terminal() {
            return state;
        }
        if self.iterations >= self.config.max_iterations {
            return SolverState::Failed {
                last_estimate: self.last_sigma,
                residual: self.last_residual,
            };
        }

        match state {
            SolverState::NewtonStep { sigma } => {
                let residual = self.evaluate(sigma);
                trace!(iteration = self.iterations, sigma, residual, "newton");
                if residual.abs() < self.config.tolerance {
                    return SolverState::Converged {
                        sigma,
                        phase: SolverPhase::Newton,
                    };
                }

                let vega = self.curve.vega(sigma);
                if !vega.is_finite() || vega.abs() < self.config.min_vega {
                    return self.switch_to_bisection("vega below threshold");
                }

                let next = sigma - residual / vega;
                if !next.is_finite() {
                    return self.switch_to_bisection("non-finite newton step");
                }
                // the tracked bracket never leaves the configured one
                if next <= self.lower || next >= self.upper {
                    return self.switch_to_bisection("newton step left bracket");
                }
                SolverState::NewtonStep { sigma: next }
            }
            SolverState::BisectionStep { lower, upper } => {
                let mid = 0.5 * (lower + upper);
                let residual = self.evaluate(mid);
                trace!(iteration = self.iterations, sigma = mid, residual, "bisection");
                if residual.abs() < self.config.tolerance {
                    return SolverState::Converged {
                        sigma: mid,
                        phase: SolverPhase::Bisection,
                    };
                }
                if residual > 0.0 {
                    SolverState::BisectionStep { lower, upper: mid }
                } else {
                    SolverState::BisectionStep { lower: mid, upper }
                }
            }
            terminal => terminal,
        }
    }

    /// Runs from `seed` to a terminal state.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidParameter`] if the configuration is invalid
    /// - [`EngineError::ConvergenceFailure`] if the budget runs out first
    pub fn run(&mut self, seed: f64) -> EngineResult<ImpliedVolReport> {
        self.config.validate()?;
        let mut state = self.initial_state(seed);
        loop {
            match state {
                SolverState::Converged { sigma, phase } => {
                    debug!(
                        iterations = self.iterations,
                        sigma,
                        ?phase,
                        "implied volatility converged"
                    );
                    return Ok(ImpliedVolReport {
                        implied_vol: sigma,
                        iterations: self.iterations,
                        residual: self.last_residual,
                        phase,
                    });
                }
                SolverState::Failed {
                    last_estimate,
                    residual,
                } => {
                    return Err(EngineError::ConvergenceFailure {
                        iterations: self.iterations,
                        last_estimate,
                        residual,
                    });
                }
                pending => state = self.step(pending),
            }
        }
    }
}

/// Inverts the Black-Scholes premium of `query` for σ.
///
/// Validates the query and configuration, rejects premiums outside the
/// no-arbitrage range, then runs the hybrid solver from the configured seed.
///
/// # Errors
///
/// - [`EngineError::InvalidParameter`] for bad inputs or configuration
/// - [`EngineError::ArbitrageViolation`] if no σ ≥ 0 reproduces the premium
/// - [`EngineError::ConvergenceFailure`] if the iteration budget is exhausted
pub fn solve(query: &ImpliedVolQuery, config: &SolverConfig) -> EngineResult<ImpliedVolReport> {
    query.validate()?;
    config.validate()?;

    let bounds = query.bounds()?;
    if !bounds.admits(query.market_premium, config.tolerance) {
        return Err(EngineError::ArbitrageViolation {
            premium: query.market_premium,
            lower: bounds.lower,
            upper: bounds.upper,
        });
    }

    let seed = config
        .initial_guess
        .seed(query.spot, query.time_to_expiry, query.market_premium);
    HybridSolver::new(query, query.market_premium, config).run(seed)
}

impl ImpliedVolQuery {
    /// Implied volatility with solver diagnostics; see [`solve`].
    pub fn solve(&self, config: &SolverConfig) -> EngineResult<ImpliedVolReport> {
        solve(self, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::implied_vol::config::InitialGuess;

    /// price(σ) = slope·σ, a curve Newton-Raphson solves in one step.
    struct Linear {
        slope: f64,
    }

    impl PriceCurve for Linear {
        fn price(&self, sigma: f64) -> f64 {
            self.slope * sigma
        }

        fn vega(&self, _sigma: f64) -> f64 {
            self.slope
        }
    }

    /// Monotone curve whose reported vega is always zero.
    struct FlatVega;

    impl PriceCurve for FlatVega {
        fn price(&self, sigma: f64) -> f64 {
            sigma * sigma
        }

        fn vega(&self, _sigma: f64) -> f64 {
            0.0
        }
    }

    /// Reports a vega far too large, so Newton crawls.
    struct Sluggish;

    impl PriceCurve for Sluggish {
        fn price(&self, sigma: f64) -> f64 {
            sigma
        }

        fn vega(&self, _sigma: f64) -> f64 {
            1e6
        }
    }

    #[test]
    fn test_newton_on_linear_curve() {
        let config = SolverConfig::default();
        let curve = Linear { slope: 10.0 };
        let mut solver = HybridSolver::new(&curve, 3.0, &config);

        let state = solver.initial_state(0.2);
        assert_eq!(state, SolverState::NewtonStep { sigma: 0.2 });
        let state = solver.step(state);
        match state {
            SolverState::NewtonStep { sigma } => assert!((sigma - 0.3).abs() < 1e-12),
            other => panic!("expected a newton step, got {other:?}"),
        }
        let state = solver.step(state);
        assert!(matches!(
            state,
            SolverState::Converged {
                phase: SolverPhase::Newton,
                ..
            }
        ));
        assert_eq!(solver.iterations(), 2);
    }

    #[test]
    fn test_zero_vega_switches_to_bisection() {
        let config = SolverConfig::default().with_bracket(0.0, 2.0);
        let mut solver = HybridSolver::new(&FlatVega, 0.25, &config);

        let state = solver.initial_state(1.0);
        let state = solver.step(state);
        // price(1.0) = 1.0 > 0.25 so 1.0 becomes the upper end
        assert_eq!(
            state,
            SolverState::BisectionStep {
                lower: 0.0,
                upper: 1.0
            }
        );

        let report = HybridSolver::new(&FlatVega, 0.25, &config).run(1.0).unwrap();
        assert_eq!(report.phase, SolverPhase::Bisection);
        assert!((report.implied_vol - 0.5).abs() < 1e-6, "{report:?}");
    }

    #[test]
    fn test_newton_escaping_bracket_switches_to_bisection() {
        struct Square;
        impl PriceCurve for Square {
            fn price(&self, sigma: f64) -> f64 {
                sigma * sigma
            }
            fn vega(&self, sigma: f64) -> f64 {
                2.0 * sigma
            }
        }

        let config = SolverConfig::default().with_bracket(0.0, 4.0);
        let mut solver = HybridSolver::new(&Square, 1.0, &config);
        let state = solver.step(SolverState::NewtonStep { sigma: 0.01 });
        // below target: lower end moves to 0.01, the step lands far above 4
        assert!(matches!(state, SolverState::BisectionStep { .. }));
        assert_eq!(solver.bracket(), (0.01, 4.0));
    }

    #[test]
    fn test_budget_exhaustion_fails() {
        let config = SolverConfig::default().with_max_iterations(5);
        let mut solver = HybridSolver::new(&Sluggish, 1.0, &config);
        let err = solver.run(0.2).unwrap_err();
        match err {
            EngineError::ConvergenceFailure {
                iterations,
                last_estimate,
                residual,
            } => {
                assert_eq!(iterations, 5);
                assert!(last_estimate < 0.21);
                assert!((residual - (last_estimate - 1.0)).abs() < 1e-12);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_terminal_states_are_fixed_points() {
        let config = SolverConfig::default();
        let curve = Linear { slope: 1.0 };
        let mut solver = HybridSolver::new(&curve, 0.5, &config);
        let done = SolverState::Converged {
            sigma: 0.5,
            phase: SolverPhase::Newton,
        };
        assert_eq!(solver.step(done), done);
        assert_eq!(solver.iterations(), 0);
    }

    #[test]
    fn test_bisection_method_skips_newton() {
        let config = SolverConfig::bracketed();
        let curve = Linear { slope: 10.0 };
        let mut solver = HybridSolver::new(&curve, 3.0, &config);
        assert_eq!(
            solver.initial_state(0.2),
            SolverState::BisectionStep {
                lower: 1e-4,
                upper: 2.0
            }
        );
        let report = solver.run(0.2).unwrap();
        assert_eq!(report.phase, SolverPhase::Bisection);
        assert!((report.implied_vol - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_solve_literal_scenario() {
        let query = ImpliedVolQuery::call(10046.0, 11000.0, 27.0 / 252.0, 0.02, 38.0).unwrap();
        let report = solve(&query, &SolverConfig::default()).unwrap();
        assert!(
            (report.implied_vol - 0.217_069_131_469_726_6).abs() < 1e-4,
            "{report:?}"
        );
        assert!(report.residual.abs() < 1e-6);
        assert_eq!(report.phase, SolverPhase::Newton);
    }

    #[test]
    fn test_solve_with_brenner_seed() {
        let query = ImpliedVolQuery::put(100.0, 95.0, 0.5, 0.01, 4.2).unwrap();
        let config = SolverConfig::default().with_initial_guess(InitialGuess::BrennerSubrahmanyam);
        let report = query.solve(&config).unwrap();
        let repriced = query.parameters(report.implied_vol).premium().unwrap();
        assert!((repriced - 4.2).abs() < 1e-6);
    }

    #[test]
    fn test_solve_rejects_arbitrage() {
        // call worth less than its discounted intrinsic value
        let query = ImpliedVolQuery::call(120.0, 100.0, 1.0, 0.05, 5.0).unwrap();
        match solve(&query, &SolverConfig::default()) {
            Err(EngineError::ArbitrageViolation {
                premium,
                lower,
                upper,
            }) => {
                assert_eq!(premium, 5.0);
                assert!(lower > 24.0);
                assert_eq!(upper, 120.0);
            }
            other => panic!("expected arbitrage violation, got {other:?}"),
        }

        let above = ImpliedVolQuery::call(100.0, 100.0, 1.0, 0.05, 100.0).unwrap();
        assert!(matches!(
            solve(&above, &SolverConfig::default()),
            Err(EngineError::ArbitrageViolation { .. })
        ));
    }

    #[test]
    fn test_run_validates_config() {
        let config = SolverConfig::default().with_max_iterations(0);
        let curve = Linear { slope: 10.0 };
        let result = HybridSolver::new(&curve, 3.0, &config).run(0.2);
        assert!(
            matches!(result, Err(EngineError::InvalidParameter { .. })),
            "{result:?}"
        );
    }

    #[test]
    fn test_solve_rejects_invalid_config() {
        let query = ImpliedVolQuery::call(100.0, 100.0, 1.0, 0.05, 10.0).unwrap();
        let config = SolverConfig::default().with_tolerance(-1.0);
        assert!(matches!(
            solve(&query, &config),
            Err(EngineError::InvalidParameter { .. })
        ));
    }
}

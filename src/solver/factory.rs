use crate::domain::{
    solver_service::{Result, SolverError, SolverService},
    value_objects::SolverBackend,
};
use std::sync::Arc;

#[cfg(feature = "coin_cbc")]
use crate::solver::CoinCbcSolver;
#[cfg(feature = "highs")]
use crate::solver::HighsSolver;

/// Factory for creating solver instances based on configuration
pub struct SolverFactory;

impl SolverFactory {
    /// Create a solver for a specific backend
    ///
    /// Fails with [`SolverError::SolverNotAvailable`] when the backend was not
    /// compiled into this build.
    pub fn create_from_backend(backend: SolverBackend) -> Result<Arc<dyn SolverService>> {
        match backend {
            SolverBackend::Auto => Self::default_solver(),
            #[cfg(feature = "highs")]
            SolverBackend::Highs => Ok(Arc::new(HighsSolver::new())),
            #[cfg(feature = "coin_cbc")]
            SolverBackend::CoinCbc => Ok(Arc::new(CoinCbcSolver::new())),
            #[allow(unreachable_patterns)]
            other => Err(SolverError::SolverNotAvailable(format!(
                "{} support is not compiled into this build",
                other
            ))),
        }
    }

    /// Get the default solver (HiGHS, then CBC)
    pub fn default_solver() -> Result<Arc<dyn SolverService>> {
        #[cfg(feature = "highs")]
        return Ok(Arc::new(HighsSolver::new()));

        #[cfg(all(not(feature = "highs"), feature = "coin_cbc"))]
        return Ok(Arc::new(CoinCbcSolver::new()));

        #[cfg(not(any(feature = "highs", feature = "coin_cbc")))]
        Err(SolverError::SolverNotAvailable(
            "no solver backend is compiled into this build".to_string(),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[cfg(feature = "highs")]
    #[test]
    fn test_auto_selects_highs() {
        let solver = SolverFactory::create_from_backend(SolverBackend::Auto).unwrap();
        assert_eq!(solver.name(), "HiGHS");
        assert!(solver.supports_mip());
    }

    #[cfg(not(feature = "coin_cbc"))]
    #[test]
    fn test_missing_backend_is_reported() {
        assert!(matches!(
            SolverFactory::create_from_backend(SolverBackend::CoinCbc),
            Err(SolverError::SolverNotAvailable(_))
        ));
    }
}

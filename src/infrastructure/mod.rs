// Infrastructure: batch files and the concurrent runner

pub mod runner;

pub use runner::{load_batch, run_batch, Batch, RunnerError, ScenarioReport, ScenarioRequest};

// Domain module: modeling primitives, pricing and the solver contract

pub mod cost_model;
pub mod linearizer;
pub mod models;
pub mod problem_builder;
pub mod solver_service;
pub mod value_objects;

pub use cost_model::*;
pub use models::*;
pub use problem_builder::{ModelError, ProblemBuilder};
pub use solver_service::*;
pub use value_objects::*;

//! Scoring network and its loss helpers.

pub mod loss;
pub mod network;

pub use loss::{binary_cross_entropy, output_delta, squared_error};
pub use network::{NetworkParameters, ScoringNetwork};

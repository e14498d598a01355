//! Type definitions for the soil sample service

pub mod prediction;
pub mod soil_sample;

pub use prediction::Prediction;
pub use soil_sample::{NewSoilSample, SoilSample, SoilSamplePatch};

pub mod decision;
pub mod engine;
pub mod error;
pub mod hydrator;
mod maintenance;

pub use decision::{ceil_secs, Decision, UsageReport};
pub use engine::AdmissionEngine;
pub use error::AdmissionError;
pub use hydrator::{HydrationReport, Hydrator};

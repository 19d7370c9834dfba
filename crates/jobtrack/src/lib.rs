//! Job-seeker portal core: application lifecycle tracking and CV completeness scoring.

pub mod clock;
pub mod config;
pub mod error;
pub mod profile;
pub mod session;
pub mod telemetry;
pub mod tracking;

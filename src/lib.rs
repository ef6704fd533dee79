//! Data model and computations for scraped Student Registration System records:
//! identifier normalization, the weekly schedule grid, and GPA/CGPA aggregation.

pub mod config;
pub mod error;
pub mod gpa;
pub mod import;
pub mod models;
pub mod normalize;
pub mod report;
pub mod schedule;

pub use error::SrsError;

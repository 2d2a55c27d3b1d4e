#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// #![warn(clippy::cargo)]

pub mod calibration;
pub mod config;
pub mod dataset;
pub mod error;
pub mod math;
pub mod pipeline;
pub mod report;
pub mod resolve;

pub use error::Error;

pub type Result<T> = ::std::result::Result<T, Box<dyn ::std::error::Error>>;

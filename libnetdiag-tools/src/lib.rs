mod config;
mod duration;
mod error;

pub use config::Config;
pub use duration::{Duration, MICROS_PER_SEC};
pub use error::*;

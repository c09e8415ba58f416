#![forbid(unsafe_code)]

pub mod model;
pub mod narrative;
pub mod time;

pub use time::Clock;

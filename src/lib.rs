pub mod config;
pub mod data;
pub mod describe;
pub mod error;
pub mod evaluate;
pub mod family;
pub mod forecast;
pub mod gamlss;
pub mod pipeline;
#[cfg(feature = "plots")]
pub mod plot;
pub mod report;
pub mod stats;

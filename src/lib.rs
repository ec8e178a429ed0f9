#![forbid(unsafe_code)]

pub mod app;
pub mod chart;
pub mod cli;
pub mod coerce;
pub mod document;
pub mod export;
pub mod fetch;
pub mod formats;
pub mod logging;
pub mod normalize;
pub mod query;
pub mod raw_store;
pub mod scrape;

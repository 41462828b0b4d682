pub mod builder;
pub mod config;
pub mod constants;
pub mod geo;
pub mod handles;
pub mod map;
pub mod registry;
pub mod viewport;

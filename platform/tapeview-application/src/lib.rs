pub mod config;
pub mod frame;
pub mod pipeline;
pub mod validation;

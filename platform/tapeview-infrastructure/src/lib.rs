pub mod render;
pub mod tick_log;

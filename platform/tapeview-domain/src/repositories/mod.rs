pub mod render_sink;
pub mod tick_log;

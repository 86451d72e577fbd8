pub mod indicators;
pub mod ohlcv;
pub mod stats;
pub mod tick_reader;

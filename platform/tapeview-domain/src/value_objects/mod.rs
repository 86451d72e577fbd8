pub mod bar;
pub mod drawing;
pub mod indicator_row;
pub mod quote;
pub mod symbol;
pub mod tick;
pub mod timeframe;

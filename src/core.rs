pub mod aggregator;
pub mod cost;
pub mod day_color;
pub mod direction;
pub mod engine;
pub mod merger;
pub mod reading;
pub mod rule;
pub mod statistic;
pub mod timestamp;
pub mod window;

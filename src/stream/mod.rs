pub mod consumer;
pub mod counters;

pub use consumer::StreamConsumer;
pub use counters::Counters;

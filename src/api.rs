pub mod gateway;
pub mod heartbeat;
pub mod recorder;
pub mod store;

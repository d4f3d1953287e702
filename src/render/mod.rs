pub mod composite;
pub mod coordinator;
pub mod frames;
pub mod job;
pub mod protocol;
pub mod worker;

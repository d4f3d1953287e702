pub mod arrival;
pub mod ease;

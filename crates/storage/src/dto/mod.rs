pub mod common;
pub mod identity;
pub mod ranking;

pub mod identity;
pub mod ranking;
pub mod rating;

mod identity;
mod rating;

pub use identity::{Identity, IdentityId, UpsertOutcome};
pub use rating::{RatingSnapshot, RatingValues, SnapshotRow};

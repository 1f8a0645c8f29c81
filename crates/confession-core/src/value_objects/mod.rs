//! Value objects - immutable types that represent domain concepts

mod change_kinds;
mod ids;

pub use change_kinds::ChangeKinds;
pub use ids::{IdParseError, PostId, ViewerId};

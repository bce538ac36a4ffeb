pub mod model;
pub mod record;

pub use model::{InvocationModel, OutcomeCategory, TargetOutcome};
pub use record::*;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

//! Message dispatch: category selection plus handler delegation.

pub mod dispatcher;
pub mod traits;

pub use dispatcher::{DefaultDispatcher, DEGRADED_REPLY};
pub use traits::{DispatchOutcome, Dispatcher};

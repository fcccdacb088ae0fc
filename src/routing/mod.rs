//! Intent routing: fixed category set, ordered keyword rules, total
//! resolution with a configurable fallback.

pub mod classifier;
pub mod traits;

pub use classifier::KeywordClassifier;
pub use traits::{Category, IntentClassifier, IntentRule, Route, RouteDecision};

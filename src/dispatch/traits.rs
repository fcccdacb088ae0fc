//! Dispatch trait and types: one message in, one categorized reply out.

use crate::routing::Category;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The category actually used for a message plus the produced reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub category: Category,
    pub reply: String,
}

/// Routes one message to its handler and records the exchange.
///
/// Handler failures never abort the session: they are caught at this
/// boundary and converted into a visible in-band failure reply.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Produce a reply for `input` within `session_id`. A `hint`
    /// short-circuits classification (explicit UI-selected category).
    ///
    /// Side effect: appends the user turn and the assistant turn to the
    /// session's log, both tagged with the resolved category.
    async fn dispatch(
        &self,
        session_id: &str,
        input: &str,
        hint: Option<Category>,
    ) -> Result<DispatchOutcome>;

    /// The name of this dispatcher implementation.
    fn name(&self) -> &str;
}

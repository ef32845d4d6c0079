//! The dispatch core: from one utterance to one rendered reply.
//!
//! Each turn follows the same path:
//!
//! 1. **Assemble** the prompt (profile → tool manifest → history → utterance)
//! 2. **Resolve** it into a `Decision` with one intent-service call
//! 3. **Dispatch** the decision: validate name and arity, run the tool
//! 4. **Record** the exchange in the session history and the journal
//!
//! Nothing in this path returns an error to the caller. Every failure becomes
//! a `DispatchResult` the user can read, and the only recovery is to rephrase.

pub mod bootstrap;
pub mod context;
pub mod dispatcher;
pub mod resolver;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{AssembledPrompt, ContextAssembler};
pub use dispatcher::{DispatchResult, Dispatcher};
pub use resolver::{IntentResolver, Resolution};
pub use session::{Orchestrator, Session};

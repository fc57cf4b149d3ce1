//! Push notification delivery for the anchor watch monitor.
//!
//! - [`PushMessage`] -- a fully composed alert ready to send.
//! - [`delivery`] -- external delivery channels (Pushover).
//! - [`AlertDispatcher`] -- background task that hands every queued alert to
//!   the channel without making the engine wait.

pub mod delivery;
pub mod dispatcher;
pub mod message;

pub use delivery::pushover::{PushoverConfig, PushoverDelivery, PushoverError, PushoverReceipt};
pub use dispatcher::AlertDispatcher;
pub use message::PushMessage;

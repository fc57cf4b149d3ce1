//! Shared types for the anchor watch monitor.
//!
//! This crate has zero internal dependencies so that the Signal K client,
//! the push delivery crate, and the agent can all agree on path names,
//! notification states, and alert delivery parameters.

pub mod alert;
pub mod notification_state;
pub mod paths;

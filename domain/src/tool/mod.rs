//! Tool authorization
//!
//! Agents may declare which tools they are allowed to invoke. The
//! [`ToolAllowlist`] is consulted before any tool call is issued on an
//! agent's behalf.

pub mod allowlist;

pub use allowlist::{AllowDecision, ToolAllowlist, ToolDenied, ToolPolicy};

//! Trello REST access
//!
//! Only the credential seam lives here: attaching `key`/`token` to a
//! request and checking that a credential is usable.

pub mod client;

pub use client::{Member, TrelloClient};

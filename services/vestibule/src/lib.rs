//! # Vestibule (Authentication & Registration Ceremonies)
//!
//! `vestibule` drives users through configurable, possibly branching,
//! multi-step credential ceremonies and issues signed session tokens on
//! completion. The server is stateless between steps: all ceremony progress
//! travels in a signed, short-lived continuation token the client echoes
//! back on every request.
//!
//! ## Ceremonies
//!
//! A ceremony is a tree of credential components combined with sequence
//! (all, in order) and choice (any one) nodes, e.g. email → password, or
//! policy → (passkey | email → otp). The [`ceremony`] crate holds the pure
//! algebra; this crate resolves "which step is next" against the ordered
//! list of steps the caller has already completed.
//!
//! ## Providers
//!
//! Each component id maps to an identity component provider implementing a
//! fixed capability set: prompt, verify, setup, validate, and an optional
//! skip decision for adaptive flows. Providers are external collaborators;
//! the core only dispatches.
//!
//! ## Registration
//!
//! Registration is two-phase: components are set up first and then
//! validated (e.g. an emailed code). Because no identity exists in storage
//! until the ceremony completes, drafts accumulate inside the continuation
//! token and materialize in a single conditional commit, which also enforces
//! global uniqueness of identifications such as email addresses.

pub mod api;
pub mod cli;
pub mod flow;
pub mod store;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

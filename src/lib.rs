//! # Gardisto (HTTP Access Control)
//!
//! `gardisto` enforces declared security constraints in front of an HTTP
//! request pipeline. A single [`gate::AccessControlStage`] sits between the
//! transport and the application handlers and decides, per request, whether
//! processing continues or halts with a challenge, redirect, or error.
//!
//! ## Processing Model
//!
//! - **Constraint resolution:** the realm maps each request path to the
//!   security constraints that apply. Unconstrained requests pass through
//!   untouched.
//! - **Identity restore:** authenticated principals are cached in the session
//!   and restored on later requests without re-running the scheme.
//! - **Schemes:** credential verification is pluggable (`BASIC`, `FORM`);
//!   schemes register verified identities back through the stage so caching
//!   and single sign-on behave identically for all of them.
//! - **Single sign-on:** an optional registry receives every verified login
//!   under a digest-derived token carried in a cookie.
//!
//! ## Fail-Closed
//!
//! Denials are always enforced. An audit observer that fails while vetoing a
//! *grant* converts the grant into a denial; failures on the denial path are
//! logged and swallowed.

pub mod api;
pub mod cli;
pub mod gate;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

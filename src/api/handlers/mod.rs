//! HTTP handlers for Ledgerly.
//!
//! `auth` owns login, sessions, and the route gate; `dashboard` owns the
//! invoice and customer data endpoints behind it.

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod root;

//! Router Module Index
//!
//! Splits routes by access level. The guard is applied to a whole module at once in
//! `create_router`, so a route's protection is decided by which file it lives in.

/// Routes reachable without a token (home, health, registration, login).
pub mod public;

/// Routes protected by the identity guard.
pub mod authenticated;

//! Auth types shared across Bazaar services.
//!
//! Provides JWT claims and access-token validation.

pub mod token;

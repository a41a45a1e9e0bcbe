//! Cryptographic helpers.

pub mod session_token;

//! Chat sessions, messages, and the inference round-trip.
//!
//! `ChatRepository` is the persistence port; `ChatService` owns the
//! ownership checks, the context window, and the title rule.

pub mod context;
pub mod repository;
pub mod service;
pub mod title;

#[cfg(test)]
pub(crate) mod testing;

//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the synchronous keyed store contract (`ReminderStore`).
//! - Expose the async, outcome-returning facade (`ReminderRepository`) that
//!   every other component reads and writes through.
//!
//! # Invariants
//! - The repository is the only writer of the store.
//! - "Not found" is an `Outcome::Error`, never a `StoreError`.
//! - Store faults on writes propagate as `StoreError` to the immediate caller.

pub mod outcome;
pub mod reminder_repository;
pub mod reminder_store;

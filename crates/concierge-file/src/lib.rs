//! concierge-file - File-backed session storage.
//!
//! [`FileSessionStore`] keeps the current session in memory and writes every
//! change through to a JSON file, so the next process starts logged in.

mod store;

pub use store::{FileSessionStore, write_private};

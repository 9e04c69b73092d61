//! Ports the client depends on.
//!
//! The client never talks to the network, the session storage, or the
//! application shell directly; it goes through these traits so each can be
//! swapped for a fake in tests.

mod navigator;
mod session_store;
mod transport;

pub use navigator::Navigator;
pub use session_store::SessionStore;
pub use transport::Transport;

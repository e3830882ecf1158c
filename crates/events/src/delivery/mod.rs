//! External delivery channels for tenant notifications.
//!
//! The outbox dispatcher uses these to push events outside the platform.

pub mod email;

//! REST surface for the wizard pipeline: session store, handlers, and the
//! HTTP/metrics servers.

pub mod rest;
pub mod server;
pub mod sessions;

pub use server::ApiServer;
pub use sessions::{Session, SessionStore};

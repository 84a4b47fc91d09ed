//! Shared data models for fwgate components

mod credentials;
mod download;
mod firmware;
mod session;

pub use credentials::*;
pub use download::*;
pub use firmware::*;
pub use session::*;

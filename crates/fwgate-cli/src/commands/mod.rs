//! Command implementations for fwgate

pub mod dev;
pub mod device;
pub mod ipsw;
pub mod resolve;
pub mod traits;

pub use dev::dev;
pub use device::{device_get, device_list};
pub use ipsw::{ipsw_get, ipsw_version};
pub use resolve::{resolve_build, resolve_version};
pub use traits::traits;

//! Device-trait resolver
//!
//! Looks up hardware traits (architecture, artwork idiom, memory class,
//! graphics feature set) for Apple devices from a gzip-compressed JSON
//! dataset. The dataset ships inside the binary; a file with the same
//! format can be swapped in through [`FileTraits`].
//!
//! # Example
//!
//! ```rust,no_run
//! use fwgate_traits::DeviceTraitResolver;
//!
//! let resolver = DeviceTraitResolver::embedded();
//! let device = resolver.find_by_product_type("iPhone10,3")?;
//! println!("{} is {}", device.target, device.traits.preferred_architecture);
//! # Ok::<(), fwgate_core::Error>(())
//! ```

mod product;
mod record;
mod resolver;
mod source;

pub use product::{sort_by_product_type, ProductType};
pub use record::{DeviceRecord, DeviceTrait};
pub use resolver::DeviceTraitResolver;
pub use source::{EmbeddedTraits, FileTraits, TraitSource};

pub use fwgate_core::{Error, Result};

//! Hardware abstraction layer for the diskpart shell.
//!
//! Everything that touches real devices (spawning partitioning tools, reading sysfs,
//! mounting) lives behind the traits in [`hal`], so the interpreter can be driven
//! against [`FakeHal`] in tests.

mod error;
pub mod hal;
pub mod lsblk;
pub mod path;
pub mod sysfs;

pub use error::{HalError, HalResult};
pub use hal::*;

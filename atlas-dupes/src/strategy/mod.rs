//! Container source strategies.
//!
//! Only the filesystem strategy exists today. The analyzer itself takes any
//! [`crate::ContainerLoader`], so an embedding host can feed it directly
//! without going through this module.

pub mod fs;

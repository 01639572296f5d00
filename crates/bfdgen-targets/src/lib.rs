//! Build-host platform model and linking policy for bfdgen.
//!
//! The libraries that must accompany libbfd/libopcodes at link time depend
//! on the host operating system and pointer width. A [`PlatformPolicy`] is
//! resolved once per build from a [`HostPlatform`] and stays fixed for the
//! rest of the run.

pub mod error;
pub mod host;
pub mod policy;

pub use error::TargetError;
pub use host::HostPlatform;
pub use policy::PlatformPolicy;

//! Source generation for bfdgen.
//!
//! All renderers are pure string formatting over an ordered slice of
//! [`ArchitectureEntry`](bfdgen_core::ArchitectureEntry): identical input
//! yields byte-identical output. Only supported entries are emitted.
//!
//! - [`c_source`]: the probe translation unit compiled by the bootstrap step
//! - [`c_header`]: the supported-architecture header for extension builds
//! - [`registry`]: bootstrap output parsing and the registry data module

pub mod c_header;
pub mod c_source;
pub mod error;
pub mod names;
pub mod registry;

pub use c_header::render_c_header;
pub use c_source::render_c_source;
pub use error::CodegenError;
pub use registry::{parse_bootstrap_output, render_registry, RegistryRow};

//! Core data model for bfdgen.
//!
//! bfdgen discovers which instruction-set architectures an installed
//! libbfd/libopcodes build actually supports. This crate holds the pieces
//! every stage shares:
//!
//! - [`model`]: machine identifiers, library descriptors, architecture entries
//! - [`naming`]: mapping between machine identifiers and disassembler hook symbols
//! - [`header`]: textual extraction of machine identifiers from `bfd.h`-style headers
//! - [`hash`]: content digests for generated artifacts

pub mod error;
pub mod hash;
pub mod header;
pub mod model;
pub mod naming;

pub use error::{CoreError, HeaderError};
pub use header::{extract, extract_str, HeaderGrammar};
pub use model::{ArchitectureEntry, LibraryDescriptor, LibraryKind, MachineIdentifier};
pub use naming::{PrefixConvention, SymbolConvention};

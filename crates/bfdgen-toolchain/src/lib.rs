//! External tool invocation for bfdgen.
//!
//! Every process the pipeline spawns (`nm`, the C compiler, the bootstrap
//! executable) goes through the [`ToolRunner`] capability so callers can
//! substitute deterministic fakes for real toolchains.
//!
//! ## Modules
//!
//! - [`runner`]: the `ToolRunner` trait and the `std::process` implementation
//! - [`symbols`]: symbol-table listing and disassembler hook probing
//! - [`bootstrap`]: compile, link and run the generated probe program

pub mod bootstrap;
pub mod error;
pub mod runner;
pub mod symbols;

pub use bootstrap::{compile_and_run, BootstrapRequest, LinkPlan};
pub use error::ToolchainError;
pub use runner::{SystemRunner, ToolOutput, ToolRunner};
pub use symbols::{HookMatch, SymbolProber, SymbolTable};

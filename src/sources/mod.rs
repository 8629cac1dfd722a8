//! External sources of module information.
//!
//! The `go` toolchain answers questions about local modules and the module
//! proxy; remote git repositories are asked for their tags directly.

pub mod git;
pub mod toolchain;

pub use git::{Git2RefLister, RefLister};
pub use toolchain::{GoToolchain, ModuleInfo, DEFAULT_GOPROXY};

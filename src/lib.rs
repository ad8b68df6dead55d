//! typewrap: runtime argument and return type checking for dynamically-typed callables.
//!
//! A callable is wrapped together with its declared parameters and a type
//! signature. Each call checks the arguments the caller supplied before the
//! callable runs and checks its result afterwards. Arguments the caller omits
//! are never seen, so defaults the callable fills in are never checked.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod demos;
pub mod error;
#[cfg(feature = "python")]
pub mod parser;
pub mod signature;
pub mod types;
pub mod wrapper;

/// Re-exports commonly used types and traits.
pub mod prelude {
    pub use crate::error::{ArgumentSlot, Error, Result};
    pub use crate::signature::{ParamKind, ParameterDescriptor, Parameters, TypeSignature};
    pub use crate::types::{Type, Value};
    pub use crate::wrapper::{method_fn, wrap, CallArguments, Method, WrappedCallable};
}

/// Runs every guarded demonstration, printing to standard output.
pub fn run() -> crate::error::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    demos::run_all(&mut out)
}

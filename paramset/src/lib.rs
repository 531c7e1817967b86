//! Symbolic parameter sets with safe expression evaluation.
//!
//! A [`Registry`] holds named fields in definition order. Text fields may
//! reference other fields with `${name}` placeholders and use a small
//! arithmetic grammar (with arrays, slicing, transpose, and matrix
//! multiplication); [`resolve`] orders the definitions by dependency and
//! evaluates them one by one in a sandbox, tolerating undefined or broken
//! fields without aborting the rest. [`render`] substitutes the resolved
//! values into free-form text.
//!
//! ```
//! use paramset::{resolve, Registry, ResolveMode, Value};
//!
//! let mut reg = Registry::new();
//! reg.set("radius", 2);
//! reg.set("area", "pi * ${radius}^2");
//!
//! let (resolved, diags) = resolve(&reg, ResolveMode::Strict)?;
//! assert!(diags.is_empty());
//! assert!(matches!(resolved.get("area")?, Value::Float(_)));
//! # Ok::<(), paramset::Error>(())
//! ```

pub mod array;
pub mod error;
pub mod escape;
pub mod expr;
pub mod file;
pub mod funcs;
pub mod registry;
pub mod sort;
pub mod template;
pub mod value;

pub use array::{AxisIndex, Indexed, NdArray};
pub use error::{Diagnostic, Error};
pub use expr::EvalContext;
pub use registry::{Registry, RESERVED};
pub use sort::{references, sort_definitions, ResolveMode};
pub use template::{render, resolve};
pub use value::{ArithOp, Value};

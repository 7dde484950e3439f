//! Three-address code intermediate representation and the traversal infrastructure shared by
//! its backends.

pub mod error;
mod ext;
pub mod il;
mod prelude;
pub mod types;

#[cfg(test)]
mod testing;

pub use error::IrError;

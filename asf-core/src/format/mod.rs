//! Binary formats handled by the tooling.
//!
//! Only the ASF script container lives here; the bytecode inside it is handled by [`crate::disasm`].

pub mod asf;

pub use asf::{AsfContainer, FormatError};

//! Record types and the column storage they are buffered in.

pub mod color;
pub mod columns;
pub mod records;

pub use color::*;
pub use columns::*;
pub use records::*;

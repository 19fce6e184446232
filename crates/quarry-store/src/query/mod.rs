//! Filter expression language shared by every store backend.

mod eval;
mod parser;

pub use parser::{Bound, Clause, Field, Filter, RangeValue};

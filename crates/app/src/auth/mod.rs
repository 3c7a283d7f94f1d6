//! Stateless resumption of verified nominations.

mod resume;

pub use resume::*;

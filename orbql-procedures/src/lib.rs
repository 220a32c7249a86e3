//! Procedures bundled with orbql: a small math library and a sequence-fetch
//! stand-in, each exposing a `register` function invoked from the server's
//! registry manifest.

pub mod math;
pub mod sequence_fetch;

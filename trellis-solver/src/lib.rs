//! Lowers canonical constraint models onto the in-process engine or onto MiniZinc.
//!
//! This crate re-exports [`trellis_core`]; the engine behind the API backend is available as
//! [`engine`].
pub use trellis_core::*;
pub use trellis_engine as engine;

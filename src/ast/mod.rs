//! Abstract syntax tree for HILO modules.
//!
//! Every grammar family gets one tagged-variant type; each variant carries
//! exactly the payload its alternative needs, plus a span covering its full
//! source extent. The tree is built once per parse call and never mutated.

pub mod declarations;
pub mod expressions;
pub mod module;
pub mod patterns;
pub mod statements;
pub mod types;

//! Generator adapters.

mod simple;

pub use simple::SimpleGenerator;

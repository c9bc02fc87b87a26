mod backend;
mod streaming;

pub use backend::*;
pub use streaming::*;

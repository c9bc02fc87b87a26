mod box_mesh;
mod matrix;
mod preview;
mod shading;

pub use box_mesh::*;
pub use matrix::*;
pub use preview::*;
pub use shading::*;

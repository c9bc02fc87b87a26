pub mod pricing;
pub mod renderer;
pub mod vk;

pub use glam::vec3;
pub use glam::vec4;
pub use glam::Vec3;
pub use glam::Vec4;

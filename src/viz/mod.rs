pub mod color;
pub mod projection;
pub mod render;

pub use projection::Projection;
pub use render::{should_render, RenderOptions, Renderer};

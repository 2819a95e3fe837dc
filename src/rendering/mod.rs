mod grid_pass;
mod imgui_renderer;
mod mesh_pass;
mod render_model;
pub mod renderer;
mod texture;

pub use renderer::Renderer;

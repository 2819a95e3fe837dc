pub mod object;
pub mod registry;
pub mod transform;

pub use object::{ObjectId, SceneObject};
pub use registry::ObjectRegistry;
pub use transform::Transform;

//! Rendering module
//!
//! Meshes for the grid, paddle and ball, drawn through a `GraphicsBackend`
//! with an orthographic projection over the world.

pub mod grid_mesh;
pub mod quad;
pub mod scene;
pub mod vertex;

pub use grid_mesh::GridMesh;
pub use quad::Quad;
pub use scene::{Scene, world_projection};
pub use vertex::{Vertex, colors};

//! Everything drawn each frame: grid, paddle and ball

use std::path::{Path, PathBuf};

use glam::Mat4;

use super::grid_mesh::GridMesh;
use super::quad::Quad;
use crate::consts::WORLD_HALF_EXTENTS;
use crate::error::GpuError;
use crate::gpu::{GraphicsBackend, Shader, ShaderSourceLoader};
use crate::handle::Handle;
use crate::sim::GameState;

/// Shader programs by name, each `<name>.vert.wgsl` + `<name>.frag.wgsl`
pub const PADDLE_SHADER: &str = "basic";
pub const BALL_SHADER: &str = "ball";
pub const GRID_SHADER: &str = "box";

/// Orthographic projection covering the whole world
pub fn world_projection() -> Mat4 {
    Mat4::orthographic_rh(
        -WORLD_HALF_EXTENTS.x,
        WORLD_HALF_EXTENTS.x,
        -WORLD_HALF_EXTENTS.y,
        WORLD_HALF_EXTENTS.y,
        -1.0,
        1.0,
    )
}

fn shader_paths(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{name}.vert.wgsl")),
        dir.join(format!("{name}.frag.wgsl")),
    )
}

pub fn load_shader(
    backend: &Handle<dyn GraphicsBackend>,
    loader: &dyn ShaderSourceLoader,
    dir: &Path,
    name: &str,
) -> Result<Handle<Shader>, GpuError> {
    let (vert, frag) = shader_paths(dir, name);
    Handle::try_make(|| Shader::new(backend, loader, &vert, &frag))
}

pub struct Scene {
    projection: Mat4,
    grid: GridMesh,
    paddle: Quad,
    ball: Quad,
}

impl Scene {
    /// Build meshes and shaders for the entities in `state`
    ///
    /// `shader_dir` is resolved by `loader`.
    pub fn new(
        backend: &Handle<dyn GraphicsBackend>,
        loader: &dyn ShaderSourceLoader,
        shader_dir: &Path,
        state: &GameState,
    ) -> Result<Self, GpuError> {
        let grid_shader = load_shader(backend, loader, shader_dir, GRID_SHADER)?;
        let paddle_shader = load_shader(backend, loader, shader_dir, PADDLE_SHADER)?;
        let ball_shader = load_shader(backend, loader, shader_dir, BALL_SHADER)?;

        Ok(Self {
            projection: world_projection(),
            grid: GridMesh::new(backend, &state.grid, grid_shader)?,
            paddle: Quad::new(backend, state.paddle.size, paddle_shader)?,
            ball: Quad::new(backend, state.ball.size, ball_shader)?,
        })
    }

    /// Queue draws for the current state, grid first
    pub fn draw(&mut self, state: &GameState) -> Result<(), GpuError> {
        if self.grid.sync(&state.grid)? {
            log::debug!("grid mesh re-uploaded (revision {})", self.grid.revision());
        }
        self.grid.draw(&self.projection);
        self.paddle.draw(&self.projection, state.paddle.pos);
        self.ball.draw(&self.projection, state.ball.pos);
        Ok(())
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    pub fn grid(&self) -> &GridMesh {
        &self.grid
    }
}

//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

use crate::gpu::{AttribFormat, LayoutElem};

/// 2D vertex, position only; color comes from the shader
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
}

impl Vertex {
    pub const STRIDE: u64 = std::mem::size_of::<Vertex>() as u64;

    pub const fn new(x: f32, y: f32) -> Self {
        Self { position: [x, y] }
    }

    pub fn layout() -> [LayoutElem; 1] {
        [LayoutElem {
            index: 0,
            count: 2,
            format: AttribFormat::Float32,
            normalized: false,
            stride: Self::STRIDE,
            offset: 0,
        }]
    }
}

/// Colors for game elements
pub mod colors {
    pub const BACKGROUND: [f32; 4] = [0.2, 0.1, 0.3, 1.0];
}

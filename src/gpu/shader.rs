//! Shader programs built from a vertex and fragment source file

use std::path::{Path, PathBuf};

use super::{GraphicsBackend, NativeId, ShaderStage};
use crate::error::{AssetError, GpuError};
use crate::handle::Handle;

/// Where shader sources come from
pub trait ShaderSourceLoader {
    fn load(&self, path: &Path) -> Result<String, AssetError>;
}

/// Loads sources relative to an asset root on disk
#[derive(Debug, Clone)]
pub struct AssetDir {
    root: PathBuf,
}

impl AssetDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl ShaderSourceLoader for AssetDir {
    fn load(&self, path: &Path) -> Result<String, AssetError> {
        let full = self.resolve(path);
        std::fs::read_to_string(&full).map_err(|source| AssetError::Io { path: full, source })
    }
}

/// A linked program
pub struct Shader {
    id: NativeId,
    backend: Handle<dyn GraphicsBackend>,
}

impl Shader {
    pub fn new(
        backend: &Handle<dyn GraphicsBackend>,
        loader: &dyn ShaderSourceLoader,
        vert_path: &Path,
        frag_path: &Path,
    ) -> Result<Self, GpuError> {
        let id = backend
            .create_program()
            .ok_or(GpuError::ResourceCreation("shader program"))?;
        // From here on `Drop` owns the program id, so early returns release it
        let shader = Self {
            id,
            backend: backend.clone(),
        };

        let vertex = Self::compile_shader(backend, loader, ShaderStage::Vertex, vert_path)?;
        let fragment = match Self::compile_shader(backend, loader, ShaderStage::Fragment, frag_path) {
            Ok(fragment) => fragment,
            Err(e) => {
                backend.delete_shader(vertex);
                return Err(e);
            }
        };

        let linked = backend.link_program(id, vertex, fragment);
        backend.delete_shader(vertex);
        backend.delete_shader(fragment);
        linked.map_err(GpuError::ShaderLink)?;

        log::debug!(
            "linked shader program {id} from {} + {}",
            vert_path.display(),
            frag_path.display()
        );
        Ok(shader)
    }

    /// Compile one stage from a file, returning the stage object id
    pub fn compile_shader(
        backend: &Handle<dyn GraphicsBackend>,
        loader: &dyn ShaderSourceLoader,
        stage: ShaderStage,
        path: &Path,
    ) -> Result<NativeId, GpuError> {
        let source = loader.load(path)?;
        backend
            .compile_shader(stage, &source)
            .map_err(|log| GpuError::ShaderCompile {
                stage,
                path: path.to_path_buf(),
                log,
            })
    }

    pub fn id(&self) -> NativeId {
        self.id
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        self.backend.delete_program(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::HeadlessBackend;
    use std::collections::HashMap;
    use std::rc::Rc;

    struct MemoryLoader(HashMap<PathBuf, String>);

    impl MemoryLoader {
        fn new(files: &[(&str, &str)]) -> Self {
            Self(
                files
                    .iter()
                    .map(|(p, s)| (PathBuf::from(p), s.to_string()))
                    .collect(),
            )
        }
    }

    impl ShaderSourceLoader for MemoryLoader {
        fn load(&self, path: &Path) -> Result<String, AssetError> {
            self.0.get(path).cloned().ok_or_else(|| AssetError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        }
    }

    const VS: &str = r#"
struct Uniforms {
    projection: mat4x4<f32>,
    model: mat4x4<f32>,
}
@group(0) @binding(0) var<uniform> u: Uniforms;

@vertex
fn vs_main(@location(0) position: vec2<f32>) -> @builtin(position) vec4<f32> {
    return u.projection * u.model * vec4<f32>(position, 0.0, 1.0);
}
"#;
    const FS: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 1.0, 1.0, 1.0);
}
"#;

    fn backend() -> (Rc<HeadlessBackend>, Handle<dyn GraphicsBackend>) {
        let headless = Rc::new(HeadlessBackend::new());
        let dyn_backend: Rc<dyn GraphicsBackend> = headless.clone();
        (headless, Handle::from(dyn_backend))
    }

    #[test]
    fn test_links_and_releases_stage_objects() {
        let (headless, gfx) = backend();
        let loader = MemoryLoader::new(&[("a.vert.wgsl", VS), ("a.frag.wgsl", FS)]);

        let shader = Shader::new(&gfx, &loader, Path::new("a.vert.wgsl"), Path::new("a.frag.wgsl")).unwrap();
        assert!(headless.is_linked(shader.id()));
        assert_eq!(headless.live_shaders(), 0);

        drop(shader);
        assert_eq!(headless.live_programs(), 0);
        assert_eq!(headless.deleted_programs(), 1);
    }

    #[test]
    fn test_compile_error_names_the_file() {
        let (headless, gfx) = backend();
        let loader = MemoryLoader::new(&[("bad.vert.wgsl", "fn vs_main( {"), ("a.frag.wgsl", FS)]);

        let err = Shader::new(&gfx, &loader, Path::new("bad.vert.wgsl"), Path::new("a.frag.wgsl"))
            .err()
            .unwrap();
        match err {
            GpuError::ShaderCompile { stage, path, log } => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert_eq!(path, PathBuf::from("bad.vert.wgsl"));
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error {other:?}"),
        }
        // Program created before the failure is released
        assert_eq!(headless.live_programs(), 0);
    }

    #[test]
    fn test_fragment_failure_releases_vertex_stage() {
        let (headless, gfx) = backend();
        let loader = MemoryLoader::new(&[("a.vert.wgsl", VS), ("a.frag.wgsl", VS)]);

        let result = Shader::new(&gfx, &loader, Path::new("a.vert.wgsl"), Path::new("a.frag.wgsl"));
        assert!(matches!(
            result,
            Err(GpuError::ShaderCompile {
                stage: ShaderStage::Fragment,
                ..
            })
        ));
        assert_eq!(headless.live_shaders(), 0);
    }

    #[test]
    fn test_missing_source_is_asset_error() {
        let (_headless, gfx) = backend();
        let loader = MemoryLoader::new(&[]);

        let result = Shader::compile_shader(&gfx, &loader, ShaderStage::Vertex, Path::new("nope.wgsl"));
        assert!(matches!(result, Err(GpuError::Asset(AssetError::Io { .. }))));
    }

    #[test]
    fn test_shared_shader_outlives_first_owner() {
        let (headless, gfx) = backend();
        let loader = MemoryLoader::new(&[("a.vert.wgsl", VS), ("a.frag.wgsl", FS)]);

        let shader = Handle::make(
            Shader::new(&gfx, &loader, Path::new("a.vert.wgsl"), Path::new("a.frag.wgsl")).unwrap(),
        );
        let paddle_copy = shader.clone();
        drop(shader);
        assert_eq!(headless.live_programs(), 1);
        drop(paddle_copy);
        assert_eq!(headless.live_programs(), 0);
    }
}

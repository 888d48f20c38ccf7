//! `GraphicsBackend` on top of wgpu
//!
//! Draws are queued between `clear` and `present` and recorded into a single
//! render pass at `present`. Render pipelines are built lazily for each
//! (program, vertex array) pair the first time the pair is drawn.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use wgpu::util::DeviceExt;

use super::{
    wgsl, AttribFormat, BufferKind, BufferUsage, GraphicsBackend, LayoutElem, NativeId,
    ShaderStage, Uniforms,
};
use crate::error::BootstrapError;

struct GpuBuffer {
    buffer: wgpu::Buffer,
    kind: BufferKind,
}

#[derive(Default)]
struct VertexArrayState {
    layout: Vec<LayoutElem>,
    vertex_buffer: Option<(NativeId, u64)>,
    index_buffer: Option<NativeId>,
}

struct StageModule {
    stage: ShaderStage,
    module: Rc<wgpu::ShaderModule>,
}

/// Stage modules a program was linked from
struct LinkedProgram {
    vertex: Rc<wgpu::ShaderModule>,
    fragment: Rc<wgpu::ShaderModule>,
}

struct PendingDraw {
    vertex_array: NativeId,
    program: NativeId,
    uniforms: Uniforms,
    index_count: u32,
}

pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    uniform_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    next_id: Cell<u32>,
    buffers: RefCell<HashMap<NativeId, GpuBuffer>>,
    vertex_arrays: RefCell<HashMap<NativeId, VertexArrayState>>,
    shaders: RefCell<HashMap<NativeId, StageModule>>,
    programs: RefCell<HashMap<NativeId, Option<LinkedProgram>>>,
    pipelines: RefCell<HashMap<(NativeId, NativeId), wgpu::RenderPipeline>>,
    clear_color: Cell<wgpu::Color>,
    pending: RefCell<Vec<PendingDraw>>,
}

impl WgpuBackend {
    /// Open a device and configure `target` as a `width` x `height` surface
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<Self, BootstrapError> {
        pollster::block_on(Self::init(target.into(), width, height, vsync))
    }

    async fn init(
        target: wgpu::SurfaceTarget<'static>,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<Self, BootstrapError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(target)
            .map_err(|e| BootstrapError::Graphics(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| BootstrapError::Graphics(e.to_string()))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("arcanoid-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await
            .map_err(|e| BootstrapError::Graphics(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| BootstrapError::Graphics("surface reports no formats".into()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        log::info!(
            "Surface config: {}x{}, format: {:?}, vsync: {}",
            width,
            height,
            config.format,
            vsync
        );
        surface.configure(&device, &config);

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniforms_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&uniform_layout],
            immediate_size: 0,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            uniform_layout,
            pipeline_layout,
            next_id: Cell::new(0),
            buffers: RefCell::new(HashMap::new()),
            vertex_arrays: RefCell::new(HashMap::new()),
            shaders: RefCell::new(HashMap::new()),
            programs: RefCell::new(HashMap::new()),
            pipelines: RefCell::new(HashMap::new()),
            clear_color: Cell::new(wgpu::Color::BLACK),
            pending: RefCell::new(Vec::new()),
        })
    }

    fn allocate(&self) -> Option<NativeId> {
        let next = self.next_id.get().checked_add(1)?;
        self.next_id.set(next);
        NativeId::new(next)
    }

    fn forget_pipelines(&self, keep: impl Fn(&(NativeId, NativeId)) -> bool) {
        self.pipelines.borrow_mut().retain(|key, _| keep(key));
    }

    /// Build the pipeline for `(program, vertex_array)` unless cached
    ///
    /// Returns false when the pair cannot be drawn.
    fn ensure_pipeline(&self, program: NativeId, vertex_array: NativeId) -> bool {
        if self.pipelines.borrow().contains_key(&(program, vertex_array)) {
            return true;
        }

        let programs = self.programs.borrow();
        let Some(Some(linked)) = programs.get(&program) else {
            log::warn!("draw with unlinked program {program}");
            return false;
        };
        let vertex_arrays = self.vertex_arrays.borrow();
        let Some(vao) = vertex_arrays.get(&vertex_array) else {
            log::warn!("draw with unknown vertex array {vertex_array}");
            return false;
        };
        let Some((_, stride)) = vao.vertex_buffer else {
            log::warn!("vertex array {vertex_array} has no vertex buffer");
            return false;
        };

        let attributes: Vec<wgpu::VertexAttribute> = vao
            .layout
            .iter()
            .map(|elem| wgpu::VertexAttribute {
                format: vertex_format(elem),
                offset: elem.offset,
                shader_location: elem.index,
            })
            .collect();

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("render_pipeline"),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &linked.vertex,
                    entry_point: Some(wgsl::entry_point(ShaderStage::Vertex)),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: stride,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &attributes,
                    }],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &linked.fragment,
                    entry_point: Some(wgsl::entry_point(ShaderStage::Fragment)),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.config.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        log::debug!("built pipeline for program {program}, vertex array {vertex_array}");
        drop(vertex_arrays);
        drop(programs);
        self.pipelines
            .borrow_mut()
            .insert((program, vertex_array), pipeline);
        true
    }
}

fn vertex_format(elem: &LayoutElem) -> wgpu::VertexFormat {
    match (elem.format, elem.count) {
        (AttribFormat::Float32, 1) => wgpu::VertexFormat::Float32,
        (AttribFormat::Float32, 2) => wgpu::VertexFormat::Float32x2,
        (AttribFormat::Float32, 3) => wgpu::VertexFormat::Float32x3,
        (AttribFormat::Float32, _) => wgpu::VertexFormat::Float32x4,
    }
}

impl GraphicsBackend for WgpuBackend {
    fn create_buffer(&self, kind: BufferKind, usage: BufferUsage, size: u64) -> Option<NativeId> {
        let id = self.allocate()?;
        let usages = match kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
        } | wgpu::BufferUsages::COPY_DST;
        let label = match usage {
            BufferUsage::Static => "static_buffer",
            BufferUsage::Stream => "stream_buffer",
        };
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT),
            usage: usages,
            mapped_at_creation: false,
        });
        self.buffers
            .borrow_mut()
            .insert(id, GpuBuffer { buffer, kind });
        Some(id)
    }

    fn write_buffer(&self, id: NativeId, offset: u64, data: &[u8]) {
        match self.buffers.borrow().get(&id) {
            Some(gpu) => self.queue.write_buffer(&gpu.buffer, offset, data),
            None => log::warn!("write to unknown buffer {id}"),
        }
    }

    fn delete_buffer(&self, id: NativeId) {
        self.buffers.borrow_mut().remove(&id);
    }

    fn create_vertex_array(&self) -> Option<NativeId> {
        let id = self.allocate()?;
        self.vertex_arrays
            .borrow_mut()
            .insert(id, VertexArrayState::default());
        Some(id)
    }

    fn vertex_array_layout(&self, id: NativeId, elems: &[LayoutElem]) {
        if let Some(vao) = self.vertex_arrays.borrow_mut().get_mut(&id) {
            vao.layout = elems.to_vec();
        }
        self.forget_pipelines(|(_, vao)| *vao != id);
    }

    fn vertex_array_vertex_buffer(&self, id: NativeId, buffer: NativeId, stride: u64) {
        if let Some(vao) = self.vertex_arrays.borrow_mut().get_mut(&id) {
            vao.vertex_buffer = Some((buffer, stride));
        }
        self.forget_pipelines(|(_, vao)| *vao != id);
    }

    fn vertex_array_index_buffer(&self, id: NativeId, buffer: NativeId) {
        if let Some(vao) = self.vertex_arrays.borrow_mut().get_mut(&id) {
            vao.index_buffer = Some(buffer);
        }
    }

    fn delete_vertex_array(&self, id: NativeId) {
        self.vertex_arrays.borrow_mut().remove(&id);
        self.forget_pipelines(|(_, vao)| *vao != id);
    }

    fn create_program(&self) -> Option<NativeId> {
        let id = self.allocate()?;
        self.programs.borrow_mut().insert(id, None);
        Some(id)
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<NativeId, String> {
        wgsl::check(stage, source)?;
        let id = self
            .allocate()
            .ok_or_else(|| "shader id space exhausted".to_string())?;
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(wgsl::entry_point(stage)),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        self.shaders.borrow_mut().insert(
            id,
            StageModule {
                stage,
                module: Rc::new(module),
            },
        );
        Ok(id)
    }

    fn link_program(&self, program: NativeId, vertex: NativeId, fragment: NativeId) -> Result<(), String> {
        let shaders = self.shaders.borrow();
        let linked = match (shaders.get(&vertex), shaders.get(&fragment)) {
            (Some(v), Some(f)) if v.stage == ShaderStage::Vertex && f.stage == ShaderStage::Fragment => {
                LinkedProgram {
                    vertex: Rc::clone(&v.module),
                    fragment: Rc::clone(&f.module),
                }
            }
            _ => return Err(format!("program {program}: stage objects {vertex}/{fragment} do not form a vertex/fragment pair")),
        };

        match self.programs.borrow_mut().get_mut(&program) {
            Some(slot) => *slot = Some(linked),
            None => return Err(format!("unknown program {program}")),
        }
        self.forget_pipelines(|(p, _)| *p != program);
        Ok(())
    }

    fn delete_shader(&self, id: NativeId) {
        self.shaders.borrow_mut().remove(&id);
    }

    fn delete_program(&self, id: NativeId) {
        self.programs.borrow_mut().remove(&id);
        self.forget_pipelines(|(p, _)| *p != id);
    }

    fn clear(&self, color: [f32; 4]) {
        self.clear_color.set(wgpu::Color {
            r: color[0] as f64,
            g: color[1] as f64,
            b: color[2] as f64,
            a: color[3] as f64,
        });
        self.pending.borrow_mut().clear();
    }

    fn draw_indexed(&self, vertex_array: NativeId, program: NativeId, uniforms: &Uniforms, index_count: u32) {
        self.pending.borrow_mut().push(PendingDraw {
            vertex_array,
            program,
            uniforms: *uniforms,
            index_count,
        });
    }

    fn present(&self) {
        let draws = std::mem::take(&mut *self.pending.borrow_mut());
        let draws: Vec<PendingDraw> = draws
            .into_iter()
            .filter(|d| self.ensure_pipeline(d.program, d.vertex_array))
            .collect();

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of memory!");
                return;
            }
            Err(e) => {
                log::warn!("Render error: {:?}", e);
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let bind_groups: Vec<wgpu::BindGroup> = draws
            .iter()
            .map(|draw| {
                let uniforms = self
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("uniforms"),
                        contents: bytemuck::bytes_of(&draw.uniforms),
                        usage: wgpu::BufferUsages::UNIFORM,
                    });
                self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("uniforms_bind_group"),
                    layout: &self.uniform_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniforms.as_entire_binding(),
                    }],
                })
            })
            .collect();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });

        {
            let pipelines = self.pipelines.borrow();
            let vertex_arrays = self.vertex_arrays.borrow();
            let buffers = self.buffers.borrow();

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color.get()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for (draw, bind_group) in draws.iter().zip(&bind_groups) {
                let Some(pipeline) = pipelines.get(&(draw.program, draw.vertex_array)) else {
                    continue;
                };
                let Some(vao) = vertex_arrays.get(&draw.vertex_array) else {
                    continue;
                };
                let vertex = vao
                    .vertex_buffer
                    .and_then(|(id, _)| buffers.get(&id))
                    .filter(|b| b.kind == BufferKind::Vertex);
                let index = vao
                    .index_buffer
                    .and_then(|id| buffers.get(&id))
                    .filter(|b| b.kind == BufferKind::Index);
                let (Some(vertex), Some(index)) = (vertex, index) else {
                    log::warn!("vertex array {} is missing a bound buffer", draw.vertex_array);
                    continue;
                };

                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, bind_group, &[]);
                render_pass.set_vertex_buffer(0, vertex.buffer.slice(..));
                render_pass.set_index_buffer(index.buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..draw.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

//! Orientation gnomon drawn in the corner of the viewer.

use wgpu::util::DeviceExt;

use umbra_math::{Camera, Mat4, Vec4};

/// Gnomon uniform data for GPU (camera rotation only)
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GnomonUniform {
    view_rotation: [[f32; 4]; 4],
}

impl GnomonUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        let view = Mat4::look_at_rh(camera.position, camera.target, camera.up);
        // Drop the translation, keep the rotation
        let rotation = Mat4::from_cols(view.col(0), view.col(1), view.col(2), Vec4::W);
        Self {
            view_rotation: rotation.to_cols_array_2d(),
        }
    }

    pub fn rotation(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.view_rotation)
    }
}

/// Gnomon vertex (position + color)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GnomonVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl GnomonVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub const fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, color }
    }

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GnomonVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }

    /// Line list from the origin along X, Y and Z.
    pub fn axes() -> [Self; 6] {
        const RED: [f32; 3] = [1.0, 0.2, 0.2];
        const GREEN: [f32; 3] = [0.2, 1.0, 0.2];
        const BLUE: [f32; 3] = [0.2, 0.5, 1.0];
        [
            GnomonVertex::new([0.0, 0.0, 0.0], RED),
            GnomonVertex::new([1.0, 0.0, 0.0], RED),
            GnomonVertex::new([0.0, 0.0, 0.0], GREEN),
            GnomonVertex::new([0.0, 1.0, 0.0], GREEN),
            GnomonVertex::new([0.0, 0.0, 0.0], BLUE),
            GnomonVertex::new([0.0, 0.0, 1.0], BLUE),
        ]
    }
}

/// GPU resources of the gnomon overlay.
pub struct Gnomon {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    /// Edge length of the corner viewport in pixels
    pub size: u32,
}

impl Gnomon {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, camera: &Camera) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Gnomon Vertex Buffer"),
            contents: bytemuck::cast_slice(&GnomonVertex::axes()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Gnomon Buffer"),
            contents: bytemuck::cast_slice(&[GnomonUniform::from_camera(camera)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Gnomon Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Gnomon Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Gnomon Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/gnomon.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Gnomon Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Gnomon Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[GnomonVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        log::info!("Gnomon initialized");

        Self {
            pipeline,
            vertex_buffer,
            uniform_buffer,
            bind_group,
            size: 80,
        }
    }

    /// Upload the camera rotation (call after moving the camera)
    pub fn update(&self, queue: &wgpu::Queue, camera: &Camera) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[GnomonUniform::from_camera(camera)]),
        );
    }

    /// Draw into the bottom-right corner of a `target_size` pass.
    ///
    /// Leaves the pass viewport set to the corner.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, target_size: (u32, u32)) {
        let size = self.size.min(target_size.0).min(target_size.1) as f32;
        pass.set_viewport(
            target_size.0 as f32 - size,
            target_size.1 as f32 - size,
            size,
            size,
            0.0,
            1.0,
        );
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(0..6, 0..1);
    }
}

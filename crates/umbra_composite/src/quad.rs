//! Viewport-sized textured quad that displays the offscreen image.

use wgpu::util::DeviceExt;
use wgpu::Device;

use umbra_march::{OffscreenBuffer, Resolution};

use crate::{CompositeError, CompositeResult};

/// Texture format of the composite image. The offscreen buffer is linear,
/// so it is uploaded sRGB-encoded and decoded by the sampler. Texels are
/// premultiplied, see [`COMPOSITE_BLEND`].
pub const COMPOSITE_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Blend of the quad over the host's content. Matches the premultiplied
/// texels, so filtered silhouette texels fade to the background.
pub const COMPOSITE_BLEND: wgpu::BlendState = wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING;

/// Describes the host render pass the quad is drawn into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeTarget {
    pub color_format: wgpu::TextureFormat,
    /// Depth attachment of the host pass, if it has one
    pub depth_format: Option<wgpu::TextureFormat>,
}

impl CompositeTarget {
    pub fn new(color_format: wgpu::TextureFormat) -> Self {
        Self {
            color_format,
            depth_format: None,
        }
    }

    pub fn with_depth(mut self, depth_format: wgpu::TextureFormat) -> Self {
        self.depth_format = Some(depth_format);
        self
    }
}

/// Quad vertex (clip-space position + texture coordinate)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

impl QuadVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

    pub const fn new(position: [f32; 2], uv: [f32; 2]) -> Self {
        Self { position, uv }
    }

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }

    /// Two triangles covering the whole viewport.
    ///
    /// Image row 0 is the top of the viewport: uv (0, 0) sits at clip (-1, 1).
    pub fn viewport_quad() -> [Self; 6] {
        let top_left = QuadVertex::new([-1.0, 1.0], [0.0, 0.0]);
        let top_right = QuadVertex::new([1.0, 1.0], [1.0, 0.0]);
        let bottom_left = QuadVertex::new([-1.0, -1.0], [0.0, 1.0]);
        let bottom_right = QuadVertex::new([1.0, -1.0], [1.0, 1.0]);

        // Counter-clockwise
        [
            top_left,
            bottom_left,
            bottom_right,
            top_left,
            bottom_right,
            top_right,
        ]
    }
}

/// The image's GPU copy and the view/bind group that sample it.
struct CompositeTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    resolution: Resolution,
}

impl CompositeTexture {
    fn new(
        device: &Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        resolution: Resolution,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Raymarch Offscreen Texture"),
            size: extent(resolution),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COMPOSITE_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Composite Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        Self {
            texture,
            bind_group,
            resolution,
        }
    }
}

impl Drop for CompositeTexture {
    fn drop(&mut self) {
        self.texture.destroy();
    }
}

fn extent(resolution: Resolution) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: resolution.width,
        height: resolution.height,
        depth_or_array_layers: 1,
    }
}

/// Check `resolution` against the device's 2D texture limit.
pub fn check_texture_size(resolution: Resolution, limit: u32) -> CompositeResult<()> {
    if resolution.width > limit || resolution.height > limit {
        return Err(CompositeError::TextureTooLarge {
            width: resolution.width,
            height: resolution.height,
            limit,
        });
    }
    Ok(())
}

/// Screen-aligned quad textured with the offscreen image, alpha blended over
/// whatever the host has already drawn.
pub struct CompositeQuad {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    texture: CompositeTexture,
}

impl CompositeQuad {
    /// Build the pipeline and a texture of `resolution`.
    ///
    /// Shader and pipeline validation errors are returned rather than
    /// reported to the device's uncaptured error handler.
    pub fn new(
        device: &Device,
        target: CompositeTarget,
        resolution: Resolution,
    ) -> CompositeResult<Self> {
        check_texture_size(resolution, device.limits().max_texture_dimension_2d)?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Composite Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Composite Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Composite Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/composite.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Composite Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // Drawn last, over the host's content: never writes depth, always passes
        let depth_stencil = target.depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Always,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Composite Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[QuadVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: target.color_format,
                    blend: Some(COMPOSITE_BLEND),
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
            depth_stencil,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Composite Vertex Buffer"),
            contents: bytemuck::cast_slice(&QuadVertex::viewport_quad()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let texture = CompositeTexture::new(device, &bind_group_layout, &sampler, resolution);

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(CompositeError::Shader(error.to_string()));
        }

        log::info!(
            "Composite quad initialized ({}x{}, target {:?})",
            resolution.width,
            resolution.height,
            target.color_format
        );

        Ok(Self {
            pipeline,
            vertex_buffer,
            bind_group_layout,
            sampler,
            texture,
        })
    }

    /// Resolution of the current texture.
    pub fn resolution(&self) -> Resolution {
        self.texture.resolution
    }

    /// Recreate the texture and its bind group for a new resolution.
    pub fn resize(&mut self, device: &Device, resolution: Resolution) -> CompositeResult<()> {
        if resolution == self.texture.resolution {
            return Ok(());
        }
        check_texture_size(resolution, device.limits().max_texture_dimension_2d)?;

        self.texture =
            CompositeTexture::new(device, &self.bind_group_layout, &self.sampler, resolution);
        log::debug!("Composite texture resized to {}x{}", resolution.width, resolution.height);
        Ok(())
    }

    /// Copy a finished offscreen image into the texture, premultiplied.
    ///
    /// The buffer must match the texture's resolution.
    pub fn upload(&self, queue: &wgpu::Queue, buffer: &OffscreenBuffer) {
        debug_assert_eq!(buffer.resolution(), self.texture.resolution);
        let resolution = buffer.resolution();

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &buffer.to_premultiplied_rgba8(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * resolution.width),
                rows_per_image: Some(resolution.height),
            },
            extent(resolution),
        );
    }

    /// Record the quad draw into the host's render pass.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.texture.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(0..6, 0..1);
    }
}

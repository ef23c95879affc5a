//! Window-side wgpu state: the surface, the camera, the gnomon overlay and
//! the raymarched layer composited into the same pass.

use std::sync::Arc;

use anyhow::Result;
use wgpu::{Device, Instance, Queue, Surface, SurfaceConfiguration};
use winit::window::Window;

use umbra_composite::{CompositeTarget, RaymarchObject};
use umbra_march::{DistanceField, PassStats, RaymarchConfig, Shading};
use umbra_math::Camera;
use umbra_viewer::cli::scaled_resolution;
use umbra_viewer::gnomon::Gnomon;

/// Closest the camera may dolly to its target.
const MIN_CAMERA_DISTANCE: f32 = 0.5;

/// Host renderer owning the window surface.
pub struct Host {
    surface: Surface<'static>,
    device: Device,
    queue: Queue,
    config: SurfaceConfiguration,
    pub size: (u32, u32),
    pub camera: Camera,
    gnomon: Gnomon,
    object: RaymarchObject,
    render_scale: f32,
}

impl Host {
    /// Create the surface and device for `window`, then the raymarched layer.
    ///
    /// The offscreen resolution is the window size times `render_scale`; the
    /// resolution in `march` is replaced.
    pub async fn new(
        window: Arc<Window>,
        march: RaymarchConfig,
        shading: Shading,
        render_scale: f32,
        field: impl DistanceField + 'static,
        camera: Camera,
    ) -> Result<Self> {
        let size = window.inner_size();
        let size = (size.width.max(1), size.height.max(1));

        let instance = Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("Failed to find suitable GPU adapter"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Umbra Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("Surface reports no supported formats"))?;

        let config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.0,
            height: size.1,
            present_mode: wgpu::PresentMode::Fifo, // VSync
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let gnomon = Gnomon::new(&device, surface_format, &camera);

        let march = RaymarchConfig {
            resolution: scaled_resolution(size, render_scale),
            ..march
        };
        let target = CompositeTarget::new(surface_format);
        let object = RaymarchObject::new(&device, target, march, field)?.with_shading(shading);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            camera,
            gnomon,
            object,
            render_scale,
        })
    }

    /// Reconfigure the surface and request a matching offscreen resolution.
    ///
    /// The offscreen image follows on the next frame.
    pub fn resize(&mut self, new_size: (u32, u32)) -> Result<()> {
        if new_size.0 > 0 && new_size.1 > 0 {
            self.size = new_size;
            self.config.width = new_size.0;
            self.config.height = new_size.1;
            self.surface.configure(&self.device, &self.config);

            self.object
                .request_resolution(scaled_resolution(new_size, self.render_scale))?;
        }
        Ok(())
    }

    /// Reapply the current surface configuration (after `SurfaceError::Lost`)
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Orbit the camera by yaw/pitch deltas in radians
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.camera.orbit(delta_yaw, delta_pitch);
        self.gnomon.update(&self.queue, &self.camera);
    }

    /// Move the camera towards (positive) or away from the target
    pub fn dolly(&mut self, amount: f32) {
        self.camera.dolly(amount, MIN_CAMERA_DISTANCE);
    }

    pub fn set_shading(&mut self, shading: Shading) {
        self.object.set_shading(shading);
        log::info!("Shading: {:?}", shading);
    }

    pub fn stats(&self) -> PassStats {
        self.object.stats()
    }

    /// March the offscreen image, then draw it and the gnomon into one pass.
    pub fn render(&mut self, clear_color: wgpu::Color) -> Result<()> {
        // Complete the offscreen image before touching the surface
        let frame = self.object.prepare(&self.device, &self.queue, &self.camera)?;

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // Misses are transparent, so the clear color shows through
            frame.draw(&mut render_pass);
            self.gnomon.draw(&mut render_pass, self.size);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

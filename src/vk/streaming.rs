use std::sync::Arc;

use log::{error, warn};
use vulkano::{
    buffer::{BufferUsage, CpuAccessibleBuffer},
    command_buffer::{
        AutoCommandBufferBuilder, CommandBufferUsage, CopyBufferToImageInfo, RenderingAttachmentInfo, RenderingInfo,
    },
    descriptor_set::{PersistentDescriptorSet, WriteDescriptorSet},
    image::{attachment::AttachmentImage, view::ImageView, ImageAccess, ImageUsage},
    pipeline::{
        graphics::{
            input_assembly::InputAssemblyState,
            render_pass::PipelineRenderingCreateInfo,
            viewport::{Viewport, ViewportState},
        },
        GraphicsPipeline, Pipeline, PipelineBindPoint,
    },
    render_pass::{LoadOp, StoreOp},
    sampler::{Sampler, SamplerCreateInfo},
    swapchain::{acquire_next_image, AcquireError},
    sync::{FlushError, GpuFuture},
};

use super::VkBackend;

mod vs {
    vulkano_shaders::shader! {
        ty: "vertex",
        src: "
            #version 450
            out gl_PerVertex {
                vec4 gl_Position;
            };

            layout(location = 0) out vec2 uv;

            vec2 positions[6] = vec2[](
                vec2(-1.0, -1.0),
                vec2(-1.0, 1.0),
                vec2(1.0, -1.0),

                vec2(1.0, 1.0),
                vec2(-1.0, 1.0),
                vec2(1.0, -1.0)
            );

            void main() {
                gl_Position = vec4(positions[gl_VertexIndex], 0.0, 1.0);
                uv = positions[gl_VertexIndex] * 0.5 + 0.5;
            }
        "
    }
}

mod fs {
    vulkano_shaders::shader! {
        ty: "fragment",
        src: "
            #version 450
            layout(location = 0) in vec2 uv;
            layout(location = 0) out vec4 f_color;

            layout(set = 0, binding = 0) uniform sampler2D frame;

            void main() {
                f_color = texture(frame, uv);
            }
        "
    }
}

/// Streams CPU-rasterized frames to the window.
///
/// Each frame is uploaded into a staging buffer, copied into a sampled image,
/// and drawn over the swapchain image as a fullscreen quad.
pub struct StreamingRenderer {
    backend:            Arc<VkBackend>,
    pipeline:           Arc<GraphicsPipeline>,
    viewport:           Viewport,
    pixel_count:        usize,
    previous_frame_end: Option<Box<dyn GpuFuture>>,

    frame_staging_buffer: Arc<CpuAccessibleBuffer<[u32]>>,
    frame_image:          Arc<AttachmentImage>,
    set:                  Arc<PersistentDescriptorSet>,
}

impl StreamingRenderer {
    pub fn new(backend: Arc<VkBackend>) -> Self {
        // vertex and fragment shaders
        let vs = vs::load(backend.device.clone()).unwrap();
        let fs = fs::load(backend.device.clone()).unwrap();

        // dimensions of our viewport
        let dimensions = backend.swap_chain_images[0].dimensions().width_height();
        let viewport = Viewport {
            origin:      [0.0, 0.0],
            dimensions:  [dimensions[0] as f32, dimensions[1] as f32],
            depth_range: 0.0..1.0,
        };

        // Set up our graphics pipeline
        let pipeline = GraphicsPipeline::start()
            .render_pass(PipelineRenderingCreateInfo {
                // A single colour attachment, rendered straight to the swapchain image,
                // so it takes the swapchain's format.
                color_attachment_formats: vec![Some(backend.swap_chain.image_format())],
                ..Default::default()
            })
            // The fullscreen quad is two triangles from a hardcoded vertex list.
            .input_assembly_state(InputAssemblyState::new())
            .vertex_shader(vs.entry_point("main").unwrap(), ())
            // The window is not resizable, so a fixed viewport covers it for good
            .viewport_state(ViewportState::viewport_fixed_scissor_irrelevant([viewport.clone()]))
            .fragment_shader(fs.entry_point("main").unwrap(), ())
            .build(backend.device.clone())
            .unwrap();

        let previous_frame_end = Some(vulkano::sync::now(backend.device.clone()).boxed());

        // We write packed pixels to this buffer from the CPU side, then each frame is uploaded to the GPU
        let frame_staging_buffer = unsafe {
            CpuAccessibleBuffer::uninitialized_array(
                backend.device.clone(),
                (dimensions[0] * dimensions[1]) as u64,
                BufferUsage {
                    transfer_src: true,
                    ..BufferUsage::none()
                },
                false,
            )
            .unwrap()
        };

        // the destination image that the fullscreen quad samples
        let frame_image = AttachmentImage::with_usage(
            backend.device.clone(),
            dimensions,
            backend.swap_chain.image_format(),
            ImageUsage {
                transfer_dst: true,
                sampled: true,
                ..ImageUsage::none()
            },
        )
        .unwrap();

        let layout = pipeline.layout().set_layouts().get(0).unwrap();
        let sampler = Sampler::new(backend.device.clone(), SamplerCreateInfo::simple_repeat_linear()).unwrap();
        let image_view = ImageView::new_default(frame_image.clone()).unwrap();
        let set = PersistentDescriptorSet::new(
            layout.clone(),
            [WriteDescriptorSet::image_view_sampler(0, image_view, sampler)],
        )
        .unwrap();

        Self {
            backend,
            pipeline,
            viewport,
            pixel_count: (dimensions[0] * dimensions[1]) as usize,
            previous_frame_end,
            frame_staging_buffer,
            frame_image,
            set,
        }
    }

    pub fn render(&mut self, framebuffer: &[u32]) {
        // It is important to call this function from time to time, otherwise resources will keep
        // accumulating and you will eventually reach an out of memory error.
        // Calling this function polls various fences in order to determine what the GPU has
        // already processed, and frees the resources that are no longer needed.
        self.previous_frame_end.as_mut().unwrap().cleanup_finished();

        {
            if framebuffer.len() != self.pixel_count {
                warn!("frame is {} pixels, expected {}; skipping", framebuffer.len(), self.pixel_count);
                return;
            }
            match self.frame_staging_buffer.write() {
                Ok(mut writer) => writer.copy_from_slice(framebuffer),
                Err(e) => {
                    // if the frame rate is super high, we could be trying to write to this buffer
                    // *while* the previous frame is still copying from it to the image.
                    // In this case just log it and skip over
                    warn!("Frame staging buffer write error: {}", e);
                }
            }
        }

        // Before we can draw on the output, we have to *acquire* an image from the swapchain. If
        // no image is available (which happens if you submit draw commands too quickly), then the
        // function will block.
        // This operation returns the index of the image that we are allowed to draw upon.
        let (image_num, _suboptimal, acquire_future) = match acquire_next_image(self.backend.swap_chain.clone(), None) {
            Ok(r) => r,
            Err(AcquireError::OutOfDate) => {
                return;
            }
            Err(e) => panic!("Failed to acquire next image: {:?}", e),
        };

        // In order to draw, we have to build a *command buffer*: upload the staged frame into the
        // sampled image, then draw the fullscreen quad over the acquired swapchain image.
        let mut builder = AutoCommandBufferBuilder::primary(
            self.backend.device.clone(),
            self.backend.graphics_queue.family(),
            CommandBufferUsage::OneTimeSubmit,
        )
        .unwrap();

        builder
            .copy_buffer_to_image(CopyBufferToImageInfo::buffer_image(
                self.frame_staging_buffer.clone(),
                self.frame_image.clone(),
            ))
            .unwrap();

        builder
            .begin_rendering(RenderingInfo {
                color_attachments: vec![Some(RenderingAttachmentInfo {
                    // `Clear` wipes the attachment at the start of rendering; the quad then
                    // covers every pixel anyway.
                    load_op: LoadOp::Clear,
                    store_op: StoreOp::Store,
                    clear_value: Some([0.0, 0.0, 0.0, 1.0].into()),
                    ..RenderingAttachmentInfo::image_view(self.backend.attachment_views[image_num].clone())
                })],
                ..Default::default()
            })
            .unwrap()
            .set_viewport(0, [self.viewport.clone()])
            .bind_pipeline_graphics(self.pipeline.clone())
            .bind_descriptor_sets(
                PipelineBindPoint::Graphics,
                self.pipeline.layout().clone(),
                0,
                self.set.clone(),
            )
            .draw(6, 1, 0, 0)
            .unwrap()
            .end_rendering()
            .unwrap();

        let command_buffer = builder.build().unwrap();

        let future = self
            .previous_frame_end
            .take()
            .unwrap()
            .join(acquire_future)
            .then_execute(self.backend.graphics_queue.clone(), command_buffer)
            .unwrap()
            // This does not present immediately; it submits a present command at the end of the
            // queue, so the frame shows once the GPU has finished drawing it.
            .then_swapchain_present(
                self.backend.present_queue.clone(),
                self.backend.swap_chain.clone(),
                image_num,
            )
            .then_signal_fence_and_flush();

        match future {
            Ok(future) => {
                self.previous_frame_end = Some(future.boxed());
            }
            Err(FlushError::OutOfDate) => {
                self.previous_frame_end = Some(vulkano::sync::now(self.backend.device.clone()).boxed());
            }
            Err(e) => {
                error!("Failed to flush future: {:?}", e);
                self.previous_frame_end = Some(vulkano::sync::now(self.backend.device.clone()).boxed());
            }
        }
    }
}

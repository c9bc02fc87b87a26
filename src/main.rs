use std::sync::Arc;

use product_viz::{
    renderer::{Framebuffer, PreviewRenderer},
    vk::{StreamingRenderer, VkBackend},
};
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;

fn main() {
    let mut log_builder = env_logger::Builder::new();
    log_builder.filter(None, log::LevelFilter::Debug).init();

    let event_loop = EventLoop::new();
    let backend = Arc::new(VkBackend::new(&event_loop, "Product Preview", WIDTH, HEIGHT));
    let mut renderer = StreamingRenderer::new(backend);

    // the preview is static, so rasterize it once and re-present the same frame
    let preview = PreviewRenderer::new(0.6, 0.6, 0.6);
    let mut frame = Framebuffer::new(WIDTH as usize, HEIGHT as usize);
    preview.draw(&mut frame);

    event_loop.run(move |ev, _, control_flow| match ev {
        Event::WindowEvent {
            event: WindowEvent::CloseRequested,
            ..
        } => {
            *control_flow = ControlFlow::Exit;
        }

        Event::RedrawEventsCleared => {
            renderer.render(&frame.pixels);
        }

        _ => (),
    });
}

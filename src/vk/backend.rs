use std::sync::Arc;

use vulkano::{
    device::{
        physical::{PhysicalDevice, PhysicalDeviceType},
        Device, DeviceCreateInfo, DeviceExtensions, Features, Queue, QueueCreateInfo,
    },
    format::Format,
    image::{view::ImageView, ImageUsage, SwapchainImage},
    instance::{
        debug::{
            DebugUtilsMessageSeverity, DebugUtilsMessageType, DebugUtilsMessenger, DebugUtilsMessengerCreateInfo,
            Message,
        },
        Instance, InstanceCreateInfo, InstanceExtensions,
    },
    swapchain::{ColorSpace, PresentMode, Surface, SurfaceCapabilities, SurfaceInfo, Swapchain, SwapchainCreateInfo},
    sync::Sharing,
};

use log::{debug, error, info, warn};
use vulkano_win::VkSurfaceBuild;
use winit::{
    event_loop::EventLoop,
    window::{Window, WindowBuilder},
};

const ENABLE_VALIDATION_LAYERS: bool = false;
const VALIDATION_LAYERS: &[&str] = &["VK_LAYER_KHRONOS_validation"];

/// Owns the Vulkan objects the preview window needs: one device, a graphics
/// and a present queue, and a swapchain sized to the window.
pub struct VkBackend {
    pub instance:              Arc<Instance>,
    pub device:                Arc<Device>,
    pub physical_device_index: usize,
    pub debug_callback:        Option<DebugUtilsMessenger>,
    pub surface:               Arc<Surface<Window>>,

    pub queues:         Vec<Arc<Queue>>,
    pub graphics_queue: Arc<Queue>,
    pub present_queue:  Arc<Queue>,

    pub swap_chain:        Arc<Swapchain<Window>>,
    pub swap_chain_images: Vec<Arc<SwapchainImage<Window>>>,
    pub attachment_views:  Vec<Arc<ImageView<SwapchainImage<Window>>>>,
}

impl VkBackend {
    pub fn new(event_loop: &EventLoop<()>, title: &str, width: u32, height: u32) -> Self {
        // find out what extensions vulkano_win/winit requires
        let required_extensions = Self::get_required_instance_extensions(vulkano_win::required_extensions());
        let instance = Self::create_instance(required_extensions);
        let debug_callback = Self::setup_debug_callback(&instance);

        let surface = Self::create_surface(&instance, event_loop, title, width, height);

        let device_extensions = Self::get_required_device_extensions();

        let physical_device_index = Self::pick_physical_device(&instance, device_extensions, &surface);
        let (device, queues) = Self::create_device(&instance, physical_device_index, device_extensions);
        let (graphics_queue, present_queue) = Self::get_queues(&queues, &surface);

        let (swap_chain, swap_chain_images) = Self::create_swap_chain(
            &instance,
            &surface,
            physical_device_index,
            &device,
            &graphics_queue,
            &present_queue,
            width,
            height,
        );

        // get image views to write to from the swapchain
        let attachment_views = swap_chain_images
            .iter()
            .map(|image| ImageView::new_default(image.clone()).unwrap())
            .collect::<Vec<_>>();

        Self {
            instance,
            device,
            physical_device_index,
            debug_callback,
            surface,
            queues,
            graphics_queue,
            present_queue,
            swap_chain,
            swap_chain_images,
            attachment_views,
        }
    }

    // ----------------------------------------------------------------------------------------------------------------------
    //                                      VULKAN CONFIGURATION AND OPTIONS
    // ----------------------------------------------------------------------------------------------------------------------

    /// Desired extensions for a given instance
    const fn get_required_instance_extensions(window_extensions: InstanceExtensions) -> InstanceExtensions {
        InstanceExtensions {
            ext_debug_utils: true,
            ..InstanceExtensions::none()
        }
        .union(&window_extensions)
    }

    /// Desired extensions for our device
    const fn get_required_device_extensions() -> DeviceExtensions {
        DeviceExtensions {
            khr_swapchain: true,
            khr_dynamic_rendering: true,
            ..DeviceExtensions::none()
        }
    }

    /// Desired features for our device
    const fn get_required_device_features() -> Features {
        Features {
            dynamic_rendering: true,
            ..Features::none()
        }
    }

    /// Decides if a given physical device has the right extensions and queues for us
    fn is_device_suitable<W>(p: &PhysicalDevice, device_extensions: DeviceExtensions, surface: &Surface<W>) -> bool {
        p.supported_extensions().is_superset_of(&device_extensions)
        &&
        // The device may have multiple queue families, that can each only perform some tasks
        // (graphics, present, transfer); we look for at least one family for each task we need
        p.queue_families().any(|q| q.supports_graphics()) &&
        p.queue_families().any(|q| q.supports_surface(surface).unwrap_or(false))
    }

    /// Picks a colour format, and a colour space to use.
    fn choose_swap_surface_format(available_formats: Vec<(Format, ColorSpace)>) -> (Format, ColorSpace) {
        // Try to use our preferred format and color space (8 bit BGR in the sRGB colour space)
        debug!("Available formats: {:?}", available_formats);
        *available_formats
            .iter()
            .find(|(format, color_space)| *format == Format::B8G8R8A8_SRGB && *color_space == ColorSpace::SrgbNonLinear)
            .expect("Desired colour format and space not available")
    }

    /// Picks a present mode, based on a score. The lowest scoring present mode is selected
    fn choose_swap_present_mode(mut available_present_modes: Vec<PresentMode>) -> PresentMode {
        // score present modes based on how desirable they are, with lowest being best
        available_present_modes.sort_by_key(|m| match m {
            PresentMode::Fifo => 0,
            PresentMode::Mailbox => 1,
            PresentMode::Immediate => 2,
            _ => 100,
        });
        *available_present_modes.first().expect("No present modes")
    }

    /// The size of the swap chain images. We would like this to be our surface width and height
    fn choose_swap_extent(capabilities: &SurfaceCapabilities, width: u32, height: u32) -> [u32; 2] {
        if let Some(current_extent) = capabilities.current_extent {
            current_extent
        } else {
            let mut actual_extent = [width, height];
            actual_extent[0] =
                capabilities.min_image_extent[0].max(capabilities.max_image_extent[0].min(actual_extent[0]));
            actual_extent[1] =
                capabilities.min_image_extent[1].max(capabilities.max_image_extent[1].min(actual_extent[1]));
            actual_extent
        }
    }

    // ----------------------------------------------------------------------------------------------------------------------
    //                                      VULKAN SETUP AND INITIALISATION
    // ----------------------------------------------------------------------------------------------------------------------

    /// Gets the queues that we want from the list of queues provided by the device.
    fn get_queues(queues: &[Arc<Queue>], surface: &Surface<Window>) -> (Arc<Queue>, Arc<Queue>) {
        let graphics_queue = queues
            .iter()
            .find(|q| q.family().supports_graphics())
            .expect("Cannot find graphics queue");
        let present_queue = queues
            .iter()
            .find(|q| q.family().supports_surface(surface).unwrap_or(false))
            .expect("Cannot find present queue");

        (graphics_queue.clone(), present_queue.clone())
    }

    /// Creates a Vulkan instance
    fn create_instance(extensions: InstanceExtensions) -> Arc<Instance> {
        let mut enabled_layers: Vec<String> = vec![];
        // push on validation layers if required
        if ENABLE_VALIDATION_LAYERS {
            enabled_layers.extend(VALIDATION_LAYERS.iter().map(|s| s.to_string()));
        }

        // create a new Vulkan instance
        Instance::new(InstanceCreateInfo {
            enabled_extensions: extensions,
            // Enable enumerating devices that use non-conformant vulkan implementations. (ex. MoltenVK)
            enumerate_portability: true,
            enabled_layers,
            ..Default::default()
        })
        .expect("failed to create instance")
    }

    /// Creates a debug callback, if the validation layer is enabled. This allows the validation layer to give us debug messages.
    fn setup_debug_callback(instance: &Arc<Instance>) -> Option<DebugUtilsMessenger> {
        if !ENABLE_VALIDATION_LAYERS {
            return None;
        }

        // the logging callback
        let log_message = Arc::new(|msg: &Message| {
            let msg_type = if msg.ty.general {
                "validation_layer/general"
            } else if msg.ty.validation {
                "validation_layer/validation"
            } else if msg.ty.performance {
                "validation_layer/performance"
            } else {
                "validation_layer/unknown"
            };
            if msg.severity.error {
                error!(target: msg_type, "{}", msg.description);
            } else if msg.severity.warning {
                warn!(target: msg_type, "{}", msg.description);
            } else {
                debug!(target: msg_type, "{}", msg.description);
            }
        });

        // setup/register the callback
        unsafe {
            Some(
                DebugUtilsMessenger::new(
                    instance.clone(),
                    DebugUtilsMessengerCreateInfo {
                        message_severity: DebugUtilsMessageSeverity::errors_and_warnings(),
                        message_type: DebugUtilsMessageType::all(),
                        ..DebugUtilsMessengerCreateInfo::user_callback(log_message)
                    },
                )
                .expect("Could not create debug messenger"),
            )
        }
    }

    /// Creates the preview window and a vulkan surface for it.
    fn create_surface(
        instance: &Arc<Instance>, event_loop: &EventLoop<()>, title: &str, width: u32, height: u32,
    ) -> Arc<Surface<Window>> {
        // `build_vk_surface` comes from the `VkSurfaceBuild` trait of `vulkano_win`; it returns
        // a `Surface` holding both the winit window and the Vulkan surface over it.
        WindowBuilder::new()
            .with_title(title)
            .with_inner_size(winit::dpi::LogicalSize::new(width, height))
            .with_resizable(false)
            .build_vk_surface(event_loop, instance.clone())
            .expect("Couldn't build surface")
    }

    /// Picks out the physical device with the lowest score (best performing device) that is deemed "suitable"
    fn pick_physical_device<W>(
        instance: &Arc<Instance>, device_extensions: DeviceExtensions, surface: &Surface<W>,
    ) -> usize {
        let mut sorted_devices = PhysicalDevice::enumerate(instance).enumerate().collect::<Vec<_>>();
        sorted_devices.sort_by_key(|(_, p)| {
            // We assign a lower score to device types that are likely to be faster/better.
            match p.properties().device_type {
                PhysicalDeviceType::DiscreteGpu => 0,
                PhysicalDeviceType::IntegratedGpu => 1,
                PhysicalDeviceType::VirtualGpu => 2,
                PhysicalDeviceType::Cpu => 3,
                PhysicalDeviceType::Other => 4,
            }
        });

        if !sorted_devices[0]
            .1
            .supported_extensions()
            .is_superset_of(&device_extensions)
        {
            let missing = device_extensions.difference(sorted_devices[0].1.supported_extensions());
            warn!(
                "Ideal device is missing extensions: {:?}\nTry updating your graphics drivers",
                missing
            );
        }

        // find the first device deemed "suitable"
        let (physical_device_index, physical_device) = sorted_devices
            .iter()
            .find(|(_, device)| Self::is_device_suitable(device, device_extensions, surface))
            .expect("failed to find a suitable GPU!");

        // debug info
        info!(
            "Using device: {} (type: {:?}, vk version: {})",
            physical_device.properties().device_name,
            physical_device.properties().device_type,
            physical_device.properties().api_version,
        );

        *physical_device_index
    }

    /// From a physical device, create a logical device, which is our method of talking to the physical device
    fn create_device(
        instance: &Arc<Instance>, physical_device_index: usize, device_extensions: DeviceExtensions,
    ) -> (Arc<Device>, Vec<Arc<Queue>>) {
        let physical_device = PhysicalDevice::from_index(instance, physical_device_index).unwrap();

        // get a list of every queue family available
        let queue_create_infos = physical_device.queue_families().map(QueueCreateInfo::family).collect();

        // create logical device
        let (device, queues) = Device::new(
            physical_device,
            DeviceCreateInfo {
                enabled_extensions: device_extensions,
                enabled_features: Self::get_required_device_features(),
                queue_create_infos,
                ..Default::default()
            },
        )
        .expect("failed to create logical device!");

        (device, queues.collect())
    }

    /// Creates the swap chain we present frames through
    #[allow(clippy::too_many_arguments)]
    fn create_swap_chain(
        instance: &Arc<Instance>, surface: &Arc<Surface<Window>>, physical_device_index: usize, device: &Arc<Device>,
        graphics_queue: &Arc<Queue>, present_queue: &Arc<Queue>, width: u32, height: u32,
    ) -> (Arc<Swapchain<Window>>, Vec<Arc<SwapchainImage<Window>>>) {
        let physical_device = PhysicalDevice::from_index(instance, physical_device_index).unwrap();

        // Find out the capabilities of the device given this surface
        let capabilities = physical_device
            .surface_capabilities(surface, SurfaceInfo::default())
            .expect("failed to get surface capabilities");

        let available_formats = physical_device
            .surface_formats(surface, SurfaceInfo::default())
            .expect("Cannot get surface formats");

        let available_present_modes = physical_device
            .surface_present_modes(surface)
            .expect("Cannot get surface present modes")
            .collect();

        // based on those capabilities, pick out formats and modes
        let surface_format = Self::choose_swap_surface_format(available_formats);
        let present_mode = Self::choose_swap_present_mode(available_present_modes);
        let extent = Self::choose_swap_extent(&capabilities, width, height);

        // number of swap chain images
        let mut image_count = capabilities.min_image_count + 1;
        if capabilities.max_image_count.is_some() && image_count > capabilities.max_image_count.unwrap() {
            image_count = capabilities.max_image_count.unwrap();
        }

        // the swapchain images are only ever rendered to as colour attachments
        let image_usage = ImageUsage {
            color_attachment: true,
            ..ImageUsage::none()
        };
        // how to share swapchain resources.
        let sharing = if graphics_queue == present_queue {
            Sharing::Exclusive
        } else {
            Sharing::Concurrent(vec![graphics_queue.family().id(), present_queue.family().id()].into())
        };

        let (swap_chain, images) = Swapchain::new(
            device.clone(),
            surface.clone(),
            SwapchainCreateInfo {
                min_image_count: image_count,
                image_format: Some(surface_format.0),
                image_color_space: surface_format.1,
                image_usage,
                image_extent: extent,
                image_array_layers: 1,
                image_sharing: sharing,
                present_mode,
                clipped: true,
                ..Default::default()
            },
        )
        .expect("failed to create swap chain!");

        (swap_chain, images)
    }
}

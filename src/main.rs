//! Arcanoid entry point
//!
//! Opens the window, graphics device and audio device, then runs the frame
//! loop. Any bootstrap failure is reported and exits with a non-zero code.

use std::process::ExitCode;
use std::rc::Rc;

use arcanoid::audio::{AudioBackend, RodioBackend, SilentBackend};
use arcanoid::gpu::{AssetDir, GraphicsBackend, WgpuBackend};
use arcanoid::platform::WinitPlatform;
use arcanoid::{BootstrapError, FrameDriver, Handle, Settings};

fn run() -> Result<(), BootstrapError> {
    let settings = Settings::load();

    let platform = WinitPlatform::new(&settings.window)?;
    let window = platform
        .window()
        .ok_or_else(|| BootstrapError::Window("window was not created".into()))?;
    let (width, height) = platform.framebuffer_size();

    let graphics: Rc<dyn GraphicsBackend> =
        Rc::new(WgpuBackend::new(window, width, height, settings.window.vsync)?);

    let audio: Rc<dyn AudioBackend> = if settings.audio.enabled {
        Rc::new(RodioBackend::new(settings.effective_volume())?)
    } else {
        log::info!("Audio disabled in settings");
        Rc::new(SilentBackend::new())
    };

    let loader = Box::new(AssetDir::new(settings.assets.root.clone()));
    let mut driver = FrameDriver::new(
        platform,
        Handle::from(graphics),
        Handle::from(audio),
        loader,
        settings,
    )?;
    driver.run()
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Arcanoid starting...");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

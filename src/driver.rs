//! Frame driver: poll input, render, present, then advance the simulation
//!
//! One iteration per frame on the calling thread. The update step uses the
//! wall-clock time the iteration took, so the simulation runs on a variable
//! timestep and is not frame-rate independent.

use std::path::PathBuf;

use crate::audio::{AudioBackend, AudioEntry, AudioSource};
use crate::error::BootstrapError;
use crate::gpu::{GraphicsBackend, ShaderSourceLoader};
use crate::handle::Handle;
use crate::platform::{Key, Platform};
use crate::renderer::{Scene, colors};
use crate::settings::Settings;
use crate::sim::{GameEvent, GameState, TickInput, tick};

/// Everything recreated by a reload
struct Resources {
    state: GameState,
    scene: Scene,
    /// Kept alive for as long as a voice may play it
    click: Handle<AudioEntry>,
    ball_voice: AudioSource,
    paddle_voice: AudioSource,
}

pub struct FrameDriver<P: Platform> {
    platform: P,
    graphics: Handle<dyn GraphicsBackend>,
    audio: Handle<dyn AudioBackend>,
    loader: Box<dyn ShaderSourceLoader>,
    settings: Settings,
    resources: Resources,
    reload_held: bool,
    frames: u64,
}

impl<P: Platform> FrameDriver<P> {
    pub fn new(
        platform: P,
        graphics: Handle<dyn GraphicsBackend>,
        audio: Handle<dyn AudioBackend>,
        loader: Box<dyn ShaderSourceLoader>,
        settings: Settings,
    ) -> Result<Self, BootstrapError> {
        let resources = create_resources(&graphics, &audio, loader.as_ref(), &settings)?;
        Ok(Self {
            platform,
            graphics,
            audio,
            loader,
            settings,
            resources,
            reload_held: false,
            frames: 0,
        })
    }

    /// Run frames until the platform asks to close
    pub fn run(&mut self) -> Result<(), BootstrapError> {
        log::info!("Entering main loop");
        while !self.platform.should_close() {
            self.frame()?;
        }
        log::info!("Main loop finished after {} frames", self.frames);
        Ok(())
    }

    /// One iteration: input, render, present, update
    pub fn frame(&mut self) -> Result<(), BootstrapError> {
        let start = self.platform.time();

        self.platform.poll_events();
        self.handle_commands()?;

        self.graphics.clear(colors::BACKGROUND);
        self.resources.scene.draw(&self.resources.state)?;
        self.graphics.present();

        let dt = (self.platform.time() - start) as f32;
        self.update(dt);
        self.frames += 1;
        Ok(())
    }

    fn handle_commands(&mut self) -> Result<(), BootstrapError> {
        if self.platform.key_down(Key::Escape) {
            self.platform.set_should_close(true);
        }

        let reload = self.platform.key_down(Key::R);
        if reload && !self.reload_held {
            self.reload()?;
        }
        self.reload_held = reload;
        Ok(())
    }

    /// Recreate the game state and every GPU and audio resource
    pub fn reload(&mut self) -> Result<(), BootstrapError> {
        log::info!("Reloading resources");
        self.resources = create_resources(
            &self.graphics,
            &self.audio,
            self.loader.as_ref(),
            &self.settings,
        )?;
        Ok(())
    }

    fn paddle_axis(&self) -> f32 {
        let left = self.platform.key_down(Key::A) || self.platform.key_down(Key::Left);
        let right = self.platform.key_down(Key::D) || self.platform.key_down(Key::Right);
        match (left, right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    fn update(&mut self, dt: f32) {
        let input = TickInput {
            paddle_axis: self.paddle_axis(),
        };
        tick(&mut self.resources.state, &input, dt);

        let res = &mut self.resources;
        for event in res.state.drain_events() {
            match event {
                GameEvent::WallBounce | GameEvent::CeilingBounce | GameEvent::CellDestroyed { .. } => {
                    res.ball_voice.play(&res.click)
                }
                GameEvent::PaddleHit => res.paddle_voice.play(&res.click),
                GameEvent::WorldExit => log::info!("Round lost, press R to restart"),
            }
        }
    }

    pub fn state(&self) -> &GameState {
        &self.resources.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.resources.state
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

fn create_resources(
    graphics: &Handle<dyn GraphicsBackend>,
    audio: &Handle<dyn AudioBackend>,
    loader: &dyn ShaderSourceLoader,
    settings: &Settings,
) -> Result<Resources, BootstrapError> {
    let state = settings.new_game();
    let scene = Scene::new(graphics, loader, &settings.assets.shader_dir, &state)?;

    let click_path: PathBuf = settings.assets.click_sound_path();
    let click = Handle::try_make(|| AudioEntry::load(audio, &click_path))?;
    let ball_voice = AudioSource::new(audio)?;
    let paddle_voice = AudioSource::new(audio)?;

    Ok(Resources {
        state,
        scene,
        click,
        ball_voice,
        paddle_voice,
    })
}

//! Composition root for the audio subsystem
//!
//! Owns one [`BgmEngine`] and one [`SeVoicePool`] behind a single facade
//! the rest of the game talks to. The system is an explicit instance the
//! host creates and hands around by reference — there is no process-wide
//! singleton and no ambient mutable state.
//!
//! Every call is synchronous and non-blocking: it records intent and
//! returns; state changes are realized on subsequent [`AudioSystem::tick`]
//! calls from the host loop.

use crate::catalog::{Catalog, Clip};
use crate::config::AudioConfig;
use crate::error::Result;
use crate::events::AudioEvent;
use crate::playback::bgm::BgmEngine;
use crate::playback::voices::{SeParams, SeVoicePool};
use std::sync::Arc;
use tracing::info;

pub struct AudioSystem {
    bgm: BgmEngine,
    se: SeVoicePool,
    play_on_start: bool,
}

impl AudioSystem {
    /// Build the subsystem from a validated config and the two catalogs
    pub fn new(
        config: &AudioConfig,
        bgm_catalog: Arc<Catalog>,
        se_catalog: Arc<Catalog>,
    ) -> Result<Self> {
        config.validate()?;
        let mut bgm = BgmEngine::new(bgm_catalog, config.fade_seconds);
        bgm.set_bus_level(config.bgm_level);
        let mut se = SeVoicePool::new(se_catalog, config.voice_count);
        se.set_bus_level(config.se_level);
        info!(
            voices = config.voice_count,
            fade_seconds = config.fade_seconds,
            "audio subsystem ready"
        );
        Ok(Self {
            bgm,
            se,
            play_on_start: config.play_on_start,
        })
    }

    /// Assemble from pre-built engines (custom RNG seeding, tests)
    pub fn from_parts(bgm: BgmEngine, se: SeVoicePool, play_on_start: bool) -> Self {
        Self {
            bgm,
            se,
            play_on_start,
        }
    }

    /// Kick off playback: honors `play_on_start` with a random BGM track
    pub fn start(&mut self) {
        if self.play_on_start {
            self.bgm.play_random();
        }
    }

    /// Advance both engines by `dt` seconds of tick time
    pub fn tick(&mut self, dt: f64) -> Vec<AudioEvent> {
        let mut events = self.bgm.tick(dt);
        events.extend(self.se.tick(dt));
        events
    }

    pub fn play_bgm(&mut self, name: &str) -> Result<()> {
        self.bgm.play_track(name)
    }

    pub fn play_random_bgm(&mut self) {
        self.bgm.play_random();
    }

    pub fn pause_bgm(&mut self) {
        self.bgm.pause();
    }

    pub fn resume_bgm(&mut self) {
        self.bgm.resume();
    }

    pub fn stop_bgm(&mut self) {
        self.bgm.stop();
    }

    pub fn set_bgm_bus_volume(&mut self, level: f32) {
        self.bgm.set_bus_level(level);
    }

    pub fn play_se(&mut self, name: &str, params: SeParams) -> Result<usize> {
        self.se.play(name, params)
    }

    pub fn play_se_clip(&mut self, clip: Clip, params: SeParams) -> Result<usize> {
        self.se.play_clip(clip, params)
    }

    pub fn wait_and_play_se(&mut self, name: &str, delay: f64, params: SeParams) -> Result<()> {
        self.se.wait_and_play(name, delay, params)
    }

    pub fn set_se_bus_volume(&mut self, level: f32) {
        self.se.set_bus_level(level);
    }

    pub fn bgm(&self) -> &BgmEngine {
        &self.bgm
    }

    pub fn se(&self) -> &SeVoicePool {
        &self.se
    }
}

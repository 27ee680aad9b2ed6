//! Sound-effect voice pool
//!
//! A fixed set of channels allocated once at construction. Effects are
//! fire-and-forget: allocate a free voice, set clip/volume/pitch, play.
//! No fades. When every voice is busy, an important request reclaims
//! voice 0 — cut off, no grace period — and anything else is declined.
//!
//! The pool size is a hard capacity bound; it is never resized.

use crate::catalog::{Catalog, Clip, SoundEntry};
use crate::error::{Error, Result};
use crate::events::AudioEvent;
use crate::playback::channel::{Bus, Channel};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, warn};

/// Pitch range drawn from when a request leaves pitch unspecified
const PITCH_JITTER: Range<f32> = 0.8..1.2;

/// Per-request playback parameters
#[derive(Debug, Clone, Copy)]
pub struct SeParams {
    /// Multiplied with the entry's base volume for name-based requests
    pub volume: f32,
    /// `None` draws uniformly from [0.8, 1.2)
    pub pitch: Option<f32>,
    /// May reclaim voice 0 when the pool is exhausted
    pub important: bool,
}

impl Default for SeParams {
    fn default() -> Self {
        Self {
            volume: 1.0,
            pitch: None,
            important: false,
        }
    }
}

impl SeParams {
    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn pitch(mut self, pitch: f32) -> Self {
        self.pitch = Some(pitch);
        self
    }

    pub fn important(mut self) -> Self {
        self.important = true;
        self
    }
}

/// A deferred play waiting for its delay to elapse
///
/// The entry was resolved at schedule time (the catalog never changes);
/// voice allocation waits until the fire tick.
#[derive(Debug, Clone)]
struct DeferredSe {
    entry: SoundEntry,
    params: SeParams,
    remaining: f64,
}

/// Pooled sound-effect voices
pub struct SeVoicePool {
    catalog: Arc<Catalog>,
    voices: Vec<Channel>,
    bus: Bus,
    pending: Vec<DeferredSe>,
    events: Vec<AudioEvent>,
    rng: StdRng,
}

impl SeVoicePool {
    pub const DEFAULT_VOICES: usize = 20;

    pub fn new(catalog: Arc<Catalog>, voice_count: usize) -> Self {
        Self::with_rng(catalog, voice_count, StdRng::from_entropy())
    }

    /// Seeded variant for deterministic pitch jitter in tests
    pub fn with_rng(catalog: Arc<Catalog>, voice_count: usize, rng: StdRng) -> Self {
        let voices = (0..voice_count.max(1)).map(|_| Channel::new()).collect();
        Self {
            catalog,
            voices,
            bus: Bus::default(),
            pending: Vec::new(),
            events: Vec::new(),
            rng,
        }
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn voice(&self, index: usize) -> Option<&Channel> {
        self.voices.get(index)
    }

    pub fn busy_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_playing()).count()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Set the output-bus level (linear 0..1, applied as dB gain)
    pub fn set_bus_level(&mut self, level: f32) {
        self.bus.set_level(level);
    }

    /// Play a named effect immediately; returns the voice index used
    ///
    /// A missing name never consumes a voice.
    pub fn play(&mut self, name: &str, params: SeParams) -> Result<usize> {
        let entry = match self.catalog.get(name) {
            Ok(entry) => entry.clone(),
            Err(err) => {
                warn!(name, "sound effect not in catalog");
                return Err(err);
            }
        };
        self.play_entry(&entry, params)
    }

    /// Play a clip the caller already holds; `params.volume` is used
    /// as-is since there is no catalog base volume to scale
    pub fn play_clip(&mut self, clip: Clip, params: SeParams) -> Result<usize> {
        let voice = self.allocate(params.important)?;
        let pitch = self.resolve_pitch(params.pitch);
        self.start_voice(voice, clip, params.volume, pitch);
        self.events.push(AudioEvent::SeStarted { name: None, voice });
        Ok(voice)
    }

    /// Schedule a named effect to play `delay` seconds from now
    ///
    /// The delay is measured from this call in tick time. Allocation
    /// happens at the fire tick, so exhaustion is judged then; a dropped
    /// deferred play surfaces as [`AudioEvent::SeDropped`].
    pub fn wait_and_play(&mut self, name: &str, delay: f64, params: SeParams) -> Result<()> {
        let entry = match self.catalog.get(name) {
            Ok(entry) => entry.clone(),
            Err(err) => {
                warn!(name, "deferred sound effect not in catalog");
                return Err(err);
            }
        };
        self.pending.push(DeferredSe {
            entry,
            params,
            remaining: delay.max(0.0),
        });
        Ok(())
    }

    /// Cancel every deferred play (teardown support)
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Advance voice playback and fire deferred plays that came due
    pub fn tick(&mut self, dt: f64) -> Vec<AudioEvent> {
        for voice in &mut self.voices {
            voice.tick(dt);
        }

        let mut index = 0;
        let mut due = Vec::new();
        while index < self.pending.len() {
            self.pending[index].remaining -= dt;
            if self.pending[index].remaining <= 0.0 {
                due.push(self.pending.remove(index));
            } else {
                index += 1;
            }
        }
        for deferred in due {
            if self.play_entry(&deferred.entry, deferred.params).is_err() {
                // Exhaustion at fire time: the drop is acceptable, just
                // surfaced to whoever is listening.
                debug!(name = %deferred.entry.name, "deferred effect dropped, pool exhausted");
                self.events.push(AudioEvent::SeDropped {
                    name: Some(deferred.entry.name.clone()),
                });
            }
        }

        std::mem::take(&mut self.events)
    }

    fn play_entry(&mut self, entry: &SoundEntry, params: SeParams) -> Result<usize> {
        let voice = self.allocate(params.important)?;
        let pitch = self.resolve_pitch(params.pitch);
        self.start_voice(voice, entry.clip, entry.base_volume * params.volume, pitch);
        self.events.push(AudioEvent::SeStarted {
            name: Some(entry.name.clone()),
            voice,
        });
        Ok(voice)
    }

    /// First free voice, or voice 0 by force for important requests
    fn allocate(&mut self, important: bool) -> Result<usize> {
        if let Some(index) = self.voices.iter().position(|v| !v.is_playing()) {
            return Ok(index);
        }
        if important {
            // Voice 0 is the dedicated override slot
            self.voices[0].stop();
            self.events.push(AudioEvent::VoicePreempted { voice: 0 });
            debug!("voice 0 preempted for important effect");
            return Ok(0);
        }
        debug!("no free voice, effect declined");
        Err(Error::PoolExhausted)
    }

    fn resolve_pitch(&mut self, pitch: Option<f32>) -> f32 {
        pitch.unwrap_or_else(|| self.rng.gen_range(PITCH_JITTER))
    }

    fn start_voice(&mut self, index: usize, clip: Clip, volume: f32, pitch: f32) {
        let voice = &mut self.voices[index];
        voice.stop();
        voice.assign(clip);
        voice.set_volume(volume);
        voice.set_pitch(pitch);
        voice.play();
    }
}

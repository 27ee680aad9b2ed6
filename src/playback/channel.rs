//! Playback channels and output-bus gain
//!
//! A [`Channel`] models one host-engine playback slot: which clip it
//! holds, its gain and pitch, whether it is playing, and how far into the
//! clip it is. The host mirrors this state after each tick; nothing here
//! touches samples.
//!
//! Channels are allocated once at subsystem startup and reused for its
//! lifetime. Each channel is exclusively owned by one engine, which rules
//! out cross-engine races on the shared mixer state by construction.

use crate::catalog::Clip;
use crate::playback::fade::{FadeCurve, FadeState, FadeTask};

/// What a channel observed during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelTick {
    /// The attached fade finished this tick
    pub fade_completed: bool,
    /// Playback ran past the end of the clip and the channel stopped
    pub clip_ended: bool,
}

/// One playback slot
#[derive(Debug)]
pub struct Channel {
    clip: Option<Clip>,
    volume: f32,
    pitch: f32,
    playing: bool,
    position: f64,
    fade: Option<FadeTask>,
}

impl Channel {
    pub fn new() -> Self {
        Self {
            clip: None,
            volume: 0.0,
            pitch: 1.0,
            playing: false,
            position: 0.0,
            fade: None,
        }
    }

    pub fn clip(&self) -> Option<Clip> {
        self.clip
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Playback position in seconds from the clip start
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_fading(&self) -> bool {
        self.fade.as_ref().is_some_and(FadeTask::is_running)
    }

    pub fn assign(&mut self, clip: Clip) {
        self.clip = Some(clip);
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch;
    }

    /// Start (or restart) playback from the current position
    pub fn play(&mut self) {
        self.playing = true;
    }

    /// Stop playback and rewind to the clip start
    pub fn stop(&mut self) {
        self.playing = false;
        self.position = 0.0;
    }

    /// Attach a new fade, replacing any prior one
    ///
    /// The incumbent fade (if any) is cancelled first — two fades never
    /// compete for this channel's volume. A non-positive duration jumps
    /// straight to `to` and reports `Completed` synchronously; the caller
    /// sees no task attached afterwards.
    pub fn begin_fade(&mut self, from: f32, to: f32, duration: f64, curve: FadeCurve) -> FadeState {
        if let Some(fade) = self.fade.as_mut() {
            fade.cancel();
        }
        let task = FadeTask::new(from, to, duration, curve);
        if task.is_running() {
            self.set_volume(from);
            self.fade = Some(task);
            FadeState::Running
        } else {
            self.set_volume(to);
            self.fade = None;
            FadeState::Completed
        }
    }

    /// Cancel the attached fade, leaving the volume where the ramp last
    /// put it
    pub fn cancel_fade(&mut self) {
        if let Some(fade) = self.fade.as_mut() {
            fade.cancel();
        }
        self.fade = None;
    }

    /// Advance the fade and playback position by `dt` seconds
    pub fn tick(&mut self, dt: f64) -> ChannelTick {
        let mut out = ChannelTick::default();

        if let Some(fade) = self.fade.as_mut() {
            match fade.advance(dt) {
                Some(volume) => {
                    let finished = !fade.is_running();
                    self.set_volume(volume);
                    if finished {
                        out.fade_completed = true;
                        self.fade = None;
                    }
                }
                None => {
                    // Cancelled before this tick; drop the husk
                    self.fade = None;
                }
            }
        }

        if self.playing {
            self.position += dt * f64::from(self.pitch);
            if let Some(clip) = self.clip {
                if self.position >= clip.duration {
                    self.playing = false;
                    self.position = 0.0;
                    out.clip_ended = true;
                }
            }
        }

        out
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::new()
    }
}

/// Floor applied to the linear level before the log so zero stays finite
const LEVEL_FLOOR: f32 = 1e-4;

/// Logarithmic output-bus gain
///
/// Stores the linear [0, 1] level alongside the dB gain handed to the
/// host mixer: `gain_db = 20 × log10(max(level, 1e-4))`. Bus gain
/// multiplies a whole output group and is independent of per-channel
/// fades.
#[derive(Debug, Clone, Copy)]
pub struct Bus {
    level: f32,
    gain_db: f32,
}

impl Bus {
    pub fn new(level: f32) -> Self {
        let mut bus = Self {
            level: 0.0,
            gain_db: 0.0,
        };
        bus.set_level(level);
        bus
    }

    pub fn set_level(&mut self, level: f32) {
        let level = level.clamp(0.0, 1.0);
        self.level = level;
        self.gain_db = 20.0 * level.max(LEVEL_FLOOR).log10();
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(1.0)
    }
}

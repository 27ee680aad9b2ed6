//! Notification events emitted by the engines
//!
//! Each scheduling tick returns the events it produced; host code drains
//! the vector and reacts (UI feedback, debugging, save triggers). The
//! engines never block on a consumer.

use serde::Serialize;

/// Events surfaced from `tick()`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AudioEvent {
    /// A BGM track was assigned to the channel and its fade-in started
    BgmStarted { name: String },

    /// End-of-track crossfade began; the fade-out lasts exactly
    /// `remaining` seconds so it lands on the clip end
    BgmCrossfadeBegun { name: String, remaining: f64 },

    /// Pause fade finished and the channel stopped (track kept for resume)
    BgmPaused,

    /// Stop fade finished; channel stopped and current track cleared
    BgmStopped,

    /// A sound effect started on `voice` (`name` is `None` for
    /// direct-clip requests)
    SeStarted { name: Option<String>, voice: usize },

    /// A deferred, non-important effect found every voice busy at fire
    /// time and was dropped
    SeDropped { name: Option<String> },

    /// Voice 0 was forcibly reclaimed for an important effect
    VoicePreempted { voice: usize },
}

//! # cuebox
//!
//! Audio playback management for games: a background-music crossfade
//! engine and a pooled sound-effect voice allocator, coordinated by a
//! host-driven cooperative tick.
//!
//! The crate owns the control plane only: it decides which clip plays on
//! which channel, at what gain, and when transitions occur. Decoding and
//! sample rendering stay in the host audio engine, which mirrors
//! [`Channel`] state after each tick.
//!
//! ```
//! use cuebox::{AudioConfig, AudioSystem, Catalog, Clip, SoundEntry};
//! use std::sync::Arc;
//!
//! let bgm = Arc::new(Catalog::new([
//!     SoundEntry::new("theme", Clip::new(120.0), 0.8),
//! ]).unwrap());
//! let se = Arc::new(Catalog::new([
//!     SoundEntry::new("click", Clip::new(0.3), 1.0),
//! ]).unwrap());
//!
//! let config = AudioConfig::default();
//! let mut audio = AudioSystem::new(&config, bgm, se).unwrap();
//! audio.play_bgm("theme").unwrap();
//! for _ in 0..120 {
//!     let _events = audio.tick(1.0 / 60.0);
//! }
//! assert!(audio.bgm().is_playing());
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod playback;
pub mod system;

pub use catalog::{Catalog, Clip, ClipId, SoundEntry};
pub use config::AudioConfig;
pub use error::{Error, Result};
pub use events::AudioEvent;
pub use playback::bgm::BgmEngine;
pub use playback::channel::{Bus, Channel, ChannelTick};
pub use playback::fade::{FadeCurve, FadeState, FadeTask};
pub use playback::voices::{SeParams, SeVoicePool};
pub use system::AudioSystem;

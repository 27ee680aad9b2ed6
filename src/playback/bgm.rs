//! Background-music engine
//!
//! Owns the single BGM channel. Sequences fade-out of the old track and
//! fade-in of the new, auto-advances to a random next track when the
//! current one runs out, and handles pause/resume/stop. Public calls only
//! record intent on the channel; all progress happens on the host tick.
//!
//! Operations against the channel are totally ordered by issue time: a
//! later request supersedes an earlier one that has not finished, by
//! replacing its fade and its queued continuation.

use crate::catalog::{Catalog, SoundEntry};
use crate::error::Result;
use crate::events::AudioEvent;
use crate::playback::channel::{Bus, Channel};
use crate::playback::fade::{FadeCurve, FadeState};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{debug, warn};

/// Continuation to run once the active fade-out lands on silence
#[derive(Debug, Clone, PartialEq)]
enum Then {
    /// Assign this entry and fade it in
    Start(SoundEntry),
    /// Pick a random track and fade it in (end-of-track advance)
    Next,
    /// Stop the channel, keeping the current track for resume
    Pause,
    /// Stop the channel and clear the current track
    Stop,
}

/// Engine phase
///
/// `FadingIn` and `FadingOut` are exactly the phases with a fade attached
/// to the channel; `tick` asserts that correspondence.
#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Idle,
    FadingIn,
    Playing,
    FadingOut(Then),
    Paused,
}

/// BGM crossfade controller
///
/// Holds one track at a time. Track switches are sequential, not
/// overlapping: the outgoing track fades to silence and stops before the
/// incoming clip is assigned, so the channel never carries two clips.
pub struct BgmEngine {
    catalog: Arc<Catalog>,
    channel: Channel,
    bus: Bus,
    fade_secs: f64,
    curve: FadeCurve,
    current: Option<SoundEntry>,
    phase: Phase,
    pending: Vec<AudioEvent>,
    rng: StdRng,
}

impl BgmEngine {
    /// Fade window applied to every transition except the end-of-track
    /// crossfade, which uses the exact remaining time instead.
    pub const DEFAULT_FADE_SECS: f64 = 1.0;

    pub fn new(catalog: Arc<Catalog>, fade_secs: f64) -> Self {
        Self::with_rng(catalog, fade_secs, StdRng::from_entropy())
    }

    /// Seeded variant for deterministic track selection in tests
    pub fn with_rng(catalog: Arc<Catalog>, fade_secs: f64, rng: StdRng) -> Self {
        Self {
            catalog,
            channel: Channel::new(),
            bus: Bus::default(),
            fade_secs: fade_secs.max(0.0),
            curve: FadeCurve::EaseInQuad,
            current: None,
            phase: Phase::Idle,
            pending: Vec::new(),
            rng,
        }
    }

    /// Name of the track the engine currently holds, if any
    pub fn current_track(&self) -> Option<&str> {
        self.current.as_ref().map(|entry| entry.name.as_str())
    }

    pub fn is_playing(&self) -> bool {
        self.channel.is_playing()
    }

    pub fn is_fading(&self) -> bool {
        self.channel.is_fading()
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Set the output-bus level (linear 0..1, applied as dB gain)
    pub fn set_bus_level(&mut self, level: f32) {
        self.bus.set_level(level);
    }

    /// Switch to the named track: fade the old one to silence, then fade
    /// the new one in
    ///
    /// An unknown name is reported and leaves playback state untouched.
    pub fn play_track(&mut self, name: &str) -> Result<()> {
        let entry = match self.catalog.get(name) {
            Ok(entry) => entry.clone(),
            Err(err) => {
                warn!(name, "BGM track not in catalog");
                return Err(err);
            }
        };
        self.begin_track(entry);
        Ok(())
    }

    /// Switch to a uniformly random catalog track; no-op when the catalog
    /// is empty
    pub fn play_random(&mut self) {
        let entry = self.catalog.choose(&mut self.rng).cloned();
        match entry {
            Some(entry) => self.begin_track(entry),
            None => debug!("BGM catalog is empty, nothing to play"),
        }
    }

    /// Fade to silence and stop, keeping the current track for `resume`
    pub fn pause(&mut self) {
        match self.phase {
            Phase::Idle | Phase::Paused => {}
            _ => self.fade_to_silence(Then::Pause, self.fade_secs),
        }
    }

    /// Restart the held track from the top, fading up from the channel's
    /// current volume
    ///
    /// With no current track this is a benign no-op, not an error.
    pub fn resume(&mut self) {
        let Some(entry) = self.current.clone() else {
            return;
        };
        debug!(track = %entry.name, "BGM resumed");
        let from = self.channel.volume();
        self.channel.play();
        let outcome = self
            .channel
            .begin_fade(from, entry.base_volume, self.fade_secs, self.curve);
        self.phase = match outcome {
            FadeState::Running => Phase::FadingIn,
            _ => Phase::Playing,
        };
    }

    /// Fade to silence, stop, and clear the current track
    pub fn stop(&mut self) {
        match self.phase {
            Phase::Idle => {}
            Phase::Paused => {
                // Already silent; clear without a fade
                self.channel.stop();
                self.current = None;
                self.phase = Phase::Idle;
                self.pending.push(AudioEvent::BgmStopped);
            }
            _ => self.fade_to_silence(Then::Stop, self.fade_secs),
        }
    }

    /// Advance fades, run queued transitions, and check for end-of-track
    ///
    /// Returns the events produced by this tick and by any calls issued
    /// since the previous one.
    pub fn tick(&mut self, dt: f64) -> Vec<AudioEvent> {
        let tick = self.channel.tick(dt);

        if tick.fade_completed {
            match self.phase {
                Phase::FadingIn => self.phase = Phase::Playing,
                Phase::FadingOut(_) => self.finish_fade_out(),
                _ => {}
            }
        }

        if tick.clip_ended && self.phase == Phase::Playing {
            // Ran off the end without a crossfade window (zero-length
            // window or one giant dt): advance immediately.
            self.advance_to_next();
        }

        // End-of-track auto-advance: only while audibly playing and not
        // already fading, so the crossfade cannot re-trigger until the
        // next track's fade-in has finished.
        if self.phase == Phase::Playing && self.channel.is_playing() {
            if let Some(clip) = self.channel.clip() {
                let remaining = clip.duration - self.channel.position();
                if remaining <= self.fade_secs {
                    let name = self
                        .current
                        .as_ref()
                        .map(|entry| entry.name.clone())
                        .unwrap_or_default();
                    debug!(track = %name, remaining, "BGM end of track, crossfading");
                    self.pending
                        .push(AudioEvent::BgmCrossfadeBegun { name, remaining });
                    // The fade-out must land exactly on the clip end, so
                    // it runs over the remaining time, not the window.
                    self.fade_to_silence(Then::Next, remaining.max(0.0));
                }
            }
        }

        debug_assert_eq!(
            self.channel.is_fading(),
            matches!(self.phase, Phase::FadingIn | Phase::FadingOut(_)),
            "fade attachment must mirror the engine phase"
        );

        std::mem::take(&mut self.pending)
    }

    fn begin_track(&mut self, entry: SoundEntry) {
        if self.channel.is_playing() {
            // Audible track: fade it to silence first, then swap
            self.fade_to_silence(Then::Start(entry), self.fade_secs);
        } else {
            // Idle or paused: nothing audible to fade out
            self.start_fade_in(entry);
        }
    }

    fn fade_to_silence(&mut self, then: Then, duration: f64) {
        let from = self.channel.volume();
        let outcome = self.channel.begin_fade(from, 0.0, duration, self.curve);
        self.phase = Phase::FadingOut(then);
        if outcome == FadeState::Completed {
            // Zero-length window: resolve synchronously
            self.finish_fade_out();
        }
    }

    fn start_fade_in(&mut self, entry: SoundEntry) {
        self.channel.stop();
        self.channel.assign(entry.clip);
        self.channel.set_pitch(1.0);
        self.channel.set_volume(0.0);
        self.channel.play();
        let outcome = self
            .channel
            .begin_fade(0.0, entry.base_volume, self.fade_secs, self.curve);
        debug!(track = %entry.name, "BGM fade-in started");
        self.pending.push(AudioEvent::BgmStarted {
            name: entry.name.clone(),
        });
        self.current = Some(entry);
        self.phase = match outcome {
            FadeState::Running => Phase::FadingIn,
            _ => Phase::Playing,
        };
    }

    fn finish_fade_out(&mut self) {
        let then = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::FadingOut(then) => then,
            other => {
                self.phase = other;
                return;
            }
        };
        match then {
            Then::Start(entry) => self.start_fade_in(entry),
            Then::Next => self.advance_to_next(),
            Then::Pause => {
                self.channel.stop();
                self.phase = Phase::Paused;
                self.pending.push(AudioEvent::BgmPaused);
            }
            Then::Stop => {
                self.channel.stop();
                self.current = None;
                self.phase = Phase::Idle;
                self.pending.push(AudioEvent::BgmStopped);
            }
        }
    }

    fn advance_to_next(&mut self) {
        let entry = self.catalog.choose(&mut self.rng).cloned();
        match entry {
            Some(entry) => self.start_fade_in(entry),
            None => {
                self.channel.stop();
                self.current = None;
                self.phase = Phase::Idle;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Clip;
    use crate::error::Error;

    const DT: f64 = 0.125;

    fn engine_with(entries: Vec<SoundEntry>, fade_secs: f64) -> BgmEngine {
        let catalog = Arc::new(Catalog::new(entries).unwrap());
        BgmEngine::with_rng(catalog, fade_secs, StdRng::seed_from_u64(1))
    }

    fn single_track_engine(duration: f64, fade_secs: f64) -> BgmEngine {
        engine_with(
            vec![SoundEntry::new("theme", Clip::new(duration), 0.8)],
            fade_secs,
        )
    }

    /// Run `seconds` worth of ticks, collecting every event
    fn run(engine: &mut BgmEngine, seconds: f64) -> Vec<AudioEvent> {
        let steps = (seconds / DT).round() as usize;
        let mut events = Vec::new();
        for _ in 0..steps {
            events.extend(engine.tick(DT));
        }
        events
    }

    #[test]
    fn unknown_name_is_reported_and_state_unchanged() {
        let mut engine = single_track_engine(60.0, 1.0);
        engine.play_track("theme").unwrap();
        run(&mut engine, 2.0);

        let before = engine.current_track().map(str::to_owned);
        let err = engine.play_track("nonexistent").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(engine.current_track().map(str::to_owned), before);
        assert!(engine.is_playing());
    }

    #[test]
    fn fade_in_reaches_base_volume() {
        let mut engine = single_track_engine(60.0, 1.0);
        engine.play_track("theme").unwrap();
        assert_eq!(engine.channel().volume(), 0.0);

        run(&mut engine, 1.0);
        assert_eq!(engine.channel().volume(), 0.8);
        assert!(!engine.is_fading());
        assert!(engine.is_playing());
    }

    #[test]
    fn track_switch_is_sequential_fades() {
        let mut engine = engine_with(
            vec![
                SoundEntry::new("alpha", Clip::new(60.0), 1.0),
                SoundEntry::new("beta", Clip::new(60.0), 0.5),
            ],
            1.0,
        );
        engine.play_track("alpha").unwrap();
        run(&mut engine, 2.0);
        let alpha_clip = engine.channel().clip().unwrap();

        engine.play_track("beta").unwrap();
        // Halfway through the fade-out the old clip is still assigned
        run(&mut engine, 0.5);
        assert_eq!(engine.channel().clip().unwrap(), alpha_clip);
        assert!(engine.channel().volume() < 1.0);

        // Fade-out completes at 1.0 s, then beta fades in over another 1.0 s
        run(&mut engine, 0.5);
        assert_eq!(engine.current_track(), Some("beta"));
        assert_ne!(engine.channel().clip().unwrap(), alpha_clip);
        run(&mut engine, 1.0);
        assert_eq!(engine.channel().volume(), 0.5);
    }

    #[test]
    fn crossfade_begins_and_ends_on_clip_boundary() {
        // 10 s track, 1 s window: fade-out starts at t = 9 and lands at
        // t = 10, within one tick either way.
        let mut engine = single_track_engine(10.0, 1.0);
        engine.play_track("theme").unwrap();

        let events = run(&mut engine, 9.0 - DT);
        assert!(events
            .iter()
            .all(|e| !matches!(e, AudioEvent::BgmCrossfadeBegun { .. })));

        let events = run(&mut engine, DT);
        let remaining = events.iter().find_map(|e| match e {
            AudioEvent::BgmCrossfadeBegun { remaining, .. } => Some(*remaining),
            _ => None,
        });
        let remaining = remaining.expect("crossfade should begin at t = 9");
        assert!((remaining - 1.0).abs() <= DT);

        // Just before the boundary the fade-out is still running
        let events = run(&mut engine, 1.0 - DT);
        assert!(events
            .iter()
            .all(|e| !matches!(e, AudioEvent::BgmStarted { .. })));
        assert!(engine.is_fading());

        // On the boundary tick the old fade lands and the next track starts
        let events = run(&mut engine, DT);
        assert!(events
            .iter()
            .any(|e| matches!(e, AudioEvent::BgmStarted { .. })));
        assert!(engine.is_playing());
        assert_eq!(engine.channel().position(), 0.0);
    }

    #[test]
    fn crossfade_does_not_retrigger_while_fading() {
        let mut engine = single_track_engine(10.0, 1.0);
        engine.play_track("theme").unwrap();
        let events = run(&mut engine, 10.0);
        let begun = events
            .iter()
            .filter(|e| matches!(e, AudioEvent::BgmCrossfadeBegun { .. }))
            .count();
        assert_eq!(begun, 1);
    }

    #[test]
    fn pause_fades_out_then_keeps_track() {
        let mut engine = single_track_engine(60.0, 1.0);
        engine.play_track("theme").unwrap();
        run(&mut engine, 2.0);

        engine.pause();
        assert!(engine.is_fading());
        let events = run(&mut engine, 1.0);
        assert!(events.contains(&AudioEvent::BgmPaused));
        assert!(!engine.is_playing());
        assert_eq!(engine.current_track(), Some("theme"));
        assert_eq!(engine.channel().volume(), 0.0);
    }

    #[test]
    fn resume_restarts_from_the_top() {
        let mut engine = single_track_engine(60.0, 1.0);
        engine.play_track("theme").unwrap();
        run(&mut engine, 5.0);
        engine.pause();
        run(&mut engine, 1.0);

        engine.resume();
        assert!(engine.is_playing());
        run(&mut engine, 1.0);
        assert_eq!(engine.channel().volume(), 0.8);
        // Rewound by the pause stop, then advanced by the resume ticks
        assert!(engine.channel().position() <= 1.0 + 1e-9);
    }

    #[test]
    fn resume_without_track_is_idempotent_no_op() {
        let mut engine = single_track_engine(60.0, 1.0);
        engine.resume();
        engine.resume();
        assert!(!engine.is_playing());
        assert_eq!(engine.current_track(), None);
        assert!(run(&mut engine, 1.0).is_empty());
    }

    #[test]
    fn stop_clears_current_track() {
        let mut engine = single_track_engine(60.0, 1.0);
        engine.play_track("theme").unwrap();
        run(&mut engine, 2.0);

        engine.stop();
        let events = run(&mut engine, 1.0);
        assert!(events.contains(&AudioEvent::BgmStopped));
        assert_eq!(engine.current_track(), None);
        assert!(!engine.is_playing());
    }

    #[test]
    fn play_random_on_empty_catalog_is_no_op() {
        let catalog = Arc::new(Catalog::empty());
        let mut engine = BgmEngine::with_rng(catalog, 1.0, StdRng::seed_from_u64(1));
        engine.play_random();
        assert!(!engine.is_playing());
        assert!(run(&mut engine, 1.0).is_empty());
    }

    #[test]
    fn zero_fade_window_switches_instantly() {
        let mut engine = engine_with(
            vec![
                SoundEntry::new("alpha", Clip::new(60.0), 1.0),
                SoundEntry::new("beta", Clip::new(60.0), 0.5),
            ],
            0.0,
        );
        engine.play_track("alpha").unwrap();
        assert!(engine.is_playing());
        assert_eq!(engine.channel().volume(), 1.0);

        engine.play_track("beta").unwrap();
        assert_eq!(engine.current_track(), Some("beta"));
        assert_eq!(engine.channel().volume(), 0.5);
        assert!(!engine.is_fading());
    }

    #[test]
    fn superseding_a_fade_keeps_one_fade_attached() {
        let mut engine = engine_with(
            vec![
                SoundEntry::new("alpha", Clip::new(60.0), 1.0),
                SoundEntry::new("beta", Clip::new(60.0), 0.5),
            ],
            1.0,
        );
        engine.play_track("alpha").unwrap();
        run(&mut engine, 2.0);

        // Stop, then immediately switch tracks mid-fade: the switch wins.
        engine.stop();
        engine.play_track("beta").unwrap();
        let events = run(&mut engine, 3.0);
        assert!(!events.contains(&AudioEvent::BgmStopped));
        assert_eq!(engine.current_track(), Some("beta"));
        assert_eq!(engine.channel().volume(), 0.5);
    }

    #[test]
    fn bus_level_maps_to_db() {
        let mut engine = single_track_engine(60.0, 1.0);
        engine.set_bus_level(0.5);
        assert!((engine.bus().gain_db() - 20.0 * 0.5f32.log10()).abs() < 1e-5);
        engine.set_bus_level(0.0);
        assert!((engine.bus().gain_db() + 80.0).abs() < 1e-3);
    }
}

//! Playback control: the fade primitive, channels, and the two engines

pub mod bgm;
pub mod channel;
pub mod fade;
pub mod voices;

//! Session configuration applied once at backend construction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diff::DiffStrategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Ambient,
    SoloAmbient,
    Playback,
    Record,
    PlayAndRecord,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ambient => "ambient",
            Self::SoloAmbient => "solo_ambient",
            Self::Playback => "playback",
            Self::Record => "record",
            Self::PlayAndRecord => "play_and_record",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryOption {
    MixWithOthers,
    DuckOthers,
    AllowBluetooth,
    DefaultToSpeaker,
    InterruptSpokenAudioAndMixWithOthers,
    AllowBluetoothA2dp,
    AllowAirPlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Default,
    VoiceChat,
    GameChat,
    VideoRecording,
    Measurement,
    MoviePlayback,
    VideoChat,
    SpokenAudio,
    VoicePrompt,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Default => "default",
            Self::VoiceChat => "voice_chat",
            Self::GameChat => "game_chat",
            Self::VideoRecording => "video_recording",
            Self::Measurement => "measurement",
            Self::MoviePlayback => "movie_playback",
            Self::VideoChat => "video_chat",
            Self::SpokenAudio => "spoken_audio",
            Self::VoicePrompt => "voice_prompt",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortOverride {
    #[default]
    None,
    Speaker,
}

/// Extra tuning applied inside a configuration lock by stacks that have one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionTuning {
    pub preferred_sample_rate: f64,
    pub preferred_input_channels: u32,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            preferred_sample_rate: 44_100.0,
            preferred_input_channels: 2,
        }
    }
}

/// Immutable per-backend configuration. Reconfiguring means building a new
/// backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub category: Category,
    pub options: Vec<CategoryOption>,
    pub mode: Mode,
    pub port_override: PortOverride,
    /// Subscribe to OS session and accessory notifications at construction.
    pub observe_notifications: bool,
    /// Register with the accessory manager at construction.
    pub register_accessories: bool,
    pub diff_strategy: DiffStrategy,
    pub tuning: Option<SessionTuning>,
}

impl SessionConfig {
    /// Plain OS session: play-and-record, routed to the speaker by default.
    pub fn system() -> Self {
        Self {
            category: Category::PlayAndRecord,
            options: vec![CategoryOption::DefaultToSpeaker],
            mode: Mode::Default,
            port_override: PortOverride::None,
            observe_notifications: true,
            register_accessories: true,
            diff_strategy: DiffStrategy::default(),
            tuning: None,
        }
    }

    /// WebRTC session: record category with 44.1kHz stereo input tuning.
    pub fn webrtc() -> Self {
        Self {
            category: Category::Record,
            tuning: Some(SessionTuning::default()),
            ..Self::system()
        }
    }

    /// Vendor SDK session: record category, no tuning.
    pub fn sdk() -> Self {
        Self {
            category: Category::Record,
            ..Self::system()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::system()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(SessionConfig::system().category, Category::PlayAndRecord);
        assert_eq!(SessionConfig::webrtc().category, Category::Record);
        assert_eq!(
            SessionConfig::webrtc().tuning,
            Some(SessionTuning {
                preferred_sample_rate: 44_100.0,
                preferred_input_channels: 2
            })
        );
        assert!(SessionConfig::sdk().tuning.is_none());
        assert!(SessionConfig::sdk().options.contains(&CategoryOption::DefaultToSpeaker));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{ "category": "record", "diff_strategy": "instance_probe" }"#).unwrap();

        assert_eq!(config.category, Category::Record);
        assert_eq!(config.diff_strategy, DiffStrategy::InstanceProbe);
        assert_eq!(config.mode, Mode::Default);
        assert!(config.observe_notifications);
    }
}

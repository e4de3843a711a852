//! Sound cues triggered by menu actions and simulator events

use log::{debug, info, warn};
use macroquad::audio::{load_sound, play_sound, PlaySoundParams, Sound};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    PlatformHit,
    WallHit,
    Score,
    MenuClick,
}

impl SoundCue {
    pub const ALL: [SoundCue; 4] = [
        SoundCue::PlatformHit,
        SoundCue::WallHit,
        SoundCue::Score,
        SoundCue::MenuClick,
    ];

    /// Name used both on the wire (`sound_event`) and for the asset file.
    pub fn name(self) -> &'static str {
        match self {
            SoundCue::PlatformHit => "platform_hit",
            SoundCue::WallHit => "wall_hit",
            SoundCue::Score => "score",
            SoundCue::MenuClick => "menu_click",
        }
    }

    pub fn from_event(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cue| cue.name() == name)
    }
}

pub trait CuePlayer {
    fn play(&mut self, cue: SoundCue);
}

/// Turns the per-snapshot `sound_event` field into one-shot cues.
///
/// A cue fires when the event differs from the one seen on the previous
/// tick, so an event that stays visible for several ticks plays once.
#[derive(Debug, Default)]
pub struct CueTracker {
    last_event: Option<String>,
}

impl CueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, event: Option<&str>) -> Option<SoundCue> {
        if event == self.last_event.as_deref() {
            return None;
        }
        self.last_event = event.map(str::to_owned);

        let name = event?;
        let cue = SoundCue::from_event(name);
        if cue.is_none() {
            debug!("Ignoring unknown sound event {:?}", name);
        }
        cue
    }

    pub fn reset(&mut self) {
        self.last_event = None;
    }
}

/// Plays cues through macroquad, loading `<dir>/<cue>.wav` for each cue.
pub struct MacroquadAudio {
    sounds: HashMap<SoundCue, Sound>,
    volume: f32,
    muted: bool,
}

impl MacroquadAudio {
    pub async fn load(dir: &Path, volume: f32, muted: bool) -> Self {
        let mut sounds = HashMap::new();

        if !muted {
            for cue in SoundCue::ALL {
                let path = dir.join(format!("{}.wav", cue.name()));
                match load_sound(&path.to_string_lossy()).await {
                    Ok(sound) => {
                        sounds.insert(cue, sound);
                    }
                    Err(e) => warn!("Sound {} unavailable ({}): {:?}", cue.name(), path.display(), e),
                }
            }
            info!("Loaded {}/{} sound cues", sounds.len(), SoundCue::ALL.len());
        }

        Self {
            sounds,
            volume: volume.clamp(0.0, 1.0),
            muted,
        }
    }
}

impl CuePlayer for MacroquadAudio {
    fn play(&mut self, cue: SoundCue) {
        if self.muted {
            return;
        }
        if let Some(sound) = self.sounds.get(&cue) {
            play_sound(
                sound,
                PlaySoundParams {
                    looped: false,
                    volume: self.volume,
                },
            );
        }
    }
}

/// Discards every cue. Used when running without a window.
#[derive(Debug, Default)]
pub struct SilentAudio;

impl CuePlayer for SilentAudio {
    fn play(&mut self, cue: SoundCue) {
        debug!("Cue {} (silent)", cue.name());
    }
}

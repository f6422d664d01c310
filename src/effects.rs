//! Sound cue capability
//!
//! The engine never touches an audio device. It announces cues through the
//! [`Effects`] trait and the host decides what, if anything, to play.

use crate::settings::SoundSettings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// A new board is on screen
    RoundStart,
    /// Countdown urgency cue
    Warning,
    /// Correct piece picked
    Correct,
    /// Wrong piece picked
    Incorrect,
    /// Clock ran out
    Timeout,
    /// Reward persisted to the profile
    RewardEarned,
}

/// Receives cues from a running session
pub trait Effects: Send {
    fn play(&mut self, effect: SoundEffect);
}

/// Discards every cue
#[derive(Debug, Default)]
pub struct SilentEffects;

impl Effects for SilentEffects {
    fn play(&mut self, _effect: SoundEffect) {}
}

/// Logs cues at the configured volume (headless hosts)
#[derive(Debug, Clone)]
pub struct LogEffects {
    sound: SoundSettings,
}

impl LogEffects {
    pub fn new(sound: SoundSettings) -> Self {
        Self { sound }
    }

    /// Mute/unmute all cues
    pub fn set_muted(&mut self, muted: bool) {
        self.sound.muted = muted;
    }

    pub fn volume(&self) -> f32 {
        self.sound.effective_volume()
    }
}

impl Effects for LogEffects {
    fn play(&mut self, effect: SoundEffect) {
        let vol = self.volume();
        if vol <= 0.0 {
            return;
        }
        log::debug!("cue {:?} at volume {:.2}", effect, vol);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_effects_volume() {
        let mut fx = LogEffects::new(SoundSettings::default());
        assert!(fx.volume() > 0.0);
        fx.set_muted(true);
        assert_eq!(fx.volume(), 0.0);
        // Muted cues are dropped silently
        fx.play(SoundEffect::Correct);
    }
}

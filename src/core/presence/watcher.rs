// Classifies raw voice-state transitions against the watched channel.
//
// The greeting pipeline only cares about two transitions: a member turning
// their camera on in the watched channel, and that presence ending. Mutes,
// deafens and moves between unwatched channels are noise.

/// The parts of a platform voice state the classifier needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoiceSnapshot {
    pub channel_id: Option<u64>,
    pub video_on: bool,
}

impl VoiceSnapshot {
    fn on_camera_in(&self, channel_id: u64) -> bool {
        self.video_on && self.channel_id == Some(channel_id)
    }
}

/// Outcome of comparing a before/after voice-state pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceTransition {
    /// Camera came on in the watched channel.
    Joined,
    /// Camera presence in the watched channel ended.
    Left,
    /// Nothing the greeting pipeline cares about.
    None,
}

pub fn classify(
    watch_channel_id: u64,
    before: &VoiceSnapshot,
    after: &VoiceSnapshot,
) -> PresenceTransition {
    let was_present = before.on_camera_in(watch_channel_id);
    let is_present = after.on_camera_in(watch_channel_id);
    match (was_present, is_present) {
        (false, true) => PresenceTransition::Joined,
        (true, false) => PresenceTransition::Left,
        _ => PresenceTransition::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATCHED: u64 = 100;
    const OTHER: u64 = 200;

    fn state(channel_id: Option<u64>, video_on: bool) -> VoiceSnapshot {
        VoiceSnapshot {
            channel_id,
            video_on,
        }
    }

    #[test]
    fn camera_on_in_watched_channel_is_a_join() {
        let before = state(Some(WATCHED), false);
        let after = state(Some(WATCHED), true);
        assert_eq!(classify(WATCHED, &before, &after), PresenceTransition::Joined);
    }

    #[test]
    fn moving_into_watched_channel_with_camera_already_on_is_a_join() {
        let before = state(Some(OTHER), true);
        let after = state(Some(WATCHED), true);
        assert_eq!(classify(WATCHED, &before, &after), PresenceTransition::Joined);
    }

    #[test]
    fn joining_watched_channel_without_camera_is_ignored() {
        let before = state(None, false);
        let after = state(Some(WATCHED), false);
        assert_eq!(classify(WATCHED, &before, &after), PresenceTransition::None);
    }

    #[test]
    fn camera_off_in_watched_channel_is_a_leave() {
        let before = state(Some(WATCHED), true);
        let after = state(Some(WATCHED), false);
        assert_eq!(classify(WATCHED, &before, &after), PresenceTransition::Left);
    }

    #[test]
    fn disconnecting_from_watched_channel_is_a_leave() {
        let before = state(Some(WATCHED), true);
        let after = state(None, false);
        assert_eq!(classify(WATCHED, &before, &after), PresenceTransition::Left);
    }

    #[test]
    fn camera_toggle_in_unwatched_channel_is_ignored() {
        let before = state(Some(OTHER), false);
        let after = state(Some(OTHER), true);
        assert_eq!(classify(WATCHED, &before, &after), PresenceTransition::None);
    }

    #[test]
    fn staying_on_camera_in_watched_channel_is_ignored() {
        // Mute or deafen toggles arrive as updates where both sides still
        // satisfy the watched-and-on-camera condition.
        let before = state(Some(WATCHED), true);
        let after = state(Some(WATCHED), true);
        assert_eq!(classify(WATCHED, &before, &after), PresenceTransition::None);
    }
}

//! Lifecycle of the running animation.

use flowsim_log::debug;

use crate::{FrameState, Timeline};

/// An error returned when scheduling or querying playback.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum PlaybackError {
    /// The pass duration is not a positive number of seconds.
    #[error("animation duration must be positive, got {0}")]
    InvalidDuration(f64),
    /// A newer timeline was started after the handle was issued.
    #[error("playback {0} is stale, a newer timeline has been started")]
    Stale(u64),
    /// The timeline of the handle was stopped.
    #[error("playback {0} has been stopped")]
    Stopped(u64),
}

/// Identifies one started timeline of a [`Player`].
///
/// Handles become invalid when their timeline is stopped or replaced.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PlaybackHandle {
    generation: u64,
}

impl PlaybackHandle {
    /// Returns the sequence number of the timeline this handle refers to.
    pub fn id(&self) -> u64 {
        self.generation
    }
}

/// Runs at most one timeline at a time.
///
/// Starting a timeline stops the previous one and invalidates its handle. All queries go through
/// the handle returned from [`start`](Self::start), so callers holding an outdated handle get an
/// error instead of the state of a different batch.
#[derive(Debug, Default)]
pub struct Player {
    generation: u64,
    timeline: Option<Timeline>,
}

impl Player {
    /// Creates a player without a running timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a timeline, stopping the previous one.
    pub fn start(&mut self, timeline: Timeline) -> PlaybackHandle {
        if self.timeline.is_some() {
            debug!(playback = self.generation, "stopping previous timeline");
        }

        self.generation += 1;
        debug!(
            playback = self.generation,
            tracks = timeline.tracks().len(),
            "started timeline"
        );

        self.timeline = Some(timeline);
        PlaybackHandle {
            generation: self.generation,
        }
    }

    /// Stops the timeline of the given handle.
    pub fn stop(&mut self, handle: PlaybackHandle) -> Result<(), PlaybackError> {
        self.timeline(handle)?;
        self.timeline = None;
        debug!(playback = handle.generation, "stopped timeline");
        Ok(())
    }

    /// Returns `true` if the timeline of the handle is running.
    pub fn is_playing(&self, handle: PlaybackHandle) -> bool {
        self.timeline(handle).is_ok()
    }

    /// Returns the running timeline of the handle.
    pub fn timeline(&self, handle: PlaybackHandle) -> Result<&Timeline, PlaybackError> {
        if handle.generation != self.generation {
            return Err(PlaybackError::Stale(handle.generation));
        }

        self.timeline
            .as_ref()
            .ok_or(PlaybackError::Stopped(handle.generation))
    }

    /// Returns the state of every marker at `time` seconds after the timeline started.
    pub fn frame(
        &self,
        handle: PlaybackHandle,
        time: f64,
    ) -> Result<Vec<FrameState>, PlaybackError> {
        Ok(self.timeline(handle)?.frame(time))
    }
}

#[cfg(test)]
mod tests {
    use flowsim_sampling::{Population, SimulationParams, simulate_seeded};

    use super::*;
    use crate::DEFAULT_DURATION;

    fn timeline(seed: u64) -> Timeline {
        let params = SimulationParams {
            events: 20,
            ..SimulationParams::new(Population::default())
        };
        let result = simulate_seeded(&params, seed).unwrap();
        Timeline::new(&result.events, DEFAULT_DURATION).unwrap()
    }

    #[test]
    fn test_start_and_stop() {
        flowsim_test::setup();
        let mut player = Player::new();

        let handle = player.start(timeline(1));
        assert!(player.is_playing(handle));
        assert_eq!(player.frame(handle, 1.0).unwrap().len(), 20);

        player.stop(handle).unwrap();
        assert!(!player.is_playing(handle));
        assert_eq!(
            player.frame(handle, 1.0).unwrap_err(),
            PlaybackError::Stopped(handle.id())
        );
        assert_eq!(player.stop(handle), Err(PlaybackError::Stopped(handle.id())));
    }

    #[test]
    fn test_restart_invalidates_handle() {
        flowsim_test::setup();
        let mut player = Player::new();

        let first = player.start(timeline(1));
        let second = player.start(timeline(2));
        assert_ne!(first, second);

        assert!(!player.is_playing(first));
        assert!(player.is_playing(second));
        assert_eq!(
            player.frame(first, 0.0).unwrap_err(),
            PlaybackError::Stale(first.id())
        );
        assert_eq!(player.stop(first), Err(PlaybackError::Stale(first.id())));

        player.stop(second).unwrap();
        let third = player.start(timeline(3));
        assert!(player.is_playing(third));
        assert!(!player.is_playing(second));
    }

    #[test]
    fn test_error_messages() {
        insta::assert_snapshot!(
            PlaybackError::Stale(3).to_string(),
            @"playback 3 is stale, a newer timeline has been started"
        );
        insta::assert_snapshot!(
            PlaybackError::Stopped(4).to_string(),
            @"playback 4 has been stopped"
        );
    }
}

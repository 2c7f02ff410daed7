//! Animation scheduling for simulated events.
//!
//! Every rendered event gets a [`Track`] that moves its marker along the event's path in a loop.
//! Track starts are staggered over the first pass. Removed events change their tint once a pass
//! reaches the point where they were removed, and reset at the start of the next pass.
//!
//! The [`Player`] owns the running [`Timeline`]. Starting a new timeline stops the old one, and
//! handles to the old timeline are rejected with a [`PlaybackError`].
//!
//! # Example
//!
//! ```
//! use flowsim_playback::{DEFAULT_DURATION, Player, Timeline};
//! use flowsim_sampling::{Population, SimulationParams, simulate_seeded};
//!
//! let params = SimulationParams {
//!     events: 100,
//!     ..SimulationParams::new(Population::default())
//! };
//! let result = simulate_seeded(&params, 1).unwrap();
//!
//! let mut player = Player::new();
//! let handle = player.start(Timeline::new(&result.events, DEFAULT_DURATION).unwrap());
//! let frame = player.frame(handle, 2.5).unwrap();
//! assert_eq!(frame.len(), 100);
//!
//! player.stop(handle).unwrap();
//! assert!(player.frame(handle, 2.5).is_err());
//! ```
#![warn(missing_docs)]

mod player;
mod timeline;

pub use self::player::*;
pub use self::timeline::*;

//! Helpers for testing the simulation crates.
//!
//! When writing tests, keep the following points in mind:
//!
//!  - In every test, call [`setup`]. This will set up the logger so that all console output is
//!    captured by the test runner. All logs emitted with [`flowsim_log`] will show up for test
//!    failures or when run with `--nocapture`.
//!  - Never draw from an unseeded random source. Use [`rng`] with a fixed seed, so that failures
//!    reproduce.
//!
//! # Example
//!
//! ```no_run
//! #[test]
//! fn my_test() {
//!     flowsim_test::setup();
//!
//!     let mut rng = flowsim_test::rng(42);
//!     flowsim_log::debug!("hello, world!");
//! }
//! ```

use rand::SeedableRng;
use rand_pcg::Pcg32;

/// Setup the test environment.
///
///  - Initializes logs: The logger captures logs from all workspace crates and mutes all other
///    logs.
pub fn setup() {
    // All workspace crates share the `flowsim` prefix in their targets.
    flowsim_log::__init_test("flowsim");
}

/// Returns a deterministic random number generator for the given seed.
pub fn rng(seed: u64) -> Pcg32 {
    Pcg32::seed_from_u64(seed)
}

/// Asserts that two floats are equal within the given tolerance.
#[track_caller]
pub fn assert_approx_eq(left: f64, right: f64, tolerance: f64) {
    assert!(
        (left - right).abs() <= tolerance,
        "assertion failed: `{left}` is not within {tolerance} of `{right}`"
    );
}

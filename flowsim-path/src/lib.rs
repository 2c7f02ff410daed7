//! Smooth curve paths through event anchor points.
//!
//! [`draw_path`] turns the ordered anchor points of an event into a [`Path`] of horizontally
//! eased cubic Bézier segments, as typically seen in flow diagrams. The path renders to SVG path
//! data through its `Display` implementation and parses back through `FromStr`.
//!
//! [`anchors_to_progress`] maps every anchor point to the fraction of the path's length at which
//! it is reached, which renderers use to time visual changes along an animated path.
//!
//! # Example
//!
//! ```
//! use flowsim_path::draw_path;
//! use flowsim_protocol::AnchorPoint;
//!
//! let points = [AnchorPoint::new("start", 0.0, 0.0), AnchorPoint::new("end", 1.0, 1.0)];
//! let path = draw_path(&points, 0.25);
//!
//! assert_eq!(path.to_string(), "M 0 0 C 0.25 0 0.75 1 1 1");
//! ```
#![warn(missing_docs)]

mod path;
mod progress;

pub use crate::path::*;
pub use crate::progress::*;

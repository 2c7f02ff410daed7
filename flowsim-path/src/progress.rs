use crate::{Path, PathCommand, Point};

/// The number of chords per segment used to locate anchor points along a path.
pub const DEFAULT_RESOLUTION: usize = 5;

/// Evaluates a cubic Bézier segment at `t` in `[0, 1]`.
fn cubic_point([p0, p1, p2, p3]: &[Point; 4], t: f64) -> Point {
    let u = 1.0 - t;
    let a = u * u * u;
    let b = 3.0 * u * u * t;
    let c = 3.0 * u * t * t;
    let d = t * t * t;

    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

/// A straight approximation of a piece of the path.
#[derive(Clone, Copy, Debug)]
struct Chord {
    start: Point,
    end: Point,
    /// Path length at the end of this chord.
    end_length: f64,
}

/// Approximates the length of a [`Path`] by sampling each segment with straight chords.
///
/// The measure answers two questions: how far along the path each anchor point is reached, and
/// where on the path a given fraction of its length lies.
#[derive(Clone, Debug)]
pub struct PathMeasure {
    origin: Option<Point>,
    chords: Vec<Chord>,
    anchor_lengths: Vec<f64>,
    total: f64,
}

impl PathMeasure {
    /// Measures the path using `resolution` chords per cubic segment.
    ///
    /// A resolution of zero is treated as one.
    pub fn new(path: &Path, resolution: usize) -> Self {
        let resolution = resolution.max(1);
        let commands = path.commands();

        let mut chords = Vec::with_capacity(commands.len().saturating_sub(1) * resolution);
        let mut anchor_lengths = Vec::with_capacity(commands.len());
        let mut total = 0.0;

        if !commands.is_empty() {
            anchor_lengths.push(0.0);
        }

        for pair in commands.windows(2) {
            if let PathCommand::CurveTo { c1, c2, to } = pair[1] {
                let segment = [pair[0].end_point(), c1, c2, to];
                let mut start = segment[0];

                for step in 1..=resolution {
                    let end = cubic_point(&segment, step as f64 / resolution as f64);
                    total += start.distance(end);
                    chords.push(Chord {
                        start,
                        end,
                        end_length: total,
                    });
                    start = end;
                }
            }

            anchor_lengths.push(total);
        }

        Self {
            origin: commands.first().map(PathCommand::end_point),
            chords,
            anchor_lengths,
            total,
        }
    }

    /// Returns the approximated length of the path.
    pub fn total_length(&self) -> f64 {
        self.total
    }

    /// Returns the fraction of the path's length at which each anchor point is reached.
    ///
    /// The sequence has one entry per anchor point. It is monotonically increasing, starts at `0`
    /// and ends at exactly `1`. On a path without length every entry but the last is `0`.
    pub fn anchor_progress(&self) -> Vec<f64> {
        let mut progress: Vec<f64> = if self.total > 0.0 {
            self.anchor_lengths
                .iter()
                .map(|length| length / self.total)
                .collect()
        } else {
            vec![0.0; self.anchor_lengths.len()]
        };

        if let Some(last) = progress.last_mut() {
            *last = 1.0;
        }

        progress
    }

    /// Returns the point at the given fraction of the path's length.
    ///
    /// The fraction is clamped into `[0, 1]`. Returns `None` for an empty path.
    pub fn point_at(&self, fraction: f64) -> Option<Point> {
        let origin = self.origin?;
        if self.chords.is_empty() || self.total <= 0.0 {
            return Some(origin);
        }

        let target = fraction.clamp(0.0, 1.0) * self.total;
        let index = self
            .chords
            .partition_point(|chord| chord.end_length < target)
            .min(self.chords.len() - 1);

        let chord = self.chords[index];
        let length = chord.start.distance(chord.end);
        let t = if length > 0.0 {
            ((target - (chord.end_length - length)) / length).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Some(Point::new(
            chord.start.x + (chord.end.x - chord.start.x) * t,
            chord.start.y + (chord.end.y - chord.start.y) * t,
        ))
    }
}

/// Maps every anchor point of the path to the fraction of the path's length at which it lies.
///
/// See [`PathMeasure::anchor_progress`].
pub fn anchors_to_progress(path: &Path, resolution: usize) -> Vec<f64> {
    PathMeasure::new(path, resolution).anchor_progress()
}

#[cfg(test)]
mod tests {
    use flowsim_protocol::AnchorPoint;

    use super::*;
    use crate::draw_path;

    fn straight_path(xs: &[f64]) -> Path {
        let anchors = xs
            .iter()
            .map(|&x| AnchorPoint::new("filter", x, 0.0))
            .collect::<Vec<_>>();
        // A zero offset keeps control points on the line, so chords measure exact lengths.
        draw_path(&anchors, 0.0)
    }

    fn assert_close(left: f64, right: f64) {
        assert!((left - right).abs() < 1e-9, "{left} != {right}");
    }

    #[test]
    fn test_progress_empty() {
        assert!(anchors_to_progress(&Path::new(), 5).is_empty());
    }

    #[test]
    fn test_progress_single_point() {
        assert_eq!(anchors_to_progress(&straight_path(&[3.0]), 5), vec![1.0]);
    }

    #[test]
    fn test_progress_straight_line() {
        let progress = anchors_to_progress(&straight_path(&[0.0, 25.0, 55.0, 100.0]), 8);

        assert_eq!(progress.len(), 4);
        assert_close(progress[0], 0.0);
        assert_close(progress[1], 0.25);
        assert_close(progress[2], 0.55);
        assert_eq!(progress[3], 1.0);
    }

    #[test]
    fn test_progress_zero_length() {
        let progress = anchors_to_progress(&straight_path(&[5.0, 5.0, 5.0]), 5);
        assert_eq!(progress, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_progress_monotonic_on_curves() {
        let anchors = [
            AnchorPoint::new("start", 0.0, 30.0),
            AnchorPoint::new("sampleRate", 200.0, 120.0),
            AnchorPoint::new("inboundFilterError", 440.0, 20.0),
            AnchorPoint::new("end", 800.0, 300.0),
        ];
        let path = draw_path(&anchors, 40.0);
        let progress = anchors_to_progress(&path, DEFAULT_RESOLUTION);

        assert_eq!(progress.len(), anchors.len());
        assert_eq!(progress[0], 0.0);
        assert_eq!(progress[3], 1.0);
        assert!(progress.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_resolution_zero_is_one() {
        let path = straight_path(&[0.0, 10.0]);
        assert_close(PathMeasure::new(&path, 0).total_length(), 10.0);
    }

    #[test]
    fn test_point_at() {
        let measure = PathMeasure::new(&straight_path(&[0.0, 40.0, 100.0]), 4);

        assert_eq!(measure.point_at(0.0), Some(Point::new(0.0, 0.0)));
        let middle = measure.point_at(0.5).unwrap();
        assert_close(middle.x, 50.0);
        assert_close(middle.y, 0.0);
        let end = measure.point_at(2.0).unwrap();
        assert_close(end.x, 100.0);
        assert_close(end.y, 0.0);
        assert_eq!(PathMeasure::new(&Path::new(), 4).point_at(0.5), None);
    }
}

use std::fmt;
use std::str::FromStr;

use flowsim_protocol::AnchorPoint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A point in path coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the euclidean distance to another point.
    pub fn distance(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl From<&AnchorPoint> for Point {
    fn from(anchor: &AnchorPoint) -> Self {
        Self::new(anchor.x, anchor.y)
    }
}

/// A single drawing command of a [`Path`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    /// Moves the pen to a point without drawing (`M x y`).
    MoveTo(Point),
    /// Draws a cubic Bézier curve from the current point (`C x1 y1 x2 y2 x y`).
    CurveTo {
        /// The first control point.
        c1: Point,
        /// The second control point.
        c2: Point,
        /// The end point of the curve.
        to: Point,
    },
}

impl PathCommand {
    /// Returns the point the pen rests at after this command.
    pub fn end_point(&self) -> Point {
        match *self {
            PathCommand::MoveTo(to) => to,
            PathCommand::CurveTo { to, .. } => to,
        }
    }
}

impl fmt::Display for PathCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathCommand::MoveTo(p) => write!(f, "M {} {}", p.x, p.y),
            PathCommand::CurveTo { c1, c2, to } => write!(
                f,
                "C {} {} {} {} {} {}",
                c1.x, c1.y, c2.x, c2.y, to.x, to.y
            ),
        }
    }
}

/// A curve description made of a leading move and cubic segments.
///
/// Each command corresponds to one anchor point. The `Display` implementation produces SVG path
/// data, which is also how a path serializes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    commands: Vec<PathCommand>,
}

impl Path {
    /// Creates an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the commands of this path.
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// Returns `true` if the path has no commands.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Returns the number of commands, which equals the number of anchor points.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns an iterator over the cubic segments of this path.
    ///
    /// Each segment is `[start, c1, c2, end]`. A move in the middle of a path starts a new
    /// subpath and does not produce a segment.
    pub fn segments(&self) -> impl Iterator<Item = [Point; 4]> + '_ {
        self.commands.windows(2).filter_map(|pair| match pair[1] {
            PathCommand::CurveTo { c1, c2, to } => Some([pair[0].end_point(), c1, c2, to]),
            PathCommand::MoveTo(_) => None,
        })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, command) in self.commands.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{command}")?;
        }
        Ok(())
    }
}

/// An error returned when parsing SVG path data.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ParsePathError {
    /// A token is neither a supported command nor a coordinate in place.
    #[error("unexpected token `{0}`, only absolute M and C commands are supported")]
    UnexpectedToken(String),
    /// A command ended before all of its coordinates were given.
    #[error("missing coordinate for command {0}")]
    MissingCoordinate(char),
    /// A coordinate is not a valid number.
    #[error("invalid coordinate `{0}`")]
    InvalidNumber(String),
    /// The path draws a curve before moving to a starting point.
    #[error("path must start with a move command")]
    MissingMoveTo,
}

fn next_point<'a, I>(tokens: &mut I, command: char) -> Result<Point, ParsePathError>
where
    I: Iterator<Item = &'a str>,
{
    let mut coordinate = || {
        let token = tokens
            .next()
            .ok_or(ParsePathError::MissingCoordinate(command))?;
        token
            .parse::<f64>()
            .map_err(|_| ParsePathError::InvalidNumber(token.to_owned()))
    };

    let x = coordinate()?;
    let y = coordinate()?;
    Ok(Point::new(x, y))
}

impl FromStr for Path {
    type Err = ParsePathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty());
        let mut commands = Vec::new();

        while let Some(token) = tokens.next() {
            match token {
                "M" => commands.push(PathCommand::MoveTo(next_point(&mut tokens, 'M')?)),
                "C" => {
                    if commands.is_empty() {
                        return Err(ParsePathError::MissingMoveTo);
                    }
                    let c1 = next_point(&mut tokens, 'C')?;
                    let c2 = next_point(&mut tokens, 'C')?;
                    let to = next_point(&mut tokens, 'C')?;
                    commands.push(PathCommand::CurveTo { c1, c2, to });
                }
                other => return Err(ParsePathError::UnexpectedToken(other.to_owned())),
            }
        }

        Ok(Self { commands })
    }
}

impl Serialize for Path {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string = String::deserialize(deserializer)?;
        string.parse().map_err(serde::de::Error::custom)
    }
}

/// Draws a smooth path through the given anchor points.
///
/// The path moves to the first point, then draws one cubic segment per following point. The
/// control points sit `control_point_offset` to the right of the previous point and to the left
/// of the current point, which eases the curve horizontally into and out of every anchor.
///
/// No points produce an empty path and a single point produces a single move.
pub fn draw_path(anchor_points: &[AnchorPoint], control_point_offset: f64) -> Path {
    let mut commands = Vec::with_capacity(anchor_points.len());

    for (index, anchor) in anchor_points.iter().enumerate() {
        let point = Point::from(anchor);

        let Some(previous) = index.checked_sub(1).map(|i| &anchor_points[i]) else {
            commands.push(PathCommand::MoveTo(point));
            continue;
        };

        commands.push(PathCommand::CurveTo {
            c1: Point::new(previous.x + control_point_offset, previous.y),
            c2: Point::new(point.x - control_point_offset, point.y),
            to: point,
        });
    }

    Path { commands }
}

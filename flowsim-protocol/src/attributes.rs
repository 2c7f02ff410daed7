//! Categorical attributes of simulated events.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An error returned when parsing an unknown attribute value.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseAttributeError {
    kind: &'static str,
    value: String,
}

macro_rules! attribute_enum {
    (
        $(#[$meta:meta])*
        $name:ident as $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $str:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $str)]
                $variant,
            )+
        }

        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Returns the string identifier of this value.
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $name {
            type Err = ParseAttributeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(ParseAttributeError {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

attribute_enum! {
    /// The kind of telemetry an event represents.
    EventType as "event type" {
        /// An error event.
        Error => "error",
        /// A performance transaction.
        Performance => "performance",
    }
}

attribute_enum! {
    /// The release an event was sent from.
    Release as "release" {
        /// The older release.
        V1 => "v1",
        /// The newer release.
        V2 => "v2",
    }
}

attribute_enum! {
    /// The deployment environment an event was sent from.
    Environment as "environment" {
        /// Production.
        Prod => "prod",
        /// Staging.
        Stage => "stage",
        /// Local development.
        Dev => "dev",
    }
}

attribute_enum! {
    /// Names an attribute of an event that filter conditions can match on.
    EventProperty as "event property" {
        /// The [`EventType`] of the event.
        Type => "type",
        /// The [`Release`] of the event.
        Release => "release",
        /// The [`Environment`] of the event.
        Environment => "environment",
    }
}

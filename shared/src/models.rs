//! Domain enumerations shared by the backend and browser modules
//!
//! Every enum round-trips through its lowercase wire label, which is also
//! the value stored in the database.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// All variants in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire/database label
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($label => Ok($name::$variant),)+
                    _ => Err(format!(
                        "Unknown {} '{}'. Must be one of: {}",
                        $kind,
                        s,
                        [$($label),+].join(", ")
                    )),
                }
            }
        }
    };
}

labelled_enum! {
    /// Account role
    Role, "role" {
        Admin => "admin",
        Trainer => "trainer",
        Client => "client",
    }
}

impl Role {
    /// Roles that may be chosen at self-registration
    pub fn is_self_registrable(&self) -> bool {
        matches!(self, Role::Trainer | Role::Client)
    }
}

labelled_enum! {
    /// Difficulty level of exercises and routines
    Difficulty, "difficulty" {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Beginner
    }
}

labelled_enum! {
    /// Lifecycle state of an assignment
    AssignmentStatus, "assignment status" {
        Active => "active",
        Completed => "completed",
        Pending => "pending",
        Cancelled => "cancelled",
    }
}

impl Default for AssignmentStatus {
    fn default() -> Self {
        AssignmentStatus::Pending
    }
}

labelled_enum! {
    /// Calendar event kind
    EventType, "event type" {
        Workout => "workout",
        Meal => "meal",
        Rest => "rest",
        Assessment => "assessment",
        Appointment => "appointment",
        Reminder => "reminder",
    }
}

labelled_enum! {
    Gender, "gender" {
        Male => "male",
        Female => "female",
        Other => "other",
    }
}

labelled_enum! {
    /// Training objective recorded on a client profile
    FitnessGoal, "goal" {
        LoseWeight => "lose_weight",
        GainMuscle => "gain_muscle",
        Maintenance => "maintenance",
        Tone => "tone",
        Endurance => "endurance",
        Other => "other",
    }
}

labelled_enum! {
    /// Self-reported training experience
    ActivityLevel, "activity level" {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
}

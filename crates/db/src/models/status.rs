//! Status helper enums mapping to SMALLINT columns.
//!
//! Each enum variant's discriminant is the value stored in the column.

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Every variant in discriminant order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Resolve a stored status ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( v if v == $val => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Heartbeat measurement status.
    ///
    /// The pipeline only ever writes `Pending` (at creation). Every other
    /// value arrives through the worker completion callback.
    HeartbeatStatus {
        Pending = 0,
        Running = 1,
        Completed = 2,
        Failed = 3,
        TimedOut = 4,
    }
}

impl HeartbeatStatus {
    /// Whether the worker has finished with this heartbeat.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::TimedOut)
    }
}

/// Provider and stage defaults applied to ad-hoc executions that do not
/// reference a target.
pub mod defaults {
    /// Lighthouse audit provider.
    pub const PROVIDER: i16 = 3;
    /// Production stage.
    pub const STAGE: i16 = 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for status in HeartbeatStatus::ALL {
            assert_eq!(HeartbeatStatus::from_id(status.id()), Some(*status));
        }
        assert_eq!(HeartbeatStatus::from_id(99), None);
    }

    #[test]
    fn only_finished_states_are_terminal() {
        assert!(!HeartbeatStatus::Pending.is_terminal());
        assert!(!HeartbeatStatus::Running.is_terminal());
        assert!(HeartbeatStatus::Completed.is_terminal());
        assert!(HeartbeatStatus::Failed.is_terminal());
        assert!(HeartbeatStatus::TimedOut.is_terminal());
    }
}

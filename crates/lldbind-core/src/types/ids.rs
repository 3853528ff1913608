//! Identifier newtypes.
//!
//! Breakpoint, location and watchpoint ids are assigned by the engine and stay
//! stable for the lifetime of the object they name. Process and thread ids are
//! operating-system identifiers reported by the engine.

use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident($repr:ty)) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub $repr);

        impl $name
        {
            #[must_use]
            pub const fn from_raw(raw: $repr) -> Self
            {
                Self(raw)
            }

            #[must_use]
            pub const fn raw(self) -> $repr
            {
                self.0
            }
        }

        impl From<$repr> for $name
        {
            fn from(raw: $repr) -> Self
            {
                Self(raw)
            }
        }

        impl From<$name> for $repr
        {
            fn from(id: $name) -> Self
            {
                id.0
            }
        }

        impl fmt::Display for $name
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
            {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Operating-system process id
    ProcessId(u64)
);

id_type!(
    /// Operating-system thread id
    ThreadId(u64)
);

id_type!(
    /// Engine-assigned breakpoint id
    ///
    /// Invalid breakpoints report `-1`.
    BreakpointId(i32)
);

id_type!(
    /// Engine-assigned breakpoint location id, unique within its breakpoint
    LocationId(i32)
);

id_type!(
    /// Engine-assigned watchpoint id
    WatchpointId(i32)
);

impl BreakpointId
{
    /// Id reported for invalid breakpoints.
    pub const INVALID: BreakpointId = BreakpointId(-1);
}

impl WatchpointId
{
    /// Id reported for invalid watchpoints.
    pub const INVALID: WatchpointId = WatchpointId(-1);
}

impl LocationId
{
    pub const INVALID: LocationId = LocationId(-1);
}

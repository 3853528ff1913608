//! Bit-flag types passed across the engine boundary.

use std::ops::{BitOr, BitOrAssign};

macro_rules! bit_flags {
    ($(#[$meta:meta])* $name:ident($repr:ty) { $($(#[$fmeta:meta])* $flag:ident = $value:expr,)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name($repr);

        impl $name
        {
            $($(#[$fmeta])* pub const $flag: $name = $name($value);)*

            #[must_use]
            pub const fn from_bits(bits: $repr) -> Self
            {
                Self(bits)
            }

            #[must_use]
            pub const fn bits(self) -> $repr
            {
                self.0
            }

            #[must_use]
            pub const fn contains(self, other: Self) -> bool
            {
                self.0 & other.0 == other.0
            }

            #[must_use]
            pub const fn union(self, other: Self) -> Self
            {
                Self(self.0 | other.0)
            }

            #[must_use]
            pub const fn difference(self, other: Self) -> Self
            {
                Self(self.0 & !other.0)
            }
        }

        impl BitOr for $name
        {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self
            {
                self.union(rhs)
            }
        }

        impl BitOrAssign for $name
        {
            fn bitor_assign(&mut self, rhs: Self)
            {
                *self = self.union(rhs);
            }
        }
    };
}

bit_flags! {
    /// Process launch flags (`eLaunchFlag*`)
    LaunchFlags(u32) {
        NONE = 0,
        EXEC = 1 << 0,
        DEBUG = 1 << 1,
        /// Stop the process at its first instruction.
        STOP_AT_ENTRY = 1 << 2,
        DISABLE_ASLR = 1 << 3,
        DISABLE_STDIO = 1 << 4,
        LAUNCH_IN_TTY = 1 << 5,
        LAUNCH_IN_SHELL = 1 << 6,
        LAUNCH_IN_SEPARATE_PROCESS_GROUP = 1 << 7,
        DONT_SET_EXIT_STATUS = 1 << 8,
        DETACH_ON_ERROR = 1 << 9,
        SHELL_EXPAND_ARGUMENTS = 1 << 10,
        CLOSE_TTY_ON_EXIT = 1 << 11,
        INHERIT_TCC_FROM_PARENT = 1 << 12,
    }
}

bit_flags! {
    /// Which parts of a symbol context to resolve
    SymbolContextItem(u32) {
        TARGET = 1 << 0,
        MODULE = 1 << 1,
        COMPILE_UNIT = 1 << 2,
        FUNCTION = 1 << 3,
        BLOCK = 1 << 4,
        LINE_ENTRY = 1 << 5,
        SYMBOL = 1 << 6,
        EVERYTHING = 0xFFFF,
    }
}

bit_flags! {
    /// Memory permissions for allocations (`ePermissions*`)
    Permissions(u32) {
        WRITABLE = 1 << 0,
        READABLE = 1 << 1,
        EXECUTABLE = 1 << 2,
    }
}

impl Permissions
{
    #[must_use]
    pub fn rw() -> Self
    {
        Self::READABLE | Self::WRITABLE
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_launch_flag_values()
    {
        assert_eq!(LaunchFlags::STOP_AT_ENTRY.bits(), 4);
        assert_eq!(LaunchFlags::INHERIT_TCC_FROM_PARENT.bits(), 4096);

        let mut flags = LaunchFlags::DISABLE_ASLR;
        flags |= LaunchFlags::STOP_AT_ENTRY;
        assert!(flags.contains(LaunchFlags::STOP_AT_ENTRY));
        assert!(flags.contains(LaunchFlags::DISABLE_ASLR));
        assert!(!flags.difference(LaunchFlags::STOP_AT_ENTRY).contains(LaunchFlags::STOP_AT_ENTRY));
    }

    #[test]
    fn test_symbol_context_everything()
    {
        assert!(SymbolContextItem::EVERYTHING.contains(SymbolContextItem::LINE_ENTRY | SymbolContextItem::MODULE));
    }
}

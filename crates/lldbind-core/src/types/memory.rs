//! Memory region snapshots.

use std::fmt;

/// A memory region of the debuggee
///
/// This is a snapshot: the engine object it was copied from is released as
/// soon as the fields are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegionInfo
{
    pub base: u64,
    pub end: u64,
    pub readable: bool,
    pub writable: bool,
    pub executable: bool,
    pub mapped: bool,
    pub name: Option<String>,
}

impl MemoryRegionInfo
{
    #[must_use]
    pub fn size(&self) -> u64
    {
        self.end.saturating_sub(self.base)
    }

    #[must_use]
    pub fn contains(&self, address: u64) -> bool
    {
        self.base <= address && address < self.end
    }

    /// Permissions as an `"rwx"` style string, `-` for missing bits.
    #[must_use]
    pub fn permissions(&self) -> String
    {
        let mut perms = String::with_capacity(3);
        perms.push(if self.readable { 'r' } else { '-' });
        perms.push(if self.writable { 'w' } else { '-' });
        perms.push(if self.executable { 'x' } else { '-' });
        perms
    }
}

impl fmt::Display for MemoryRegionInfo
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "[0x{:016x}-0x{:016x}) {}", self.base, self.end, self.permissions())?;
        if let Some(name) = &self.name {
            write!(f, " {name}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_permissions_string()
    {
        let region = MemoryRegionInfo {
            base: 0x1000,
            end: 0x3000,
            readable: true,
            writable: false,
            executable: true,
            mapped: true,
            name: Some("__TEXT".to_string()),
        };
        assert_eq!(region.permissions(), "r-x");
        assert_eq!(region.size(), 0x2000);
        assert!(region.contains(0x2fff));
        assert!(!region.contains(0x3000));
        assert!(region.to_string().ends_with("r-x __TEXT"));
    }
}

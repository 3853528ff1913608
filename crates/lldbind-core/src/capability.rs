//! # Capability Negotiation
//!
//! Different builds of the wrapper library export different subsets of the
//! entry point catalogue. A [`Feature`] names an optional operation and maps
//! to exactly one entry point; [`Capabilities`] records which features the
//! loaded engine provides.
//!
//! The set is computed once when the engine is loaded (the native engine
//! checks which symbols resolved) and never changes afterwards, so
//! `is_supported` and `require` always agree.
//!
//! ## Example
//!
//! ```rust
//! use lldbind_core::capability::{Capabilities, Feature};
//!
//! let caps = Capabilities::all().without(Feature::StepOut);
//! assert!(caps.is_supported(Feature::StepOver));
//! assert!(!caps.is_supported(Feature::StepOut));
//! assert!(caps.require(Feature::StepOut).is_err());
//! assert!(!caps.is_supported_name("no_such_feature"));
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{LldbindError, LldbindResult};

/// An optional engine operation guarded by capability negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature
{
    BreakpointByAddress,
    BreakpointByRegex,
    MemoryRead,
    MemoryWrite,
    ThreadById,
    MemoryRegionInfo,
    StepInto,
    StepOver,
    StepOut,
    StepInstruction,
    Registers,
    FindVariable,
    EvaluateExpression,
}

impl Feature
{
    /// Every feature, in table order.
    pub const ALL: [Feature; 13] = [
        Feature::BreakpointByAddress,
        Feature::BreakpointByRegex,
        Feature::MemoryRead,
        Feature::MemoryWrite,
        Feature::ThreadById,
        Feature::MemoryRegionInfo,
        Feature::StepInto,
        Feature::StepOver,
        Feature::StepOut,
        Feature::StepInstruction,
        Feature::Registers,
        Feature::FindVariable,
        Feature::EvaluateExpression,
    ];

    /// The feature's public name, e.g. `"memory_read"`.
    #[must_use]
    pub fn name(self) -> &'static str
    {
        match self {
            Feature::BreakpointByAddress => "breakpoint_by_address",
            Feature::BreakpointByRegex => "breakpoint_by_regex",
            Feature::MemoryRead => "memory_read",
            Feature::MemoryWrite => "memory_write",
            Feature::ThreadById => "thread_by_id",
            Feature::MemoryRegionInfo => "memory_region_info",
            Feature::StepInto => "step_into",
            Feature::StepOver => "step_over",
            Feature::StepOut => "step_out",
            Feature::StepInstruction => "step_instruction",
            Feature::Registers => "registers",
            Feature::FindVariable => "find_variable",
            Feature::EvaluateExpression => "evaluate_expression",
        }
    }

    /// The wrapper symbol backing this feature.
    #[must_use]
    pub fn entry_point(self) -> &'static str
    {
        match self {
            Feature::BreakpointByAddress => "lldb_target_breakpoint_create_by_address",
            Feature::BreakpointByRegex => "lldb_target_breakpoint_create_by_regex",
            Feature::MemoryRead => "lldb_process_read_memory",
            Feature::MemoryWrite => "lldb_process_write_memory",
            Feature::ThreadById => "lldb_process_get_thread_by_id",
            Feature::MemoryRegionInfo => "lldb_process_get_memory_region_info",
            Feature::StepInto => "lldb_thread_step_into",
            Feature::StepOver => "lldb_thread_step_over",
            Feature::StepOut => "lldb_thread_step_out",
            Feature::StepInstruction => "lldb_thread_step_instruction",
            Feature::Registers => "lldb_frame_get_registers",
            Feature::FindVariable => "lldb_frame_find_variable",
            Feature::EvaluateExpression => "lldb_frame_evaluate_expression",
        }
    }

    fn bit(self) -> u32
    {
        1 << (self as u32)
    }
}

impl fmt::Display for Feature
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.name())
    }
}

impl FromStr for Feature
{
    type Err = LldbindError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        Feature::ALL
            .into_iter()
            .find(|feature| feature.name() == s)
            .ok_or_else(|| LldbindError::InvalidArgument(format!("unknown feature '{s}'")))
    }
}

/// The set of features a loaded engine provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(u32);

impl Capabilities
{
    /// No optional features.
    #[must_use]
    pub fn none() -> Self
    {
        Self(0)
    }

    /// Every optional feature.
    #[must_use]
    pub fn all() -> Self
    {
        Feature::ALL.into_iter().fold(Self::none(), Self::with)
    }

    /// Build the set from a symbol probe: a feature is supported when its
    /// entry point is exported.
    pub fn probe<F>(mut exported: F) -> Self
    where
        F: FnMut(&str) -> bool,
    {
        Feature::ALL
            .into_iter()
            .filter(|feature| exported(feature.entry_point()))
            .fold(Self::none(), Self::with)
    }

    #[must_use]
    pub fn with(self, feature: Feature) -> Self
    {
        Self(self.0 | feature.bit())
    }

    #[must_use]
    pub fn without(self, feature: Feature) -> Self
    {
        Self(self.0 & !feature.bit())
    }

    #[must_use]
    pub fn is_supported(self, feature: Feature) -> bool
    {
        self.0 & feature.bit() != 0
    }

    /// Lookup by public name. Unknown names are reported as unsupported.
    #[must_use]
    pub fn is_supported_name(self, name: &str) -> bool
    {
        name.parse::<Feature>().is_ok_and(|feature| self.is_supported(feature))
    }

    /// Fail with [`LldbindError::UnsupportedApi`] unless `feature` is supported.
    ///
    /// ## Errors
    ///
    /// Returns `UnsupportedApi` naming the feature.
    pub fn require(self, feature: Feature) -> LldbindResult<()>
    {
        if self.is_supported(feature) {
            Ok(())
        } else {
            Err(LldbindError::UnsupportedApi(feature.name().to_string()))
        }
    }

    #[must_use]
    pub fn supported(self) -> Vec<Feature>
    {
        Feature::ALL.into_iter().filter(|f| self.is_supported(*f)).collect()
    }

    #[must_use]
    pub fn unsupported(self) -> Vec<Feature>
    {
        Feature::ALL.into_iter().filter(|f| !self.is_supported(*f)).collect()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_feature_names_round_trip()
    {
        for feature in Feature::ALL {
            assert_eq!(feature.name().parse::<Feature>().unwrap(), feature);
            assert!(feature.entry_point().starts_with("lldb_"));
        }
    }

    #[test]
    fn test_probe_uses_entry_points()
    {
        let caps = Capabilities::probe(|symbol| symbol.starts_with("lldb_thread_step_"));
        assert_eq!(
            caps.supported(),
            vec![Feature::StepInto, Feature::StepOver, Feature::StepOut, Feature::StepInstruction]
        );
        assert_eq!(caps.unsupported().len(), Feature::ALL.len() - 4);
    }

    #[test]
    fn test_require_names_feature()
    {
        let err = Capabilities::none().require(Feature::MemoryWrite).unwrap_err();
        assert_eq!(
            err.to_string(),
            "API 'memory_write' is not supported in this LLDB version or binding"
        );
    }

    #[test]
    fn test_unknown_name_is_unsupported()
    {
        assert!(!Capabilities::all().is_supported_name("time_travel"));
        assert!(Capabilities::all().is_supported_name("registers"));
    }
}

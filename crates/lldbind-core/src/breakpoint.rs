//! # Breakpoints
//!
//! [`Breakpoint`], [`BreakpointLocation`] and [`Watchpoint`](crate::watchpoint::Watchpoint)
//! share the stop point properties: id, enabled flag, hit count, ignore count
//! and condition. The [`StopPoint`] trait provides them once for all three.
//!
//! A breakpoint resolves to zero or more locations. Deleting goes through the
//! owning target so that its bookkeeping stays in step with the engine.

use std::fmt;
use std::rc::Rc;

use crate::engine::Engine;
use crate::error::LldbindResult;
use crate::handle::{Handle, ObjectKind, RawHandle};
use crate::target::Target;
use crate::types::{BreakpointId, LocationId, ThreadId};

/// Properties common to breakpoints, breakpoint locations and watchpoints
///
/// Readers return neutral defaults on an invalid object; setters fail with
/// `InvalidObject`.
pub trait StopPoint
{
    #[doc(hidden)]
    fn stop_point_handle(&self) -> &Handle;

    /// Engine id, `-1` when the object is not valid.
    fn raw_id(&self) -> i32
    {
        let handle = self.stop_point_handle();
        handle.read(-1, |engine, raw| engine.stop_point_id(handle.kind(), raw))
    }

    fn is_enabled(&self) -> bool
    {
        let handle = self.stop_point_handle();
        handle.read(false, |engine, raw| engine.stop_point_is_enabled(handle.kind(), raw))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the object is not valid.
    fn set_enabled(&self, enabled: bool) -> LldbindResult<()>
    {
        let handle = self.stop_point_handle();
        let raw = handle.checked()?;
        handle.engine().stop_point_set_enabled(handle.kind(), raw, enabled);
        Ok(())
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the object is not valid.
    fn enable(&self) -> LldbindResult<()>
    {
        self.set_enabled(true)
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the object is not valid.
    fn disable(&self) -> LldbindResult<()>
    {
        self.set_enabled(false)
    }

    fn hit_count(&self) -> u32
    {
        let handle = self.stop_point_handle();
        handle.read(0, |engine, raw| engine.stop_point_hit_count(handle.kind(), raw))
    }

    fn ignore_count(&self) -> u32
    {
        let handle = self.stop_point_handle();
        handle.read(0, |engine, raw| engine.stop_point_ignore_count(handle.kind(), raw))
    }

    /// Skip the next `count` hits.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidObject` if the object is not valid.
    fn set_ignore_count(&self, count: u32) -> LldbindResult<()>
    {
        let handle = self.stop_point_handle();
        let raw = handle.checked()?;
        handle.engine().stop_point_set_ignore_count(handle.kind(), raw, count);
        Ok(())
    }

    fn condition(&self) -> Option<String>
    {
        let handle = self.stop_point_handle();
        handle.read(None, |engine, raw| engine.stop_point_condition(handle.kind(), raw))
    }

    /// Set or clear (with `None`) the stop condition.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidObject` if the object is not valid.
    fn set_condition(&self, condition: Option<&str>) -> LldbindResult<()>
    {
        let handle = self.stop_point_handle();
        let raw = handle.checked()?;
        handle.engine().stop_point_set_condition(handle.kind(), raw, condition);
        Ok(())
    }
}

/// A breakpoint owned by a [`Target`]
#[derive(Clone)]
pub struct Breakpoint
{
    inner: Rc<BreakpointInner>,
}

struct BreakpointInner
{
    handle: Handle,
    target: Target,
}

impl Breakpoint
{
    pub(crate) fn new(handle: Handle, target: Target) -> Self
    {
        Self {
            inner: Rc::new(BreakpointInner { handle, target }),
        }
    }

    fn engine(&self) -> &dyn Engine
    {
        self.inner.handle.engine().as_ref()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool
    {
        self.inner.handle.is_valid()
    }

    pub fn release(&self)
    {
        self.inner.handle.release();
    }

    #[must_use]
    pub fn target(&self) -> &Target
    {
        &self.inner.target
    }

    #[must_use]
    pub fn id(&self) -> BreakpointId
    {
        BreakpointId(self.raw_id())
    }

    /// Delete this breakpoint from its target.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidObject` if the owning target is not valid.
    pub fn delete(&self) -> LldbindResult<bool>
    {
        self.inner.target.delete_breakpoint(self.id())
    }

    #[must_use]
    pub fn is_one_shot(&self) -> bool
    {
        self.inner.handle.read(false, |engine, raw| engine.breakpoint_is_one_shot(raw))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the breakpoint is not valid.
    pub fn set_one_shot(&self, one_shot: bool) -> LldbindResult<()>
    {
        let raw = self.inner.handle.checked()?;
        self.engine().breakpoint_set_one_shot(raw, one_shot);
        Ok(())
    }

    #[must_use]
    pub fn is_hardware(&self) -> bool
    {
        self.inner.handle.read(false, |engine, raw| engine.breakpoint_is_hardware(raw))
    }

    #[must_use]
    pub fn auto_continue(&self) -> bool
    {
        self.inner.handle.read(false, |engine, raw| engine.breakpoint_auto_continue(raw))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the breakpoint is not valid.
    pub fn set_auto_continue(&self, auto_continue: bool) -> LldbindResult<()>
    {
        let raw = self.inner.handle.checked()?;
        self.engine().breakpoint_set_auto_continue(raw, auto_continue);
        Ok(())
    }

    /// Thread restriction; `ThreadId(0)` means any thread.
    #[must_use]
    pub fn thread_id(&self) -> ThreadId
    {
        ThreadId(self.inner.handle.read(0, |engine, raw| engine.breakpoint_thread_id(raw)))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the breakpoint is not valid.
    pub fn set_thread_id(&self, tid: ThreadId) -> LldbindResult<()>
    {
        let raw = self.inner.handle.checked()?;
        self.engine().breakpoint_set_thread_id(raw, tid.raw());
        Ok(())
    }

    #[must_use]
    pub fn thread_name(&self) -> Option<String>
    {
        self.inner.handle.read(None, |engine, raw| engine.breakpoint_thread_name(raw))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the breakpoint is not valid.
    pub fn set_thread_name(&self, name: Option<&str>) -> LldbindResult<()>
    {
        let raw = self.inner.handle.checked()?;
        self.engine().breakpoint_set_thread_name(raw, name);
        Ok(())
    }

    #[must_use]
    pub fn thread_index(&self) -> u32
    {
        self.inner.handle.read(0, |engine, raw| engine.breakpoint_thread_index(raw))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the breakpoint is not valid.
    pub fn set_thread_index(&self, index: u32) -> LldbindResult<()>
    {
        let raw = self.inner.handle.checked()?;
        self.engine().breakpoint_set_thread_index(raw, index);
        Ok(())
    }

    // Locations

    #[must_use]
    pub fn num_locations(&self) -> u32
    {
        self.inner.handle.read(0, |engine, raw| engine.breakpoint_num_locations(raw))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the breakpoint is not valid.
    pub fn location_at_index(&self, index: u32) -> LldbindResult<Option<BreakpointLocation>>
    {
        let raw = self.inner.handle.checked()?;
        let location = self.engine().breakpoint_location_at_index(raw, index);
        Ok(self.wrap_location(location))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the breakpoint is not valid.
    pub fn find_location_by_id(&self, id: LocationId) -> LldbindResult<Option<BreakpointLocation>>
    {
        let raw = self.inner.handle.checked()?;
        let location = self.engine().breakpoint_find_location(raw, id.raw());
        Ok(self.wrap_location(location))
    }

    #[must_use]
    pub fn locations(&self) -> Vec<BreakpointLocation>
    {
        (0..self.num_locations())
            .filter_map(|index| self.location_at_index(index).ok().flatten())
            .collect()
    }

    fn wrap_location(&self, raw: Option<RawHandle>) -> Option<BreakpointLocation>
    {
        self.inner
            .handle
            .adopt(ObjectKind::BreakpointLocation, raw)
            .map(|handle| BreakpointLocation::new(handle, self.clone()))
    }
}

impl StopPoint for Breakpoint
{
    fn stop_point_handle(&self) -> &Handle
    {
        &self.inner.handle
    }
}

impl fmt::Debug for Breakpoint
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Breakpoint")
            .field("handle", &self.inner.handle)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Breakpoint
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(
            f,
            "Breakpoint {}: enabled={}, hit_count={}, locations={}",
            self.id(),
            self.is_enabled(),
            self.hit_count(),
            self.num_locations()
        )
    }
}

/// One resolved address of a [`Breakpoint`]
#[derive(Clone)]
pub struct BreakpointLocation
{
    inner: Rc<LocationInner>,
}

struct LocationInner
{
    handle: Handle,
    breakpoint: Breakpoint,
}

impl BreakpointLocation
{
    fn new(handle: Handle, breakpoint: Breakpoint) -> Self
    {
        Self {
            inner: Rc::new(LocationInner { handle, breakpoint }),
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool
    {
        self.inner.handle.is_valid()
    }

    pub fn release(&self)
    {
        self.inner.handle.release();
    }

    #[must_use]
    pub fn id(&self) -> LocationId
    {
        LocationId(self.raw_id())
    }

    #[must_use]
    pub fn load_address(&self) -> u64
    {
        self.inner.handle.read(0, |engine, raw| engine.location_load_address(raw))
    }

    /// The breakpoint this location was fetched from.
    #[must_use]
    pub fn breakpoint(&self) -> &Breakpoint
    {
        &self.inner.breakpoint
    }
}

impl StopPoint for BreakpointLocation
{
    fn stop_point_handle(&self) -> &Handle
    {
        &self.inner.handle
    }
}

impl fmt::Display for BreakpointLocation
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(
            f,
            "{}.{}: address = 0x{:x}, enabled={}",
            self.inner.breakpoint.id(),
            self.id(),
            self.load_address(),
            self.is_enabled()
        )
    }
}

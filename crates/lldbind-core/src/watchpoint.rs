//! Watchpoints: data breakpoints on an address range.

use std::fmt;
use std::rc::Rc;

use crate::breakpoint::StopPoint;
use crate::error::LldbindResult;
use crate::handle::Handle;
use crate::target::Target;
use crate::types::WatchpointId;

/// A watchpoint owned by a [`Target`]
///
/// Enabled state, hit and ignore counts and the condition come from
/// [`StopPoint`].
#[derive(Clone)]
pub struct Watchpoint
{
    inner: Rc<WatchpointInner>,
}

struct WatchpointInner
{
    handle: Handle,
    target: Target,
}

impl Watchpoint
{
    pub(crate) fn new(handle: Handle, target: Target) -> Self
    {
        Self {
            inner: Rc::new(WatchpointInner { handle, target }),
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
    pub fn target(&self) -> &Target
    {
        &self.inner.target
    }

    #[must_use]
    pub fn id(&self) -> WatchpointId
    {
        WatchpointId(self.raw_id())
    }

    #[must_use]
    pub fn address(&self) -> u64
    {
        self.inner.handle.read(0, |engine, raw| engine.watchpoint_address(raw))
    }

    /// Watched size in bytes.
    #[must_use]
    pub fn size(&self) -> usize
    {
        self.inner.handle.read(0, |engine, raw| engine.watchpoint_size(raw))
    }

    #[must_use]
    pub fn is_watching_reads(&self) -> bool
    {
        self.inner.handle.read(false, |engine, raw| engine.watchpoint_is_watching_reads(raw))
    }

    #[must_use]
    pub fn is_watching_writes(&self) -> bool
    {
        self.inner.handle.read(false, |engine, raw| engine.watchpoint_is_watching_writes(raw))
    }

    /// Delete this watchpoint from its target.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidObject` if the owning target is not valid.
    pub fn delete(&self) -> LldbindResult<bool>
    {
        self.inner.target.delete_watchpoint(self.id())
    }
}

impl StopPoint for Watchpoint
{
    fn stop_point_handle(&self) -> &Handle
    {
        &self.inner.handle
    }
}

impl fmt::Debug for Watchpoint
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Watchpoint")
            .field("handle", &self.inner.handle)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Watchpoint
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let mode = match (self.is_watching_reads(), self.is_watching_writes()) {
            (true, true) => "rw",
            (true, false) => "r",
            (false, true) => "w",
            (false, false) => "-",
        };
        write!(
            f,
            "Watchpoint {}: addr = 0x{:x} size = {} type = {} hit_count={}",
            self.id(),
            self.address(),
            self.size(),
            mode,
            self.hit_count()
        )
    }
}

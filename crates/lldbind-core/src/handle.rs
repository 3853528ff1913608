//! # Handles
//!
//! Every engine object is reached through an opaque handle. A [`Handle`] owns
//! one such reference and guarantees:
//!
//! - **At-most-once release**: [`Handle::release`] takes the raw handle out of
//!   its slot before calling the engine's destroy entry point, so a second
//!   release (explicit or from `Drop`) finds an empty slot and does nothing.
//! - **Validity gate**: a handle is valid when it has not been released, the
//!   runtime lifetime it was created in is still current, and the engine's
//!   per-kind validity predicate holds.
//! - **Runtime ownership**: each handle holds the shared runtime state, so the
//!   engine is not terminated implicitly while any object is alive. After an
//!   explicit terminate the engine is not called again through the handle.
//! - **Clean failure**: read accessors go through [`Handle::read`] and return a
//!   neutral default on an invalid handle; mutators and accessors that return
//!   child objects go through [`Handle::checked`] and fail with
//!   [`LldbindError::InvalidObject`], or [`LldbindError::NotInitialized`] once
//!   the runtime has been terminated.
//!
//! Handles are deliberately `!Send` and `!Sync`: the engine's object model is
//! used from one caller thread.

use std::cell::Cell;
use std::fmt;
use std::num::NonZeroUsize;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::capability::Feature;
use crate::engine::Engine;
use crate::error::{LldbindError, LldbindResult};
use crate::runtime::RuntimeState;

/// A non-null engine object reference
///
/// For the native engine this is the object pointer; the simulated engine
/// hands out table keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(NonZeroUsize);

impl RawHandle
{
    /// Wrap a raw value. Zero (the null handle) yields `None`.
    #[must_use]
    pub fn new(raw: usize) -> Option<Self>
    {
        NonZeroUsize::new(raw).map(Self)
    }

    #[must_use]
    pub fn from_ptr<T>(ptr: *mut T) -> Option<Self>
    {
        Self::new(ptr as usize)
    }

    #[must_use]
    pub fn get(self) -> usize
    {
        self.0.get()
    }

    #[must_use]
    pub fn as_ptr<T>(self) -> *mut T
    {
        self.0.get() as *mut T
    }
}

impl fmt::Display for RawHandle
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:x}", self.0)
    }
}

/// The engine object family a handle belongs to
///
/// Selects the validity predicate and the destroy entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind
{
    Debugger,
    Target,
    Process,
    Thread,
    Frame,
    Breakpoint,
    BreakpointLocation,
    Watchpoint,
    Value,
    ValueList,
    Type,
    Module,
    SymbolContext,
    CommandInterpreter,
    CommandReturnObject,
}

impl ObjectKind
{
    /// Name used in error messages, e.g. `"Target is not valid"`.
    #[must_use]
    pub fn name(self) -> &'static str
    {
        match self {
            ObjectKind::Debugger => "Debugger",
            ObjectKind::Target => "Target",
            ObjectKind::Process => "Process",
            ObjectKind::Thread => "Thread",
            ObjectKind::Frame => "Frame",
            ObjectKind::Breakpoint => "Breakpoint",
            ObjectKind::BreakpointLocation => "BreakpointLocation",
            ObjectKind::Watchpoint => "Watchpoint",
            ObjectKind::Value => "Value",
            ObjectKind::ValueList => "ValueList",
            ObjectKind::Type => "Type",
            ObjectKind::Module => "Module",
            ObjectKind::SymbolContext => "SymbolContext",
            ObjectKind::CommandInterpreter => "CommandInterpreter",
            ObjectKind::CommandReturnObject => "CommandReturnObject",
        }
    }
}

impl fmt::Display for ObjectKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.name())
    }
}

/// Owning wrapper around one engine object reference
pub struct Handle
{
    raw: Cell<Option<RawHandle>>,
    kind: ObjectKind,
    runtime: Rc<RuntimeState>,
    generation: u64,
}

impl Handle
{
    pub(crate) fn new(kind: ObjectKind, raw: RawHandle, runtime: Rc<RuntimeState>) -> Self
    {
        let generation = runtime.generation();
        Self {
            raw: Cell::new(Some(raw)),
            kind,
            runtime,
            generation,
        }
    }

    /// Wrap another engine object created in the same runtime lifetime.
    pub(crate) fn sibling(&self, kind: ObjectKind, raw: RawHandle) -> Handle
    {
        Self {
            raw: Cell::new(Some(raw)),
            kind,
            runtime: Rc::clone(&self.runtime),
            generation: self.generation,
        }
    }

    /// Wrap a handle returned by an engine accessor. Null maps to `None`.
    pub(crate) fn adopt(&self, kind: ObjectKind, raw: Option<RawHandle>) -> Option<Handle>
    {
        raw.map(|raw| self.sibling(kind, raw))
    }

    #[must_use]
    pub fn kind(&self) -> ObjectKind
    {
        self.kind
    }

    pub(crate) fn engine(&self) -> &Rc<dyn Engine>
    {
        self.runtime.engine()
    }

    /// The runtime this handle was created in has not been terminated.
    fn is_live(&self) -> bool
    {
        self.runtime.is_live(self.generation)
    }

    /// The raw handle, or `None` after release.
    #[must_use]
    pub fn raw(&self) -> Option<RawHandle>
    {
        self.raw.get()
    }

    #[must_use]
    pub fn is_released(&self) -> bool
    {
        self.raw.get().is_none()
    }

    /// Non-null, runtime still initialized, and valid according to the engine.
    #[must_use]
    pub fn is_valid(&self) -> bool
    {
        self.is_live() && self.raw.get().is_some_and(|raw| self.engine().is_valid(self.kind, raw))
    }

    /// Release the engine object now.
    ///
    /// The slot is nulled before the destroy call, so repeated calls and the
    /// eventual `Drop` are no-ops. Objects outliving an explicit terminate are
    /// dropped without calling into the engine.
    pub fn release(&self)
    {
        if let Some(raw) = self.raw.take() {
            if self.is_live() {
                trace!("Releasing {} handle {}", self.kind, raw);
                self.engine().destroy(self.kind, raw);
            } else {
                debug!("Dropping {} handle {} from a terminated runtime", self.kind, raw);
            }
        }
    }

    /// The raw handle if valid.
    ///
    /// Fails with `NotInitialized` once the runtime has been terminated, and
    /// with `InvalidObject` naming the kind otherwise.
    pub(crate) fn checked(&self) -> LldbindResult<RawHandle>
    {
        if !self.is_live() {
            return Err(LldbindError::NotInitialized);
        }
        match self.raw.get() {
            Some(raw) if self.engine().is_valid(self.kind, raw) => Ok(raw),
            _ => Err(LldbindError::InvalidObject(self.kind.name())),
        }
    }

    /// Run a read accessor, or return `default` when the handle is invalid.
    pub(crate) fn read<T, F>(&self, default: T, f: F) -> T
    where
        F: FnOnce(&dyn Engine, RawHandle) -> T,
    {
        match self.checked() {
            Ok(raw) => f(self.engine().as_ref(), raw),
            Err(_) => default,
        }
    }

    /// Validity gate followed by a capability check.
    pub(crate) fn checked_with(&self, feature: Feature) -> LldbindResult<RawHandle>
    {
        let raw = self.checked()?;
        self.engine().capabilities().require(feature)?;
        Ok(raw)
    }
}

impl Drop for Handle
{
    fn drop(&mut self)
    {
        self.release();
    }
}

impl fmt::Debug for Handle
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Handle")
            .field("kind", &self.kind)
            .field("raw", &self.raw.get())
            .finish()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_null_raw_handle()
    {
        assert!(RawHandle::new(0).is_none());
        assert!(RawHandle::from_ptr(std::ptr::null_mut::<u8>()).is_none());
        assert_eq!(RawHandle::new(0x40).unwrap().get(), 0x40);
    }

    #[test]
    fn test_kind_names()
    {
        assert_eq!(ObjectKind::BreakpointLocation.to_string(), "BreakpointLocation");
        assert_eq!(
            LldbindError::InvalidObject(ObjectKind::Target.name()).to_string(),
            "Target is not valid"
        );
    }
}

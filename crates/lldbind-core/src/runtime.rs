//! # Runtime
//!
//! [`Lldb`] owns the loaded engine and its process-wide lifecycle.
//!
//! - [`Lldb::initialize`] and [`Lldb::terminate`] are idempotent.
//! - Creating a debugger requires an initialized runtime;
//!   [`Lldb::create_debugger`] initializes on demand, [`Debugger::create`]
//!   fails fast with [`LldbindError::NotInitialized`].
//! - Every handle shares the runtime state, so dropping the last [`Lldb`]
//!   clone terminates the engine only once the last engine object is gone.
//! - An explicit [`Lldb::terminate`] ends the current lifetime. Handles created
//!   before it fail with [`LldbindError::NotInitialized`] and are never handed
//!   back to the engine's destroy entry points, even after a later
//!   re-initialization.
//!
//! ## Example
//!
//! ```rust
//! use lldbind_core::engine::sim::{SimEngine, SimProgram};
//! use lldbind_core::Lldb;
//!
//! let lldb = Lldb::simulated(SimEngine::new().with_program(SimProgram::new("/bin/demo")));
//! let debugger = lldb.create_debugger()?;
//! assert!(lldb.is_initialized());
//! assert!(debugger.is_valid());
//! # Ok::<(), lldbind_core::LldbindError>(())
//! ```

use std::cell::Cell;
#[cfg(unix)]
use std::path::Path;
use std::rc::Rc;

use tracing::{debug, info};

use crate::capability::{Capabilities, Feature};
use crate::debugger::Debugger;
use crate::engine::sim::SimEngine;
use crate::engine::Engine;
use crate::error::{LldbindError, LldbindResult};

/// Handle to a loaded engine
#[derive(Clone)]
pub struct Lldb
{
    inner: Rc<RuntimeState>,
}

/// Engine plus lifecycle, shared by the runtime and every handle
pub(crate) struct RuntimeState
{
    engine: Rc<dyn Engine>,
    initialized: Cell<bool>,
    // Bumped by every initialize so handles from an earlier lifetime stay dead.
    generation: Cell<u64>,
}

impl RuntimeState
{
    pub(crate) fn engine(&self) -> &Rc<dyn Engine>
    {
        &self.engine
    }

    pub(crate) fn generation(&self) -> u64
    {
        self.generation.get()
    }

    /// Initialized, and still in the lifetime `generation` was taken from.
    pub(crate) fn is_live(&self, generation: u64) -> bool
    {
        self.initialized.get() && self.generation.get() == generation
    }
}

impl Lldb
{
    /// Wrap an already constructed engine.
    #[must_use]
    pub fn with_engine(engine: Rc<dyn Engine>) -> Self
    {
        Self {
            inner: Rc::new(RuntimeState {
                engine,
                initialized: Cell::new(false),
                generation: Cell::new(0),
            }),
        }
    }

    /// Run against the in-memory engine.
    #[must_use]
    pub fn simulated(engine: SimEngine) -> Self
    {
        Self::with_engine(Rc::new(engine))
    }

    /// Load the wrapper library from the default search locations.
    ///
    /// See [`wrapper_library_candidates`](crate::config::wrapper_library_candidates).
    ///
    /// ## Errors
    ///
    /// Returns `LibraryLoad` when no candidate could be opened.
    #[cfg(unix)]
    pub fn load() -> LldbindResult<Self>
    {
        let engine = crate::engine::native::NativeEngine::load()?;
        Ok(Self::with_engine(Rc::new(engine)))
    }

    /// Load the wrapper library from an explicit path.
    ///
    /// ## Errors
    ///
    /// Returns `LibraryLoad` when the library cannot be opened or lacks the
    /// required entry points.
    #[cfg(unix)]
    pub fn load_from(path: impl AsRef<Path>) -> LldbindResult<Self>
    {
        let engine = crate::engine::native::NativeEngine::open(path.as_ref())?;
        Ok(Self::with_engine(Rc::new(engine)))
    }

    /// Initialize the engine. Calling it again is a no-op.
    pub fn initialize(&self)
    {
        if !self.inner.initialized.get() {
            info!("Initializing LLDB");
            self.inner.engine.initialize();
            self.inner.generation.set(self.inner.generation.get() + 1);
            self.inner.initialized.set(true);
        }
    }

    /// Terminate the engine. Calling it again, or before `initialize`, is a no-op.
    pub fn terminate(&self)
    {
        if self.inner.initialized.replace(false) {
            info!("Terminating LLDB");
            self.inner.engine.terminate();
        }
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool
    {
        self.inner.initialized.get()
    }

    /// Fail with `NotInitialized` unless the runtime is initialized.
    ///
    /// ## Errors
    ///
    /// Returns `NotInitialized`.
    pub fn ensure_initialized(&self) -> LldbindResult<()>
    {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(LldbindError::NotInitialized)
        }
    }

    /// Initialize if needed and create a debugger session.
    ///
    /// ## Errors
    ///
    /// Returns an error if the engine fails to create the debugger.
    pub fn create_debugger(&self) -> LldbindResult<Debugger>
    {
        self.initialize();
        Debugger::create(self)
    }

    /// Engine version banner, e.g. `"lldb version 17.0.6"`.
    #[must_use]
    pub fn version_string(&self) -> Option<String>
    {
        self.inner.engine.version_string()
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities
    {
        self.inner.engine.capabilities()
    }

    #[must_use]
    pub fn is_supported(&self, feature: Feature) -> bool
    {
        self.capabilities().is_supported(feature)
    }

    /// ## Errors
    ///
    /// Returns `UnsupportedApi` naming the feature.
    pub fn require(&self, feature: Feature) -> LldbindResult<()>
    {
        self.capabilities().require(feature)
    }

    pub(crate) fn state(&self) -> &Rc<RuntimeState>
    {
        &self.inner
    }
}

impl Drop for RuntimeState
{
    fn drop(&mut self)
    {
        if self.initialized.replace(false) {
            debug!("Last runtime reference dropped, terminating LLDB");
            self.engine.terminate();
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_capabilities_follow_engine()
    {
        let engine = SimEngine::new().with_capabilities(Capabilities::all().without(Feature::Registers));
        let lldb = Lldb::simulated(engine);

        assert!(lldb.is_supported(Feature::StepOver));
        assert!(!lldb.is_supported(Feature::Registers));
        assert!(lldb.require(Feature::MemoryRead).is_ok());
        assert!(matches!(
            lldb.require(Feature::Registers),
            Err(LldbindError::UnsupportedApi(name)) if name == "registers"
        ));
        assert_eq!(lldb.version_string().as_deref(), Some("lldb version 17.0.6"));
    }

    #[test]
    fn test_drop_terminates()
    {
        let engine = Rc::new(SimEngine::new());
        {
            let lldb = Lldb::with_engine(engine.clone());
            lldb.initialize();
            let _clone = lldb.clone();
        }
        assert_eq!(engine.stats().terminate_calls, 1);
    }

    #[test]
    fn test_ensure_initialized()
    {
        let lldb = Lldb::simulated(SimEngine::new());
        assert!(matches!(lldb.ensure_initialized(), Err(LldbindError::NotInitialized)));
        lldb.initialize();
        assert!(lldb.ensure_initialized().is_ok());
    }
}

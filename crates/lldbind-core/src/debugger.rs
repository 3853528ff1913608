//! # Debugger
//!
//! The root of a debugging session. A [`Debugger`] owns its engine handle,
//! the session's async flag and the [`WaitConfig`] used by the synchronous
//! launch/attach protocol. Targets are created from it.
//!
//! ## Example
//!
//! ```rust
//! use lldbind_core::engine::sim::{SimEngine, SimProgram};
//! use lldbind_core::Lldb;
//!
//! let lldb = Lldb::simulated(SimEngine::new().with_program(SimProgram::new("/bin/true")));
//! let debugger = lldb.create_debugger()?;
//! let target = debugger.create_target("/bin/true")?;
//! assert_eq!(debugger.num_targets(), 1);
//! assert_eq!(target.executable_path().as_deref(), Some("/bin/true"));
//! # Ok::<(), lldbind_core::LldbindError>(())
//! ```

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, info};

use crate::command::CommandInterpreter;
use crate::config::WaitConfig;
use crate::error::{LldbindError, LldbindResult};
use crate::handle::{Handle, ObjectKind};
use crate::runtime::Lldb;
use crate::status::Status;
use crate::target::Target;
use crate::types::ProcessId;

/// A debugging session
#[derive(Clone)]
pub struct Debugger
{
    inner: Rc<DebuggerInner>,
}

struct DebuggerInner
{
    handle: Handle,
    wait: Cell<WaitConfig>,
    // The runtime this session was created from.
    runtime: Lldb,
}

impl Debugger
{
    /// Create a session on an initialized runtime.
    ///
    /// ## Errors
    ///
    /// - `NotInitialized` if `lldb` has not been initialized
    /// - `Engine` if the engine returns a null debugger
    pub fn create(lldb: &Lldb) -> LldbindResult<Self>
    {
        lldb.ensure_initialized()?;
        let raw = lldb
            .state()
            .engine()
            .debugger_create()
            .ok_or_else(|| LldbindError::Engine("Failed to create debugger".to_string()))?;
        debug!("Created debugger {}", raw);

        Ok(Self {
            inner: Rc::new(DebuggerInner {
                handle: Handle::new(ObjectKind::Debugger, raw, Rc::clone(lldb.state())),
                wait: Cell::new(WaitConfig::from_env()),
                runtime: lldb.clone(),
            }),
        })
    }

    #[must_use]
    pub fn is_valid(&self) -> bool
    {
        self.inner.handle.is_valid()
    }

    /// Release the engine object now instead of at drop.
    pub fn release(&self)
    {
        self.inner.handle.release();
    }

    #[must_use]
    pub fn runtime(&self) -> &Lldb
    {
        &self.inner.runtime
    }

    #[must_use]
    pub fn wait_config(&self) -> WaitConfig
    {
        self.inner.wait.get()
    }

    /// Replace the timing used by synchronous launch and attach.
    pub fn set_wait_config(&self, config: WaitConfig)
    {
        self.inner.wait.set(config);
    }

    /// Create a target for an executable with default architecture and platform.
    ///
    /// ## Errors
    ///
    /// Returns `Engine` if the engine rejects the file.
    pub fn create_target(&self, filename: &str) -> LldbindResult<Target>
    {
        self.create_target_with(filename, None, None, true)
    }

    /// Create a target with explicit architecture and platform.
    ///
    /// ## Errors
    ///
    /// - `InvalidObject` if the debugger is not valid
    /// - `Engine` carrying the engine message, or naming the file when the
    ///   engine returns a null target without one
    pub fn create_target_with(
        &self,
        filename: &str,
        arch: Option<&str>,
        platform: Option<&str>,
        add_dependent_modules: bool,
    ) -> LldbindResult<Target>
    {
        let raw = self.inner.handle.checked()?;
        let mut status = Status::new();
        let target = self.inner.handle.engine().debugger_create_target(
            raw,
            filename,
            arch,
            platform,
            add_dependent_modules,
            &mut status,
        );
        if let Err(err) = status.raise_if_error() {
            if let Some(stray) = target {
                self.inner.handle.engine().destroy(ObjectKind::Target, stray);
            }
            return Err(err);
        }

        let handle = self
            .inner
            .handle
            .adopt(ObjectKind::Target, target)
            .ok_or_else(|| LldbindError::Engine(format!("Failed to create target for '{filename}'")))?;
        info!("Created target for {}", filename);
        Ok(Target::new(handle, self.clone()))
    }

    #[must_use]
    pub fn num_targets(&self) -> u32
    {
        self.inner.handle.read(0, |engine, raw| engine.debugger_num_targets(raw))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the debugger is not valid.
    pub fn target_at_index(&self, index: u32) -> LldbindResult<Option<Target>>
    {
        let raw = self.inner.handle.checked()?;
        let target = self.inner.handle.engine().debugger_target_at_index(raw, index);
        Ok(self.wrap_target(target))
    }

    /// All targets, re-fetched on every call.
    #[must_use]
    pub fn targets(&self) -> Vec<Target>
    {
        (0..self.num_targets())
            .filter_map(|index| self.target_at_index(index).ok().flatten())
            .collect()
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the debugger is not valid.
    pub fn selected_target(&self) -> LldbindResult<Option<Target>>
    {
        let raw = self.inner.handle.checked()?;
        let target = self.inner.handle.engine().debugger_selected_target(raw);
        Ok(self.wrap_target(target))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if either the debugger or the target is not valid.
    pub fn set_selected_target(&self, target: &Target) -> LldbindResult<()>
    {
        let raw = self.inner.handle.checked()?;
        let target_raw = target.handle().checked()?;
        self.inner.handle.engine().debugger_set_selected_target(raw, target_raw);
        Ok(())
    }

    /// Delete a target from the session. Returns whether the engine deleted it.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidObject` if either the debugger or the target is not valid.
    pub fn delete_target(&self, target: &Target) -> LldbindResult<bool>
    {
        let raw = self.inner.handle.checked()?;
        let target_raw = target.handle().checked()?;
        Ok(self.inner.handle.engine().debugger_delete_target(raw, target_raw))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the debugger is not valid.
    pub fn find_target_with_process_id(&self, pid: ProcessId) -> LldbindResult<Option<Target>>
    {
        let raw = self.inner.handle.checked()?;
        let target = self
            .inner
            .handle
            .engine()
            .debugger_find_target_with_process_id(raw, pid.raw());
        Ok(self.wrap_target(target))
    }

    /// Whether launch and attach return without waiting for a stop.
    #[must_use]
    pub fn is_async(&self) -> bool
    {
        self.inner.handle.read(false, |engine, raw| engine.debugger_async(raw))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the debugger is not valid.
    pub fn set_async(&self, is_async: bool) -> LldbindResult<()>
    {
        let raw = self.inner.handle.checked()?;
        self.inner.handle.engine().debugger_set_async(raw, is_async);
        Ok(())
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the debugger is not valid.
    pub fn command_interpreter(&self) -> LldbindResult<Option<CommandInterpreter>>
    {
        let raw = self.inner.handle.checked()?;
        let interpreter = self.inner.handle.engine().debugger_command_interpreter(raw);
        Ok(self
            .inner
            .handle
            .adopt(ObjectKind::CommandInterpreter, interpreter)
            .map(|handle| CommandInterpreter::new(handle, self.clone())))
    }

    /// Run a command through the engine, discarding its output.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidObject` if the debugger is not valid.
    pub fn handle_command(&self, command: &str) -> LldbindResult<()>
    {
        let raw = self.inner.handle.checked()?;
        self.inner.handle.engine().debugger_handle_command(raw, command);
        Ok(())
    }

    fn wrap_target(&self, raw: Option<crate::handle::RawHandle>) -> Option<Target>
    {
        self.inner
            .handle
            .adopt(ObjectKind::Target, raw)
            .map(|handle| Target::new(handle, self.clone()))
    }
}

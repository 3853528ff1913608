//! # Process
//!
//! A debuggee. State is only ever changed by the engine (observed through
//! [`Process::state`]) or by the explicit control operations here, which
//! return as soon as the engine accepts the request.
//!
//! The link back to the owning [`Target`] is weak: a target holds its current
//! process strongly, so a strong link the other way would form a cycle.

use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::capability::Feature;
use crate::config::WaitConfig;
use crate::engine::{Engine, OutputStream, ProcessControl};
use crate::error::{LldbindError, LldbindResult};
use crate::handle::{Handle, ObjectKind, RawHandle};
use crate::launch;
use crate::status::Status;
use crate::target::{Target, TargetInner};
use crate::thread::Thread;
use crate::types::{MemoryRegionInfo, Permissions, ProcessId, State, ThreadId};

/// Default size of an output snapshot.
pub const DEFAULT_OUTPUT_CHUNK: usize = 4096;

/// Default bound of a C string read.
pub const DEFAULT_CSTRING_MAX: usize = 1024;

/// A process under debugger control
#[derive(Clone)]
pub struct Process
{
    inner: Rc<ProcessInner>,
}

struct ProcessInner
{
    handle: Handle,
    target: Weak<TargetInner>,
}

impl Process
{
    pub(crate) fn new(handle: Handle, target: &Target) -> Self
    {
        Self {
            inner: Rc::new(ProcessInner {
                handle,
                target: target.downgrade(),
            }),
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

    /// The owning target, while it is still alive.
    #[must_use]
    pub fn target(&self) -> Option<Target>
    {
        Target::upgrade(&self.inner.target)
    }

    // State

    /// Current state, [`State::Invalid`] for an invalid process.
    #[must_use]
    pub fn state(&self) -> State
    {
        self.inner
            .handle
            .read(State::Invalid, |engine, raw| State::from_raw(engine.process_state(raw)))
    }

    #[must_use]
    pub fn state_name(&self) -> &'static str
    {
        self.state().name()
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool
    {
        self.state() == State::Stopped
    }

    #[must_use]
    pub fn is_running(&self) -> bool
    {
        self.state() == State::Running
    }

    #[must_use]
    pub fn is_exited(&self) -> bool
    {
        self.state() == State::Exited
    }

    #[must_use]
    pub fn is_crashed(&self) -> bool
    {
        self.state() == State::Crashed
    }

    /// Block until the process is stopped, exited or crashed.
    ///
    /// Useful after a manual [`Process::continue_execution`] in synchronous code.
    ///
    /// ## Errors
    ///
    /// Returns `Launch` naming the timeout when `config.timeout` elapses first.
    pub fn wait_for_stop(&self, config: &WaitConfig) -> LldbindResult<State>
    {
        launch::poll_for_stop(self, config).ok_or_else(|| LldbindError::Launch(launch::timeout_message(config)))
    }

    // Control

    fn control(&self, control: ProcessControl) -> LldbindResult<bool>
    {
        let raw = self.inner.handle.checked()?;
        debug!("Process {}: {:?}", self.pid(), control);
        Ok(self.engine().process_control(raw, control))
    }

    /// Resume execution. Returns without waiting for the next stop.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidObject` if the process is not valid.
    pub fn continue_execution(&self) -> LldbindResult<bool>
    {
        self.control(ProcessControl::Continue)
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the process is not valid.
    pub fn stop(&self) -> LldbindResult<bool>
    {
        self.control(ProcessControl::Stop)
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the process is not valid.
    pub fn kill(&self) -> LldbindResult<bool>
    {
        self.control(ProcessControl::Kill)
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the process is not valid.
    pub fn detach(&self) -> LldbindResult<bool>
    {
        self.control(ProcessControl::Detach)
    }

    /// Tear down the debuggee.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidObject` if the process is not valid.
    pub fn destroy(&self) -> LldbindResult<bool>
    {
        self.control(ProcessControl::Destroy)
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the process is not valid.
    pub fn send_async_interrupt(&self) -> LldbindResult<bool>
    {
        self.control(ProcessControl::SendAsyncInterrupt)
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the process is not valid.
    pub fn signal(&self, signal: i32) -> LldbindResult<bool>
    {
        let raw = self.inner.handle.checked()?;
        Ok(self.engine().process_signal(raw, signal))
    }

    // Identity and exit

    /// Process id, 0 for an invalid process.
    #[must_use]
    pub fn pid(&self) -> ProcessId
    {
        ProcessId(self.inner.handle.read(0, |engine, raw| engine.process_pid(raw)))
    }

    #[must_use]
    pub fn unique_id(&self) -> u32
    {
        self.inner.handle.read(0, |engine, raw| engine.process_unique_id(raw))
    }

    #[must_use]
    pub fn exit_status(&self) -> i32
    {
        self.inner.handle.read(-1, |engine, raw| engine.process_exit_status(raw))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the process is not valid.
    pub fn exit_description(&self) -> LldbindResult<Option<String>>
    {
        let raw = self.inner.handle.checked()?;
        Ok(self.engine().process_exit_description(raw))
    }

    // Threads

    #[must_use]
    pub fn num_threads(&self) -> u32
    {
        self.inner.handle.read(0, |engine, raw| engine.process_num_threads(raw))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the process is not valid.
    pub fn thread_at_index(&self, index: u32) -> LldbindResult<Option<Thread>>
    {
        let raw = self.inner.handle.checked()?;
        let thread = self.engine().process_thread_at_index(raw, index);
        Ok(self.wrap_thread(thread))
    }

    /// ## Errors
    ///
    /// - `InvalidObject` if the process is not valid
    /// - `UnsupportedApi` if the engine lacks `thread_by_id`
    pub fn thread_by_id(&self, tid: ThreadId) -> LldbindResult<Option<Thread>>
    {
        let raw = self.inner.handle.checked_with(Feature::ThreadById)?;
        let thread = self.engine().process_thread_by_id(raw, tid.raw());
        Ok(self.wrap_thread(thread))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the process is not valid.
    pub fn thread_by_index_id(&self, index_id: u32) -> LldbindResult<Option<Thread>>
    {
        let raw = self.inner.handle.checked()?;
        let thread = self.engine().process_thread_by_index_id(raw, index_id);
        Ok(self.wrap_thread(thread))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the process is not valid.
    pub fn selected_thread(&self) -> LldbindResult<Option<Thread>>
    {
        let raw = self.inner.handle.checked()?;
        let thread = self.engine().process_selected_thread(raw);
        Ok(self.wrap_thread(thread))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the process is not valid.
    pub fn select_thread_by_id(&self, tid: ThreadId) -> LldbindResult<bool>
    {
        let raw = self.inner.handle.checked()?;
        Ok(self.engine().process_select_thread_by_id(raw, tid.raw()))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the process is not valid.
    pub fn select_thread_by_index_id(&self, index_id: u32) -> LldbindResult<bool>
    {
        let raw = self.inner.handle.checked()?;
        Ok(self.engine().process_select_thread_by_index_id(raw, index_id))
    }

    /// All threads, re-fetched on every call.
    #[must_use]
    pub fn threads(&self) -> Vec<Thread>
    {
        (0..self.num_threads())
            .filter_map(|index| self.thread_at_index(index).ok().flatten())
            .collect()
    }

    fn wrap_thread(&self, raw: Option<RawHandle>) -> Option<Thread>
    {
        self.inner
            .handle
            .adopt(ObjectKind::Thread, raw)
            .map(|handle| Thread::new(handle, self.clone()))
    }

    // Memory

    /// Read up to `size` bytes. The result is shorter when the read stops early.
    ///
    /// ## Errors
    ///
    /// - `InvalidObject` if the process is not valid
    /// - `UnsupportedApi` if the engine lacks `memory_read`
    /// - `Engine` if the read fails
    pub fn read_memory(&self, address: u64, size: usize) -> LldbindResult<Vec<u8>>
    {
        let raw = self.inner.handle.checked_with(Feature::MemoryRead)?;
        let mut buf = vec![0u8; size];
        let mut status = Status::new();
        let read = self.engine().process_read_memory(raw, address, &mut buf, &mut status);
        status.raise_if_error()?;
        buf.truncate(read.min(size));
        Ok(buf)
    }

    /// Write `data` and return the number of bytes written.
    ///
    /// ## Errors
    ///
    /// - `InvalidObject` if the process is not valid
    /// - `UnsupportedApi` if the engine lacks `memory_write`
    /// - `Engine` if the write fails
    pub fn write_memory(&self, address: u64, data: &[u8]) -> LldbindResult<usize>
    {
        let raw = self.inner.handle.checked_with(Feature::MemoryWrite)?;
        let mut status = Status::new();
        let written = self.engine().process_write_memory(raw, address, data, &mut status);
        status.raise_if_error()?;
        Ok(written)
    }

    /// Allocate memory in the debuggee and return its address.
    ///
    /// ## Errors
    ///
    /// - `InvalidObject` if the process is not valid
    /// - `Engine` if the allocation fails
    pub fn allocate_memory(&self, size: usize, permissions: Permissions) -> LldbindResult<u64>
    {
        let raw = self.inner.handle.checked()?;
        let mut status = Status::new();
        let address = self
            .engine()
            .process_allocate_memory(raw, size, permissions.bits(), &mut status);
        status.raise_if_error()?;
        Ok(address)
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the process is not valid.
    pub fn deallocate_memory(&self, address: u64) -> LldbindResult<bool>
    {
        let raw = self.inner.handle.checked()?;
        Ok(self.engine().process_deallocate_memory(raw, address))
    }

    /// Read a NUL-terminated string of at most `max_len` bytes.
    ///
    /// ## Errors
    ///
    /// - `InvalidObject` if the process is not valid
    /// - `Engine` if the read fails
    pub fn read_cstring_from_memory(&self, address: u64, max_len: usize) -> LldbindResult<String>
    {
        let raw = self.inner.handle.checked()?;
        let mut buf = vec![0u8; max_len];
        let mut status = Status::new();
        let read = self.engine().process_read_cstring(raw, address, &mut buf, &mut status);
        status.raise_if_error()?;
        buf.truncate(read.min(max_len));
        if let Some(nul) = buf.iter().position(|b| *b == 0) {
            buf.truncate(nul);
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Describe the memory region containing `address`.
    ///
    /// ## Errors
    ///
    /// - `InvalidObject` if the process is not valid
    /// - `UnsupportedApi` if the engine lacks `memory_region_info`
    /// - `Engine` if the query fails
    pub fn memory_region_info(&self, address: u64) -> LldbindResult<Option<MemoryRegionInfo>>
    {
        let raw = self.inner.handle.checked_with(Feature::MemoryRegionInfo)?;
        let mut status = Status::new();
        let region = self.engine().process_memory_region_info(raw, address, &mut status);
        status.raise_if_error()?;
        Ok(region)
    }

    /// Number of hardware watchpoint slots, 0 when unknown.
    #[must_use]
    pub fn num_supported_hardware_watchpoints(&self) -> u32
    {
        self.inner.handle.read(0, |engine, raw| {
            let mut status = Status::new();
            engine.process_num_supported_hardware_watchpoints(raw, &mut status)
        })
    }

    // I/O

    /// Snapshot of up to `max_len` bytes of pending standard output.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidObject` if the process is not valid.
    pub fn stdout(&self, max_len: usize) -> LldbindResult<String>
    {
        self.read_output(OutputStream::Stdout, max_len)
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the process is not valid.
    pub fn stderr(&self, max_len: usize) -> LldbindResult<String>
    {
        self.read_output(OutputStream::Stderr, max_len)
    }

    fn read_output(&self, stream: OutputStream, max_len: usize) -> LldbindResult<String>
    {
        let raw = self.inner.handle.checked()?;
        let mut buf = vec![0u8; max_len];
        let read = self.engine().process_read_output(raw, stream, &mut buf);
        buf.truncate(read.min(max_len));
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Feed bytes to the debuggee's standard input. Returns bytes accepted.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidObject` if the process is not valid.
    pub fn put_stdin(&self, data: &[u8]) -> LldbindResult<usize>
    {
        let raw = self.inner.handle.checked()?;
        Ok(self.engine().process_put_stdin(raw, data))
    }
}

impl fmt::Debug for Process
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Process")
            .field("handle", &self.inner.handle)
            .field("pid", &self.pid())
            .finish()
    }
}

//! Threads of a debuggee: stepping, frames and stop information.

use std::fmt;
use std::rc::Rc;

use crate::engine::{Engine, StepKind};
use crate::error::LldbindResult;
use crate::frame::Frame;
use crate::handle::{Handle, ObjectKind, RawHandle};
use crate::process::Process;
use crate::types::{StopReason, ThreadId};

/// Maximum length of a stop description.
const STOP_DESCRIPTION_MAX: usize = 256;

/// A thread of a [`Process`]
#[derive(Clone)]
pub struct Thread
{
    inner: Rc<ThreadInner>,
}

struct ThreadInner
{
    handle: Handle,
    process: Process,
}

impl Thread
{
    pub(crate) fn new(handle: Handle, process: Process) -> Self
    {
        Self {
            inner: Rc::new(ThreadInner { handle, process }),
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

    /// The process this thread was fetched from.
    #[must_use]
    pub fn process(&self) -> &Process
    {
        &self.inner.process
    }

    // Stepping

    fn step(&self, kind: StepKind) -> LldbindResult<bool>
    {
        let raw = self.inner.handle.checked_with(kind.feature())?;
        Ok(self.engine().thread_step(raw, kind))
    }

    /// Step over the current source line.
    ///
    /// ## Errors
    ///
    /// - `InvalidObject` if the thread is not valid
    /// - `UnsupportedApi` if the engine lacks `step_over`
    pub fn step_over(&self) -> LldbindResult<bool>
    {
        self.step(StepKind::Over)
    }

    /// ## Errors
    ///
    /// - `InvalidObject` if the thread is not valid
    /// - `UnsupportedApi` if the engine lacks `step_into`
    pub fn step_into(&self) -> LldbindResult<bool>
    {
        self.step(StepKind::Into)
    }

    /// ## Errors
    ///
    /// - `InvalidObject` if the thread is not valid
    /// - `UnsupportedApi` if the engine lacks `step_out`
    pub fn step_out(&self) -> LldbindResult<bool>
    {
        self.step(StepKind::Out)
    }

    /// Step one instruction; `over_calls` treats a call as one instruction.
    ///
    /// ## Errors
    ///
    /// - `InvalidObject` if the thread is not valid
    /// - `UnsupportedApi` if the engine lacks `step_instruction`
    pub fn step_instruction(&self, over_calls: bool) -> LldbindResult<bool>
    {
        self.step(StepKind::Instruction { over_calls })
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the thread is not valid.
    pub fn run_to_address(&self, address: u64) -> LldbindResult<bool>
    {
        let raw = self.inner.handle.checked()?;
        Ok(self.engine().thread_run_to_address(raw, address))
    }

    // Frames

    #[must_use]
    pub fn num_frames(&self) -> u32
    {
        self.inner.handle.read(0, |engine, raw| engine.thread_num_frames(raw))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the thread is not valid.
    pub fn frame_at_index(&self, index: u32) -> LldbindResult<Option<Frame>>
    {
        let raw = self.inner.handle.checked()?;
        let frame = self.engine().thread_frame_at_index(raw, index);
        Ok(self.wrap_frame(frame))
    }

    /// Frames from innermost outward, re-fetched on every call.
    #[must_use]
    pub fn frames(&self) -> Vec<Frame>
    {
        (0..self.num_frames())
            .filter_map(|index| self.frame_at_index(index).ok().flatten())
            .collect()
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the thread is not valid.
    pub fn selected_frame(&self) -> LldbindResult<Option<Frame>>
    {
        let raw = self.inner.handle.checked()?;
        let frame = self.engine().thread_selected_frame(raw);
        Ok(self.wrap_frame(frame))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the thread is not valid.
    pub fn select_frame(&self, index: u32) -> LldbindResult<bool>
    {
        let raw = self.inner.handle.checked()?;
        Ok(self.engine().thread_select_frame(raw, index))
    }

    fn wrap_frame(&self, raw: Option<RawHandle>) -> Option<Frame>
    {
        self.inner
            .handle
            .adopt(ObjectKind::Frame, raw)
            .map(|handle| Frame::new(handle, self.clone()))
    }

    // Identity

    #[must_use]
    pub fn thread_id(&self) -> ThreadId
    {
        ThreadId(self.inner.handle.read(0, |engine, raw| engine.thread_id(raw)))
    }

    /// The engine's 1-based thread index.
    #[must_use]
    pub fn index_id(&self) -> u32
    {
        self.inner.handle.read(0, |engine, raw| engine.thread_index_id(raw))
    }

    #[must_use]
    pub fn name(&self) -> Option<String>
    {
        self.inner.handle.read(None, |engine, raw| engine.thread_name(raw))
    }

    #[must_use]
    pub fn queue_name(&self) -> Option<String>
    {
        self.inner.handle.read(None, |engine, raw| engine.thread_queue_name(raw))
    }

    // Stop information

    #[must_use]
    pub fn stop_reason(&self) -> StopReason
    {
        self.inner
            .handle
            .read(StopReason::Invalid, |engine, raw| StopReason::from_raw(engine.thread_stop_reason(raw)))
    }

    #[must_use]
    pub fn stop_description(&self) -> Option<String>
    {
        self.inner
            .handle
            .read(None, |engine, raw| engine.thread_stop_description(raw, STOP_DESCRIPTION_MAX))
    }

    /// Reason-specific data words, e.g. breakpoint id and location id for a
    /// breakpoint stop.
    #[must_use]
    pub fn stop_reason_data(&self) -> Vec<u64>
    {
        self.inner.handle.read(Vec::new(), |engine, raw| {
            let count = engine.thread_stop_reason_data_count(raw);
            (0..u32::try_from(count).unwrap_or(u32::MAX))
                .map(|index| engine.thread_stop_reason_data_at_index(raw, index))
                .collect()
        })
    }

    #[must_use]
    pub fn is_stopped_at_breakpoint(&self) -> bool
    {
        self.stop_reason() == StopReason::Breakpoint
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool
    {
        self.inner.handle.read(false, |engine, raw| engine.thread_is_stopped(raw))
    }

    #[must_use]
    pub fn is_suspended(&self) -> bool
    {
        self.inner.handle.read(false, |engine, raw| engine.thread_is_suspended(raw))
    }

    /// Keep this thread from running when the process resumes.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidObject` if the thread is not valid.
    pub fn suspend(&self) -> LldbindResult<bool>
    {
        let raw = self.inner.handle.checked()?;
        Ok(self.engine().thread_set_suspended(raw, true))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the thread is not valid.
    pub fn resume(&self) -> LldbindResult<bool>
    {
        let raw = self.inner.handle.checked()?;
        Ok(self.engine().thread_set_suspended(raw, false))
    }
}

impl fmt::Display for Thread
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "thread #{}: tid = {}", self.index_id(), self.thread_id())?;
        if let Some(name) = self.name() {
            write!(f, ", name = '{name}'")?;
        }
        write!(f, ", stop reason = {}", self.stop_reason())
    }
}

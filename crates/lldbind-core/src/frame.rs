//! # Frames
//!
//! A [`Frame`] is one activation record of a stopped thread. Frames are only
//! meaningful while the process stays stopped: once it resumes, the engine
//! reports every previously fetched frame as invalid, so read accessors fall
//! back to their defaults and fallible ones fail with `InvalidObject`.

use std::fmt;
use std::rc::Rc;

use crate::capability::Feature;
use crate::engine::{Engine, FrameRegister, FrameText, VariableOptions};
use crate::error::{LldbindError, LldbindResult};
use crate::handle::{Handle, ObjectKind, RawHandle};
use crate::module::{Module, SymbolContext};
use crate::thread::Thread;
use crate::types::SymbolContextItem;
use crate::value::{Value, ValueList, ValueOwner};

/// A stack frame of a [`Thread`]
#[derive(Clone)]
pub struct Frame
{
    inner: Rc<FrameInner>,
}

struct FrameInner
{
    handle: Handle,
    thread: Thread,
}

impl Frame
{
    pub(crate) fn new(handle: Handle, thread: Thread) -> Self
    {
        Self {
            inner: Rc::new(FrameInner { handle, thread }),
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
    pub fn thread(&self) -> &Thread
    {
        &self.inner.thread
    }

    fn text(&self, text: FrameText) -> Option<String>
    {
        self.inner.handle.read(None, |engine, raw| engine.frame_text(raw, text))
    }

    #[must_use]
    pub fn function_name(&self) -> Option<String>
    {
        self.text(FrameText::FunctionName)
    }

    /// Function name as the engine would print it, e.g. with arguments for C++.
    #[must_use]
    pub fn display_function_name(&self) -> Option<String>
    {
        self.text(FrameText::DisplayFunctionName)
    }

    #[must_use]
    pub fn file_path(&self) -> Option<String>
    {
        self.text(FrameText::FilePath)
    }

    /// Source line, `0` when unknown.
    #[must_use]
    pub fn line(&self) -> u32
    {
        self.inner.handle.read(0, |engine, raw| engine.frame_line(raw))
    }

    #[must_use]
    pub fn column(&self) -> u32
    {
        self.inner.handle.read(0, |engine, raw| engine.frame_column(raw))
    }

    /// `file:line` when both are known.
    #[must_use]
    pub fn location(&self) -> Option<String>
    {
        let file = self.file_path()?;
        match self.line() {
            0 => None,
            line => Some(format!("{file}:{line}")),
        }
    }

    #[must_use]
    pub fn disassemble(&self) -> Option<String>
    {
        self.text(FrameText::Disassembly)
    }

    #[must_use]
    pub fn pc(&self) -> u64
    {
        self.inner.handle.read(0, |engine, raw| engine.frame_register(raw, FrameRegister::Pc))
    }

    #[must_use]
    pub fn sp(&self) -> u64
    {
        self.inner.handle.read(0, |engine, raw| engine.frame_register(raw, FrameRegister::Sp))
    }

    #[must_use]
    pub fn fp(&self) -> u64
    {
        self.inner.handle.read(0, |engine, raw| engine.frame_register(raw, FrameRegister::Fp))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the frame is not valid.
    pub fn set_pc(&self, pc: u64) -> LldbindResult<bool>
    {
        let raw = self.inner.handle.checked()?;
        Ok(self.engine().frame_set_pc(raw, pc))
    }

    /// Index of the frame within its thread, `0` being innermost.
    #[must_use]
    pub fn frame_id(&self) -> u32
    {
        self.inner.handle.read(0, |engine, raw| engine.frame_id(raw))
    }

    #[must_use]
    pub fn is_inlined(&self) -> bool
    {
        self.inner.handle.read(false, |engine, raw| engine.frame_is_inlined(raw))
    }

    // Variables and expressions

    /// Look up a variable visible in this frame.
    ///
    /// ## Errors
    ///
    /// - `InvalidObject` if the frame is not valid
    /// - `UnsupportedApi` if the engine lacks `find_variable`
    pub fn find_variable(&self, name: &str) -> LldbindResult<Option<Value>>
    {
        let raw = self.inner.handle.checked_with(Feature::FindVariable)?;
        let value = self.engine().frame_find_variable(raw, name);
        Ok(self.wrap_value(value))
    }

    /// Evaluate an expression in this frame's context.
    ///
    /// The returned value may carry an evaluation error; see
    /// [`Frame::evaluate`] for a variant that turns it into an `Err`.
    ///
    /// ## Errors
    ///
    /// - `InvalidObject` if the frame is not valid
    /// - `UnsupportedApi` if the engine lacks `evaluate_expression`
    pub fn evaluate_expression(&self, expression: &str) -> LldbindResult<Option<Value>>
    {
        let raw = self.inner.handle.checked_with(Feature::EvaluateExpression)?;
        let value = self.engine().frame_evaluate_expression(raw, expression);
        Ok(self.wrap_value(value))
    }

    /// Evaluate an expression and require a result without error.
    ///
    /// ## Errors
    ///
    /// - `InvalidObject` / `UnsupportedApi` as for [`Frame::evaluate_expression`]
    /// - `Evaluation` with the engine's message when the result carries an
    ///   error, or naming the expression when there is no result at all
    pub fn evaluate(&self, expression: &str) -> LldbindResult<Value>
    {
        let value = self
            .evaluate_expression(expression)?
            .ok_or_else(|| LldbindError::Evaluation(format!("Failed to evaluate expression '{expression}'")))?;
        value.error()?.raise_if_error_as(LldbindError::Evaluation)?;
        Ok(value)
    }

    /// Resolve a path such as `point.x` or `items[2]`.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidObject` if the frame is not valid.
    pub fn value_for_variable_path(&self, path: &str) -> LldbindResult<Option<Value>>
    {
        let raw = self.inner.handle.checked()?;
        let value = self.engine().frame_value_for_variable_path(raw, path);
        Ok(self.wrap_value(value))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the frame is not valid.
    pub fn variables(&self, options: VariableOptions) -> LldbindResult<Option<ValueList>>
    {
        let raw = self.inner.handle.checked()?;
        let list = self.engine().frame_variables(raw, options);
        Ok(self.wrap_list(list))
    }

    /// Register sets of this frame, one value per set.
    ///
    /// ## Errors
    ///
    /// - `InvalidObject` if the frame is not valid
    /// - `UnsupportedApi` if the engine lacks `get_registers`
    pub fn registers(&self) -> LldbindResult<Option<ValueList>>
    {
        let raw = self.inner.handle.checked_with(Feature::Registers)?;
        let list = self.engine().frame_registers(raw);
        Ok(self.wrap_list(list))
    }

    fn wrap_value(&self, raw: Option<RawHandle>) -> Option<Value>
    {
        self.inner
            .handle
            .adopt(ObjectKind::Value, raw)
            .map(|handle| Value::new(handle, ValueOwner::Frame(self.clone())))
    }

    fn wrap_list(&self, raw: Option<RawHandle>) -> Option<ValueList>
    {
        self.inner
            .handle
            .adopt(ObjectKind::ValueList, raw)
            .map(|handle| ValueList::new(handle, ValueOwner::Frame(self.clone())))
    }

    // Symbols

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the frame is not valid.
    pub fn symbol_context(&self, scope: SymbolContextItem) -> LldbindResult<Option<SymbolContext>>
    {
        let raw = self.inner.handle.checked()?;
        let context = self.engine().frame_symbol_context(raw, scope);
        Ok(self
            .inner
            .handle
            .adopt(ObjectKind::SymbolContext, context)
            .map(SymbolContext::new))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the frame is not valid.
    pub fn module(&self) -> LldbindResult<Option<Module>>
    {
        let raw = self.inner.handle.checked()?;
        let module = self.engine().frame_module(raw);
        Ok(self.inner.handle.adopt(ObjectKind::Module, module).map(Module::new))
    }
}

impl fmt::Display for Frame
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "frame #{}: 0x{:016x}", self.frame_id(), self.pc())?;
        if let Some(name) = self.function_name() {
            write!(f, " {name}")?;
        }
        if let Some(location) = self.location() {
            write!(f, " at {location}")?;
        }
        Ok(())
    }
}

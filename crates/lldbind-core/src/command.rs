//! # Command Interpreter
//!
//! Runs textual debugger commands (`breakpoint list`, `frame variable`, ...)
//! and captures their output in a [`CommandReturnObject`].

use std::fmt;

use tracing::debug;

use crate::debugger::Debugger;
use crate::engine::ReturnText;
use crate::error::{LldbindError, LldbindResult};
use crate::handle::{Handle, ObjectKind};

/// A debugger's command interpreter
pub struct CommandInterpreter
{
    handle: Handle,
    debugger: Debugger,
}

impl CommandInterpreter
{
    pub(crate) fn new(handle: Handle, debugger: Debugger) -> Self
    {
        Self { handle, debugger }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool
    {
        self.handle.is_valid()
    }

    #[must_use]
    pub fn debugger(&self) -> &Debugger
    {
        &self.debugger
    }

    /// Run a command and return its captured result.
    ///
    /// A command the engine rejects is not an `Err`: inspect
    /// [`CommandReturnObject::succeeded`] and [`CommandReturnObject::error`].
    ///
    /// ## Errors
    ///
    /// - `InvalidObject` if the interpreter is not valid
    /// - `Engine` if no result object could be created
    pub fn handle_command(&self, command: &str, add_to_history: bool) -> LldbindResult<CommandReturnObject>
    {
        let raw = self.handle.checked()?;
        let result = self
            .handle
            .engine()
            .command_return_object_create()
            .ok_or_else(|| LldbindError::Engine("Failed to create command return object".to_string()))?;
        let result = self.handle.sibling(ObjectKind::CommandReturnObject, result);

        let raw_result = result.checked()?;
        let status = self
            .handle
            .engine()
            .interpreter_handle_command(raw, command, raw_result, add_to_history);
        debug!("Command '{}' returned status {}", command, status);
        Ok(CommandReturnObject { handle: result })
    }

    #[must_use]
    pub fn command_exists(&self, command: &str) -> bool
    {
        self.handle.read(false, |engine, raw| engine.interpreter_command_exists(raw, command))
    }

    #[must_use]
    pub fn alias_exists(&self, alias: &str) -> bool
    {
        self.handle.read(false, |engine, raw| engine.interpreter_alias_exists(raw, alias))
    }
}

/// Output, error text and success flag of one command
pub struct CommandReturnObject
{
    handle: Handle,
}

impl CommandReturnObject
{
    #[must_use]
    pub fn is_valid(&self) -> bool
    {
        self.handle.is_valid()
    }

    #[must_use]
    pub fn output(&self) -> Option<String>
    {
        self.handle.read(None, |engine, raw| engine.return_object_text(raw, ReturnText::Output))
    }

    #[must_use]
    pub fn error(&self) -> Option<String>
    {
        self.handle.read(None, |engine, raw| engine.return_object_text(raw, ReturnText::Error))
    }

    #[must_use]
    pub fn succeeded(&self) -> bool
    {
        self.handle.read(false, |engine, raw| engine.return_object_succeeded(raw))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the result is not valid.
    pub fn clear(&self) -> LldbindResult<()>
    {
        let raw = self.handle.checked()?;
        self.handle.engine().return_object_clear(raw);
        Ok(())
    }
}

impl fmt::Display for CommandReturnObject
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let text = if self.succeeded() { self.output() } else { self.error() };
        f.write_str(text.as_deref().unwrap_or_default())
    }
}

//! Loaded images and symbol contexts.

use std::fmt;

use crate::handle::{Handle, ObjectKind};

/// An executable or shared library loaded by a target
pub struct Module
{
    handle: Handle,
}

impl Module
{
    pub(crate) fn new(handle: Handle) -> Self
    {
        Self { handle }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool
    {
        self.handle.is_valid()
    }

    pub fn release(&self)
    {
        self.handle.release();
    }

    /// Path on the host.
    #[must_use]
    pub fn file_path(&self) -> Option<String>
    {
        self.handle.read(None, |engine, raw| engine.module_file_path(raw, false))
    }

    /// Path on the platform the debuggee runs on.
    #[must_use]
    pub fn platform_file_path(&self) -> Option<String>
    {
        self.handle.read(None, |engine, raw| engine.module_file_path(raw, true))
    }

    #[must_use]
    pub fn num_symbols(&self) -> u32
    {
        self.handle.read(0, |engine, raw| engine.module_num_symbols(raw))
    }
}

impl fmt::Display for Module
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.file_path().as_deref().unwrap_or("(unknown module)"))
    }
}

/// Symbol information resolved for a frame
pub struct SymbolContext
{
    handle: Handle,
}

impl SymbolContext
{
    pub(crate) fn new(handle: Handle) -> Self
    {
        Self { handle }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool
    {
        self.handle.is_valid()
    }

    #[must_use]
    pub fn module(&self) -> Option<Module>
    {
        let raw = self.handle.checked().ok()?;
        let module = self.handle.engine().symbol_context_module(raw);
        self.handle.adopt(ObjectKind::Module, module).map(Module::new)
    }

    #[must_use]
    pub fn function_name(&self) -> Option<String>
    {
        self.handle.read(None, |engine, raw| engine.symbol_context_function_name(raw))
    }
}

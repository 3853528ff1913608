//! # Values
//!
//! A [`Value`] is a typed runtime datum: a variable, an expression result, a
//! register or a member of another value. Each value records its logical
//! owner as a [`ValueOwner`]. The owner is only consulted to recover the
//! [`Target`] a new watchpoint belongs to; it never affects lifetimes beyond
//! keeping the parent wrapper alive.
//!
//! ## Example
//!
//! ```rust
//! use lldbind_core::engine::sim::{SimEngine, SimProgram};
//! use lldbind_core::{LaunchInfo, Lldb};
//!
//! let lldb = Lldb::simulated(SimEngine::new().with_program(SimProgram::demo("/bin/demo")));
//! let debugger = lldb.create_debugger()?;
//! let target = debugger.create_target("/bin/demo")?;
//! target.breakpoint_create_by_name("compute", None)?;
//! let process = target.launch(LaunchInfo::default())?;
//!
//! let thread = process.selected_thread()?.expect("stopped thread");
//! let frame = thread.frame_at_index(0)?.expect("innermost frame");
//! let value = frame.evaluate("x")?;
//! assert_eq!(value.signed(), 21);
//! # Ok::<(), lldbind_core::LldbindError>(())
//! ```

use std::fmt;
use std::rc::Rc;

use crate::engine::{Engine, ValueDerivation, ValueText};
use crate::error::{LldbindError, LldbindResult};
use crate::frame::Frame;
use crate::handle::{Handle, ObjectKind, RawHandle};
use crate::status::Status;
use crate::target::Target;
use crate::typeinfo::Type;
use crate::types::ValueType;
use crate::watchpoint::Watchpoint;

/// The object a value was obtained from
#[derive(Clone)]
pub enum ValueOwner
{
    Frame(Frame),
    Value(Value),
    Target(Target),
}

impl ValueOwner
{
    /// The target at the root of the ownership chain.
    #[must_use]
    pub fn target(&self) -> Option<Target>
    {
        match self {
            ValueOwner::Frame(frame) => frame.thread().process().target(),
            ValueOwner::Value(value) => value.owner().target(),
            ValueOwner::Target(target) => Some(target.clone()),
        }
    }
}

/// A typed runtime datum
#[derive(Clone)]
pub struct Value
{
    inner: Rc<ValueInner>,
}

struct ValueInner
{
    handle: Handle,
    owner: ValueOwner,
}

impl Value
{
    pub(crate) fn new(handle: Handle, owner: ValueOwner) -> Self
    {
        Self {
            inner: Rc::new(ValueInner { handle, owner }),
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
    pub fn owner(&self) -> &ValueOwner
    {
        &self.inner.owner
    }

    fn text(&self, text: ValueText) -> Option<String>
    {
        self.inner.handle.read(None, |engine, raw| engine.value_text(raw, text))
    }

    #[must_use]
    pub fn name(&self) -> Option<String>
    {
        self.text(ValueText::Name)
    }

    /// The engine's formatted value, e.g. `"42"` or `"0x00007ffe..."`.
    #[must_use]
    pub fn value(&self) -> Option<String>
    {
        self.text(ValueText::Value)
    }

    #[must_use]
    pub fn summary(&self) -> Option<String>
    {
        self.text(ValueText::Summary)
    }

    #[must_use]
    pub fn type_name(&self) -> Option<String>
    {
        self.text(ValueText::TypeName)
    }

    #[must_use]
    pub fn expression_path(&self) -> Option<String>
    {
        self.text(ValueText::ExpressionPath)
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the value is not valid.
    pub fn type_info(&self) -> LldbindResult<Option<Type>>
    {
        let raw = self.inner.handle.checked()?;
        let ty = self.engine().value_type(raw);
        Ok(self.inner.handle.adopt(ObjectKind::Type, ty).map(Type::new))
    }

    #[must_use]
    pub fn signed(&self) -> i64
    {
        self.inner.handle.read(0, |engine, raw| engine.value_as_signed(raw))
    }

    #[must_use]
    pub fn unsigned(&self) -> u64
    {
        self.inner.handle.read(0, |engine, raw| engine.value_as_unsigned(raw))
    }

    #[must_use]
    pub fn byte_size(&self) -> u64
    {
        self.inner.handle.read(0, |engine, raw| engine.value_byte_size(raw))
    }

    #[must_use]
    pub fn might_have_children(&self) -> bool
    {
        self.inner.handle.read(false, |engine, raw| engine.value_might_have_children(raw))
    }

    #[must_use]
    pub fn load_address(&self) -> u64
    {
        self.inner.handle.read(0, |engine, raw| engine.value_load_address(raw))
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType
    {
        self.inner
            .handle
            .read(ValueType::Invalid, |engine, raw| ValueType::from_raw(engine.value_value_type(raw)))
    }

    #[must_use]
    pub fn is_pointer_type(&self) -> bool
    {
        self.inner.handle.read(false, |engine, raw| engine.value_is_pointer_type(raw))
    }

    /// The value's error state as a [`Status`].
    ///
    /// ## Errors
    ///
    /// Returns `InvalidObject` if the value is not valid.
    pub fn error(&self) -> LldbindResult<Status>
    {
        let raw = self.inner.handle.checked()?;
        let mut status = Status::new();
        self.engine().value_error(raw, &mut status);
        Ok(status)
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the value is not valid.
    pub fn has_error(&self) -> LldbindResult<bool>
    {
        Ok(self.error()?.fail())
    }

    // Children

    #[must_use]
    pub fn num_children(&self) -> u32
    {
        self.inner.handle.read(0, |engine, raw| engine.value_num_children(raw))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the value is not valid.
    pub fn child_at_index(&self, index: u32) -> LldbindResult<Option<Value>>
    {
        let raw = self.inner.handle.checked()?;
        let child = self.engine().value_child_at_index(raw, index);
        Ok(self.wrap_child(child))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the value is not valid.
    pub fn child_member_with_name(&self, name: &str) -> LldbindResult<Option<Value>>
    {
        let raw = self.inner.handle.checked()?;
        let child = self.engine().value_child_member_with_name(raw, name);
        Ok(self.wrap_child(child))
    }

    #[must_use]
    pub fn children(&self) -> Vec<Value>
    {
        (0..self.num_children())
            .filter_map(|index| self.child_at_index(index).ok().flatten())
            .collect()
    }

    // Derived values

    fn derive(&self, derivation: ValueDerivation) -> LldbindResult<Option<Value>>
    {
        let raw = self.inner.handle.checked()?;
        let derived = self.engine().value_derive(raw, derivation);
        Ok(self.wrap_child(derived))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the value is not valid.
    pub fn dereference(&self) -> LldbindResult<Option<Value>>
    {
        self.derive(ValueDerivation::Dereference)
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the value is not valid.
    pub fn address_of(&self) -> LldbindResult<Option<Value>>
    {
        self.derive(ValueDerivation::AddressOf)
    }

    /// The value without synthetic child providers applied.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidObject` if the value is not valid.
    pub fn non_synthetic_value(&self) -> LldbindResult<Option<Value>>
    {
        self.derive(ValueDerivation::NonSynthetic)
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the value or the type is not valid.
    pub fn cast(&self, ty: &Type) -> LldbindResult<Option<Value>>
    {
        let raw = self.inner.handle.checked()?;
        let ty = ty.handle().checked()?;
        let cast = self.engine().value_cast(raw, ty);
        Ok(self.wrap_child(cast))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the value or the type is not valid.
    pub fn create_child_at_offset(&self, name: &str, ty: &Type, offset: u32) -> LldbindResult<Option<Value>>
    {
        let raw = self.inner.handle.checked()?;
        let ty = ty.handle().checked()?;
        let child = self.engine().value_create_child_at_offset(raw, name, ty, offset);
        Ok(self.wrap_child(child))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the value or the type is not valid.
    pub fn create_value_from_address(&self, name: &str, address: u64, ty: &Type) -> LldbindResult<Option<Value>>
    {
        let raw = self.inner.handle.checked()?;
        let ty = ty.handle().checked()?;
        let created = self.engine().value_create_from_address(raw, name, address, ty);
        Ok(self.wrap_child(created))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the value is not valid.
    pub fn create_value_from_expression(&self, name: &str, expression: &str) -> LldbindResult<Option<Value>>
    {
        let raw = self.inner.handle.checked()?;
        let created = self.engine().value_create_from_expression(raw, name, expression);
        Ok(self.wrap_child(created))
    }

    fn wrap_child(&self, raw: Option<RawHandle>) -> Option<Value>
    {
        self.inner
            .handle
            .adopt(ObjectKind::Value, raw)
            .map(|handle| Value::new(handle, ValueOwner::Value(self.clone())))
    }

    // Mutation

    /// Assign from a string such as `"42"`.
    ///
    /// ## Errors
    ///
    /// - `InvalidObject` if the value is not valid
    /// - `Engine` with the engine's message if the assignment is rejected
    pub fn set_value_from_str(&self, text: &str) -> LldbindResult<bool>
    {
        let raw = self.inner.handle.checked()?;
        let mut status = Status::new();
        let assigned = self.engine().value_set_from_str(raw, text, &mut status);
        status.raise_if_error()?;
        Ok(assigned)
    }

    /// Set a watchpoint on this value's storage.
    ///
    /// The watchpoint is attached to the target found through the owner
    /// chain and recorded in that target's bookkeeping.
    ///
    /// ## Errors
    ///
    /// - `InvalidObject` if the value is not valid
    /// - `Engine` if the engine rejects the watchpoint or no target owns the value
    pub fn watch(&self, resolve_location: bool, read: bool, write: bool) -> LldbindResult<Option<Watchpoint>>
    {
        let raw = self.inner.handle.checked()?;
        let mut status = Status::new();
        let watchpoint = self
            .engine()
            .value_watch(raw, resolve_location, read, write, &mut status);
        if let Err(err) = status.raise_if_error() {
            if let Some(stray) = watchpoint {
                self.engine().destroy(ObjectKind::Watchpoint, stray);
            }
            return Err(err);
        }

        let Some(handle) = self.inner.handle.adopt(ObjectKind::Watchpoint, watchpoint) else {
            return Ok(None);
        };
        let target = self
            .owner()
            .target()
            .ok_or_else(|| LldbindError::Engine("Could not find target from value hierarchy".to_string()))?;
        let watchpoint = Watchpoint::new(handle, target.clone());
        target.track_watchpoint(watchpoint.id());
        Ok(Some(watchpoint))
    }
}

impl fmt::Display for Value
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = self.name().unwrap_or_default();
        if let Some(summary) = self.summary() {
            write!(f, "{name} = {summary}")
        } else if let Some(value) = self.value() {
            write!(f, "{name} = {value}")
        } else {
            write!(f, "{name} ({})", self.type_name().unwrap_or_default())
        }
    }
}

impl fmt::Debug for Value
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Value")
            .field("name", &self.name())
            .field("type", &self.type_name())
            .field("value", &self.value())
            .finish()
    }
}

/// An ordered list of values, e.g. a frame's variables
pub struct ValueList
{
    handle: Handle,
    owner: ValueOwner,
}

impl ValueList
{
    pub(crate) fn new(handle: Handle, owner: ValueOwner) -> Self
    {
        Self { handle, owner }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool
    {
        self.handle.is_valid()
    }

    #[must_use]
    pub fn len(&self) -> u32
    {
        self.handle.read(0, |engine, raw| engine.value_list_size(raw))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the list is not valid.
    pub fn get(&self, index: u32) -> LldbindResult<Option<Value>>
    {
        let raw = self.handle.checked()?;
        let value = self.handle.engine().value_list_at_index(raw, index);
        Ok(self.wrap(value))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the list is not valid.
    pub fn first_by_name(&self, name: &str) -> LldbindResult<Option<Value>>
    {
        let raw = self.handle.checked()?;
        let value = self.handle.engine().value_list_first_by_name(raw, name);
        Ok(self.wrap(value))
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Value>
    {
        (0..self.len()).filter_map(|index| self.get(index).ok().flatten()).collect()
    }

    fn wrap(&self, raw: Option<RawHandle>) -> Option<Value>
    {
        self.handle
            .adopt(ObjectKind::Value, raw)
            .map(|handle| Value::new(handle, self.owner.clone()))
    }
}

//! Static type descriptions attached to values.

use std::fmt;

use crate::engine::{TypeCount, TypeDerivation, TypeTrait};
use crate::error::LldbindResult;
use crate::handle::{Handle, ObjectKind};
use crate::types::BasicType;

/// A type as the engine describes it
pub struct Type
{
    handle: Handle,
}

impl Type
{
    pub(crate) fn new(handle: Handle) -> Self
    {
        Self { handle }
    }

    pub(crate) fn handle(&self) -> &Handle
    {
        &self.handle
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

    #[must_use]
    pub fn name(&self) -> Option<String>
    {
        self.handle.read(None, |engine, raw| engine.type_name(raw, false))
    }

    /// Name as printed, with typedefs kept.
    #[must_use]
    pub fn display_name(&self) -> Option<String>
    {
        self.handle.read(None, |engine, raw| engine.type_name(raw, true))
    }

    fn count(&self, count: TypeCount) -> u64
    {
        self.handle.read(0, |engine, raw| engine.type_count(raw, count))
    }

    #[must_use]
    pub fn byte_size(&self) -> u64
    {
        self.count(TypeCount::ByteSize)
    }

    #[must_use]
    pub fn array_size(&self) -> u64
    {
        self.count(TypeCount::ArraySize)
    }

    #[must_use]
    pub fn num_fields(&self) -> u64
    {
        self.count(TypeCount::Fields)
    }

    #[must_use]
    pub fn num_direct_base_classes(&self) -> u64
    {
        self.count(TypeCount::DirectBaseClasses)
    }

    #[must_use]
    pub fn num_virtual_base_classes(&self) -> u64
    {
        self.count(TypeCount::VirtualBaseClasses)
    }

    fn has(&self, type_trait: TypeTrait) -> bool
    {
        self.handle.read(false, |engine, raw| engine.type_has_trait(raw, type_trait))
    }

    #[must_use]
    pub fn is_pointer(&self) -> bool
    {
        self.has(TypeTrait::Pointer)
    }

    #[must_use]
    pub fn is_reference(&self) -> bool
    {
        self.has(TypeTrait::Reference)
    }

    #[must_use]
    pub fn is_array(&self) -> bool
    {
        self.has(TypeTrait::Array)
    }

    #[must_use]
    pub fn is_vector(&self) -> bool
    {
        self.has(TypeTrait::Vector)
    }

    #[must_use]
    pub fn is_typedef(&self) -> bool
    {
        self.has(TypeTrait::Typedef)
    }

    #[must_use]
    pub fn is_function(&self) -> bool
    {
        self.has(TypeTrait::Function)
    }

    #[must_use]
    pub fn is_polymorphic_class(&self) -> bool
    {
        self.has(TypeTrait::PolymorphicClass)
    }

    fn derive(&self, derivation: TypeDerivation) -> LldbindResult<Option<Type>>
    {
        let raw = self.handle.checked()?;
        let derived = self.handle.engine().type_derive(raw, derivation);
        Ok(self.handle.adopt(ObjectKind::Type, derived).map(Type::new))
    }

    /// `T*` for this type `T`.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidObject` if the type is not valid.
    pub fn pointer_type(&self) -> LldbindResult<Option<Type>>
    {
        self.derive(TypeDerivation::Pointer)
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the type is not valid.
    pub fn pointee_type(&self) -> LldbindResult<Option<Type>>
    {
        self.derive(TypeDerivation::Pointee)
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the type is not valid.
    pub fn reference_type(&self) -> LldbindResult<Option<Type>>
    {
        self.derive(TypeDerivation::Reference)
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the type is not valid.
    pub fn dereferenced_type(&self) -> LldbindResult<Option<Type>>
    {
        self.derive(TypeDerivation::Dereferenced)
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the type is not valid.
    pub fn unqualified_type(&self) -> LldbindResult<Option<Type>>
    {
        self.derive(TypeDerivation::Unqualified)
    }

    /// The type with typedefs resolved.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidObject` if the type is not valid.
    pub fn canonical_type(&self) -> LldbindResult<Option<Type>>
    {
        self.derive(TypeDerivation::Canonical)
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the type is not valid.
    pub fn array_element_type(&self) -> LldbindResult<Option<Type>>
    {
        self.derive(TypeDerivation::ArrayElement)
    }

    #[must_use]
    pub fn basic_type(&self) -> BasicType
    {
        self.handle
            .read(BasicType::Invalid, |engine, raw| BasicType::from_raw(engine.type_basic_type(raw)))
    }
}

impl fmt::Display for Type
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.display_name().or_else(|| self.name()).as_deref().unwrap_or("(invalid type)"))
    }
}

//! Lazy and optional access to beans.
//!
//! An [ObjectProvider] defers bean lookup until an instance is actually needed, and allows
//! treating missing or ambiguous beans as absent values instead of errors.

use crate::error::BeansError;
use crate::instance::{downcast_bean, BeanInstanceAnyPtr, BeanInstancePtr};
use std::any::type_name;
use std::marker::PhantomData;

/// Lazy sequence of bean instances. Each instance is created when requested, so creation errors
/// are reported per element.
pub type BeanStream<'a, T> = Box<dyn Iterator<Item = Result<T, BeansError>> + 'a>;

pub type ObjectProviderPtr<'a, T> = Box<dyn ObjectProvider<T> + 'a>;

/// Factory returning a (possibly shared) object on demand.
pub trait ObjectFactory<T> {
    fn get_object(&self) -> Result<T, BeansError>;
}

/// [ObjectFactory] designed for injection points, allowing optional and unique access.
pub trait ObjectProvider<T>: ObjectFactory<T> {
    /// Returns an instance created with explicit construction arguments.
    fn get_object_with_args(&self, args: &[BeanInstanceAnyPtr]) -> Result<T, BeansError>;

    /// Returns an instance if available. Fails when multiple candidates exist without a primary
    /// one, or creation fails.
    fn get_if_available(&self) -> Result<Option<T>, BeansError>;

    fn get_if_available_or(&self, default_supplier: &dyn Fn() -> T) -> Result<T, BeansError> {
        Ok(self
            .get_if_available()?
            .unwrap_or_else(|| default_supplier()))
    }

    /// Consumes an instance if available.
    fn if_available(&self, consumer: &mut dyn FnMut(T)) -> Result<(), BeansError> {
        if let Some(instance) = self.get_if_available()? {
            consumer(instance);
        }

        Ok(())
    }

    /// Returns an instance if available and unique, i.e. a single candidate or a primary one.
    /// Fails only when creation fails.
    fn get_if_unique(&self) -> Result<Option<T>, BeansError>;

    fn get_if_unique_or(&self, default_supplier: &dyn Fn() -> T) -> Result<T, BeansError> {
        Ok(self.get_if_unique()?.unwrap_or_else(|| default_supplier()))
    }

    /// Consumes an instance if available and unique.
    fn if_unique(&self, consumer: &mut dyn FnMut(T)) -> Result<(), BeansError> {
        if let Some(instance) = self.get_if_unique()? {
            consumer(instance);
        }

        Ok(())
    }

    /// Returns all matching instances, without specific ordering guarantees.
    fn stream(&self) -> Result<BeanStream<'_, T>, BeansError> {
        Err(BeansError::UnsupportedOperation(
            "Multi element access not supported".to_string(),
        ))
    }

    /// Returns all matching instances, ordered by their definitions.
    fn ordered_stream(&self) -> Result<BeanStream<'_, T>, BeansError> {
        Err(BeansError::UnsupportedOperation(
            "Ordered element access not supported".to_string(),
        ))
    }
}

/// Strongly-typed view of a type-erased [ObjectProvider].
pub struct TypedObjectProvider<'a, T> {
    provider: ObjectProviderPtr<'a, BeanInstanceAnyPtr>,
    _phantom: PhantomData<fn() -> T>,
}

impl<'a, T: Send + Sync + 'static> TypedObjectProvider<'a, T> {
    pub fn new(provider: ObjectProviderPtr<'a, BeanInstanceAnyPtr>) -> Self {
        Self {
            provider,
            _phantom: PhantomData,
        }
    }

    fn cast(instance: BeanInstanceAnyPtr) -> Result<BeanInstancePtr<T>, BeansError> {
        downcast_bean(type_name::<T>(), instance)
    }
}

impl<'a, T: Send + Sync + 'static> ObjectFactory<BeanInstancePtr<T>>
    for TypedObjectProvider<'a, T>
{
    fn get_object(&self) -> Result<BeanInstancePtr<T>, BeansError> {
        self.provider.get_object().and_then(Self::cast)
    }
}

impl<'a, T: Send + Sync + 'static> ObjectProvider<BeanInstancePtr<T>>
    for TypedObjectProvider<'a, T>
{
    fn get_object_with_args(
        &self,
        args: &[BeanInstanceAnyPtr],
    ) -> Result<BeanInstancePtr<T>, BeansError> {
        self.provider.get_object_with_args(args).and_then(Self::cast)
    }

    fn get_if_available(&self) -> Result<Option<BeanInstancePtr<T>>, BeansError> {
        self.provider
            .get_if_available()?
            .map(Self::cast)
            .transpose()
    }

    fn get_if_unique(&self) -> Result<Option<BeanInstancePtr<T>>, BeansError> {
        self.provider.get_if_unique()?.map(Self::cast).transpose()
    }

    fn stream(&self) -> Result<BeanStream<'_, BeanInstancePtr<T>>, BeansError> {
        Ok(Box::new(
            self.provider
                .stream()?
                .map(|instance| instance.and_then(Self::cast)),
        ))
    }

    fn ordered_stream(&self) -> Result<BeanStream<'_, BeanInstancePtr<T>>, BeansError> {
        Ok(Box::new(
            self.provider
                .ordered_stream()?
                .map(|instance| instance.and_then(Self::cast)),
        ))
    }
}

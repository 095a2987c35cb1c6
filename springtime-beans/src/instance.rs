use crate::error::BeansError;
use std::any::{type_name, Any, TypeId};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type BeanInstancePtr<T> = Arc<T>;

pub type BeanInstanceAnyPtr = BeanInstancePtr<dyn Any + Send + Sync + 'static>;

/// Identity of a Rust type backing bean instances.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct RustType {
    id: TypeId,
    name: &'static str,
}

impl RustType {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Display for RustType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Casts a type-erased instance of the bean named `name` to a concrete type.
pub fn downcast_bean<T: Send + Sync + 'static>(
    name: &str,
    instance: BeanInstanceAnyPtr,
) -> Result<BeanInstancePtr<T>, BeansError> {
    instance
        .downcast::<T>()
        .map_err(|_| BeansError::BeanNotOfRequiredType {
            name: name.to_string(),
            required_type: type_name::<T>().to_string(),
            actual_type: "unknown".to_string(),
        })
}

//! Bean instances are contained in [Scope]s - containers which decide when to reuse or create an
//! instance. There's a shared one for singletons and a [PrototypeScope], which never reuses
//! anything, but custom ones can be registered in the factory as well.
//!
//! Note: scope resolution happens at bean instantiation time, so a [singleton](SINGLETON) bean
//! holding on to a [prototype](PROTOTYPE) dependency keeps that single dependency instance for as
//! long as the singleton lives.

use crate::definition::BeanDefinition;
use crate::instance::BeanInstanceAnyPtr;
use fxhash::FxHashMap;
#[cfg(test)]
use mockall::automock;

pub type ScopePtr = Box<dyn Scope + Send + Sync>;

/// Name of the [SingletonScope].
pub const SINGLETON: &str = "singleton";

/// Name of the [PrototypeScope].
pub const PROTOTYPE: &str = "prototype";

/// A scope containing bean instances. See module documentation for information on scopes.
#[cfg_attr(test, automock)]
pub trait Scope {
    /// Gets an instance requested for the given definition, if available in this scope.
    fn instance(&self, definition: &BeanDefinition) -> Option<BeanInstanceAnyPtr>;

    /// Stores given instance in the scope. The scope might not support storing instances and ignore
    /// it.
    fn store_instance(&mut self, definition: &BeanDefinition, instance: BeanInstanceAnyPtr);
}

/// Scope for instances shared between beans.
#[derive(Default)]
pub struct SingletonScope {
    instances: FxHashMap<String, BeanInstanceAnyPtr>,
}

impl Scope for SingletonScope {
    #[inline]
    fn instance(&self, definition: &BeanDefinition) -> Option<BeanInstanceAnyPtr> {
        self.instances.get(&definition.name).cloned()
    }

    #[inline]
    fn store_instance(&mut self, definition: &BeanDefinition, instance: BeanInstanceAnyPtr) {
        self.instances
            .entry(definition.name.clone())
            .or_insert(instance);
    }
}

/// A scope which creates a new instance on each request.
#[derive(Default, Copy, Clone, Eq, PartialEq)]
pub struct PrototypeScope;

impl Scope for PrototypeScope {
    #[inline]
    fn instance(&self, _definition: &BeanDefinition) -> Option<BeanInstanceAnyPtr> {
        None
    }

    #[inline]
    fn store_instance(&mut self, _definition: &BeanDefinition, _instance: BeanInstanceAnyPtr) {}
}

/// Factory for custom [Scope]s.
#[cfg_attr(test, automock)]
pub trait ScopeFactory {
    fn create_scope(&self) -> ScopePtr;
}

#[derive(Copy, Clone, Eq, PartialEq, Default)]
pub struct SingletonScopeFactory;

impl ScopeFactory for SingletonScopeFactory {
    fn create_scope(&self) -> ScopePtr {
        Box::<SingletonScope>::default()
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Default)]
pub struct PrototypeScopeFactory;

impl ScopeFactory for PrototypeScopeFactory {
    fn create_scope(&self) -> ScopePtr {
        Box::<PrototypeScope>::default()
    }
}

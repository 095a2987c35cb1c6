//! Functionality related to registering [BeanDefinition]s. Bean factories create instances based
//! on those definitions, which can be registered manually or statically, with the
//! [submit](internal::submit) macro:
//!
//! ```
//! use springtime_beans::definition::internal::{submit, BeanDefinitionRegisterer};
//! use springtime_beans::definition::BeanDefinition;
//! use springtime_beans::error::BeansError;
//! use springtime_beans::factory::BeanFactory;
//! use springtime_beans::instance::{BeanInstanceAnyPtr, BeanInstancePtr, RustType};
//! use springtime_core::class::Class;
//! use springtime_core::resolvable_type::ResolvableTypeFactory;
//!
//! struct Clock;
//!
//! fn create_clock(
//!     _factory: &dyn BeanFactory,
//!     _args: &[BeanInstanceAnyPtr],
//! ) -> Result<BeanInstanceAnyPtr, BeansError> {
//!     Ok(BeanInstancePtr::new(Clock) as BeanInstanceAnyPtr)
//! }
//!
//! fn clock_definition(types: &ResolvableTypeFactory) -> BeanDefinition {
//!     BeanDefinition::new(
//!         "clock",
//!         types.for_class(&Class::builder("app.Clock").build()),
//!         RustType::of::<Clock>(),
//!         create_clock,
//!     )
//! }
//!
//! submit! {
//!     BeanDefinitionRegisterer {
//!         register: clock_definition,
//!     }
//! }
//! ```

use crate::error::{BeanDefinitionRegistryError, BeansError};
use crate::factory::BeanFactory;
use crate::instance::{BeanInstanceAnyPtr, RustType};
use crate::scope::SINGLETON;
use derivative::Derivative;
use fxhash::FxHashMap;
use itertools::Itertools;
#[cfg(test)]
use mockall::automock;
use springtime_core::resolvable_type::{ResolvableType, ResolvableTypeFactory};
use tracing::debug;

/// Creates a bean instance, given the factory for resolving dependencies and explicit
/// construction arguments.
pub type BeanConstructor = fn(
    factory: &dyn BeanFactory,
    args: &[BeanInstanceAnyPtr],
) -> Result<BeanInstanceAnyPtr, BeansError>;

pub type BeanDefinitionRegistryPtr = Box<dyn BeanDefinitionRegistry + Send + Sync>;

/// Definition of a bean registered in a definition registry.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct BeanDefinition {
    /// Unique name of the bean.
    pub name: String,

    /// Alternative names, which can be used in place of [BeanDefinition::name].
    pub aliases: Vec<String>,

    /// Generic type of the bean, used when matching requested types.
    pub bean_type: ResolvableType,

    /// Rust type of created instances.
    pub rust_type: RustType,

    /// Name of the [Scope](crate::scope::Scope) holding instances.
    pub scope_name: String,

    /// With multiple candidates for a requested type, the primary one is selected.
    pub is_primary: bool,

    /// Position in ordered collections of beans; lower values come first and unordered beans come
    /// last.
    pub order: Option<i32>,

    #[derivative(Debug = "ignore")]
    pub constructor: BeanConstructor,
}

impl BeanDefinition {
    /// Creates a non-primary, unordered [singleton](SINGLETON) definition without aliases.
    pub fn new<T: ToString>(
        name: T,
        bean_type: ResolvableType,
        rust_type: RustType,
        constructor: BeanConstructor,
    ) -> Self {
        Self {
            name: name.to_string(),
            aliases: vec![],
            bean_type,
            rust_type,
            scope_name: SINGLETON.to_string(),
            is_primary: false,
            order: None,
            constructor,
        }
    }

    pub fn with_alias<T: ToString>(mut self, alias: T) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn with_scope<T: ToString>(mut self, scope_name: T) -> Self {
        self.scope_name = scope_name.to_string();
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }
}

/// A registry of bean definitions used by bean factories.
#[cfg_attr(test, automock)]
pub trait BeanDefinitionRegistry {
    /// Adds a new definition along with its aliases. Handling of duplicate names is
    /// registry-dependent.
    fn register_bean_definition(
        &mut self,
        definition: BeanDefinition,
    ) -> Result<(), BeanDefinitionRegistryError>;

    /// Adds an alternative name for a registered bean.
    fn register_alias(
        &mut self,
        name: &str,
        alias: &str,
    ) -> Result<(), BeanDefinitionRegistryError>;

    /// Returns a definition with given name or alias.
    fn bean_definition(&self, name: &str) -> Option<BeanDefinition>;

    /// Resolves an alias to the bean name. Bean names resolve to themselves.
    fn canonical_name(&self, name: &str) -> Option<String>;

    /// Returns all aliases registered for a bean name.
    fn aliases(&self, name: &str) -> Vec<String>;

    /// Returns all definitions in registration order.
    fn bean_definitions(&self) -> Vec<BeanDefinition>;

    /// Checks if there's a definition with given name or alias.
    fn contains_bean_definition(&self, name: &str) -> bool;
}

/// Registry of bean definitions initialized from statically registered definitions.
#[derive(Clone, Debug, Default)]
pub struct StaticBeanDefinitionRegistry {
    definitions: Vec<BeanDefinition>,
    names: FxHashMap<String, usize>,
    aliases: FxHashMap<String, String>,
    allow_definition_overriding: bool,
}

impl StaticBeanDefinitionRegistry {
    /// Creates a registry with all definitions submitted with
    /// [BeanDefinitionRegisterer](internal::BeanDefinitionRegisterer)s.
    pub fn new(
        allow_definition_overriding: bool,
        type_factory: &ResolvableTypeFactory,
    ) -> Result<Self, BeanDefinitionRegistryError> {
        let definitions = inventory::iter::<internal::BeanDefinitionRegisterer>
            .into_iter()
            .map(|registerer| (registerer.register)(type_factory))
            .collect_vec();

        let mut registry = Self::empty(allow_definition_overriding);
        for definition in definitions {
            registry.register_bean_definition(definition)?;
        }

        Ok(registry)
    }

    /// Creates a registry without any definitions.
    pub fn empty(allow_definition_overriding: bool) -> Self {
        Self {
            allow_definition_overriding,
            ..Default::default()
        }
    }

    fn try_register_alias(
        &mut self,
        name: &str,
        alias: &str,
    ) -> Result<(), BeanDefinitionRegistryError> {
        if alias == name {
            self.aliases.remove(alias);
            return Ok(());
        }

        let taken = self.names.contains_key(alias)
            || self
                .aliases
                .get(alias)
                .map(|existing| existing != name)
                .unwrap_or(false);

        if taken && !self.allow_definition_overriding {
            return Err(BeanDefinitionRegistryError::DuplicateAlias {
                alias: alias.to_string(),
                name: name.to_string(),
            });
        }

        self.aliases.insert(alias.to_string(), name.to_string());
        Ok(())
    }
}

impl BeanDefinitionRegistry for StaticBeanDefinitionRegistry {
    fn register_bean_definition(
        &mut self,
        definition: BeanDefinition,
    ) -> Result<(), BeanDefinitionRegistryError> {
        let name = definition.name.clone();
        let aliases = definition.aliases.clone();

        match self.names.get(&name) {
            Some(&index) => {
                if !self.allow_definition_overriding {
                    return Err(BeanDefinitionRegistryError::DuplicateBeanName(name));
                }

                debug!(name = %name, "Overriding bean definition.");
                self.definitions[index] = definition;
            }
            None => {
                if self.aliases.contains_key(&name) && !self.allow_definition_overriding {
                    return Err(BeanDefinitionRegistryError::DuplicateBeanName(name));
                }

                self.aliases.remove(&name);
                self.names.insert(name.clone(), self.definitions.len());
                self.definitions.push(definition);
            }
        }

        debug!(name = %name, "Registered bean definition.");

        for alias in &aliases {
            self.try_register_alias(&name, alias)?;
        }

        Ok(())
    }

    fn register_alias(
        &mut self,
        name: &str,
        alias: &str,
    ) -> Result<(), BeanDefinitionRegistryError> {
        let name = self
            .canonical_name(name)
            .ok_or_else(|| BeanDefinitionRegistryError::MissingAliasTarget {
                alias: alias.to_string(),
                name: name.to_string(),
            })?;

        self.try_register_alias(&name, alias)
    }

    fn bean_definition(&self, name: &str) -> Option<BeanDefinition> {
        self.canonical_name(name)
            .and_then(|name| self.names.get(&name))
            .and_then(|index| self.definitions.get(*index))
            .cloned()
    }

    fn canonical_name(&self, name: &str) -> Option<String> {
        if self.names.contains_key(name) {
            return Some(name.to_string());
        }

        self.aliases
            .get(name)
            .filter(|target| self.names.contains_key(target.as_str()))
            .cloned()
    }

    fn aliases(&self, name: &str) -> Vec<String> {
        self.aliases
            .iter()
            .filter(|(_, target)| target.as_str() == name)
            .map(|(alias, _)| alias.clone())
            .sorted()
            .collect()
    }

    #[inline]
    fn bean_definitions(&self) -> Vec<BeanDefinition> {
        self.definitions.clone()
    }

    #[inline]
    fn contains_bean_definition(&self, name: &str) -> bool {
        self.canonical_name(name).is_some()
    }
}

#[doc(hidden)]
pub mod internal {
    use crate::definition::BeanDefinition;
    use inventory::collect;
    pub use inventory::submit;
    use springtime_core::resolvable_type::ResolvableTypeFactory;

    pub struct BeanDefinitionRegisterer {
        pub register: fn(&ResolvableTypeFactory) -> BeanDefinition,
    }

    collect!(BeanDefinitionRegisterer);
}

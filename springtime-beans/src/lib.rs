//! Bean factory built on generics-aware type resolution.
//!
//! Beans are described by [BeanDefinition](definition::BeanDefinition)s: a name, optional
//! aliases, the generic [ResolvableType](springtime_core::resolvable_type::ResolvableType) of the
//! bean, the Rust type of created instances and a constructor function. Definitions are usually
//! registered statically and picked up by a
//! [StaticBeanDefinitionRegistry](definition::StaticBeanDefinitionRegistry) when the factory is
//! built.
//!
//! ### Lookup
//!
//! A [BeanFactory](factory::BeanFactory) retrieves beans by name or alias, or by type. Lookup by
//! type honors generics, so a bean of type `Repository<User>` does not satisfy a request for
//! `Repository<Order>`. When multiple beans match, the one marked as primary wins.
//! [TypedBeanFactory](factory::TypedBeanFactory) adds strongly-typed access.
//!
//! Optional, lazy and multi-bean access goes through an
//! [ObjectProvider](object_provider::ObjectProvider).
//!
//! ### Scopes
//!
//! Instances are stored in [scopes](scope), the default being a shared singleton scope.
//! Prototype beans are created anew on every request, and custom scopes can be registered when
//! building the factory.

pub mod config;
pub mod definition;
pub mod error;
pub mod factory;
pub mod instance;
pub mod object_provider;
pub mod scope;

pub use error::BeansError;

//! Core type machinery for the springtime bean factory.
//!
//! Rust has no runtime reflection over generic types, so this crate models the reflective type
//! graph explicitly: [Class](class::Class) descriptors with their members and the
//! [Type](types::Type) shapes built on top of them (parameterized types, type variables,
//! wildcards, generic arrays). On top of the model sits
//! [ResolvableType](resolvable_type::ResolvableType), which resolves generic types down to raw
//! classes, walks type hierarchies and matches types against each other.
//!
//! Type graphs can be made persistable with the
//! [SerializableTypeWrapper](serializable_type_wrapper::SerializableTypeWrapper), which replaces
//! composite types with proxies holding only a re-derivable [TypeProvider](type_provider::TypeProvider).
//!
//! ### Configuration
//!
//! Caching behavior is driven by [CoreConfig](config::CoreConfig), which can be read from the
//! environment.

pub mod assert;
pub mod class;
pub mod config;
mod error;
pub mod method_parameter;
pub mod parameter_name_discoverer;
pub mod registry;
pub mod resolvable_type;
pub mod serializable_type_wrapper;
pub mod type_provider;
pub mod types;

pub use error::{AssertionError, TypeError};

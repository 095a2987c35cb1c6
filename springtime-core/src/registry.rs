//! Registry of known classes, used to turn persisted types back into live ones.

use crate::class::Class;
use crate::error::TypeError;
use crate::serializable_type_wrapper::{TypeProxy, TypeShape};
use crate::types::{GenericDeclaration, Type, TypeSchema};
use fxhash::FxHashMap;
use std::sync::Weak;
use tracing::debug;

/// Name to [Class] mapping. The default registry knows the root, string and void classes.
#[derive(Clone, Debug)]
pub struct TypeRegistry {
    classes: FxHashMap<String, Class>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        let mut registry = Self {
            classes: FxHashMap::default(),
        };

        registry.register(Class::object());
        registry.register(Class::string());
        registry.register(Class::void());
        registry
    }
}

impl TypeRegistry {
    /// Registers a class, replacing any previous class with the same name.
    pub fn register(&mut self, class: Class) {
        debug!(class = class.name(), "Registering class.");
        self.classes.insert(class.name().to_string(), class);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Looks up a class by name. Array class names (`Component[]`) are synthesized from their
    /// registered component class.
    pub fn class(&self, name: &str) -> Result<Class, TypeError> {
        if let Some(class) = self.classes.get(name) {
            return Ok(class.clone());
        }

        match name.strip_suffix("[]") {
            Some(component) => self
                .class(component)
                .map(|component| Class::array_of(&component))
                .map_err(|_| TypeError::ClassNotFound(name.to_string())),
            None => Err(TypeError::ClassNotFound(name.to_string())),
        }
    }

    /// Rebuilds a live type from its persisted form.
    ///
    /// Variables are looked up among the type parameters of their declaring class or method.
    /// Persisted providers are resolved and, for composite types, wrapped in a fresh proxy which
    /// is not tied to any
    /// [SerializableTypeWrapper](crate::serializable_type_wrapper::SerializableTypeWrapper) cache.
    pub fn resolve_type(&self, schema: &TypeSchema) -> Result<Type, TypeError> {
        match schema {
            TypeSchema::Class(name) => self.class(name).map(Type::Class),
            TypeSchema::Parameterized {
                raw,
                owner,
                arguments,
            } => {
                let raw = self.class(raw)?;
                let arguments = arguments
                    .iter()
                    .map(|argument| self.resolve_type(argument))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(match owner {
                    Some(owner) => {
                        Type::parameterized_with_owner(self.resolve_type(owner)?, raw, arguments)
                    }
                    None => Type::parameterized(raw, arguments),
                })
            }
            TypeSchema::Variable { name, declaration } => self.resolve_variable(name, declaration),
            TypeSchema::Wildcard { upper, lower } => {
                let upper = upper
                    .iter()
                    .map(|bound| self.resolve_type(bound))
                    .collect::<Result<Vec<_>, _>>()?;
                let lower = lower
                    .iter()
                    .map(|bound| self.resolve_type(bound))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(Type::wildcard_with_bounds(upper, lower))
            }
            TypeSchema::GenericArray(component) => {
                self.resolve_type(component).map(Type::generic_array)
            }
            TypeSchema::Provided(persisted) => {
                let provider = persisted.resolve(self)?;
                let provided = provider.get_type().unwrap_or(Type::Empty);

                Ok(match TypeShape::of(&provided) {
                    Some(shape) => Type::Proxy(TypeProxy::new(provider, shape, Weak::new())),
                    None => provided,
                })
            }
            TypeSchema::Empty => Ok(Type::Empty),
        }
    }

    fn resolve_variable(
        &self,
        name: &str,
        declaration: &GenericDeclaration,
    ) -> Result<Type, TypeError> {
        let class_name = declaration.class_name();
        let class = self.class(class_name).map_err(|error| TypeError::StructureNotFound {
            declaring_class: class_name.to_string(),
            member: name.to_string(),
            source: Some(Box::new(error)),
        })?;

        let variable = match declaration {
            GenericDeclaration::Class(_) => class
                .type_parameters()
                .iter()
                .find(|variable| variable.name() == name)
                .cloned(),
            GenericDeclaration::Method { method, .. } => class
                .declared_methods()
                .iter()
                .filter(|candidate| candidate.name() == method)
                .flat_map(|candidate| candidate.type_parameters().to_vec())
                .find(|variable| variable.name() == name),
        };

        variable
            .map(Type::Variable)
            .ok_or_else(|| TypeError::StructureNotFound {
                declaring_class: class_name.to_string(),
                member: match declaration {
                    GenericDeclaration::Method { method, .. } => format!("{method}<{name}>"),
                    GenericDeclaration::Class(_) => format!("<{name}>"),
                },
                source: None,
            })
    }
}

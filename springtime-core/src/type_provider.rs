//! Providers of types which can be re-derived after being persisted.
//!
//! A [TypeProvider] yields a type on demand and describes how to find it again: instead of holding
//! on to a live type, its [ProviderDescriptor] records the declaring class, member name and
//! parameter index. A persisted [SerializedTypeProvider] is turned back into a live provider by
//! resolving it against a [TypeRegistry].

use crate::class::Field;
use crate::error::TypeError;
use crate::method_parameter::{Executable, MethodParameter};
use crate::registry::TypeRegistry;
use crate::types::{Type, TypeAccessor};
use derivative::Derivative;
use derive_more::Constructor;
#[cfg(test)]
use mockall::automock;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Version of the persisted provider format produced by this crate.
pub const SCHEMA_VERSION: u32 = 1;

pub type TypeProviderPtr = Arc<dyn TypeProvider + Send + Sync>;

/// The program element a provided type originates from.
#[derive(Clone, PartialEq, Debug)]
pub enum TypeSource {
    Field(Field),
    MethodParameter(MethodParameter),
}

/// Source of a type which can be re-derived from its [ProviderDescriptor].
#[cfg_attr(test, automock)]
pub trait TypeProvider {
    /// Returns the provided type, if available.
    fn get_type(&self) -> Option<Type>;

    /// Returns the element the type originates from, for diagnostics.
    fn source(&self) -> Option<TypeSource> {
        None
    }

    /// Describes how to obtain this provider again.
    fn descriptor(&self) -> ProviderDescriptor;
}

/// Persistable recipe for re-creating a [TypeProvider].
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderDescriptor {
    Field {
        declaring_class: String,
        field_name: String,
    },
    /// A method (when `method_name` is present) or constructor parameter; index `-1` denotes the
    /// method return type.
    MethodParameter {
        declaring_class: String,
        method_name: Option<String>,
        parameter_types: Vec<String>,
        parameter_index: i32,
    },
    /// Result of invoking an accessor on the type of another provider.
    MethodInvoke {
        provider: Box<ProviderDescriptor>,
        accessor: TypeAccessor,
        index: Option<usize>,
    },
}

fn structure_not_found(
    declaring_class: &str,
    member: String,
    source: Option<TypeError>,
) -> TypeError {
    TypeError::StructureNotFound {
        declaring_class: declaring_class.to_string(),
        member,
        source: source.map(Box::new),
    }
}

impl ProviderDescriptor {
    /// Re-creates a live provider by looking up the described members in the registry.
    pub fn resolve(&self, registry: &TypeRegistry) -> Result<TypeProviderPtr, TypeError> {
        match self {
            ProviderDescriptor::Field {
                declaring_class,
                field_name,
            } => {
                let class = registry.class(declaring_class).map_err(|error| {
                    structure_not_found(declaring_class, field_name.clone(), Some(error))
                })?;

                let field = class.declared_field(field_name).ok_or_else(|| {
                    structure_not_found(declaring_class, field_name.clone(), None)
                })?;

                Ok(Arc::new(FieldTypeProvider::new(field)))
            }
            ProviderDescriptor::MethodParameter {
                declaring_class,
                method_name,
                parameter_types,
                parameter_index,
            } => {
                let member = format!(
                    "{}({})",
                    method_name.as_deref().unwrap_or("<init>"),
                    parameter_types.join(", ")
                );

                let class = registry.class(declaring_class).map_err(|error| {
                    structure_not_found(declaring_class, member.clone(), Some(error))
                })?;

                let executable = match method_name {
                    Some(method_name) => class
                        .declared_method(method_name, parameter_types.as_slice())
                        .map(Executable::Method),
                    None => class
                        .declared_constructor(parameter_types.as_slice())
                        .map(Executable::Constructor),
                }
                .ok_or_else(|| structure_not_found(declaring_class, member, None))?;

                let method_parameter = MethodParameter::new(executable, *parameter_index)?;
                Ok(Arc::new(MethodParameterTypeProvider::new(method_parameter)))
            }
            ProviderDescriptor::MethodInvoke {
                provider,
                accessor,
                index,
            } => {
                let provider = provider.resolve(registry)?;
                Ok(Arc::new(MethodInvokeTypeProvider::new(
                    provider, *accessor, *index,
                )))
            }
        }
    }
}

/// Versioned, persistable form of a [TypeProvider].
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct SerializedTypeProvider {
    pub version: u32,
    pub provider: ProviderDescriptor,
}

impl SerializedTypeProvider {
    /// Wraps a descriptor with the current [SCHEMA_VERSION].
    pub fn new(provider: ProviderDescriptor) -> Self {
        Self {
            version: SCHEMA_VERSION,
            provider,
        }
    }

    /// Re-creates a live provider, rejecting unknown schema versions.
    pub fn resolve(&self, registry: &TypeRegistry) -> Result<TypeProviderPtr, TypeError> {
        if self.version != SCHEMA_VERSION {
            return Err(TypeError::UnsupportedSchemaVersion {
                found: self.version,
                supported: SCHEMA_VERSION,
            });
        }

        self.provider.resolve(registry)
    }
}

/// Provides the generic type of a field.
#[derive(Clone, Debug, Constructor)]
pub struct FieldTypeProvider {
    field: Field,
}

impl TypeProvider for FieldTypeProvider {
    fn get_type(&self) -> Option<Type> {
        Some(self.field.generic_type().clone())
    }

    fn source(&self) -> Option<TypeSource> {
        Some(TypeSource::Field(self.field.clone()))
    }

    fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor::Field {
            declaring_class: self.field.declaring_class().name().to_string(),
            field_name: self.field.name().to_string(),
        }
    }
}

/// Provides the generic type of a method or constructor parameter.
#[derive(Clone, Debug, Constructor)]
pub struct MethodParameterTypeProvider {
    method_parameter: MethodParameter,
}

impl TypeProvider for MethodParameterTypeProvider {
    fn get_type(&self) -> Option<Type> {
        Some(self.method_parameter.generic_parameter_type())
    }

    fn source(&self) -> Option<TypeSource> {
        Some(TypeSource::MethodParameter(self.method_parameter.clone()))
    }

    fn descriptor(&self) -> ProviderDescriptor {
        let executable = self.method_parameter.executable();
        ProviderDescriptor::MethodParameter {
            declaring_class: self.method_parameter.declaring_class().name().to_string(),
            method_name: self
                .method_parameter
                .method()
                .map(|method| method.name().to_string()),
            parameter_types: executable
                .parameter_types()
                .iter()
                .map(|class| class.name().to_string())
                .collect(),
            parameter_index: self.method_parameter.parameter_index(),
        }
    }
}

/// Provides a type obtained by invoking an accessor on the type of another provider, picking the
/// element at `index` for list-valued accessors. The result is computed once and reused, since the
/// underlying types never change.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct MethodInvokeTypeProvider {
    #[derivative(Debug = "ignore")]
    provider: TypeProviderPtr,
    accessor: TypeAccessor,
    index: Option<usize>,
    result: OnceCell<Option<Type>>,
}

impl MethodInvokeTypeProvider {
    pub fn new(provider: TypeProviderPtr, accessor: TypeAccessor, index: Option<usize>) -> Self {
        Self {
            provider,
            accessor,
            index,
            result: OnceCell::new(),
        }
    }
}

impl TypeProvider for MethodInvokeTypeProvider {
    fn get_type(&self) -> Option<Type> {
        self.result
            .get_or_init(|| {
                self.provider
                    .get_type()
                    .and_then(|ty| self.accessor.apply(&ty, self.index))
            })
            .clone()
    }

    fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor::MethodInvoke {
            provider: Box::new(self.provider.descriptor()),
            accessor: self.accessor,
            index: self.index,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::class::{Class, MethodDefinition};
    use crate::error::TypeError;
    use crate::method_parameter::MethodParameter;
    use crate::registry::TypeRegistry;
    use crate::type_provider::{
        FieldTypeProvider, MethodInvokeTypeProvider, MethodParameterTypeProvider,
        MockTypeProvider, ProviderDescriptor, SerializedTypeProvider, TypeProvider,
        TypeProviderPtr, TypeSource, SCHEMA_VERSION,
    };
    use crate::types::{Type, TypeAccessor};
    use std::sync::Arc;

    fn create_classes() -> (Class, Class) {
        let list = Class::builder("java.util.List")
            .interface()
            .type_parameter("E")
            .build();
        let list_of_strings = Type::parameterized(list.clone(), vec![Type::class(Class::string())]);

        let service = Class::builder("test.Service")
            .field("names", list_of_strings.clone())
            .method(MethodDefinition::new("set_names").parameter(list_of_strings))
            .build();

        (list, service)
    }

    fn create_registry(classes: &[Class]) -> TypeRegistry {
        let mut registry = TypeRegistry::default();
        for class in classes {
            registry.register(class.clone());
        }
        registry
    }

    #[test]
    fn should_provide_field_type() {
        let (list, service) = create_classes();
        let field = service.declared_field("names").unwrap();
        let provider = FieldTypeProvider::new(field.clone());

        assert_eq!(provider.get_type().unwrap().erasure(), list);
        assert_eq!(provider.source(), Some(TypeSource::Field(field)));
        assert_eq!(
            provider.descriptor(),
            ProviderDescriptor::Field {
                declaring_class: "test.Service".to_string(),
                field_name: "names".to_string(),
            }
        );
    }

    #[test]
    fn should_describe_method_parameter() {
        let (_, service) = create_classes();
        let method = service.method_named("set_names").unwrap();
        let provider =
            MethodParameterTypeProvider::new(MethodParameter::for_method(method, 0).unwrap());

        assert_eq!(
            provider.descriptor(),
            ProviderDescriptor::MethodParameter {
                declaring_class: "test.Service".to_string(),
                method_name: Some("set_names".to_string()),
                parameter_types: vec!["java.util.List".to_string()],
                parameter_index: 0,
            }
        );
    }

    #[test]
    fn should_invoke_accessor_once() {
        let mut parent = MockTypeProvider::new();
        parent.expect_get_type().times(1).returning(|| {
            Some(Type::parameterized(
                Class::builder("java.util.List").build(),
                vec![Type::class(Class::string())],
            ))
        });

        let provider = MethodInvokeTypeProvider::new(
            Arc::new(parent) as TypeProviderPtr,
            TypeAccessor::ActualTypeArguments,
            Some(0),
        );

        assert_eq!(provider.get_type(), Some(Type::class(Class::string())));
        assert_eq!(provider.get_type(), Some(Type::class(Class::string())));
        assert_eq!(provider.source(), None);
    }

    #[test]
    fn should_resolve_persisted_providers() {
        let (list, service) = create_classes();
        let registry = create_registry(&[list, service.clone()]);

        let field = service.declared_field("names").unwrap();
        let nested = MethodInvokeTypeProvider::new(
            Arc::new(FieldTypeProvider::new(field)),
            TypeAccessor::ActualTypeArguments,
            Some(0),
        );

        let restored = SerializedTypeProvider::new(nested.descriptor())
            .resolve(&registry)
            .unwrap();
        assert_eq!(restored.get_type(), Some(Type::class(Class::string())));

        let method = service.method_named("set_names").unwrap();
        let parameter =
            MethodParameterTypeProvider::new(MethodParameter::for_method(method, 0).unwrap());
        let restored = SerializedTypeProvider::new(parameter.descriptor())
            .resolve(&registry)
            .unwrap();
        assert_eq!(restored.get_type(), parameter.get_type());
    }

    #[test]
    fn should_report_missing_structure() {
        let (list, service) = create_classes();
        let registry = create_registry(&[list]);

        let descriptor = ProviderDescriptor::Field {
            declaring_class: service.name().to_string(),
            field_name: "names".to_string(),
        };

        assert!(matches!(
            SerializedTypeProvider::new(descriptor).resolve(&registry).err().unwrap(),
            TypeError::StructureNotFound { source: Some(_), .. }
        ));

        let registry = create_registry(&[service.clone()]);
        let descriptor = ProviderDescriptor::Field {
            declaring_class: service.name().to_string(),
            field_name: "renamed".to_string(),
        };

        assert_eq!(
            descriptor.resolve(&registry).err().unwrap(),
            TypeError::StructureNotFound {
                declaring_class: "test.Service".to_string(),
                member: "renamed".to_string(),
                source: None,
            }
        );
    }

    #[test]
    fn should_reject_unknown_schema_version() {
        let persisted = SerializedTypeProvider {
            version: SCHEMA_VERSION + 1,
            provider: ProviderDescriptor::Field {
                declaring_class: "test.Service".to_string(),
                field_name: "names".to_string(),
            },
        };

        assert_eq!(
            persisted.resolve(&TypeRegistry::default()).err().unwrap(),
            TypeError::UnsupportedSchemaVersion {
                found: SCHEMA_VERSION + 1,
                supported: SCHEMA_VERSION,
            }
        );
    }
}

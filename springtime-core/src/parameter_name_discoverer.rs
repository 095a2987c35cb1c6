//! Discovery of method and constructor parameter names.

use crate::class::{Constructor, Method};
#[cfg(test)]
use mockall::automock;
use std::sync::Arc;

/// Name of the implicit enclosing instance parameter of inner class constructors.
pub const ENCLOSING_INSTANCE_PARAMETER: &str = "this$0";

pub type ParameterNameDiscovererPtr = Arc<dyn ParameterNameDiscoverer + Send + Sync>;

/// Strategy for discovering parameter names. Returns `None` when names cannot be determined.
#[cfg_attr(test, automock)]
pub trait ParameterNameDiscoverer {
    fn method_parameter_names(&self, method: &Method) -> Option<Vec<String>>;

    fn constructor_parameter_names(&self, constructor: &Constructor) -> Option<Vec<String>>;
}

/// Reads names declared in class descriptors. Inner class constructors get the implicit enclosing
/// instance parameter prepended, if it's missing from the declared names.
#[derive(Clone, Copy, Default, Debug)]
pub struct DescriptorParameterNameDiscoverer;

impl ParameterNameDiscoverer for DescriptorParameterNameDiscoverer {
    fn method_parameter_names(&self, method: &Method) -> Option<Vec<String>> {
        method.parameter_names().map(|names| names.to_vec())
    }

    fn constructor_parameter_names(&self, constructor: &Constructor) -> Option<Vec<String>> {
        let names = constructor.parameter_names()?;

        if constructor.declaring_class().is_inner_class()
            && names.len() + 1 == constructor.parameter_count()
        {
            Some(
                std::iter::once(ENCLOSING_INSTANCE_PARAMETER.to_string())
                    .chain(names.iter().cloned())
                    .collect(),
            )
        } else {
            Some(names.to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::class::{Class, ConstructorDefinition, MethodDefinition};
    use crate::parameter_name_discoverer::{
        DescriptorParameterNameDiscoverer, ParameterNameDiscoverer, ENCLOSING_INSTANCE_PARAMETER,
    };
    use crate::types::Type;

    #[test]
    fn should_read_declared_names() {
        let class = Class::builder("test.Service")
            .method(
                MethodDefinition::new("rename")
                    .parameter(Type::class(Class::string()))
                    .parameter_names(["name"]),
            )
            .method(MethodDefinition::new("anonymous").parameter(Type::class(Class::string())))
            .build();

        let discoverer = DescriptorParameterNameDiscoverer;
        assert_eq!(
            discoverer.method_parameter_names(&class.method_named("rename").unwrap()),
            Some(vec!["name".to_string()])
        );
        assert_eq!(
            discoverer.method_parameter_names(&class.method_named("anonymous").unwrap()),
            None
        );
    }

    #[test]
    fn should_prepend_enclosing_instance() {
        let outer = Class::builder("test.Outer").build();
        let inner = Class::builder("test.Outer$Inner")
            .member_of(&outer, false)
            .constructor(
                ConstructorDefinition::new()
                    .parameter(Type::class(Class::string()))
                    .parameter_names(["value"]),
            )
            .build();

        assert_eq!(
            DescriptorParameterNameDiscoverer
                .constructor_parameter_names(&inner.declared_constructors()[0]),
            Some(vec![
                ENCLOSING_INSTANCE_PARAMETER.to_string(),
                "value".to_string()
            ])
        );
    }
}

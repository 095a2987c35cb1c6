//! Descriptor of a single method or constructor parameter, including nested generic levels.
//!
//! A [MethodParameter] points at a parameter of an [Executable] by index, with `-1` denoting the
//! return type of a method. Nesting levels allow describing types inside the parameter type: level
//! 1 is the parameter type itself, level 2 one of its generic arguments (the last one by default,
//! or the one given by [MethodParameter::nested]) and so on.

use crate::assert;
use crate::class::{Class, Constructor, Method};
use crate::error::AssertionError;
use crate::parameter_name_discoverer::ParameterNameDiscovererPtr;
use crate::types::Type;
use derivative::Derivative;
use fxhash::FxHashMap;
use once_cell::sync::OnceCell;

/// A method or a constructor.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Executable {
    Method(Method),
    Constructor(Constructor),
}

impl Executable {
    pub fn declaring_class(&self) -> &Class {
        match self {
            Executable::Method(method) => method.declaring_class(),
            Executable::Constructor(constructor) => constructor.declaring_class(),
        }
    }

    /// Method name, or `<init>` for constructors.
    pub fn name(&self) -> &str {
        match self {
            Executable::Method(method) => method.name(),
            Executable::Constructor(_) => "<init>",
        }
    }

    pub fn parameter_count(&self) -> usize {
        match self {
            Executable::Method(method) => method.parameter_count(),
            Executable::Constructor(constructor) => constructor.parameter_count(),
        }
    }

    pub fn parameter_types(&self) -> &[Class] {
        match self {
            Executable::Method(method) => method.parameter_types(),
            Executable::Constructor(constructor) => constructor.parameter_types(),
        }
    }

    pub fn generic_parameter_types(&self) -> &[Type] {
        match self {
            Executable::Method(method) => method.generic_parameter_types(),
            Executable::Constructor(constructor) => constructor.generic_parameter_types(),
        }
    }
}

/// See module documentation for details.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct MethodParameter {
    executable: Executable,
    parameter_index: i32,
    nesting_level: usize,
    type_indexes_per_level: FxHashMap<usize, usize>,
    containing_class: Option<Class>,
    parameter_type: OnceCell<Class>,
    generic_parameter_type: OnceCell<Type>,
    #[derivative(Debug = "ignore")]
    parameter_name_discoverer: Option<ParameterNameDiscovererPtr>,
    parameter_name: OnceCell<Option<String>>,
}

fn validate_index(executable: &Executable, parameter_index: i32) -> Result<i32, AssertionError> {
    let count = executable.parameter_count() as i32;
    let min = match executable {
        Executable::Method(_) => -1,
        Executable::Constructor(_) => 0,
    };

    assert::is_true(
        (min..count).contains(&parameter_index),
        format!(
            "Parameter index needs to be between {} and {}",
            min,
            count - 1
        ),
    )?;

    Ok(parameter_index)
}

impl MethodParameter {
    /// Creates a parameter at nesting level 1. Valid indexes range from `-1` (the return type of
    /// methods only) to the parameter count minus one.
    pub fn new(executable: Executable, parameter_index: i32) -> Result<Self, AssertionError> {
        let parameter_index = validate_index(&executable, parameter_index)?;
        Ok(Self::create(executable, parameter_index))
    }

    fn create(executable: Executable, parameter_index: i32) -> Self {
        Self {
            executable,
            parameter_index,
            nesting_level: 1,
            type_indexes_per_level: FxHashMap::default(),
            containing_class: None,
            parameter_type: OnceCell::new(),
            generic_parameter_type: OnceCell::new(),
            parameter_name_discoverer: None,
            parameter_name: OnceCell::new(),
        }
    }

    #[inline]
    pub fn for_method(method: Method, parameter_index: i32) -> Result<Self, AssertionError> {
        Self::new(Executable::Method(method), parameter_index)
    }

    /// Describes the return type of a method.
    pub fn for_return_type(method: Method) -> Self {
        Self::create(Executable::Method(method), -1)
    }

    #[inline]
    pub fn for_constructor(
        constructor: Constructor,
        parameter_index: i32,
    ) -> Result<Self, AssertionError> {
        Self::new(Executable::Constructor(constructor), parameter_index)
    }

    /// Returns a copy of this parameter at the given nesting level.
    pub fn with_nesting_level(&self, nesting_level: usize) -> Result<Self, AssertionError> {
        assert::is_true(nesting_level >= 1, "Nesting level needs to be at least 1")?;

        let mut result = self.clone();
        result.nesting_level = nesting_level;
        Ok(result)
    }

    /// Returns a copy of this parameter one nesting level deeper, optionally selecting the generic
    /// argument at `type_index` on the new level.
    pub fn nested(&self, type_index: Option<usize>) -> Self {
        let mut result = self.clone();
        result.nesting_level += 1;
        match type_index {
            Some(type_index) => {
                result
                    .type_indexes_per_level
                    .insert(result.nesting_level, type_index);
            }
            None => {
                result.type_indexes_per_level.remove(&result.nesting_level);
            }
        }

        result
    }

    #[inline]
    pub fn nesting_level(&self) -> usize {
        self.nesting_level
    }

    /// Returns the generic argument index selected for the given nesting level.
    pub fn type_index_for_level(&self, nesting_level: usize) -> Option<usize> {
        self.type_indexes_per_level.get(&nesting_level).copied()
    }

    #[inline]
    pub fn type_indexes_per_level(&self) -> &FxHashMap<usize, usize> {
        &self.type_indexes_per_level
    }

    #[inline]
    pub fn type_index_for_current_level(&self) -> Option<usize> {
        self.type_index_for_level(self.nesting_level)
    }

    /// Returns a copy of this parameter as seen from the given (possibly more specific) class.
    pub fn with_containing_class(&self, containing_class: Class) -> Self {
        let mut result = self.clone();
        result.containing_class = Some(containing_class);
        result
    }

    /// Returns the class this parameter is seen from, defaulting to the declaring class.
    pub fn containing_class(&self) -> &Class {
        self.containing_class
            .as_ref()
            .unwrap_or_else(|| self.executable.declaring_class())
    }

    #[inline]
    pub fn declaring_class(&self) -> &Class {
        self.executable.declaring_class()
    }

    pub fn method(&self) -> Option<&Method> {
        match &self.executable {
            Executable::Method(method) => Some(method),
            Executable::Constructor(_) => None,
        }
    }

    pub fn constructor(&self) -> Option<&Constructor> {
        match &self.executable {
            Executable::Constructor(constructor) => Some(constructor),
            Executable::Method(_) => None,
        }
    }

    #[inline]
    pub fn executable(&self) -> &Executable {
        &self.executable
    }

    /// Index of the parameter, `-1` for the method return type.
    #[inline]
    pub fn parameter_index(&self) -> i32 {
        self.parameter_index
    }

    /// Returns the generic type of the parameter (or return type). Computed once.
    ///
    /// Compiled inner class constructors with at least one generic parameter omit the implicit
    /// enclosing instance from their generic parameter types, while their raw parameter classes
    /// include it. In such case the generic type is looked up with the index lowered by one.
    /// Indexes without a generic counterpart fall back to the raw parameter class.
    pub fn generic_parameter_type(&self) -> Type {
        self.generic_parameter_type
            .get_or_init(|| {
                if self.parameter_index < 0 {
                    return match self.method() {
                        Some(method) => method.generic_return_type().clone(),
                        None => Type::class(Class::void()),
                    };
                }

                let generic_parameter_types = self.executable.generic_parameter_types();
                let mut index = self.parameter_index;

                if let Executable::Constructor(constructor) = &self.executable {
                    if constructor.declaring_class().is_inner_class()
                        && generic_parameter_types.len() + 1 == constructor.parameter_count()
                    {
                        index -= 1;
                    }
                }

                usize::try_from(index)
                    .ok()
                    .and_then(|index| generic_parameter_types.get(index))
                    .cloned()
                    .unwrap_or_else(|| Type::class(self.parameter_type()))
            })
            .clone()
    }

    /// Returns the raw class of the parameter (or return type). Computed once.
    pub fn parameter_type(&self) -> Class {
        self.parameter_type
            .get_or_init(|| match usize::try_from(self.parameter_index) {
                Ok(index) => self
                    .executable
                    .parameter_types()
                    .get(index)
                    .cloned()
                    .unwrap_or_else(Class::object),
                Err(_) => self
                    .method()
                    .map(Method::return_type)
                    .unwrap_or_else(Class::void),
            })
            .clone()
    }

    /// Returns the raw class at the current nesting level. Levels past a non-parameterized type
    /// stay at that type; anything which cannot be reduced to a class yields the root class.
    pub fn nested_parameter_type(&self) -> Class {
        if self.nesting_level <= 1 {
            return self.parameter_type();
        }

        let mut ty = self.generic_parameter_type();
        for level in 2..=self.nesting_level {
            let arguments = ty.actual_type_arguments();
            if arguments.is_empty() {
                continue;
            }

            let index = self
                .type_index_for_level(level)
                .unwrap_or(arguments.len() - 1);
            if let Some(argument) = arguments.into_iter().nth(index) {
                ty = argument;
            }
        }

        if let Some(class) = ty.as_class() {
            return class;
        }

        ty.raw_type()
            .and_then(|raw_type| raw_type.as_class())
            .unwrap_or_else(Class::object)
    }

    /// Installs the strategy used by [Self::parameter_name]. Names discovered earlier are kept.
    pub fn init_parameter_name_discovery(&mut self, discoverer: ParameterNameDiscovererPtr) {
        self.parameter_name_discoverer = Some(discoverer);
    }

    /// Returns the parameter name, if a discoverer is installed and able to find it. Return types
    /// have no name.
    pub fn parameter_name(&self) -> Option<String> {
        let index = usize::try_from(self.parameter_index).ok()?;
        let discoverer = self.parameter_name_discoverer.as_ref()?;

        self.parameter_name
            .get_or_init(|| {
                let names = match &self.executable {
                    Executable::Method(method) => discoverer.method_parameter_names(method),
                    Executable::Constructor(constructor) => {
                        discoverer.constructor_parameter_names(constructor)
                    }
                };

                names.and_then(|names| names.into_iter().nth(index))
            })
            .clone()
    }
}

impl PartialEq for MethodParameter {
    fn eq(&self, other: &Self) -> bool {
        self.executable == other.executable
            && self.parameter_index == other.parameter_index
            && self.nesting_level == other.nesting_level
            && self.type_indexes_per_level == other.type_indexes_per_level
            && self.containing_class() == other.containing_class()
    }
}

impl Eq for MethodParameter {}

#[cfg(test)]
mod tests {
    use crate::class::{Class, ConstructorDefinition, MethodDefinition};
    use crate::error::AssertionError;
    use crate::method_parameter::MethodParameter;
    use crate::parameter_name_discoverer::{
        DescriptorParameterNameDiscoverer, MockParameterNameDiscoverer,
    };
    use crate::types::Type;
    use std::sync::Arc;

    fn collection_classes() -> (Class, Class) {
        let list = Class::builder("java.util.List")
            .interface()
            .type_parameter("E")
            .build();
        let map = Class::builder("java.util.Map")
            .interface()
            .type_parameter("K")
            .type_parameter("V")
            .build();

        (list, map)
    }

    fn create_service() -> (Class, Class, Class) {
        let (list, map) = collection_classes();
        let integer = Class::builder("java.lang.Integer").build();

        let service = Class::builder("test.Service")
            .method(
                MethodDefinition::new("index")
                    .parameter(Type::parameterized(
                        map.clone(),
                        vec![
                            Type::class(Class::string()),
                            Type::parameterized(list.clone(), vec![Type::class(integer.clone())]),
                        ],
                    ))
                    .parameter(Type::class(Class::primitive("int")))
                    .returns(Type::parameterized(
                        list,
                        vec![Type::class(Class::string())],
                    ))
                    .parameter_names(["entries", "limit"]),
            )
            .build();

        (service, map, integer)
    }

    #[test]
    fn should_validate_index() {
        let (service, _, _) = create_service();
        let method = service.method_named("index").unwrap();

        assert!(MethodParameter::for_method(method.clone(), -1).is_ok());
        assert!(MethodParameter::for_method(method.clone(), 1).is_ok());
        assert_eq!(
            MethodParameter::for_method(method.clone(), 2).unwrap_err(),
            AssertionError::IllegalArgument(
                "Parameter index needs to be between -1 and 1".to_string()
            )
        );
        assert!(MethodParameter::for_method(method, -2).is_err());

        let class = Class::builder("test.Value")
            .constructor(ConstructorDefinition::new())
            .build();
        assert!(
            MethodParameter::for_constructor(class.declared_constructors()[0].clone(), -1)
                .is_err()
        );
    }

    #[test]
    fn should_describe_return_type() {
        let (service, _, _) = create_service();
        let method = service.method_named("index").unwrap();
        let parameter = MethodParameter::for_method(method.clone(), -1).unwrap();
        assert_eq!(parameter, MethodParameter::for_return_type(method.clone()));

        assert_eq!(&parameter.generic_parameter_type(), method.generic_return_type());
        assert_eq!(parameter.parameter_type(), method.return_type());
        assert_eq!(parameter.nested(None).nested_parameter_type(), Class::string());
    }

    #[test]
    fn should_resolve_nested_types() {
        let (service, map, integer) = create_service();
        let method = service.method_named("index").unwrap();
        let parameter = MethodParameter::for_method(method, 0).unwrap();

        assert_eq!(parameter.parameter_type(), map);
        assert_eq!(parameter.nested_parameter_type(), map);

        let value = parameter.nested(None);
        assert_eq!(value.nesting_level(), 2);
        assert_eq!(value.nested_parameter_type().name(), "java.util.List");
        assert_eq!(value.nested(None).nested_parameter_type(), integer);

        let key = parameter.nested(Some(0));
        assert_eq!(key.type_index_for_current_level(), Some(0));
        assert_eq!(key.nested_parameter_type(), Class::string());

        assert_ne!(key, value);
        assert_eq!(parameter.with_nesting_level(2).unwrap(), value);
        assert!(parameter.with_nesting_level(0).is_err());
    }

    #[test]
    fn should_memoize_types() {
        let (service, _, _) = create_service();
        let parameter =
            MethodParameter::for_method(service.method_named("index").unwrap(), 1).unwrap();

        let first = parameter.parameter_type();
        let second = parameter.parameter_type();
        assert_eq!(first, Class::primitive("int"));
        assert_eq!(first, second);
        assert_eq!(parameter.generic_parameter_type(), Type::class(first));
    }

    #[test]
    fn should_shift_index_for_inner_class_constructors() {
        let (list, _) = collection_classes();
        let outer = Class::builder("test.Outer").build();
        let list_of_strings = Type::parameterized(list, vec![Type::class(Class::string())]);

        let inner = Class::builder("test.Outer$Inner")
            .member_of(&outer, false)
            .constructor(ConstructorDefinition::new().parameter(list_of_strings.clone()))
            .build();
        let constructor = inner.declared_constructors().remove(0);
        assert_eq!(constructor.parameter_count(), 2);
        assert_eq!(constructor.generic_parameter_types().len(), 1);

        let parameter = MethodParameter::for_constructor(constructor.clone(), 1).unwrap();
        assert_eq!(parameter.generic_parameter_type(), list_of_strings);

        let enclosing = MethodParameter::for_constructor(constructor, 0).unwrap();
        assert_eq!(enclosing.generic_parameter_type(), Type::class(outer.clone()));
        assert_eq!(enclosing.parameter_type(), outer);
    }

    #[test]
    fn should_not_shift_index_for_static_nested_classes() {
        let (list, _) = collection_classes();
        let outer = Class::builder("test.Outer").build();
        let list_of_strings = Type::parameterized(list, vec![Type::class(Class::string())]);

        let nested = Class::builder("test.Outer$Nested")
            .member_of(&outer, true)
            .constructor(
                ConstructorDefinition::new()
                    .parameter(Type::class(Class::string()))
                    .parameter(list_of_strings.clone()),
            )
            .build();

        let parameter =
            MethodParameter::for_constructor(nested.declared_constructors().remove(0), 1).unwrap();
        assert_eq!(parameter.generic_parameter_type(), list_of_strings);
    }

    #[test]
    fn should_discover_parameter_names() {
        let (service, _, _) = create_service();
        let method = service.method_named("index").unwrap();

        let mut parameter = MethodParameter::for_method(method.clone(), 1).unwrap();
        assert_eq!(parameter.parameter_name(), None);

        parameter.init_parameter_name_discovery(Arc::new(DescriptorParameterNameDiscoverer));
        assert_eq!(parameter.parameter_name(), Some("limit".to_string()));

        let mut discoverer = MockParameterNameDiscoverer::new();
        discoverer
            .expect_method_parameter_names()
            .times(1)
            .returning(|_| Some(vec!["first".to_string(), "second".to_string()]));

        let mut parameter = MethodParameter::for_method(method.clone(), 0).unwrap();
        parameter.init_parameter_name_discovery(Arc::new(discoverer));
        assert_eq!(parameter.parameter_name(), Some("first".to_string()));
        assert_eq!(parameter.parameter_name(), Some("first".to_string()));

        let mut parameter = MethodParameter::for_method(method, -1).unwrap();
        parameter.init_parameter_name_discovery(Arc::new(DescriptorParameterNameDiscoverer));
        assert_eq!(parameter.parameter_name(), None);
    }

    #[test]
    fn should_use_containing_class() {
        let (service, _, _) = create_service();
        let parameter =
            MethodParameter::for_method(service.method_named("index").unwrap(), 0).unwrap();
        assert_eq!(parameter.containing_class(), &service);

        let subclass = Class::builder("test.SubService")
            .extends(Type::class(service.clone()))
            .build();
        let contained = parameter.with_containing_class(subclass.clone());
        assert_eq!(contained.containing_class(), &subclass);
        assert_eq!(contained.declaring_class(), &service);
        assert_ne!(contained, parameter);
    }
}

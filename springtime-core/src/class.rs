//! Class descriptors - the explicit counterpart of runtime class metadata.
//!
//! A [Class] describes a named type together with its declared type parameters, its generic
//! supertypes and its members ([Field], [Method], [Constructor]). Classes are immutable once built
//! and cheap to clone. Two classes are equal when their names are equal.
//!
//! ```
//! use springtime_core::class::{Class, MethodDefinition};
//! use springtime_core::types::Type;
//!
//! let list = Class::builder("java.util.List").interface().type_parameter("E").build();
//!
//! let builder = Class::builder("java.util.ArrayList").type_parameter("E");
//! let element = builder.variable("E");
//! let array_list = builder
//!     .implements(Type::parameterized(list.clone(), vec![element.clone()]))
//!     .method(MethodDefinition::new("get").parameter(Type::class(Class::primitive("int"))).returns(element))
//!     .build();
//!
//! assert!(list.is_assignable_from(&array_list));
//! ```

use crate::types::{GenericDeclaration, Type, TypeVariable};
use itertools::Itertools;
use once_cell::sync::Lazy;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Name of the root class.
pub const OBJECT: &str = "java.lang.Object";

/// Name of the string class.
pub const STRING: &str = "java.lang.String";

/// Name of the pseudo-class describing an absent return value.
pub const VOID: &str = "void";

static OBJECT_CLASS: Lazy<Class> = Lazy::new(|| ClassBuilder::new(OBJECT).build());

static STRING_CLASS: Lazy<Class> = Lazy::new(|| ClassBuilder::new(STRING).build());

static VOID_CLASS: Lazy<Class> = Lazy::new(|| Class::primitive(VOID));

/// What kind of type a [Class] describes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClassKind {
    Primitive,
    Class,
    Interface,
    Array(Class),
}

/// Handle to an immutable class descriptor.
#[derive(Clone)]
pub struct Class {
    inner: Arc<ClassData>,
}

struct ClassData {
    name: String,
    kind: ClassKind,
    enclosing_class: Option<Class>,
    is_static: bool,
    type_parameters: Vec<TypeVariable>,
    generic_superclass: Option<Type>,
    generic_interfaces: Vec<Type>,
    fields: Vec<FieldData>,
    methods: Vec<MethodData>,
    constructors: Vec<ConstructorData>,
}

struct FieldData {
    name: String,
    generic_type: Type,
}

struct MethodData {
    name: String,
    type_parameters: Vec<TypeVariable>,
    parameter_types: Vec<Class>,
    generic_parameter_types: Vec<Type>,
    generic_return_type: Type,
    parameter_names: Option<Vec<String>>,
}

struct ConstructorData {
    parameter_types: Vec<Class>,
    generic_parameter_types: Vec<Type>,
    parameter_names: Option<Vec<String>>,
}

impl Class {
    /// Starts building a new reference class extending [OBJECT].
    pub fn builder<T: ToString>(name: T) -> ClassBuilder {
        ClassBuilder::new(name)
    }

    /// The root class, assignable from every reference class.
    pub fn object() -> Class {
        OBJECT_CLASS.clone()
    }

    pub fn string() -> Class {
        STRING_CLASS.clone()
    }

    /// The [VOID] pseudo-class, used as the return type of methods returning nothing.
    pub fn void() -> Class {
        VOID_CLASS.clone()
    }

    /// Creates a primitive class with the given name, e.g. `int`.
    pub fn primitive<T: ToString>(name: T) -> Class {
        let mut builder = ClassBuilder::new(name);
        builder.data.kind = ClassKind::Primitive;
        builder.data.generic_superclass = None;
        builder.build()
    }

    /// Creates the array class with the given component class.
    pub fn array_of(component: &Class) -> Class {
        let mut builder = ClassBuilder::new(format!("{}[]", component.name()));
        builder.data.kind = ClassKind::Array(component.clone());
        builder.build()
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[inline]
    pub fn kind(&self) -> &ClassKind {
        &self.inner.kind
    }

    #[inline]
    pub fn is_primitive(&self) -> bool {
        self.inner.kind == ClassKind::Primitive
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        self.inner.kind == ClassKind::Interface
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self.inner.kind, ClassKind::Array(_))
    }

    /// Returns the component class of an array class.
    pub fn component_type(&self) -> Option<Class> {
        match &self.inner.kind {
            ClassKind::Array(component) => Some(component.clone()),
            _ => None,
        }
    }

    #[inline]
    pub fn enclosing_class(&self) -> Option<&Class> {
        self.inner.enclosing_class.as_ref()
    }

    #[inline]
    pub fn is_member_class(&self) -> bool {
        self.inner.enclosing_class.is_some()
    }

    /// Checks if this is a non-static member class, i.e. one whose constructors take an implicit
    /// enclosing instance as the first parameter.
    #[inline]
    pub fn is_inner_class(&self) -> bool {
        self.is_member_class() && !self.inner.is_static
    }

    #[inline]
    pub fn type_parameters(&self) -> &[TypeVariable] {
        &self.inner.type_parameters
    }

    #[inline]
    pub fn generic_superclass(&self) -> Option<&Type> {
        self.inner.generic_superclass.as_ref()
    }

    /// Returns the erasure of the generic superclass.
    pub fn superclass(&self) -> Option<Class> {
        self.inner.generic_superclass.as_ref().map(Type::erasure)
    }

    #[inline]
    pub fn generic_interfaces(&self) -> &[Type] {
        &self.inner.generic_interfaces
    }

    /// Returns erasures of the generic interfaces.
    pub fn interfaces(&self) -> Vec<Class> {
        self.inner
            .generic_interfaces
            .iter()
            .map(Type::erasure)
            .collect()
    }

    pub fn declared_fields(&self) -> Vec<Field> {
        (0..self.inner.fields.len())
            .map(|index| Field {
                declaring_class: self.clone(),
                index,
            })
            .collect()
    }

    pub fn declared_field(&self, name: &str) -> Option<Field> {
        self.inner
            .fields
            .iter()
            .position(|field| field.name == name)
            .map(|index| Field {
                declaring_class: self.clone(),
                index,
            })
    }

    pub fn declared_methods(&self) -> Vec<Method> {
        (0..self.inner.methods.len())
            .map(|index| Method {
                declaring_class: self.clone(),
                index,
            })
            .collect()
    }

    /// Looks up a method by name and raw parameter class names.
    pub fn declared_method<S: AsRef<str>>(
        &self,
        name: &str,
        parameter_types: &[S],
    ) -> Option<Method> {
        self.inner
            .methods
            .iter()
            .position(|method| {
                method.name == name && names_match(&method.parameter_types, parameter_types)
            })
            .map(|index| Method {
                declaring_class: self.clone(),
                index,
            })
    }

    /// Returns the first declared method with the given name.
    pub fn method_named(&self, name: &str) -> Option<Method> {
        self.inner
            .methods
            .iter()
            .position(|method| method.name == name)
            .map(|index| Method {
                declaring_class: self.clone(),
                index,
            })
    }

    pub fn declared_constructors(&self) -> Vec<Constructor> {
        (0..self.inner.constructors.len())
            .map(|index| Constructor {
                declaring_class: self.clone(),
                index,
            })
            .collect()
    }

    /// Looks up a constructor by raw parameter class names.
    pub fn declared_constructor<S: AsRef<str>>(&self, parameter_types: &[S]) -> Option<Constructor> {
        self.inner
            .constructors
            .iter()
            .position(|constructor| names_match(&constructor.parameter_types, parameter_types))
            .map(|index| Constructor {
                declaring_class: self.clone(),
                index,
            })
    }

    /// Determines if a value of the `other` class can be used where this class is expected.
    pub fn is_assignable_from(&self, other: &Class) -> bool {
        if self == other {
            return true;
        }

        if self.is_primitive() || other.is_primitive() {
            return false;
        }

        if self.name() == OBJECT {
            return true;
        }

        if let (ClassKind::Array(ours), ClassKind::Array(theirs)) = (self.kind(), other.kind()) {
            return if ours.is_primitive() || theirs.is_primitive() {
                ours == theirs
            } else {
                ours.is_assignable_from(theirs)
            };
        }

        other
            .superclass()
            .into_iter()
            .chain(other.interfaces())
            .any(|supertype| self.is_assignable_from(&supertype))
    }
}

fn names_match<S: AsRef<str>>(classes: &[Class], names: &[S]) -> bool {
    classes.len() == names.len()
        && classes
            .iter()
            .zip(names)
            .all(|(class, name)| class.name() == name.as_ref())
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.name == other.inner.name
    }
}

impl Eq for Class {}

impl Hash for Class {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.name.hash(state);
    }
}

impl Debug for Class {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Class({})", self.inner.name)
    }
}

impl Display for Class {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner.name)
    }
}

/// A field declared by a class.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Field {
    declaring_class: Class,
    index: usize,
}

impl Field {
    fn data(&self) -> &FieldData {
        &self.declaring_class.inner.fields[self.index]
    }

    #[inline]
    pub fn declaring_class(&self) -> &Class {
        &self.declaring_class
    }

    pub fn name(&self) -> &str {
        &self.data().name
    }

    pub fn generic_type(&self) -> &Type {
        &self.data().generic_type
    }

    /// Raw class of the field.
    pub fn field_type(&self) -> Class {
        self.data().generic_type.erasure()
    }
}

/// A method declared by a class.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Method {
    declaring_class: Class,
    index: usize,
}

impl Method {
    fn data(&self) -> &MethodData {
        &self.declaring_class.inner.methods[self.index]
    }

    #[inline]
    pub fn declaring_class(&self) -> &Class {
        &self.declaring_class
    }

    pub fn name(&self) -> &str {
        &self.data().name
    }

    pub fn type_parameters(&self) -> &[TypeVariable] {
        &self.data().type_parameters
    }

    pub fn parameter_count(&self) -> usize {
        self.data().parameter_types.len()
    }

    pub fn parameter_types(&self) -> &[Class] {
        &self.data().parameter_types
    }

    pub fn generic_parameter_types(&self) -> &[Type] {
        &self.data().generic_parameter_types
    }

    pub fn generic_return_type(&self) -> &Type {
        &self.data().generic_return_type
    }

    pub fn return_type(&self) -> Class {
        self.data().generic_return_type.erasure()
    }

    pub fn parameter_names(&self) -> Option<&[String]> {
        self.data().parameter_names.as_deref()
    }
}

/// A constructor declared by a class.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Constructor {
    declaring_class: Class,
    index: usize,
}

impl Constructor {
    fn data(&self) -> &ConstructorData {
        &self.declaring_class.inner.constructors[self.index]
    }

    #[inline]
    pub fn declaring_class(&self) -> &Class {
        &self.declaring_class
    }

    pub fn parameter_count(&self) -> usize {
        self.data().parameter_types.len()
    }

    /// Raw parameter classes, including the implicit enclosing instance of inner classes.
    pub fn parameter_types(&self) -> &[Class] {
        &self.data().parameter_types
    }

    /// Generic parameter types. For inner classes this might lack the enclosing instance
    /// parameter - see [ClassBuilder::constructor].
    pub fn generic_parameter_types(&self) -> &[Type] {
        &self.data().generic_parameter_types
    }

    pub fn parameter_names(&self) -> Option<&[String]> {
        self.data().parameter_names.as_deref()
    }
}

/// Declaration of a method to be added to a [ClassBuilder].
#[derive(Clone, Debug)]
pub struct MethodDefinition {
    name: String,
    type_parameters: Vec<(String, Vec<Type>)>,
    generic_parameter_types: Vec<Type>,
    generic_return_type: Type,
    parameter_names: Option<Vec<String>>,
}

impl MethodDefinition {
    /// Creates a parameterless method returning [VOID].
    pub fn new<T: ToString>(name: T) -> Self {
        Self {
            name: name.to_string(),
            type_parameters: vec![],
            generic_parameter_types: vec![],
            generic_return_type: Type::class(Class::void()),
            parameter_names: None,
        }
    }

    /// Declares a method-level type parameter. Use [ClassBuilder::method_variable] to refer to it.
    pub fn type_parameter<T: ToString>(mut self, name: T, bounds: Vec<Type>) -> Self {
        self.type_parameters.push((name.to_string(), bounds));
        self
    }

    pub fn parameter(mut self, generic_type: Type) -> Self {
        self.generic_parameter_types.push(generic_type);
        self
    }

    pub fn returns(mut self, generic_type: Type) -> Self {
        self.generic_return_type = generic_type;
        self
    }

    pub fn parameter_names<T: ToString, I: IntoIterator<Item = T>>(mut self, names: I) -> Self {
        self.parameter_names = Some(names.into_iter().map(|name| name.to_string()).collect());
        self
    }
}

/// Declaration of a constructor to be added to a [ClassBuilder].
#[derive(Clone, Debug, Default)]
pub struct ConstructorDefinition {
    generic_parameter_types: Vec<Type>,
    parameter_names: Option<Vec<String>>,
}

impl ConstructorDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parameter(mut self, generic_type: Type) -> Self {
        self.generic_parameter_types.push(generic_type);
        self
    }

    pub fn parameter_names<T: ToString, I: IntoIterator<Item = T>>(mut self, names: I) -> Self {
        self.parameter_names = Some(names.into_iter().map(|name| name.to_string()).collect());
        self
    }
}

/// Builder for [Class] descriptors.
pub struct ClassBuilder {
    data: ClassData,
}

impl ClassBuilder {
    fn new<T: ToString>(name: T) -> Self {
        let name = name.to_string();
        let generic_superclass = if name == OBJECT {
            None
        } else {
            Some(Type::class(Class::object()))
        };

        Self {
            data: ClassData {
                name,
                kind: ClassKind::Class,
                enclosing_class: None,
                is_static: false,
                type_parameters: vec![],
                generic_superclass,
                generic_interfaces: vec![],
                fields: vec![],
                methods: vec![],
                constructors: vec![],
            },
        }
    }

    /// Marks the class as an interface. Interfaces have no superclass.
    pub fn interface(mut self) -> Self {
        self.data.kind = ClassKind::Interface;
        self.data.generic_superclass = None;
        self
    }

    /// Declares this class as a member of `enclosing`. Non-static members are inner classes.
    pub fn member_of(mut self, enclosing: &Class, is_static: bool) -> Self {
        self.data.enclosing_class = Some(enclosing.clone());
        self.data.is_static = is_static;
        self
    }

    /// Declares an unbounded class-level type parameter.
    pub fn type_parameter<T: ToString>(self, name: T) -> Self {
        self.bounded_type_parameter(name, vec![])
    }

    pub fn bounded_type_parameter<T: ToString>(mut self, name: T, bounds: Vec<Type>) -> Self {
        let variable = TypeVariable::new(
            name,
            GenericDeclaration::Class(self.data.name.clone()),
            bounds,
        );
        self.data.type_parameters.push(variable);
        self
    }

    /// Returns a reference to a class-level type parameter of the class being built.
    pub fn variable(&self, name: &str) -> Type {
        Type::Variable(
            self.data
                .type_parameters
                .iter()
                .find(|variable| variable.name() == name)
                .cloned()
                .unwrap_or_else(|| {
                    TypeVariable::new(
                        name,
                        GenericDeclaration::Class(self.data.name.clone()),
                        vec![],
                    )
                }),
        )
    }

    /// Returns a reference to a type parameter declared by a method of the class being built.
    pub fn method_variable(&self, method: &str, name: &str) -> Type {
        Type::Variable(TypeVariable::new(
            name,
            GenericDeclaration::Method {
                class: self.data.name.clone(),
                method: method.to_string(),
            },
            vec![],
        ))
    }

    pub fn extends(mut self, superclass: Type) -> Self {
        self.data.generic_superclass = Some(superclass);
        self
    }

    pub fn implements(mut self, interface: Type) -> Self {
        self.data.generic_interfaces.push(interface);
        self
    }

    pub fn field<T: ToString>(mut self, name: T, generic_type: Type) -> Self {
        self.data.fields.push(FieldData {
            name: name.to_string(),
            generic_type,
        });
        self
    }

    pub fn method(mut self, definition: MethodDefinition) -> Self {
        let declaration = GenericDeclaration::Method {
            class: self.data.name.clone(),
            method: definition.name.clone(),
        };

        self.data.methods.push(MethodData {
            type_parameters: definition
                .type_parameters
                .into_iter()
                .map(|(name, bounds)| TypeVariable::new(name, declaration.clone(), bounds))
                .collect(),
            parameter_types: definition
                .generic_parameter_types
                .iter()
                .map(Type::erasure)
                .collect(),
            name: definition.name,
            generic_parameter_types: definition.generic_parameter_types,
            generic_return_type: definition.generic_return_type,
            parameter_names: definition.parameter_names,
        });
        self
    }

    /// Adds a constructor with the given declared parameters.
    ///
    /// Constructors of inner classes get the enclosing instance prepended to their raw parameter
    /// classes. Their generic parameter types mirror what compiled class files report: when at
    /// least one declared parameter is generic, the generic signature lists only the declared
    /// parameters, so it is one element shorter than the raw parameter list. Otherwise both lists
    /// include the enclosing instance.
    pub fn constructor(mut self, definition: ConstructorDefinition) -> Self {
        let declared: Vec<Class> = definition
            .generic_parameter_types
            .iter()
            .map(Type::erasure)
            .collect();

        let enclosing = self
            .data
            .enclosing_class
            .as_ref()
            .filter(|_| !self.data.is_static)
            .cloned();

        let constructor = match enclosing {
            Some(enclosing) => {
                let has_generic_signature = definition
                    .generic_parameter_types
                    .iter()
                    .any(|parameter| parameter.as_class().is_none());

                let generic_parameter_types = if has_generic_signature {
                    definition.generic_parameter_types
                } else {
                    std::iter::once(Type::class(enclosing.clone()))
                        .chain(definition.generic_parameter_types)
                        .collect_vec()
                };

                ConstructorData {
                    parameter_types: std::iter::once(enclosing).chain(declared).collect(),
                    generic_parameter_types,
                    parameter_names: definition.parameter_names,
                }
            }
            None => ConstructorData {
                parameter_types: declared,
                generic_parameter_types: definition.generic_parameter_types,
                parameter_names: definition.parameter_names,
            },
        };

        self.data.constructors.push(constructor);
        self
    }

    pub fn build(self) -> Class {
        Class {
            inner: Arc::new(self.data),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::class::{Class, ConstructorDefinition, MethodDefinition, OBJECT};
    use crate::types::Type;

    fn collection_classes() -> (Class, Class, Class) {
        let collection = Class::builder("java.util.Collection")
            .interface()
            .type_parameter("E")
            .build();

        let builder = Class::builder("java.util.List").interface().type_parameter("E");
        let element = builder.variable("E");
        let list = builder
            .implements(Type::parameterized(collection.clone(), vec![element]))
            .build();

        let builder = Class::builder("java.util.ArrayList").type_parameter("E");
        let element = builder.variable("E");
        let array_list = builder
            .implements(Type::parameterized(list.clone(), vec![element]))
            .build();

        (collection, list, array_list)
    }

    #[test]
    fn should_check_assignability_through_hierarchy() {
        let (collection, list, array_list) = collection_classes();

        assert!(collection.is_assignable_from(&array_list));
        assert!(list.is_assignable_from(&array_list));
        assert!(!array_list.is_assignable_from(&list));
        assert!(Class::object().is_assignable_from(&list));
        assert!(!Class::object().is_assignable_from(&Class::primitive("int")));
    }

    #[test]
    fn should_check_array_assignability() {
        let (_, list, array_list) = collection_classes();

        assert!(Class::array_of(&list).is_assignable_from(&Class::array_of(&array_list)));
        assert!(Class::object().is_assignable_from(&Class::array_of(&list)));
        assert!(!Class::array_of(&Class::primitive("long"))
            .is_assignable_from(&Class::array_of(&Class::primitive("int"))));
        assert_eq!(
            Class::array_of(&list).component_type(),
            Some(list.clone())
        );
        assert_eq!(Class::array_of(&list).name(), "java.util.List[]");
    }

    #[test]
    fn should_find_members() {
        let class = Class::builder("test.Service")
            .field("name", Type::class(Class::string()))
            .method(
                MethodDefinition::new("rename")
                    .parameter(Type::class(Class::string()))
                    .parameter_names(["value"]),
            )
            .constructor(ConstructorDefinition::new())
            .build();

        assert_eq!(class.declared_field("name").unwrap().field_type(), Class::string());
        assert!(class.declared_field("missing").is_none());

        let method = class
            .declared_method("rename", &["java.lang.String"])
            .unwrap();
        assert_eq!(method.return_type(), Class::void());
        assert_eq!(method.parameter_names().unwrap(), ["value".to_string()]);
        assert!(class.declared_method("rename", &[OBJECT]).is_none());

        assert!(class.declared_constructor::<&str>(&[]).is_some());
        assert_eq!(class.superclass(), Some(Class::object()));
        assert_eq!(Class::object().superclass(), None);
    }

    #[test]
    fn should_prepend_enclosing_instance_for_inner_classes() {
        let (_, list, _) = collection_classes();
        let outer = Class::builder("test.Outer").build();

        let inner = Class::builder("test.Outer$Inner")
            .member_of(&outer, false)
            .constructor(ConstructorDefinition::new().parameter(Type::parameterized(
                list.clone(),
                vec![Type::class(Class::string())],
            )))
            .constructor(ConstructorDefinition::new().parameter(Type::class(Class::string())))
            .build();

        assert!(inner.is_inner_class());

        let constructors = inner.declared_constructors();
        assert_eq!(constructors[0].parameter_types(), [outer.clone(), list]);
        assert_eq!(constructors[0].generic_parameter_types().len(), 1);
        assert_eq!(constructors[1].parameter_types().len(), 2);
        assert_eq!(constructors[1].generic_parameter_types().len(), 2);

        let nested = Class::builder("test.Outer$Nested")
            .member_of(&outer, true)
            .build();
        assert!(nested.is_member_class());
        assert!(!nested.is_inner_class());
    }
}

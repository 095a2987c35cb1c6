//! Generic type shapes built on top of [Class] descriptors.
//!
//! [Type] is the tagged counterpart of a reflective type graph: plain classes, parameterized
//! types, type variables, wildcards and generic arrays. Composite types can additionally be
//! represented by a [TypeProxy] - a persistable stand-in created by the
//! [SerializableTypeWrapper](crate::serializable_type_wrapper::SerializableTypeWrapper), which
//! compares and hashes exactly like the type it stands for.

use crate::class::{Class, OBJECT};
use crate::serializable_type_wrapper::TypeProxy;
use crate::type_provider::SerializedTypeProvider;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// The element declaring a [TypeVariable].
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenericDeclaration {
    Class(String),
    Method { class: String, method: String },
}

impl GenericDeclaration {
    /// Name of the class which declares the variable, directly or through a method.
    pub fn class_name(&self) -> &str {
        match self {
            GenericDeclaration::Class(class) => class,
            GenericDeclaration::Method { class, .. } => class,
        }
    }
}

/// A named type parameter of a class or method. Variables are equal when their names and
/// declarations are equal.
#[derive(Clone)]
pub struct TypeVariable {
    inner: Arc<TypeVariableData>,
}

struct TypeVariableData {
    name: String,
    declaration: GenericDeclaration,
    bounds: Vec<Type>,
}

impl TypeVariable {
    /// Creates a new variable. Missing bounds default to the root class.
    pub fn new<T: ToString>(name: T, declaration: GenericDeclaration, bounds: Vec<Type>) -> Self {
        let bounds = if bounds.is_empty() {
            vec![Type::class(Class::object())]
        } else {
            bounds
        };

        Self {
            inner: Arc::new(TypeVariableData {
                name: name.to_string(),
                declaration,
                bounds,
            }),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[inline]
    pub fn declaration(&self) -> &GenericDeclaration {
        &self.inner.declaration
    }

    #[inline]
    pub fn bounds(&self) -> &[Type] {
        &self.inner.bounds
    }
}

impl PartialEq for TypeVariable {
    fn eq(&self, other: &Self) -> bool {
        self.inner.name == other.inner.name && self.inner.declaration == other.inner.declaration
    }
}

impl Eq for TypeVariable {}

impl Hash for TypeVariable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.name.hash(state);
        self.inner.declaration.hash(state);
    }
}

impl Debug for TypeVariable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TypeVariable({} @ {})",
            self.inner.name,
            self.inner.declaration.class_name()
        )
    }
}

/// A class with actual type arguments, e.g. `List<String>`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ParameterizedType {
    raw_type: Class,
    owner_type: Option<Type>,
    actual_type_arguments: Vec<Type>,
}

impl ParameterizedType {
    #[inline]
    pub fn raw_type(&self) -> &Class {
        &self.raw_type
    }

    #[inline]
    pub fn owner_type(&self) -> Option<&Type> {
        self.owner_type.as_ref()
    }

    #[inline]
    pub fn actual_type_arguments(&self) -> &[Type] {
        &self.actual_type_arguments
    }
}

/// A wildcard with upper (`? extends`) and lower (`? super`) bounds.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct WildcardType {
    upper_bounds: Vec<Type>,
    lower_bounds: Vec<Type>,
}

impl WildcardType {
    #[inline]
    pub fn upper_bounds(&self) -> &[Type] {
        &self.upper_bounds
    }

    #[inline]
    pub fn lower_bounds(&self) -> &[Type] {
        &self.lower_bounds
    }
}

/// An array whose component is a parameterized type or a type variable, e.g. `T[]`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct GenericArrayType {
    generic_component_type: Type,
}

impl GenericArrayType {
    #[inline]
    pub fn generic_component_type(&self) -> &Type {
        &self.generic_component_type
    }
}

/// Shape of a type, looking through proxies.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeKind {
    Class,
    Parameterized,
    Variable,
    Wildcard,
    GenericArray,
    Empty,
}

/// Type-returning accessors of composite types. Accessors are identified by value, so their
/// invocation can be persisted and replayed.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeAccessor {
    RawType,
    OwnerType,
    ActualTypeArguments,
    GenericComponentType,
    Bounds,
    UpperBounds,
    LowerBounds,
}

impl TypeAccessor {
    /// Checks if this accessor returns a list of types rather than a single one.
    pub fn returns_many(self) -> bool {
        matches!(
            self,
            TypeAccessor::ActualTypeArguments
                | TypeAccessor::Bounds
                | TypeAccessor::UpperBounds
                | TypeAccessor::LowerBounds
        )
    }

    /// Invokes a single-valued accessor on the given type.
    pub fn single(self, ty: &Type) -> Option<Type> {
        match (self, ty) {
            (TypeAccessor::RawType, Type::Parameterized(parameterized)) => {
                Some(Type::Class(parameterized.raw_type.clone()))
            }
            (TypeAccessor::OwnerType, Type::Parameterized(parameterized)) => {
                parameterized.owner_type.clone()
            }
            (TypeAccessor::GenericComponentType, Type::GenericArray(array)) => {
                Some(array.generic_component_type.clone())
            }
            (_, Type::Proxy(proxy)) => proxy.provided_type().and_then(|ty| self.single(&ty)),
            _ => None,
        }
    }

    /// Invokes a list-valued accessor on the given type.
    pub fn many(self, ty: &Type) -> Vec<Type> {
        match (self, ty) {
            (TypeAccessor::ActualTypeArguments, Type::Parameterized(parameterized)) => {
                parameterized.actual_type_arguments.clone()
            }
            (TypeAccessor::Bounds, Type::Variable(variable)) => variable.bounds().to_vec(),
            (TypeAccessor::UpperBounds, Type::Wildcard(wildcard)) => {
                wildcard.upper_bounds.clone()
            }
            (TypeAccessor::LowerBounds, Type::Wildcard(wildcard)) => {
                wildcard.lower_bounds.clone()
            }
            (_, Type::Proxy(proxy)) => proxy
                .provided_type()
                .map(|ty| self.many(&ty))
                .unwrap_or_default(),
            _ => vec![],
        }
    }

    /// Invokes the accessor and picks the element at `index` for list-valued accessors.
    pub fn apply(self, ty: &Type, index: Option<usize>) -> Option<Type> {
        match index {
            Some(index) => self.many(ty).into_iter().nth(index),
            None => self.single(ty),
        }
    }
}

/// A type in the generic type graph.
#[derive(Clone)]
pub enum Type {
    Class(Class),
    Parameterized(Arc<ParameterizedType>),
    Variable(TypeVariable),
    Wildcard(Arc<WildcardType>),
    GenericArray(Arc<GenericArrayType>),
    /// Persistable stand-in for a composite type.
    Proxy(TypeProxy),
    /// Absent or unresolvable type.
    Empty,
}

impl Type {
    #[inline]
    pub fn class(class: Class) -> Type {
        Type::Class(class)
    }

    pub fn parameterized(raw_type: Class, actual_type_arguments: Vec<Type>) -> Type {
        Type::Parameterized(Arc::new(ParameterizedType {
            raw_type,
            owner_type: None,
            actual_type_arguments,
        }))
    }

    /// Creates a parameterized member type, e.g. `Outer<String>.Inner<Integer>`.
    pub fn parameterized_with_owner(
        owner_type: Type,
        raw_type: Class,
        actual_type_arguments: Vec<Type>,
    ) -> Type {
        Type::Parameterized(Arc::new(ParameterizedType {
            raw_type,
            owner_type: Some(owner_type),
            actual_type_arguments,
        }))
    }

    /// Creates an unbounded wildcard `?`.
    pub fn wildcard() -> Type {
        Self::wildcard_with_bounds(vec![], vec![])
    }

    /// Creates `? extends bound`.
    pub fn wildcard_extends(bound: Type) -> Type {
        Self::wildcard_with_bounds(vec![bound], vec![])
    }

    /// Creates `? super bound`.
    pub fn wildcard_super(bound: Type) -> Type {
        Self::wildcard_with_bounds(vec![], vec![bound])
    }

    /// Creates a wildcard. Missing upper bounds default to the root class.
    pub fn wildcard_with_bounds(upper_bounds: Vec<Type>, lower_bounds: Vec<Type>) -> Type {
        let upper_bounds = if upper_bounds.is_empty() {
            vec![Type::class(Class::object())]
        } else {
            upper_bounds
        };

        Type::Wildcard(Arc::new(WildcardType {
            upper_bounds,
            lower_bounds,
        }))
    }

    pub fn generic_array(generic_component_type: Type) -> Type {
        Type::GenericArray(Arc::new(GenericArrayType {
            generic_component_type,
        }))
    }

    /// Returns the type with all proxies replaced by the types they stand for. Proxies whose
    /// provider no longer yields a type are returned as-is.
    pub fn unwrapped(&self) -> Cow<'_, Type> {
        match self {
            Type::Proxy(proxy) => match proxy.provided_type() {
                Some(ty) => Cow::Owned(ty.unwrapped().into_owned()),
                None => Cow::Borrowed(self),
            },
            _ => Cow::Borrowed(self),
        }
    }

    /// Returns the shape of this type, looking through proxies.
    pub fn kind(&self) -> TypeKind {
        match &*self.unwrapped() {
            Type::Class(_) => TypeKind::Class,
            Type::Parameterized(_) => TypeKind::Parameterized,
            Type::Variable(_) => TypeKind::Variable,
            Type::Wildcard(_) => TypeKind::Wildcard,
            Type::GenericArray(_) => TypeKind::GenericArray,
            Type::Proxy(_) | Type::Empty => TypeKind::Empty,
        }
    }

    /// Checks if this type can be persisted directly, without wrapping.
    #[inline]
    pub fn is_serializable(&self) -> bool {
        matches!(self, Type::Class(_) | Type::Proxy(_))
    }

    pub fn as_class(&self) -> Option<Class> {
        match &*self.unwrapped() {
            Type::Class(class) => Some(class.clone()),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<TypeVariable> {
        match &*self.unwrapped() {
            Type::Variable(variable) => Some(variable.clone()),
            _ => None,
        }
    }

    /// Returns the raw class this type erases to.
    pub fn erasure(&self) -> Class {
        match &*self.unwrapped() {
            Type::Class(class) => class.clone(),
            Type::Parameterized(parameterized) => parameterized.raw_type.clone(),
            Type::GenericArray(array) => Class::array_of(&array.generic_component_type.erasure()),
            Type::Variable(variable) => variable
                .bounds()
                .first()
                .map(Type::erasure)
                .unwrap_or_else(Class::object),
            Type::Wildcard(wildcard) => wildcard
                .upper_bounds
                .first()
                .map(Type::erasure)
                .unwrap_or_else(Class::object),
            Type::Proxy(_) | Type::Empty => Class::object(),
        }
    }

    fn invoke_single(&self, accessor: TypeAccessor) -> Option<Type> {
        match self {
            Type::Proxy(proxy) => proxy.invoke_single(accessor),
            _ => accessor.single(self),
        }
    }

    fn invoke_many(&self, accessor: TypeAccessor) -> Vec<Type> {
        match self {
            Type::Proxy(proxy) => proxy.invoke_many(accessor),
            _ => accessor.many(self),
        }
    }

    /// Raw class of a parameterized type.
    pub fn raw_type(&self) -> Option<Type> {
        self.invoke_single(TypeAccessor::RawType)
    }

    pub fn owner_type(&self) -> Option<Type> {
        self.invoke_single(TypeAccessor::OwnerType)
    }

    pub fn actual_type_arguments(&self) -> Vec<Type> {
        self.invoke_many(TypeAccessor::ActualTypeArguments)
    }

    pub fn generic_component_type(&self) -> Option<Type> {
        self.invoke_single(TypeAccessor::GenericComponentType)
    }

    /// Bounds of a type variable.
    pub fn bounds(&self) -> Vec<Type> {
        self.invoke_many(TypeAccessor::Bounds)
    }

    pub fn upper_bounds(&self) -> Vec<Type> {
        self.invoke_many(TypeAccessor::UpperBounds)
    }

    pub fn lower_bounds(&self) -> Vec<Type> {
        self.invoke_many(TypeAccessor::LowerBounds)
    }

    /// Returns a human-readable name, e.g. `java.util.List<java.lang.String>`.
    pub fn type_name(&self) -> String {
        match self {
            Type::Class(class) => class.name().to_string(),
            Type::Parameterized(parameterized) => {
                let raw_name = parameterized.raw_type.name();
                let mut name = match &parameterized.owner_type {
                    Some(owner) => format!(
                        "{}${}",
                        owner.type_name(),
                        raw_name.rsplit('$').next().unwrap_or(raw_name)
                    ),
                    None => raw_name.to_string(),
                };

                if !parameterized.actual_type_arguments.is_empty() {
                    name.push('<');
                    name.push_str(
                        &parameterized
                            .actual_type_arguments
                            .iter()
                            .map(Type::type_name)
                            .join(", "),
                    );
                    name.push('>');
                }

                name
            }
            Type::Variable(variable) => variable.name().to_string(),
            Type::Wildcard(wildcard) => {
                if !wildcard.lower_bounds.is_empty() {
                    format!(
                        "? super {}",
                        wildcard.lower_bounds.iter().map(Type::type_name).join(" & ")
                    )
                } else if wildcard.upper_bounds.is_empty()
                    || wildcard.upper_bounds[0].as_class().as_ref().map(Class::name)
                        == Some(OBJECT)
                {
                    "?".to_string()
                } else {
                    format!(
                        "? extends {}",
                        wildcard.upper_bounds.iter().map(Type::type_name).join(" & ")
                    )
                }
            }
            Type::GenericArray(array) => {
                format!("{}[]", array.generic_component_type.type_name())
            }
            Type::Proxy(proxy) => proxy
                .provided_type()
                .map(|ty| ty.type_name())
                .unwrap_or_else(|| "?".to_string()),
            Type::Empty => "<empty>".to_string(),
        }
    }

    /// Converts this type to its persistable form. Proxies are persisted as the description of
    /// their provider, not the type they currently stand for.
    pub fn to_schema(&self) -> TypeSchema {
        match self {
            Type::Class(class) => TypeSchema::Class(class.name().to_string()),
            Type::Parameterized(parameterized) => TypeSchema::Parameterized {
                raw: parameterized.raw_type.name().to_string(),
                owner: parameterized
                    .owner_type
                    .as_ref()
                    .map(|owner| Box::new(owner.to_schema())),
                arguments: parameterized
                    .actual_type_arguments
                    .iter()
                    .map(Type::to_schema)
                    .collect(),
            },
            Type::Variable(variable) => TypeSchema::Variable {
                name: variable.name().to_string(),
                declaration: variable.declaration().clone(),
            },
            Type::Wildcard(wildcard) => TypeSchema::Wildcard {
                upper: wildcard.upper_bounds.iter().map(Type::to_schema).collect(),
                lower: wildcard.lower_bounds.iter().map(Type::to_schema).collect(),
            },
            Type::GenericArray(array) => {
                TypeSchema::GenericArray(Box::new(array.generic_component_type.to_schema()))
            }
            Type::Proxy(proxy) => TypeSchema::Provided(SerializedTypeProvider::new(
                proxy.type_provider().descriptor(),
            )),
            Type::Empty => TypeSchema::Empty,
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (&*self.unwrapped(), &*other.unwrapped()) {
            (Type::Class(first), Type::Class(second)) => first == second,
            (Type::Parameterized(first), Type::Parameterized(second)) => first == second,
            (Type::Variable(first), Type::Variable(second)) => first == second,
            (Type::Wildcard(first), Type::Wildcard(second)) => first == second,
            (Type::GenericArray(first), Type::GenericArray(second)) => first == second,
            (Type::Proxy(first), Type::Proxy(second)) => first.ptr_eq(second),
            (Type::Empty, Type::Empty) => true,
            _ => false,
        }
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &*self.unwrapped() {
            Type::Class(class) => {
                0u8.hash(state);
                class.hash(state);
            }
            Type::Parameterized(parameterized) => {
                1u8.hash(state);
                parameterized.hash(state);
            }
            Type::Variable(variable) => {
                2u8.hash(state);
                variable.hash(state);
            }
            Type::Wildcard(wildcard) => {
                3u8.hash(state);
                wildcard.hash(state);
            }
            Type::GenericArray(array) => {
                4u8.hash(state);
                array.hash(state);
            }
            Type::Proxy(proxy) => {
                5u8.hash(state);
                proxy.ptr_hash(state);
            }
            Type::Empty => 6u8.hash(state),
        }
    }
}

impl Debug for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Proxy(_) => write!(f, "Proxy({})", self.type_name()),
            _ => write!(f, "Type({})", self.type_name()),
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.type_name())
    }
}

impl From<Class> for Type {
    fn from(value: Class) -> Self {
        Type::Class(value)
    }
}

/// Persistable form of a [Type]. Classes are referenced by name and must be resolved against a
/// [TypeRegistry](crate::registry::TypeRegistry) to become live types again.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeSchema {
    Class(String),
    Parameterized {
        raw: String,
        owner: Option<Box<TypeSchema>>,
        arguments: Vec<TypeSchema>,
    },
    Variable {
        name: String,
        declaration: GenericDeclaration,
    },
    Wildcard {
        upper: Vec<TypeSchema>,
        lower: Vec<TypeSchema>,
    },
    GenericArray(Box<TypeSchema>),
    Provided(SerializedTypeProvider),
    Empty,
}

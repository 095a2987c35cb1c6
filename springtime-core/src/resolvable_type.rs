//! Generic type resolution.
//!
//! A [ResolvableType] wraps a [Type] together with the context needed to resolve its type
//! variables, and provides access to its super types, interfaces and generic parameters, with the
//! ability to ultimately resolve everything down to raw [Class]es:
//!
//! ```
//! use springtime_core::class::Class;
//! use springtime_core::config::CoreConfig;
//! use springtime_core::resolvable_type::ResolvableTypeFactory;
//! use springtime_core::types::Type;
//!
//! let list = Class::builder("java.util.List").interface().type_parameter("E").build();
//! let service = Class::builder("test.Service")
//!     .field("names", Type::parameterized(list.clone(), vec![Type::class(Class::string())]))
//!     .build();
//!
//! let factory = ResolvableTypeFactory::from_config(&CoreConfig::default());
//! let ty = factory.for_field(&service.declared_field("names").unwrap()).unwrap();
//!
//! assert_eq!(ty.resolve(), Some(list));
//! assert_eq!(ty.resolve_generic(&[0]), Some(Class::string()));
//! ```
//!
//! Types are created by a [ResolvableTypeFactory], which caches composite types. Everything
//! derived from a type is computed lazily, and the parts which don't refer back to the type itself
//! (resolved class, component type, generics of non-class types, hash) are memoized. Variables
//! which cannot be resolved yield [ResolvableType::none] instead of failing, which allows
//! best-effort matching of partially known types.

mod factory;
mod variable_resolver;

use crate::class::Class;
use crate::type_provider::{TypeProviderPtr, TypeSource};
use crate::types::{Type, TypeKind, TypeVariable};
pub use factory::ResolvableTypeFactory;
use fxhash::{FxHashMap, FxHasher};
use itertools::Itertools;
use once_cell::sync::{Lazy, OnceCell};
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};
pub use variable_resolver::{
    DefaultVariableResolver, TypeVariablesVariableResolver, VariableResolver,
    VariableResolverPtr, VariableSource,
};

#[cfg(test)]
pub use variable_resolver::MockVariableResolver;

static NONE: Lazy<ResolvableType> =
    Lazy::new(|| ResolvableType::new_uncached(Type::Empty, None, None, Weak::new()));

/// A [Type] with its variable resolution context. See module documentation for details.
///
/// Two types are equal when their underlying types are equal, regardless of the context they
/// were created in.
#[derive(Clone)]
pub struct ResolvableType {
    inner: Arc<ResolvableTypeInner>,
}

struct ResolvableTypeInner {
    ty: Type,
    provider: Option<TypeProviderPtr>,
    variable_resolver: Option<VariableResolverPtr>,
    raw_class_matching: bool,
    factory: Weak<ResolvableTypeFactory>,
    resolved: OnceCell<Option<Class>>,
    component_type: OnceCell<ResolvableType>,
    generics: OnceCell<Vec<ResolvableType>>,
    hash: OnceCell<u64>,
}

impl ResolvableTypeInner {
    fn new(
        ty: Type,
        provider: Option<TypeProviderPtr>,
        variable_resolver: Option<VariableResolverPtr>,
        factory: Weak<ResolvableTypeFactory>,
    ) -> Self {
        Self {
            ty,
            provider,
            variable_resolver,
            raw_class_matching: false,
            factory,
            resolved: OnceCell::new(),
            component_type: OnceCell::new(),
            generics: OnceCell::new(),
            hash: OnceCell::new(),
        }
    }
}

impl ResolvableType {
    fn new_uncached(
        ty: Type,
        provider: Option<TypeProviderPtr>,
        variable_resolver: Option<VariableResolverPtr>,
        factory: Weak<ResolvableTypeFactory>,
    ) -> Self {
        Self::from_inner(Arc::new(ResolvableTypeInner::new(
            ty,
            provider,
            variable_resolver,
            factory,
        )))
    }

    fn new_raw_class(class: Class, factory: Weak<ResolvableTypeFactory>) -> Self {
        let mut inner = ResolvableTypeInner::new(Type::class(class), None, None, factory);
        inner.raw_class_matching = true;
        Self::from_inner(Arc::new(inner))
    }

    fn new_array(
        array_class: Class,
        component_type: ResolvableType,
        factory: Weak<ResolvableTypeFactory>,
    ) -> Self {
        let inner = ResolvableTypeInner::new(Type::class(array_class), None, None, factory);
        inner.component_type.get_or_init(|| component_type);
        Self::from_inner(Arc::new(inner))
    }

    #[inline]
    fn from_inner(inner: Arc<ResolvableTypeInner>) -> Self {
        Self { inner }
    }

    #[inline]
    fn downgrade(&self) -> Weak<ResolvableTypeInner> {
        Arc::downgrade(&self.inner)
    }

    /// Returns the type representing absent or unresolvable types.
    pub fn none() -> Self {
        NONE.clone()
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self.inner.ty, Type::Empty)
    }

    /// Checks if both types are the same instance, as opposed to being equal.
    #[inline]
    pub fn ptr_eq(&self, other: &ResolvableType) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns the underlying type, which might be a proxy.
    #[inline]
    pub fn get_type(&self) -> &Type {
        &self.inner.ty
    }

    #[inline]
    pub fn type_provider(&self) -> Option<&TypeProviderPtr> {
        self.inner.provider.as_ref()
    }

    /// Returns the element this type originates from, if known.
    pub fn source(&self) -> Option<TypeSource> {
        self.inner
            .provider
            .as_ref()
            .and_then(|provider| provider.source())
    }

    #[inline]
    pub fn variable_resolver(&self) -> Option<&VariableResolverPtr> {
        self.inner.variable_resolver.as_ref()
    }

    fn derive(&self, ty: Option<Type>, resolver: Option<VariableResolverPtr>) -> ResolvableType {
        if let Some(factory) = self.inner.factory.upgrade() {
            return factory.create(ty, None, resolver);
        }

        match ty {
            Some(Type::Empty) | None => ResolvableType::none(),
            Some(ty) => ResolvableType::new_uncached(ty, None, resolver, Weak::new()),
        }
    }

    fn derive_with_own_resolver(&self, ty: Option<Type>) -> ResolvableType {
        self.derive(ty, self.inner.variable_resolver.clone())
    }

    /// Resolves this type to a raw class, if possible. Computed once.
    pub fn resolve(&self) -> Option<Class> {
        self.inner
            .resolved
            .get_or_init(|| match self.inner.ty.kind() {
                TypeKind::Empty => None,
                TypeKind::Class => self.inner.ty.as_class(),
                TypeKind::GenericArray => self
                    .get_component_type()
                    .resolve()
                    .map(|component| Class::array_of(&component)),
                _ => self.resolve_type().resolve(),
            })
            .clone()
    }

    /// Resolves this type to a raw class, returning `fallback` if it cannot be resolved.
    pub fn resolve_or(&self, fallback: &Class) -> Class {
        self.resolve().unwrap_or_else(|| fallback.clone())
    }

    /// Resolves this type to a raw class, falling back to the root class.
    pub fn to_class(&self) -> Class {
        self.resolve().unwrap_or_else(Class::object)
    }

    /// Resolves this type by a single level: parameterized types to their raw class, wildcards to
    /// their bounds and variables to what the variable resolver or their bounds say. Other types
    /// resolve to [ResolvableType::none].
    pub fn resolve_type(&self) -> ResolvableType {
        let ty = &self.inner.ty;
        match ty.kind() {
            TypeKind::Parameterized => self.derive_with_own_resolver(ty.raw_type()),
            TypeKind::Wildcard => {
                let resolved =
                    resolve_bounds(ty.upper_bounds()).or_else(|| resolve_bounds(ty.lower_bounds()));
                self.derive_with_own_resolver(resolved)
            }
            TypeKind::Variable => {
                let resolved = self
                    .inner
                    .variable_resolver
                    .as_ref()
                    .zip(ty.as_variable())
                    .and_then(|(resolver, variable)| resolver.resolve_variable(&variable));

                match resolved {
                    Some(resolved) => resolved,
                    None => self.derive_with_own_resolver(resolve_bounds(ty.bounds())),
                }
            }
            _ => ResolvableType::none(),
        }
    }

    /// Returns the component type of an array type, or [ResolvableType::none] for other types.
    /// Computed once.
    pub fn get_component_type(&self) -> ResolvableType {
        if self.is_none() {
            return ResolvableType::none();
        }

        self.inner
            .component_type
            .get_or_init(|| {
                let ty = &self.inner.ty;
                match ty.kind() {
                    TypeKind::Class => self.derive_with_own_resolver(
                        ty.as_class()
                            .and_then(|class| class.component_type())
                            .map(Type::Class),
                    ),
                    TypeKind::GenericArray => {
                        self.derive_with_own_resolver(ty.generic_component_type())
                    }
                    _ => self.resolve_type().get_component_type(),
                }
            })
            .clone()
    }

    pub fn is_array(&self) -> bool {
        match self.inner.ty.kind() {
            TypeKind::Empty => false,
            TypeKind::Class => self
                .inner
                .ty
                .as_class()
                .map(|class| class.is_array())
                .unwrap_or(false),
            TypeKind::GenericArray => true,
            _ => self.resolve_type().is_array(),
        }
    }

    /// Returns the generic parameters of this type. Classes yield their type parameters, resolved
    /// against the class itself.
    pub fn get_generics(&self) -> Vec<ResolvableType> {
        let ty = &self.inner.ty;
        match ty.kind() {
            TypeKind::Empty => vec![],
            // derived from the type itself, so memoizing would create a reference cycle
            TypeKind::Class => {
                let resolver = self.as_variable_resolver();
                ty.as_class()
                    .map(|class| {
                        class
                            .type_parameters()
                            .iter()
                            .map(|variable| {
                                self.derive(
                                    Some(Type::Variable(variable.clone())),
                                    resolver.clone(),
                                )
                            })
                            .collect()
                    })
                    .unwrap_or_default()
            }
            TypeKind::Parameterized => self
                .inner
                .generics
                .get_or_init(|| {
                    ty.actual_type_arguments()
                        .into_iter()
                        .map(|argument| self.derive_with_own_resolver(Some(argument)))
                        .collect()
                })
                .clone(),
            _ => self
                .inner
                .generics
                .get_or_init(|| self.resolve_type().get_generics())
                .clone(),
        }
    }

    /// Returns the generic parameter at the given nesting path, e.g. `&[1, 0]` for `Integer` in
    /// `Map<String, List<Integer>>`. An empty path selects the first generic parameter. Missing
    /// generics yield [ResolvableType::none].
    pub fn get_generic(&self, indexes: &[usize]) -> ResolvableType {
        if indexes.is_empty() {
            return self
                .get_generics()
                .into_iter()
                .next()
                .unwrap_or_else(ResolvableType::none);
        }

        let mut generic = self.clone();
        for &index in indexes {
            match generic.get_generics().into_iter().nth(index) {
                Some(next) => generic = next,
                None => return ResolvableType::none(),
            }
        }

        generic
    }

    #[inline]
    pub fn has_generics(&self) -> bool {
        !self.get_generics().is_empty()
    }

    /// Checks if any generic parameter of this type, or of its generic supertypes, cannot be
    /// resolved. Raw implementations of generic interfaces count as unresolvable.
    pub fn has_unresolvable_generics(&self) -> bool {
        if self.is_none() {
            return false;
        }

        if self.get_generics().iter().any(|generic| {
            generic.is_unresolvable_type_variable() || generic.is_wildcard_without_bounds()
        }) {
            return true;
        }

        match self.resolve() {
            Some(resolved) => {
                let raw_generic_interface = resolved.generic_interfaces().iter().any(|interface| {
                    matches!(interface, Type::Class(_))
                        && self.derive(Some(interface.clone()), None).has_generics()
                });

                raw_generic_interface || self.get_super_type().has_unresolvable_generics()
            }
            None => false,
        }
    }

    fn is_unresolvable_type_variable(&self) -> bool {
        let variable = match self.inner.ty.as_variable() {
            Some(variable) => variable,
            None => return false,
        };

        match &self.inner.variable_resolver {
            Some(resolver) => resolver
                .resolve_variable(&variable)
                .map(|resolved| resolved.is_unresolvable_type_variable())
                .unwrap_or(true),
            None => true,
        }
    }

    fn is_wildcard_without_bounds(&self) -> bool {
        let ty = &self.inner.ty;
        if ty.kind() != TypeKind::Wildcard || !ty.lower_bounds().is_empty() {
            return false;
        }

        let upper_bounds = ty.upper_bounds();
        upper_bounds.is_empty()
            || (upper_bounds.len() == 1 && upper_bounds[0] == Type::class(Class::object()))
    }

    /// Resolves the generic parameter at the given nesting path to a raw class.
    #[inline]
    pub fn resolve_generic(&self, indexes: &[usize]) -> Option<Class> {
        self.get_generic(indexes).resolve()
    }

    pub fn resolve_generics(&self) -> Vec<Option<Class>> {
        self.get_generics()
            .iter()
            .map(ResolvableType::resolve)
            .collect()
    }

    /// Resolves all generic parameters, replacing unresolvable ones with `fallback`.
    pub fn resolve_generics_or(&self, fallback: &Class) -> Vec<Class> {
        self.get_generics()
            .iter()
            .map(|generic| generic.resolve_or(fallback))
            .collect()
    }

    /// Returns the generic superclass, with variables resolved against this type.
    pub fn get_super_type(&self) -> ResolvableType {
        self.resolve()
            .and_then(|resolved| resolved.generic_superclass().cloned())
            .map(|superclass| self.derive(Some(superclass), self.as_variable_resolver()))
            .unwrap_or_else(ResolvableType::none)
    }

    /// Returns the generic interfaces directly implemented by this type, with variables resolved
    /// against this type.
    pub fn get_interfaces(&self) -> Vec<ResolvableType> {
        let resolved = match self.resolve() {
            Some(resolved) => resolved,
            None => return vec![],
        };

        let resolver = self.as_variable_resolver();
        resolved
            .generic_interfaces()
            .iter()
            .map(|interface| self.derive(Some(interface.clone()), resolver.clone()))
            .collect()
    }

    /// Views this type as the given supertype, e.g. `ArrayList<String>` as `List<String>`.
    /// Returns [ResolvableType::none] if the class is not a supertype of this type.
    pub fn as_type(&self, class: &Class) -> ResolvableType {
        if self.is_none() {
            return ResolvableType::none();
        }

        match self.resolve() {
            Some(resolved) if &resolved != class => {}
            _ => return self.clone(),
        }

        self.get_interfaces()
            .iter()
            .map(|interface| interface.as_type(class))
            .find(|found| !found.is_none())
            .unwrap_or_else(|| self.get_super_type().as_type(class))
    }

    /// Returns the type at the given nesting level, where level 1 is this type and each further
    /// level descends into array components or generic parameters. Unless a type index is given
    /// for a level, the last generic parameter is used. Types without generics are viewed through
    /// their supertypes.
    pub fn get_nested(
        &self,
        nesting_level: usize,
        type_indexes_per_level: Option<&FxHashMap<usize, usize>>,
    ) -> ResolvableType {
        let mut result = self.clone();
        for level in 2..=nesting_level {
            if result.is_array() {
                result = result.get_component_type();
                continue;
            }

            while !result.is_none() && !result.has_generics() {
                result = result.get_super_type();
            }

            let generics = result.get_generics();
            result = type_indexes_per_level
                .and_then(|indexes| indexes.get(&level).copied())
                .or_else(|| generics.len().checked_sub(1))
                .and_then(|index| generics.into_iter().nth(index))
                .unwrap_or_else(ResolvableType::none);
        }

        result
    }

    /// Resolves a variable in the context of this type. Parameterized types bind variables of
    /// their raw class by name, falling back to their owner type. Returns `None` for unknown
    /// variables.
    pub fn resolve_variable(&self, variable: &TypeVariable) -> Option<ResolvableType> {
        let ty = &self.inner.ty;
        match ty.kind() {
            TypeKind::Variable => return self.resolve_type().resolve_variable(variable),
            TypeKind::Parameterized => {
                let resolved = self.resolve()?;
                let bound = resolved
                    .type_parameters()
                    .iter()
                    .position(|candidate| candidate.name() == variable.name())
                    .and_then(|index| ty.actual_type_arguments().into_iter().nth(index));

                if let Some(bound) = bound {
                    return Some(self.derive_with_own_resolver(Some(bound)));
                }

                if let Some(owner) = ty.owner_type() {
                    return self
                        .derive_with_own_resolver(Some(owner))
                        .resolve_variable(variable);
                }
            }
            TypeKind::Wildcard => {
                if let Some(resolved) = self.resolve_type().resolve_variable(variable) {
                    return Some(resolved);
                }
            }
            _ => {}
        }

        self.inner
            .variable_resolver
            .as_ref()
            .and_then(|resolver| resolver.resolve_variable(variable))
    }

    /// Returns a resolver which resolves variables against this type.
    pub fn as_variable_resolver(&self) -> Option<VariableResolverPtr> {
        if self.is_none() {
            None
        } else {
            Some(Arc::new(DefaultVariableResolver::new(self.clone())))
        }
    }

    /// Checks if a value of the `other` type can be used where this type is expected, taking
    /// generics into account. Generic parameters have to match exactly, unless bounded by
    /// wildcards. Unresolvable generics match anything.
    pub fn is_assignable_from(&self, other: &ResolvableType) -> bool {
        self.is_assignable_from_matched(other, None)
    }

    /// Checks if a value of the given class can be used where this type is expected.
    pub fn is_instance_of_class(&self, class: &Class) -> bool {
        self.is_assignable_from(&self.derive(Some(Type::class(class.clone())), None))
    }

    fn is_assignable_from_matched(
        &self,
        other: &ResolvableType,
        matched_before: Option<&mut Vec<(Type, Type)>>,
    ) -> bool {
        if self.is_none() || other.is_none() {
            return false;
        }

        if self.inner.raw_class_matching {
            return match (self.resolve(), other.resolve()) {
                (Some(ours), Some(theirs)) => ours.is_assignable_from(&theirs),
                _ => false,
            };
        }

        if let Some(matched) = matched_before.as_deref() {
            if matched
                .iter()
                .any(|(ours, theirs)| ours == &self.inner.ty && theirs == &other.inner.ty)
            {
                return true;
            }
        }

        if self.is_array() {
            return other.is_array()
                && self
                    .get_component_type()
                    .is_assignable_from(&other.get_component_type());
        }

        let our_bounds = WildcardBounds::of(self);
        if let Some(their_bounds) = WildcardBounds::of(other) {
            return our_bounds
                .map(|our_bounds| {
                    our_bounds.kind == their_bounds.kind
                        && our_bounds.is_assignable_from(&their_bounds.bounds)
                })
                .unwrap_or(false);
        }

        if let Some(our_bounds) = our_bounds {
            return our_bounds.is_assignable_from(std::slice::from_ref(other));
        }

        let mut exact_match = matched_before.is_some();
        let mut check_generics = true;
        let mut our_resolved = None;

        if let Some(variable) = self.inner.ty.as_variable() {
            our_resolved = self
                .inner
                .variable_resolver
                .as_ref()
                .and_then(|resolver| resolver.resolve_variable(&variable))
                .and_then(|resolved| resolved.resolve());

            if our_resolved.is_none() {
                // try resolving against the context of the other type
                if let Some(resolved) = other
                    .inner
                    .variable_resolver
                    .as_ref()
                    .and_then(|resolver| resolver.resolve_variable(&variable))
                {
                    our_resolved = resolved.resolve();
                    check_generics = false;
                }
            }

            if our_resolved.is_none() {
                exact_match = false;
            }
        }

        let our_resolved = our_resolved.unwrap_or_else(|| self.to_class());
        let their_resolved = other.to_class();

        let raw_match = if exact_match {
            our_resolved == their_resolved
        } else {
            our_resolved.is_assignable_from(&their_resolved)
        };

        if !raw_match {
            return false;
        }

        if !check_generics {
            return true;
        }

        let our_generics = self.get_generics();
        let their_generics = other.as_type(&our_resolved).get_generics();
        if our_generics.len() != their_generics.len() {
            return false;
        }

        let mut local = vec![];
        let matched = match matched_before {
            Some(matched) => matched,
            None => &mut local,
        };
        matched.push((self.inner.ty.clone(), other.inner.ty.clone()));

        our_generics
            .iter()
            .zip(&their_generics)
            .all(|(ours, theirs)| {
                theirs.is_unresolvable_type_variable()
                    || ours.is_assignable_from_matched(theirs, Some(&mut *matched))
            })
    }

    /// Returns the memoized hash of the underlying type.
    pub fn hash_code(&self) -> u64 {
        *self.inner.hash.get_or_init(|| {
            let mut hasher = FxHasher::default();
            self.inner.ty.hash(&mut hasher);
            hasher.finish()
        })
    }
}

fn resolve_bounds(bounds: Vec<Type>) -> Option<Type> {
    bounds
        .into_iter()
        .next()
        .filter(|bound| bound != &Type::class(Class::object()))
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum BoundsKind {
    Upper,
    Lower,
}

/// Bounds of a type which resolves to a wildcard.
struct WildcardBounds {
    kind: BoundsKind,
    bounds: Vec<ResolvableType>,
}

impl WildcardBounds {
    fn of(ty: &ResolvableType) -> Option<Self> {
        let mut wildcard = ty.clone();
        while wildcard.inner.ty.kind() != TypeKind::Wildcard {
            if wildcard.is_none() {
                return None;
            }

            wildcard = wildcard.resolve_type();
        }

        let lower_bounds = wildcard.inner.ty.lower_bounds();
        let (kind, bounds) = if lower_bounds.is_empty() {
            (BoundsKind::Upper, wildcard.inner.ty.upper_bounds())
        } else {
            (BoundsKind::Lower, lower_bounds)
        };

        Some(Self {
            kind,
            bounds: bounds
                .into_iter()
                .map(|bound| ty.derive_with_own_resolver(Some(bound)))
                .collect(),
        })
    }

    fn is_assignable_from(&self, types: &[ResolvableType]) -> bool {
        self.bounds.iter().all(|bound| {
            types.iter().all(|ty| match self.kind {
                BoundsKind::Upper => bound.is_assignable_from(ty),
                BoundsKind::Lower => ty.is_assignable_from(bound),
            })
        })
    }
}

impl PartialEq for ResolvableType {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.inner.ty == other.inner.ty
    }
}

impl Eq for ResolvableType {}

impl Hash for ResolvableType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash_code().hash(state);
    }
}

impl Display for ResolvableType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_array() {
            return write!(f, "{}[]", self.get_component_type());
        }

        let resolved = match self.resolve() {
            Some(resolved) => resolved,
            None => return f.write_str("?"),
        };

        if let Some(variable) = self.inner.ty.as_variable() {
            let bound = self
                .inner
                .variable_resolver
                .as_ref()
                .and_then(|resolver| resolver.resolve_variable(&variable));

            // bounds are skipped, since they might refer back to the variable
            if bound.is_none() {
                return f.write_str("?");
            }
        }

        let generics = self.get_generics();
        if generics.is_empty() {
            f.write_str(resolved.name())
        } else {
            write!(f, "{}<{}>", resolved.name(), generics.iter().join(", "))
        }
    }
}

impl Debug for ResolvableType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ResolvableType({})", self)
    }
}

use crate::assert;
use crate::class::{Class, Constructor, Field, Method};
use crate::config::CoreConfig;
use crate::error::{AssertionError, TypeError};
use crate::method_parameter::MethodParameter;
use crate::resolvable_type::variable_resolver::{
    TypeVariablesVariableResolver, VariableResolverPtr, VariableSource,
};
use crate::resolvable_type::ResolvableType;
use crate::serializable_type_wrapper::SerializableTypeWrapper;
use crate::type_provider::{
    FieldTypeProvider, MethodParameterTypeProvider, ProviderDescriptor, TypeProviderPtr,
};
use crate::types::Type;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use fxhash::FxBuildHasher;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
struct CacheKey {
    ty: Type,
    provider: Option<ProviderDescriptor>,
    resolver: Option<VariableSource>,
}

/// Creates [ResolvableType]s, reusing instances for equal composite types.
///
/// The cache holds weak references, so it never keeps types alive by itself. Once it reaches its
/// capacity, entries for dropped types are purged; if the cache is still full afterwards, new
/// types are handed out without being cached. Concurrent creation of the same type might produce
/// redundant instances, but only one of them ends up in the cache.
///
/// Types created by the factory refer back to it, so types derived from them (generics, super
/// types, component types) go through the same cache.
pub struct ResolvableTypeFactory {
    wrapper: Arc<SerializableTypeWrapper>,
    cache: DashMap<CacheKey, Weak<super::ResolvableTypeInner>, FxBuildHasher>,
    capacity: usize,
    this: Weak<ResolvableTypeFactory>,
}

impl ResolvableTypeFactory {
    pub fn new(wrapper: Arc<SerializableTypeWrapper>, capacity: usize) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            wrapper,
            cache: DashMap::with_hasher(FxBuildHasher::default()),
            capacity,
            this: this.clone(),
        })
    }

    pub fn from_config(config: &CoreConfig) -> Arc<Self> {
        Self::new(
            SerializableTypeWrapper::from_config(config),
            config.resolvable_type_cache_capacity,
        )
    }

    #[inline]
    pub fn wrapper(&self) -> &Arc<SerializableTypeWrapper> {
        &self.wrapper
    }

    /// Number of cache entries, including ones not yet purged.
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    /// Returns a type for the given class, using its type parameters as generics.
    pub fn for_class(&self, class: &Class) -> ResolvableType {
        self.create(Some(Type::class(class.clone())), None, None)
    }

    /// Returns a type for the given class, which matches other types by their raw classes only.
    pub fn for_raw_class(&self, class: &Class) -> ResolvableType {
        ResolvableType::new_raw_class(class.clone(), self.this.clone())
    }

    /// Returns a parameterized type for the given class with its type parameters bound to
    /// `generics`.
    pub fn for_class_with_generics(
        &self,
        class: &Class,
        generics: &[ResolvableType],
    ) -> Result<ResolvableType, AssertionError> {
        let variables = class.type_parameters();
        assert::is_true(
            variables.len() == generics.len(),
            format!(
                "Mismatched number of generics specified for {}: expected {}, got {}",
                class.name(),
                variables.len(),
                generics.len()
            ),
        )?;

        let arguments = variables
            .iter()
            .zip(generics)
            .map(|(variable, generic)| match generic.get_type() {
                Type::Empty => Type::Variable(variable.clone()),
                ty if ty.as_variable().is_some() => Type::Variable(variable.clone()),
                ty => ty.clone(),
            })
            .collect();

        let resolver = TypeVariablesVariableResolver::new(variables.to_vec(), generics.to_vec());
        Ok(self.create(
            Some(Type::parameterized(class.clone(), arguments)),
            None,
            Some(Arc::new(resolver)),
        ))
    }

    /// Shorthand for [Self::for_class_with_generics] with plain classes as generics.
    pub fn for_class_with_generic_classes(
        &self,
        class: &Class,
        generics: &[Class],
    ) -> Result<ResolvableType, AssertionError> {
        let generics: Vec<_> = generics
            .iter()
            .map(|generic| self.for_class(generic))
            .collect();
        self.for_class_with_generics(class, &generics)
    }

    /// Returns a type for the given type without any variable resolution context.
    pub fn for_type(&self, ty: Type) -> ResolvableType {
        self.create(Some(ty), None, None)
    }

    /// Returns a type with variables resolved against `owner`, e.g. the class declaring the
    /// member the type comes from.
    pub fn for_type_with_owner(&self, ty: Type, owner: &ResolvableType) -> ResolvableType {
        self.create(Some(ty), None, owner.as_variable_resolver())
    }

    /// General entry point. When no type is given, it's taken from the provider through the
    /// [SerializableTypeWrapper]. No type and no provider yield [ResolvableType::none].
    pub fn for_type_with_provider(
        &self,
        ty: Option<Type>,
        provider: Option<TypeProviderPtr>,
        resolver: Option<VariableResolverPtr>,
    ) -> Result<ResolvableType, TypeError> {
        let ty = match (ty, &provider) {
            (Some(ty), _) => Some(ty),
            (None, Some(provider)) => self.wrapper.for_type_provider(provider.clone())?,
            (None, None) => None,
        };

        Ok(self.create(ty, provider, resolver))
    }

    /// Returns the generic type of a field.
    pub fn for_field(&self, field: &Field) -> Result<ResolvableType, TypeError> {
        self.for_type_with_provider(
            None,
            Some(Arc::new(FieldTypeProvider::new(field.clone()))),
            None,
        )
    }

    /// Returns the generic type of a field, with variables resolved against the given
    /// implementation of the declaring class.
    pub fn for_field_with_implementation(
        &self,
        field: &Field,
        implementation: &Class,
    ) -> Result<ResolvableType, TypeError> {
        let owner = self
            .for_class(implementation)
            .as_type(field.declaring_class());

        self.for_type_with_provider(
            None,
            Some(Arc::new(FieldTypeProvider::new(field.clone()))),
            owner.as_variable_resolver(),
        )
    }

    /// Returns the type of a method parameter at its nesting level, with variables resolved
    /// against the containing class.
    pub fn for_method_parameter(
        &self,
        method_parameter: &MethodParameter,
    ) -> Result<ResolvableType, TypeError> {
        let owner = self
            .for_class(method_parameter.containing_class())
            .as_type(method_parameter.declaring_class());

        self.for_type_with_provider(
            None,
            Some(Arc::new(MethodParameterTypeProvider::new(
                method_parameter.clone(),
            ))),
            owner.as_variable_resolver(),
        )
        .map(|ty| {
            ty.get_nested(
                method_parameter.nesting_level(),
                Some(method_parameter.type_indexes_per_level()),
            )
        })
    }

    pub fn for_method_return_type(&self, method: &Method) -> Result<ResolvableType, TypeError> {
        self.for_method_parameter(&MethodParameter::for_return_type(method.clone()))
    }

    pub fn for_constructor_parameter(
        &self,
        constructor: &Constructor,
        parameter_index: i32,
    ) -> Result<ResolvableType, TypeError> {
        let method_parameter =
            MethodParameter::for_constructor(constructor.clone(), parameter_index)?;
        self.for_method_parameter(&method_parameter)
    }

    /// Returns an array type with the given component type.
    pub fn for_array_component(&self, component_type: &ResolvableType) -> ResolvableType {
        let component_class = component_type.to_class();
        ResolvableType::new_array(
            Class::array_of(&component_class),
            component_type.clone(),
            self.this.clone(),
        )
    }

    pub(crate) fn create(
        &self,
        ty: Option<Type>,
        provider: Option<TypeProviderPtr>,
        resolver: Option<VariableResolverPtr>,
    ) -> ResolvableType {
        let ty = match ty {
            Some(Type::Empty) | None => return ResolvableType::none(),
            Some(ty) => ty,
        };

        if let Type::Class(_) = ty {
            return ResolvableType::new_uncached(ty, provider, resolver, self.this.clone());
        }

        let key = CacheKey {
            ty: ty.clone(),
            provider: provider.as_ref().map(|provider| provider.descriptor()),
            resolver: resolver.as_ref().map(|resolver| resolver.source()),
        };

        if let Some(cached) = self.cache.get(&key).and_then(|entry| entry.value().upgrade()) {
            trace!(ty = %ty, "Reusing cached resolvable type.");
            return ResolvableType::from_inner(cached);
        }

        let created = ResolvableType::new_uncached(ty, provider, resolver, self.this.clone());
        self.store(key, created)
    }

    fn store(&self, key: CacheKey, created: ResolvableType) -> ResolvableType {
        if self.cache.len() >= self.capacity {
            let before = self.cache.len();
            self.cache.retain(|_, entry| entry.strong_count() > 0);
            debug!(
                evicted = before - self.cache.len(),
                "Purged stale resolvable type cache entries."
            );

            if self.cache.len() >= self.capacity {
                trace!(ty = %key.ty, "Resolvable type cache is full - not caching.");
                return created;
            }
        }

        match self.cache.entry(key) {
            Entry::Occupied(mut entry) => match entry.get().upgrade() {
                Some(existing) => return ResolvableType::from_inner(existing),
                None => {
                    entry.insert(created.downgrade());
                }
            },
            Entry::Vacant(entry) => {
                entry.insert(created.downgrade());
            }
        }

        created
    }
}

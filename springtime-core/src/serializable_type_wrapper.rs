//! Persistable stand-ins for composite types.
//!
//! Composite types (parameterized types, type variables, wildcards and generic arrays) reference
//! live class descriptors, so they cannot be persisted directly. The [SerializableTypeWrapper]
//! replaces such a type with a [TypeProxy] holding only the [TypeProvider] it came from. The
//! proxy compares and hashes exactly like the type it stands for, and persists as the provider's
//! descriptor. Nested types returned by the proxy's accessors are wrapped lazily through
//! [MethodInvokeTypeProvider]s, so arbitrarily deep type graphs stay persistable without walking
//! them eagerly.

use crate::config::CoreConfig;
use crate::error::TypeError;
use crate::type_provider::{MethodInvokeTypeProvider, TypeProviderPtr};
use crate::types::{Type, TypeAccessor};
use dashmap::DashMap;
use fxhash::FxBuildHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Composite type shapes which can be wrapped in a [TypeProxy].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeShape {
    GenericArray,
    Parameterized,
    Variable,
    Wildcard,
}

impl TypeShape {
    /// Returns the shape of a wrappable type, or `None` for anything else.
    pub fn of(ty: &Type) -> Option<TypeShape> {
        match ty {
            Type::GenericArray(_) => Some(TypeShape::GenericArray),
            Type::Parameterized(_) => Some(TypeShape::Parameterized),
            Type::Variable(_) => Some(TypeShape::Variable),
            Type::Wildcard(_) => Some(TypeShape::Wildcard),
            _ => None,
        }
    }
}

/// Persistable stand-in for a composite type. See module documentation for details.
#[derive(Clone)]
pub struct TypeProxy {
    inner: Arc<TypeProxyInner>,
}

struct TypeProxyInner {
    provider: TypeProviderPtr,
    shape: TypeShape,
    wrapper: Weak<SerializableTypeWrapper>,
}

impl TypeProxy {
    pub(crate) fn new(
        provider: TypeProviderPtr,
        shape: TypeShape,
        wrapper: Weak<SerializableTypeWrapper>,
    ) -> Self {
        Self {
            inner: Arc::new(TypeProxyInner {
                provider,
                shape,
                wrapper,
            }),
        }
    }

    /// Returns the provider backing this proxy.
    #[inline]
    pub fn type_provider(&self) -> &TypeProviderPtr {
        &self.inner.provider
    }

    #[inline]
    pub fn shape(&self) -> TypeShape {
        self.inner.shape
    }

    /// Returns the type this proxy currently stands for.
    pub fn provided_type(&self) -> Option<Type> {
        self.inner.provider.get_type()
    }

    pub(crate) fn ptr_eq(&self, other: &TypeProxy) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn ptr_hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.inner) as usize).hash(state);
    }

    pub(crate) fn invoke_single(&self, accessor: TypeAccessor) -> Option<Type> {
        self.wrap_nested(accessor, None)
    }

    pub(crate) fn invoke_many(&self, accessor: TypeAccessor) -> Vec<Type> {
        let count = self
            .provided_type()
            .map(|ty| accessor.many(&ty).len())
            .unwrap_or(0);

        (0..count)
            .filter_map(|index| self.wrap_nested(accessor, Some(index)))
            .collect()
    }

    fn wrap_nested(&self, accessor: TypeAccessor, index: Option<usize>) -> Option<Type> {
        let provider: TypeProviderPtr = Arc::new(MethodInvokeTypeProvider::new(
            self.inner.provider.clone(),
            accessor,
            index,
        ));

        let wrapped = match self.inner.wrapper.upgrade() {
            Some(wrapper) => wrapper.for_type_provider(provider.clone()),
            None => wrap(provider.clone(), Weak::new()),
        };

        wrapped.unwrap_or_else(|error| {
            debug!(%error, ?accessor, "Using unwrapped nested type.");
            provider.get_type()
        })
    }
}

fn wrap(
    provider: TypeProviderPtr,
    wrapper: Weak<SerializableTypeWrapper>,
) -> Result<Option<Type>, TypeError> {
    let provided = match provider.get_type() {
        Some(provided) => provided,
        None => return Ok(None),
    };

    if provided.is_serializable() {
        return Ok(Some(provided));
    }

    TypeShape::of(&provided)
        .map(|shape| Some(Type::Proxy(TypeProxy::new(provider, shape, wrapper))))
        .ok_or_else(|| TypeError::UnsupportedType(provided.type_name()))
}

/// Cache service producing [TypeProxy] instances for provided types. A proxy is created once per
/// distinct provided type and reused afterwards; concurrent callers racing for the same type may
/// build redundant proxies, but only the first stored one is ever returned.
pub struct SerializableTypeWrapper {
    enabled: bool,
    cache: DashMap<Type, Type, FxBuildHasher>,
    this: Weak<SerializableTypeWrapper>,
}

impl SerializableTypeWrapper {
    /// Creates a new wrapper. A disabled wrapper returns provided types unchanged.
    pub fn new(enabled: bool) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            enabled,
            cache: DashMap::with_hasher(FxBuildHasher::default()),
            this: this.clone(),
        })
    }

    pub fn from_config(config: &CoreConfig) -> Arc<Self> {
        Self::new(config.type_wrapping_enabled)
    }

    /// Returns the type of the given provider, wrapped in a [TypeProxy] when it's composite.
    ///
    /// Classes and existing proxies are returned unchanged, as are all types when wrapping is
    /// disabled. Types which are neither serializable nor one of the supported [TypeShape]s are
    /// rejected with [TypeError::UnsupportedType].
    pub fn for_type_provider(&self, provider: TypeProviderPtr) -> Result<Option<Type>, TypeError> {
        let provided = match provider.get_type() {
            Some(provided) => provided,
            None => return Ok(None),
        };

        if provided.is_serializable() || !self.enabled {
            return Ok(Some(provided));
        }

        if let Some(cached) = self.cache.get(&provided) {
            trace!(ty = %provided, "Reusing cached type proxy.");
            return Ok(Some(cached.value().clone()));
        }

        let proxy = wrap(provider, self.this.clone())?;
        Ok(proxy.map(|proxy| {
            debug!(ty = %provided, "Created type proxy.");
            self.cache.entry(provided).or_insert(proxy).value().clone()
        }))
    }

    /// Returns the type a possibly proxied type stands for.
    pub fn unwrap(ty: &Type) -> Type {
        ty.unwrapped().into_owned()
    }

    /// Number of cached proxies.
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use crate::class::Class;
    use crate::error::TypeError;
    use crate::serializable_type_wrapper::{SerializableTypeWrapper, TypeShape};
    use crate::type_provider::{
        FieldTypeProvider, MockTypeProvider, ProviderDescriptor, TypeProvider, TypeProviderPtr,
    };
    use crate::types::{Type, TypeAccessor, TypeSchema};
    use std::sync::Arc;
    use std::thread;

    fn create_map_field() -> (Class, FieldTypeProvider) {
        let map = Class::builder("java.util.Map")
            .interface()
            .type_parameter("K")
            .type_parameter("V")
            .build();
        let list = Class::builder("java.util.List")
            .interface()
            .type_parameter("E")
            .build();

        let builder = Class::builder("test.Holder")
            .type_parameter("K")
            .type_parameter("V");
        let key = builder.variable("K");
        let value = builder.variable("V");
        let holder = builder
            .field(
                "entries",
                Type::parameterized(list, vec![Type::parameterized(map, vec![key, value])]),
            )
            .build();

        let field = holder.declared_field("entries").unwrap();
        (holder, FieldTypeProvider::new(field))
    }

    fn mock_provider(ty: Option<Type>) -> TypeProviderPtr {
        let mut provider = MockTypeProvider::new();
        provider.expect_get_type().return_const(ty);
        provider
            .expect_descriptor()
            .return_const(ProviderDescriptor::Field {
                declaring_class: "test.Mock".to_string(),
                field_name: "mock".to_string(),
            });
        Arc::new(provider)
    }

    #[test]
    fn should_wrap_composite_types() {
        let (_, provider) = create_map_field();
        let original = provider.get_type().unwrap();

        let wrapper = SerializableTypeWrapper::new(true);
        let wrapped = wrapper
            .for_type_provider(Arc::new(provider))
            .unwrap()
            .unwrap();

        assert!(matches!(wrapped, Type::Proxy(_)));
        assert_eq!(wrapped, original);
        assert_eq!(SerializableTypeWrapper::unwrap(&wrapped), original);
        assert!(matches!(
            SerializableTypeWrapper::unwrap(&wrapped),
            Type::Parameterized(_)
        ));
    }

    #[test]
    fn should_wrap_nested_types_lazily() {
        let (_, provider) = create_map_field();
        let original = provider.get_type().unwrap();

        let wrapper = SerializableTypeWrapper::new(true);
        let wrapped = wrapper
            .for_type_provider(Arc::new(provider))
            .unwrap()
            .unwrap();

        let arguments = wrapped.actual_type_arguments();
        assert_eq!(arguments.len(), 1);
        assert!(matches!(arguments[0], Type::Proxy(_)));
        assert_eq!(arguments, original.actual_type_arguments());

        let nested = arguments[0].actual_type_arguments();
        assert_eq!(nested.len(), 2);
        assert!(nested.iter().all(|ty| matches!(ty, Type::Proxy(_))));
        assert_eq!(nested[1].type_name(), "V");

        let raw = arguments[0].raw_type().unwrap();
        assert!(matches!(raw, Type::Class(_)));
    }

    #[test]
    fn should_persist_proxies_as_providers() {
        let (_, provider) = create_map_field();
        let wrapper = SerializableTypeWrapper::new(true);
        let wrapped = wrapper
            .for_type_provider(Arc::new(provider))
            .unwrap()
            .unwrap();

        let nested = wrapped.actual_type_arguments().remove(0);
        match nested.to_schema() {
            TypeSchema::Provided(persisted) => assert!(matches!(
                persisted.provider,
                ProviderDescriptor::MethodInvoke {
                    accessor: TypeAccessor::ActualTypeArguments,
                    index: Some(0),
                    ..
                }
            )),
            schema => panic!("Unexpected schema: {schema:?}"),
        }
    }

    #[test]
    fn should_reuse_cached_proxies() {
        let (_, provider) = create_map_field();
        let provider = Arc::new(provider);

        let wrapper = SerializableTypeWrapper::new(true);
        let first = wrapper.for_type_provider(provider.clone()).unwrap().unwrap();
        let second = wrapper.for_type_provider(provider).unwrap().unwrap();

        match (first, second) {
            (Type::Proxy(first), Type::Proxy(second)) => assert!(first.ptr_eq(&second)),
            _ => panic!("Expected proxies"),
        }
        assert_eq!(wrapper.cache_size(), 1);
    }

    #[test]
    fn should_reuse_cached_proxies_across_threads() {
        let (_, provider) = create_map_field();
        let provider = Arc::new(provider);
        let wrapper = SerializableTypeWrapper::new(true);

        let proxies: Vec<Type> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let provider = provider.clone();
                    let wrapper = &wrapper;
                    scope.spawn(move || {
                        (0..200)
                            .map(|_| {
                                wrapper
                                    .for_type_provider(provider.clone())
                                    .unwrap()
                                    .unwrap()
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| handle.join().unwrap())
                .collect()
        });

        let first = match &proxies[0] {
            Type::Proxy(first) => first.clone(),
            _ => panic!("Expected proxy"),
        };
        for proxy in &proxies {
            match proxy {
                Type::Proxy(proxy) => assert!(proxy.ptr_eq(&first)),
                _ => panic!("Expected proxy"),
            }
        }
        assert_eq!(proxies[0], provider.get_type().unwrap());
        assert_eq!(wrapper.cache_size(), 1);
    }

    #[test]
    fn should_pass_through_serializable_types() {
        let wrapper = SerializableTypeWrapper::new(true);

        assert_eq!(
            wrapper
                .for_type_provider(mock_provider(Some(Type::class(Class::string()))))
                .unwrap(),
            Some(Type::class(Class::string()))
        );
        assert_eq!(wrapper.for_type_provider(mock_provider(None)).unwrap(), None);
        assert_eq!(wrapper.cache_size(), 0);
    }

    #[test]
    fn should_not_wrap_when_disabled() {
        let (_, provider) = create_map_field();
        let wrapper = SerializableTypeWrapper::new(false);

        let provided = wrapper
            .for_type_provider(Arc::new(provider))
            .unwrap()
            .unwrap();
        assert!(matches!(provided, Type::Parameterized(_)));
    }

    #[test]
    fn should_reject_unsupported_types() {
        let wrapper = SerializableTypeWrapper::new(true);

        assert!(matches!(
            wrapper
                .for_type_provider(mock_provider(Some(Type::Empty)))
                .unwrap_err(),
            TypeError::UnsupportedType(_)
        ));
    }

    #[test]
    fn should_detect_shapes() {
        assert_eq!(
            TypeShape::of(&Type::wildcard()),
            Some(TypeShape::Wildcard)
        );
        assert_eq!(TypeShape::of(&Type::class(Class::string())), None);
        assert_eq!(TypeShape::of(&Type::Empty), None);
    }
}

//! Core functionality for retrieving and creating beans.
//!
//! [BeanFactory] is the object-safe lookup contract, while [TypedBeanFactory] adds
//! strongly-typed access on top of it. [DefaultBeanFactory] implements both, using definitions
//! from a [BeanDefinitionRegistry](crate::definition::BeanDefinitionRegistry) and
//! [scopes](crate::scope) to create and store instances for reuse.

use crate::config::BeanFactoryConfig;
use crate::definition::{BeanDefinition, BeanDefinitionRegistryPtr, StaticBeanDefinitionRegistry};
use crate::error::{BeanDefinitionRegistryError, BeansError, NoSuchBeanDefinitionError};
use crate::instance::{downcast_bean, BeanInstanceAnyPtr, BeanInstancePtr, RustType};
use crate::object_provider::{
    BeanStream, ObjectFactory, ObjectProvider, ObjectProviderPtr, TypedObjectProvider,
};
use crate::scope::{
    PrototypeScopeFactory, ScopeFactory, ScopePtr, SingletonScopeFactory, PROTOTYPE, SINGLETON,
};
use fxhash::{FxHashMap, FxHashSet};
use itertools::Itertools;
use parking_lot::Mutex;
use springtime_core::class::Class;
use springtime_core::resolvable_type::{ResolvableType, ResolvableTypeFactory};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, trace};

/// Prefix distinguishing factory beans from the beans they create. Factory beans are not
/// supported, so such names never match a bean.
pub const FACTORY_BEAN_PREFIX: &str = "&";

pub type ScopeFactoryPtr = Box<dyn ScopeFactory + Send + Sync>;

pub type ScopeFactoryRegistry = FxHashMap<String, ScopeFactoryPtr>;

/// Bean lookup contract. Lookups fail with [BeansError::NoSuchBeanDefinition] carrying the
/// requested name or type, when no matching bean exists.
pub trait BeanFactory {
    /// Returns an instance of the bean with given name or alias.
    fn get_bean(&self, name: &str) -> Result<BeanInstanceAnyPtr, BeansError>;

    /// Returns an instance of the bean with given name or alias, using explicit construction
    /// arguments when a new instance needs to be created.
    fn get_bean_with_args(
        &self,
        name: &str,
        args: &[BeanInstanceAnyPtr],
    ) -> Result<BeanInstanceAnyPtr, BeansError>;

    /// Returns an instance of the single bean assignable to given type. With multiple candidates,
    /// the primary one is selected.
    fn get_bean_of_type(
        &self,
        required_type: &ResolvableType,
    ) -> Result<BeanInstanceAnyPtr, BeansError>;

    fn get_bean_of_type_with_args(
        &self,
        required_type: &ResolvableType,
        args: &[BeanInstanceAnyPtr],
    ) -> Result<BeanInstanceAnyPtr, BeansError>;

    /// Returns an instance of the single bean of given Rust type.
    fn get_bean_of_rust_type(&self, rust_type: RustType)
        -> Result<BeanInstanceAnyPtr, BeansError>;

    /// Returns a provider for beans assignable to given type, allowing lazy and optional access.
    fn get_bean_provider(
        &self,
        required_type: ResolvableType,
    ) -> ObjectProviderPtr<'_, BeanInstanceAnyPtr>;

    fn get_bean_provider_of_rust_type(
        &self,
        rust_type: RustType,
    ) -> ObjectProviderPtr<'_, BeanInstanceAnyPtr>;

    /// Checks if a bean with given name or alias exists.
    fn contains_bean(&self, name: &str) -> bool;

    fn is_singleton(&self, name: &str) -> Result<bool, BeansError>;

    fn is_prototype(&self, name: &str) -> Result<bool, BeansError>;

    /// Checks if the bean with given name is assignable to the given type.
    fn is_type_match(&self, name: &str, type_to_match: &ResolvableType)
        -> Result<bool, BeansError>;

    /// Checks if the bean with given name is assignable to the given class, ignoring generics.
    fn is_type_match_class(&self, name: &str, type_to_match: &Class) -> Result<bool, BeansError>;

    /// Returns the raw class of the bean with given name, if it can be determined.
    fn get_type(&self, name: &str) -> Result<Option<Class>, BeansError>;

    /// Returns the other names of the bean with given name or alias. When given an alias, the
    /// bean name is returned first.
    fn get_aliases(&self, name: &str) -> Vec<String>;
}

/// Helper trait for [BeanFactory] providing strongly-typed access.
pub trait TypedBeanFactory {
    /// Returns the bean with given name, which is required to be of type `T`.
    fn get_bean_typed<T: Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<BeanInstancePtr<T>, BeansError>;

    /// Returns the single bean of type `T`.
    fn get_bean_of<T: Send + Sync + 'static>(&self) -> Result<BeanInstancePtr<T>, BeansError>;

    /// Returns a provider for beans of type `T`.
    fn get_bean_provider_of<T: Send + Sync + 'static>(&self) -> TypedObjectProvider<'_, T>;
}

impl<F: BeanFactory + ?Sized> TypedBeanFactory for F {
    fn get_bean_typed<T: Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<BeanInstancePtr<T>, BeansError> {
        let instance = self.get_bean(name)?;
        instance
            .downcast::<T>()
            .map_err(|_| BeansError::BeanNotOfRequiredType {
                name: name.to_string(),
                required_type: RustType::of::<T>().to_string(),
                actual_type: self
                    .get_type(name)
                    .ok()
                    .flatten()
                    .map(|class| class.name().to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
            })
    }

    fn get_bean_of<T: Send + Sync + 'static>(&self) -> Result<BeanInstancePtr<T>, BeansError> {
        let rust_type = RustType::of::<T>();
        self.get_bean_of_rust_type(rust_type)
            .and_then(|instance| downcast_bean(rust_type.name(), instance))
    }

    fn get_bean_provider_of<T: Send + Sync + 'static>(&self) -> TypedObjectProvider<'_, T> {
        TypedObjectProvider::new(self.get_bean_provider_of_rust_type(RustType::of::<T>()))
    }
}

/// What a lookup by type is looking for.
#[derive(Clone, Debug)]
enum BeanRequirement {
    Type(ResolvableType),
    RustType(RustType),
}

impl BeanRequirement {
    fn matches(&self, definition: &BeanDefinition) -> bool {
        match self {
            BeanRequirement::Type(required_type) => {
                required_type.is_assignable_from(&definition.bean_type)
            }
            BeanRequirement::RustType(rust_type) => definition.rust_type == *rust_type,
        }
    }

    fn describe(&self) -> String {
        match self {
            BeanRequirement::Type(required_type) => required_type.to_string(),
            BeanRequirement::RustType(rust_type) => rust_type.to_string(),
        }
    }

    fn not_found(&self) -> NoSuchBeanDefinitionError {
        match self {
            BeanRequirement::Type(required_type) => {
                NoSuchBeanDefinitionError::for_type(required_type.clone())
            }
            BeanRequirement::RustType(rust_type) => {
                NoSuchBeanDefinitionError::for_type_name(rust_type.name())
            }
        }
    }
}

/// Builder for [DefaultBeanFactory] with sensible defaults, for easy construction.
pub struct DefaultBeanFactoryBuilder {
    definition_registry: BeanDefinitionRegistryPtr,
    scope_factories: ScopeFactoryRegistry,
    type_factory: Arc<ResolvableTypeFactory>,
}

impl DefaultBeanFactoryBuilder {
    /// Creates a new builder with all statically registered definitions and the built-in
    /// [SINGLETON] and [PROTOTYPE] scopes.
    pub fn new(
        config: &BeanFactoryConfig,
        type_factory: Arc<ResolvableTypeFactory>,
    ) -> Result<Self, BeanDefinitionRegistryError> {
        Ok(Self {
            definition_registry: Box::new(StaticBeanDefinitionRegistry::new(
                config.allow_definition_overriding,
                &type_factory,
            )?),
            scope_factories: [
                (
                    SINGLETON.to_string(),
                    Box::<SingletonScopeFactory>::default() as ScopeFactoryPtr,
                ),
                (
                    PROTOTYPE.to_string(),
                    Box::<PrototypeScopeFactory>::default() as ScopeFactoryPtr,
                ),
            ]
            .into_iter()
            .collect(),
            type_factory,
        })
    }

    /// Sets new [BeanDefinitionRegistry](crate::definition::BeanDefinitionRegistry).
    pub fn with_definition_registry(
        mut self,
        definition_registry: BeanDefinitionRegistryPtr,
    ) -> Self {
        self.definition_registry = definition_registry;
        self
    }

    /// Sets new scope factories.
    pub fn with_scope_factories(mut self, scope_factories: ScopeFactoryRegistry) -> Self {
        self.scope_factories = scope_factories;
        self
    }

    /// Adds a new scope factory.
    pub fn with_scope_factory<T: ToString>(mut self, name: T, factory: ScopeFactoryPtr) -> Self {
        self.scope_factories.insert(name.to_string(), factory);
        self
    }

    /// Registers an additional definition.
    pub fn with_definition(
        mut self,
        definition: BeanDefinition,
    ) -> Result<Self, BeanDefinitionRegistryError> {
        self.definition_registry
            .register_bean_definition(definition)?;
        Ok(self)
    }

    pub fn build(self) -> DefaultBeanFactory {
        DefaultBeanFactory::new(
            self.definition_registry,
            self.scope_factories,
            self.type_factory,
        )
    }
}

/// Bean factory backed by a [BeanDefinitionRegistry](crate::definition::BeanDefinitionRegistry).
/// Instances are created on first request and stored in the scope of their definition.
///
/// Creation might recursively request dependencies from the factory. Requesting a bean which is
/// currently being created by the same thread results in [BeansError::BeanCurrentlyInCreation].
/// Concurrent creation of the same singleton might create redundant instances, but only the
/// first stored one is ever returned.
pub struct DefaultBeanFactory {
    definition_registry: BeanDefinitionRegistryPtr,
    scope_factories: ScopeFactoryRegistry,
    scopes: Mutex<FxHashMap<String, ScopePtr>>,
    beans_in_creation: Mutex<FxHashSet<(ThreadId, String)>>,
    type_factory: Arc<ResolvableTypeFactory>,
}

impl DefaultBeanFactory {
    /// Creates a new factory with given registry and scope factories. The factory map should
    /// include built-in [SINGLETON] and [PROTOTYPE] scopes, since definitions use them by
    /// default.
    pub fn new(
        definition_registry: BeanDefinitionRegistryPtr,
        scope_factories: ScopeFactoryRegistry,
        type_factory: Arc<ResolvableTypeFactory>,
    ) -> Self {
        Self {
            definition_registry,
            scope_factories,
            scopes: Default::default(),
            beans_in_creation: Default::default(),
            type_factory,
        }
    }

    #[inline]
    pub fn type_factory(&self) -> &Arc<ResolvableTypeFactory> {
        &self.type_factory
    }

    fn definition(&self, name: &str) -> Result<BeanDefinition, BeansError> {
        if name.starts_with(FACTORY_BEAN_PREFIX) {
            return Err(NoSuchBeanDefinitionError::for_name(name)
                .with_message("factory beans are not supported")
                .into());
        }

        self.definition_registry
            .bean_definition(name)
            .ok_or_else(|| NoSuchBeanDefinitionError::for_name(name).into())
    }

    fn candidates(&self, requirement: &BeanRequirement) -> Vec<BeanDefinition> {
        self.definition_registry
            .bean_definitions()
            .into_iter()
            .filter(|definition| requirement.matches(definition))
            .collect()
    }

    /// Selects the single candidate or the primary one among many. Returns `None` when there are
    /// no candidates.
    fn unique_candidate(
        &self,
        requirement: &BeanRequirement,
    ) -> Result<Option<BeanDefinition>, BeansError> {
        let mut candidates = self.candidates(requirement);
        if candidates.len() <= 1 {
            return Ok(candidates.pop());
        }

        let mut primary = candidates
            .iter()
            .filter(|definition| definition.is_primary)
            .cloned()
            .collect_vec();

        if primary.len() == 1 {
            return Ok(primary.pop());
        }

        Err(BeansError::NoUniqueBeanDefinition {
            required_type: requirement.describe(),
            bean_names: candidates
                .into_iter()
                .map(|definition| definition.name)
                .collect(),
        })
    }

    fn get_bean_for(
        &self,
        requirement: &BeanRequirement,
        args: &[BeanInstanceAnyPtr],
    ) -> Result<BeanInstanceAnyPtr, BeansError> {
        let definition = self
            .unique_candidate(requirement)?
            .ok_or_else(|| requirement.not_found())?;

        self.create_instance(&definition, args)
    }

    fn scoped_instance(
        &self,
        definition: &BeanDefinition,
    ) -> Result<Option<BeanInstanceAnyPtr>, BeansError> {
        let mut scopes = self.scopes.lock();
        if let Some(scope) = scopes.get(&definition.scope_name) {
            return Ok(scope.instance(definition));
        }

        let factory = self
            .scope_factories
            .get(&definition.scope_name)
            .ok_or_else(|| BeansError::UnrecognizedScope {
                name: definition.name.clone(),
                scope: definition.scope_name.clone(),
            })?;

        let scope = scopes
            .entry(definition.scope_name.clone())
            .or_insert_with(|| factory.create_scope());

        Ok(scope.instance(definition))
    }

    fn create_instance(
        &self,
        definition: &BeanDefinition,
        args: &[BeanInstanceAnyPtr],
    ) -> Result<BeanInstanceAnyPtr, BeansError> {
        if let Some(instance) = self.scoped_instance(definition)? {
            trace!(name = %definition.name, "Reusing scoped bean instance.");
            return Ok(instance);
        }

        let key = (thread::current().id(), definition.name.clone());
        if !self.beans_in_creation.lock().insert(key.clone()) {
            return Err(BeansError::BeanCurrentlyInCreation(
                definition.name.clone(),
            ));
        }

        debug!(name = %definition.name, scope = %definition.scope_name, "Creating bean instance.");

        let instance = (definition.constructor)(self, args);
        self.beans_in_creation.lock().remove(&key);

        let instance = instance.map_err(|error| match error {
            BeansError::BeanCurrentlyInCreation(_) => error,
            error => BeansError::BeanCreation {
                name: definition.name.clone(),
                source: Arc::new(error),
            },
        })?;

        let mut scopes = self.scopes.lock();
        let scope = scopes
            .get_mut(&definition.scope_name)
            .ok_or_else(|| BeansError::UnrecognizedScope {
                name: definition.name.clone(),
                scope: definition.scope_name.clone(),
            })?;

        scope.store_instance(definition, instance.clone());
        Ok(scope.instance(definition).unwrap_or(instance))
    }
}

impl BeanFactory for DefaultBeanFactory {
    fn get_bean(&self, name: &str) -> Result<BeanInstanceAnyPtr, BeansError> {
        self.get_bean_with_args(name, &[])
    }

    fn get_bean_with_args(
        &self,
        name: &str,
        args: &[BeanInstanceAnyPtr],
    ) -> Result<BeanInstanceAnyPtr, BeansError> {
        let definition = self.definition(name)?;
        self.create_instance(&definition, args)
    }

    fn get_bean_of_type(
        &self,
        required_type: &ResolvableType,
    ) -> Result<BeanInstanceAnyPtr, BeansError> {
        self.get_bean_of_type_with_args(required_type, &[])
    }

    fn get_bean_of_type_with_args(
        &self,
        required_type: &ResolvableType,
        args: &[BeanInstanceAnyPtr],
    ) -> Result<BeanInstanceAnyPtr, BeansError> {
        self.get_bean_for(&BeanRequirement::Type(required_type.clone()), args)
    }

    fn get_bean_of_rust_type(
        &self,
        rust_type: RustType,
    ) -> Result<BeanInstanceAnyPtr, BeansError> {
        self.get_bean_for(&BeanRequirement::RustType(rust_type), &[])
    }

    fn get_bean_provider(
        &self,
        required_type: ResolvableType,
    ) -> ObjectProviderPtr<'_, BeanInstanceAnyPtr> {
        Box::new(BeanObjectProvider {
            factory: self,
            requirement: BeanRequirement::Type(required_type),
        })
    }

    fn get_bean_provider_of_rust_type(
        &self,
        rust_type: RustType,
    ) -> ObjectProviderPtr<'_, BeanInstanceAnyPtr> {
        Box::new(BeanObjectProvider {
            factory: self,
            requirement: BeanRequirement::RustType(rust_type),
        })
    }

    fn contains_bean(&self, name: &str) -> bool {
        !name.starts_with(FACTORY_BEAN_PREFIX)
            && self.definition_registry.contains_bean_definition(name)
    }

    fn is_singleton(&self, name: &str) -> Result<bool, BeansError> {
        self.definition(name)
            .map(|definition| definition.scope_name == SINGLETON)
    }

    fn is_prototype(&self, name: &str) -> Result<bool, BeansError> {
        self.definition(name)
            .map(|definition| definition.scope_name == PROTOTYPE)
    }

    fn is_type_match(
        &self,
        name: &str,
        type_to_match: &ResolvableType,
    ) -> Result<bool, BeansError> {
        self.definition(name)
            .map(|definition| type_to_match.is_assignable_from(&definition.bean_type))
    }

    fn is_type_match_class(&self, name: &str, type_to_match: &Class) -> Result<bool, BeansError> {
        self.is_type_match(name, &self.type_factory.for_raw_class(type_to_match))
    }

    fn get_type(&self, name: &str) -> Result<Option<Class>, BeansError> {
        self.definition(name)
            .map(|definition| definition.bean_type.resolve())
    }

    fn get_aliases(&self, name: &str) -> Vec<String> {
        let canonical_name = match self.definition_registry.canonical_name(name) {
            Some(canonical_name) => canonical_name,
            None => return vec![],
        };

        let aliases = self.definition_registry.aliases(&canonical_name);
        let mut result = Vec::with_capacity(aliases.len() + 1);
        if canonical_name != name {
            result.push(canonical_name);
        }

        result.extend(aliases.into_iter().filter(|alias| alias != name));
        result
    }
}

/// [ObjectProvider] for beans matching a type, supporting multi-element access.
pub struct BeanObjectProvider<'a> {
    factory: &'a DefaultBeanFactory,
    requirement: BeanRequirement,
}

impl<'a> BeanObjectProvider<'a> {
    fn create_all(&self, definitions: Vec<BeanDefinition>) -> BeanStream<'_, BeanInstanceAnyPtr> {
        Box::new(
            definitions
                .into_iter()
                .map(move |definition| self.factory.create_instance(&definition, &[])),
        )
    }
}

impl<'a> ObjectFactory<BeanInstanceAnyPtr> for BeanObjectProvider<'a> {
    fn get_object(&self) -> Result<BeanInstanceAnyPtr, BeansError> {
        self.factory.get_bean_for(&self.requirement, &[])
    }
}

impl<'a> ObjectProvider<BeanInstanceAnyPtr> for BeanObjectProvider<'a> {
    fn get_object_with_args(
        &self,
        args: &[BeanInstanceAnyPtr],
    ) -> Result<BeanInstanceAnyPtr, BeansError> {
        self.factory.get_bean_for(&self.requirement, args)
    }

    fn get_if_available(&self) -> Result<Option<BeanInstanceAnyPtr>, BeansError> {
        self.factory
            .unique_candidate(&self.requirement)?
            .map(|definition| self.factory.create_instance(&definition, &[]))
            .transpose()
    }

    fn get_if_unique(&self) -> Result<Option<BeanInstanceAnyPtr>, BeansError> {
        match self.factory.unique_candidate(&self.requirement) {
            Ok(Some(definition)) => self.factory.create_instance(&definition, &[]).map(Some),
            Ok(None) | Err(BeansError::NoUniqueBeanDefinition { .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }

    fn stream(&self) -> Result<BeanStream<'_, BeanInstanceAnyPtr>, BeansError> {
        Ok(self.create_all(self.factory.candidates(&self.requirement)))
    }

    fn ordered_stream(&self) -> Result<BeanStream<'_, BeanInstanceAnyPtr>, BeansError> {
        let definitions = self
            .factory
            .candidates(&self.requirement)
            .into_iter()
            .sorted_by_key(|definition| definition.order.unwrap_or(i32::MAX))
            .collect();

        Ok(self.create_all(definitions))
    }
}

#[cfg(test)]
mod tests {
    use crate::definition::{
        BeanDefinition, BeanDefinitionRegistry, BeanDefinitionRegistryPtr,
        MockBeanDefinitionRegistry, StaticBeanDefinitionRegistry,
    };
    use crate::error::BeansError;
    use crate::factory::{
        BeanFactory, DefaultBeanFactory, ScopeFactoryPtr, ScopeFactoryRegistry,
        FACTORY_BEAN_PREFIX,
    };
    use crate::instance::{BeanInstanceAnyPtr, BeanInstancePtr, RustType};
    use crate::scope::{
        MockScope, MockScopeFactory, PrototypeScopeFactory, ScopePtr, SingletonScopeFactory,
        PROTOTYPE, SINGLETON,
    };
    use mockall::predicate::*;
    use springtime_core::class::Class;
    use springtime_core::config::CoreConfig;
    use springtime_core::resolvable_type::ResolvableTypeFactory;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn constructor(
        _factory: &dyn BeanFactory,
        _args: &[BeanInstanceAnyPtr],
    ) -> Result<BeanInstanceAnyPtr, BeansError> {
        Ok(BeanInstancePtr::new(0_i8) as BeanInstanceAnyPtr)
    }

    fn error_constructor(
        _factory: &dyn BeanFactory,
        _args: &[BeanInstanceAnyPtr],
    ) -> Result<BeanInstanceAnyPtr, BeansError> {
        Err(BeansError::IllegalArgument("broken".to_string()))
    }

    static RECURSE_ON_CREATION: AtomicBool = AtomicBool::new(true);

    fn recursive_once_constructor(
        factory: &dyn BeanFactory,
        args: &[BeanInstanceAnyPtr],
    ) -> Result<BeanInstanceAnyPtr, BeansError> {
        if RECURSE_ON_CREATION.swap(false, Ordering::SeqCst) {
            factory.get_bean("name")
        } else {
            constructor(factory, args)
        }
    }

    fn args_constructor(
        _factory: &dyn BeanFactory,
        args: &[BeanInstanceAnyPtr],
    ) -> Result<BeanInstanceAnyPtr, BeansError> {
        Ok(args
            .first()
            .cloned()
            .unwrap_or_else(|| BeanInstancePtr::new(0_i8) as BeanInstanceAnyPtr))
    }

    fn type_factory() -> Arc<ResolvableTypeFactory> {
        ResolvableTypeFactory::from_config(&CoreConfig::default())
    }

    fn create_definition(scope_name: &str) -> BeanDefinition {
        BeanDefinition::new(
            "name",
            type_factory().for_class(&Class::string()),
            RustType::of::<i8>(),
            constructor,
        )
        .with_scope(scope_name)
    }

    fn scope_factories() -> ScopeFactoryRegistry {
        [
            (
                SINGLETON.to_string(),
                Box::<SingletonScopeFactory>::default() as ScopeFactoryPtr,
            ),
            (
                PROTOTYPE.to_string(),
                Box::<PrototypeScopeFactory>::default() as ScopeFactoryPtr,
            ),
        ]
        .into_iter()
        .collect()
    }

    fn create_factory<T: BeanDefinitionRegistry + Send + Sync + 'static>(
        definition_registry: T,
    ) -> DefaultBeanFactory {
        DefaultBeanFactory::new(
            Box::new(definition_registry) as BeanDefinitionRegistryPtr,
            scope_factories(),
            type_factory(),
        )
    }

    fn create_registry(definitions: Vec<BeanDefinition>) -> StaticBeanDefinitionRegistry {
        let mut registry = StaticBeanDefinitionRegistry::empty(false);
        for definition in definitions {
            registry.register_bean_definition(definition).unwrap();
        }

        registry
    }

    #[test]
    fn should_return_bean_by_name() {
        let mut registry = MockBeanDefinitionRegistry::new();
        registry
            .expect_bean_definition()
            .with(eq("name"))
            .times(1)
            .return_const(Some(create_definition(PROTOTYPE)));

        let factory = create_factory(registry);
        assert!(factory.get_bean("name").is_ok());
    }

    #[test]
    fn should_report_missing_bean_name() {
        let mut registry = MockBeanDefinitionRegistry::new();
        registry
            .expect_bean_definition()
            .with(eq("missing"))
            .times(1)
            .return_const(None);

        let factory = create_factory(registry);
        match factory.get_bean("missing").unwrap_err() {
            BeansError::NoSuchBeanDefinition(error) => {
                assert_eq!(error.bean_name(), Some("missing"))
            }
            error => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn should_not_support_factory_beans() {
        let factory = create_factory(create_registry(vec![create_definition(SINGLETON)]));
        let name = format!("{FACTORY_BEAN_PREFIX}name");

        assert!(!factory.contains_bean(&name));
        assert!(factory.get_bean(&name).unwrap_err().is_no_such_bean());
    }

    #[test]
    fn should_detect_creation_cycles() {
        let mut definition = create_definition(PROTOTYPE);
        definition.constructor = recursive_once_constructor;

        let factory = create_factory(create_registry(vec![definition]));
        assert!(matches!(
            factory.get_bean("name").unwrap_err(),
            BeansError::BeanCurrentlyInCreation(name) if name == "name"
        ));

        // a failed creation doesn't leave the bean marked as in creation
        assert!(factory.get_bean("name").is_ok());
    }

    #[test]
    fn should_recognize_missing_scope() {
        let factory = create_factory(create_registry(vec![create_definition("request")]));
        assert!(matches!(
            factory.get_bean("name").unwrap_err(),
            BeansError::UnrecognizedScope { scope, .. } if scope == "request"
        ));
    }

    #[test]
    fn should_wrap_constructor_error() {
        let mut definition = create_definition(PROTOTYPE);
        definition.constructor = error_constructor;

        let factory = create_factory(create_registry(vec![definition]));
        match factory.get_bean("name").unwrap_err() {
            BeansError::BeanCreation { name, source } => {
                assert_eq!(name, "name");
                assert_eq!(source.to_string(), "broken");
            }
            error => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn should_store_instance_in_scope() {
        let mut scope_factory = MockScopeFactory::new();
        scope_factory.expect_create_scope().times(1).returning(|| {
            let mut scope = MockScope::new();
            scope.expect_store_instance().times(1).return_const(());
            scope.expect_instance().return_const(None);

            Box::new(scope) as ScopePtr
        });

        let factory = DefaultBeanFactory::new(
            Box::new(create_registry(vec![create_definition("custom")]))
                as BeanDefinitionRegistryPtr,
            [(
                "custom".to_string(),
                Box::new(scope_factory) as ScopeFactoryPtr,
            )]
            .into_iter()
            .collect(),
            type_factory(),
        );

        factory.get_bean("name").unwrap();
    }

    #[test]
    fn should_reuse_singletons() {
        let factory = create_factory(create_registry(vec![create_definition(SINGLETON)]));

        let first = factory.get_bean("name").unwrap();
        let second = factory.get_bean("name").unwrap();
        assert!(BeanInstancePtr::ptr_eq(&first, &second));
        assert!(factory.is_singleton("name").unwrap());
        assert!(!factory.is_prototype("name").unwrap());
    }

    #[test]
    fn should_create_prototypes_with_args() {
        let mut definition = create_definition(PROTOTYPE);
        definition.constructor = args_constructor;

        let factory = create_factory(create_registry(vec![definition]));
        let argument = BeanInstancePtr::new(5_i8) as BeanInstanceAnyPtr;

        let instance = factory
            .get_bean_with_args("name", &[argument.clone()])
            .unwrap();
        assert!(BeanInstancePtr::ptr_eq(&instance, &argument));
        assert!(!BeanInstancePtr::ptr_eq(
            &factory.get_bean("name").unwrap(),
            &factory.get_bean("name").unwrap()
        ));
    }

    #[test]
    fn should_select_primary_candidate() {
        let types = type_factory();
        let number = Class::builder("java.lang.Number").build();
        let integer = Class::builder("java.lang.Integer")
            .extends(springtime_core::types::Type::class(number.clone()))
            .build();

        let mut first = create_definition(SINGLETON);
        first.name = "first".to_string();
        first.bean_type = types.for_class(&integer);

        let mut second = first.clone();
        second.name = "second".to_string();

        let factory = create_factory(create_registry(vec![first.clone(), second.clone()]));
        assert!(matches!(
            factory.get_bean_of_type(&types.for_class(&number)).unwrap_err(),
            BeansError::NoUniqueBeanDefinition { bean_names, .. } if bean_names == ["first", "second"]
        ));

        let factory = create_factory(create_registry(vec![first, second.primary()]));
        let instance = factory.get_bean_of_type(&types.for_class(&number)).unwrap();
        assert!(BeanInstancePtr::ptr_eq(
            &instance,
            &factory.get_bean("second").unwrap()
        ));

        assert!(factory
            .get_bean_of_type(&types.for_class(&Class::string()))
            .unwrap_err()
            .is_no_such_bean());
    }

    #[test]
    fn should_match_bean_types() {
        let factory = create_factory(create_registry(vec![
            create_definition(SINGLETON).with_alias("alias")
        ]));
        let types = factory.type_factory().clone();

        assert!(factory.contains_bean("alias"));
        assert!(factory
            .is_type_match("name", &types.for_class(&Class::object()))
            .unwrap());
        assert!(factory
            .is_type_match_class("alias", &Class::string())
            .unwrap());
        assert!(!factory
            .is_type_match_class("name", &Class::void())
            .unwrap());
        assert_eq!(factory.get_type("name").unwrap(), Some(Class::string()));
        assert!(factory.get_type("missing").unwrap_err().is_no_such_bean());

        assert_eq!(factory.get_aliases("name"), ["alias"]);
        assert_eq!(factory.get_aliases("alias"), ["name"]);
        assert!(factory.get_aliases("missing").is_empty());
    }
}

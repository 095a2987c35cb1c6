use springtime_core::resolvable_type::ResolvableType;
use std::error::Error;
use std::sync::Arc;
use thiserror::Error;

/// Type-erased error cause.
pub type ErrorPtr = Arc<dyn Error + Send + Sync>;

/// Errors related to retrieving and creating beans.
#[derive(Error, Clone, Debug)]
pub enum BeansError {
    #[error(transparent)]
    NoSuchBeanDefinition(#[from] NoSuchBeanDefinitionError),
    #[error("No qualifying bean of type '{required_type}' available: expected single matching bean but found {}: {}", bean_names.len(), bean_names.join(","))]
    NoUniqueBeanDefinition {
        required_type: String,
        bean_names: Vec<String>,
    },
    #[error("Bean named '{name}' is expected to be of type '{required_type}' but was actually of type '{actual_type}'")]
    BeanNotOfRequiredType {
        name: String,
        required_type: String,
        actual_type: String,
    },
    #[error("Requested bean is currently in creation - is there an unresolvable circular reference? Bean: {0}")]
    BeanCurrentlyInCreation(String),
    #[error("Error creating bean with name '{name}': {source}")]
    BeanCreation {
        name: String,
        #[source]
        source: ErrorPtr,
    },
    #[error("No scope registered for scope name '{scope}' of bean: {name}")]
    UnrecognizedScope { name: String, scope: String },
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("{0}")]
    IllegalArgument(String),
}

impl BeansError {
    /// Checks if this error signals a missing bean, as opposed to a failure to create one.
    pub fn is_no_such_bean(&self) -> bool {
        matches!(self, BeansError::NoSuchBeanDefinition(_))
    }
}

/// A requested bean could not be found. Carries the requested name and/or type, so callers can
/// decide to fall back to a default.
#[derive(Error, Clone, Debug)]
#[error("{}", self.describe())]
pub struct NoSuchBeanDefinitionError {
    bean_name: Option<String>,
    resolvable_type: Option<ResolvableType>,
    type_name: Option<String>,
    message: Option<String>,
}

impl NoSuchBeanDefinitionError {
    pub fn for_name<T: ToString>(name: T) -> Self {
        Self {
            bean_name: Some(name.to_string()),
            resolvable_type: None,
            type_name: None,
            message: None,
        }
    }

    pub fn for_type(resolvable_type: ResolvableType) -> Self {
        Self {
            bean_name: None,
            type_name: Some(resolvable_type.to_string()),
            resolvable_type: Some(resolvable_type),
            message: None,
        }
    }

    /// Missing bean of the given Rust type.
    pub fn for_type_name<T: ToString>(type_name: T) -> Self {
        Self {
            bean_name: None,
            resolvable_type: None,
            type_name: Some(type_name.to_string()),
            message: None,
        }
    }

    /// Replaces the default message with a more specific one.
    pub fn with_message<T: ToString>(mut self, message: T) -> Self {
        self.message = Some(message.to_string());
        self
    }

    #[inline]
    pub fn bean_name(&self) -> Option<&str> {
        self.bean_name.as_deref()
    }

    #[inline]
    pub fn resolvable_type(&self) -> Option<&ResolvableType> {
        self.resolvable_type.as_ref()
    }

    /// Human-readable description of the requested type, if a type was requested.
    #[inline]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    fn describe(&self) -> String {
        let description = match (&self.bean_name, &self.type_name) {
            (Some(name), _) => format!("No bean named '{name}' available"),
            (None, Some(type_name)) => {
                format!("No qualifying bean of type '{type_name}' available")
            }
            (None, None) => "No matching bean available".to_string(),
        };

        match &self.message {
            Some(message) => format!("{description}: {message}"),
            None => description,
        }
    }
}

/// Errors related to bean definition registries.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum BeanDefinitionRegistryError {
    #[error("Attempted to register a duplicated bean with name: {0}")]
    DuplicateBeanName(String),
    #[error("Cannot register alias '{alias}' for bean '{name}': it is already in use")]
    DuplicateAlias { alias: String, name: String },
    #[error("Cannot register alias '{alias}' for missing bean: {name}")]
    MissingAliasTarget { alias: String, name: String },
}

use crate::resolvable_type::ResolvableType;
use crate::types::{Type, TypeVariable};
#[cfg(test)]
use mockall::automock;
use std::sync::Arc;

pub type VariableResolverPtr = Arc<dyn VariableResolver + Send + Sync>;

/// Structural identity of a [VariableResolver], used to tell apart cached types resolved in
/// different contexts.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum VariableSource {
    /// Variables are resolved against the given type, which itself might have a resolver.
    Type {
        ty: Type,
        resolver: Option<Box<VariableSource>>,
    },
    /// Variables are bound explicitly. Each binding is identified by the generic type together
    /// with its own resolver.
    Variables(Vec<(TypeVariable, VariableSource)>),
}

impl VariableSource {
    /// Identity of the given type along with its resolution context.
    pub fn of(ty: &ResolvableType) -> Self {
        VariableSource::Type {
            ty: ty.get_type().clone(),
            resolver: ty
                .variable_resolver()
                .map(|resolver| Box::new(resolver.source())),
        }
    }
}

/// Strategy for resolving type variables to concrete types.
#[cfg_attr(test, automock)]
pub trait VariableResolver {
    /// Returns the identity of this resolver.
    fn source(&self) -> VariableSource;

    /// Resolves the given variable or returns `None`, if it's unknown to this resolver.
    fn resolve_variable(&self, variable: &TypeVariable) -> Option<ResolvableType>;
}

/// Resolves variables against a [ResolvableType], e.g. the type declaring a field or a method.
#[derive(Clone, Debug)]
pub struct DefaultVariableResolver {
    owner: ResolvableType,
}

impl DefaultVariableResolver {
    pub fn new(owner: ResolvableType) -> Self {
        Self { owner }
    }
}

impl VariableResolver for DefaultVariableResolver {
    fn source(&self) -> VariableSource {
        VariableSource::of(&self.owner)
    }

    fn resolve_variable(&self, variable: &TypeVariable) -> Option<ResolvableType> {
        self.owner.resolve_variable(variable)
    }
}

/// Resolves variables bound explicitly to generics.
#[derive(Clone, Debug)]
pub struct TypeVariablesVariableResolver {
    variables: Vec<TypeVariable>,
    generics: Vec<ResolvableType>,
}

impl TypeVariablesVariableResolver {
    /// Binds `variables` to `generics` pairwise. Excess elements of the longer list are ignored.
    pub fn new(variables: Vec<TypeVariable>, generics: Vec<ResolvableType>) -> Self {
        Self {
            variables,
            generics,
        }
    }
}

impl VariableResolver for TypeVariablesVariableResolver {
    fn source(&self) -> VariableSource {
        VariableSource::Variables(
            self.variables
                .iter()
                .cloned()
                .zip(self.generics.iter().map(VariableSource::of))
                .collect(),
        )
    }

    fn resolve_variable(&self, variable: &TypeVariable) -> Option<ResolvableType> {
        self.variables
            .iter()
            .position(|candidate| candidate == variable)
            .and_then(|index| self.generics.get(index))
            .cloned()
    }
}

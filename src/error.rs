//! # Error Types
//!
//! Structured error handling for factory discovery and instantiation using
//! thiserror instead of `Box<dyn Error>` patterns.

use thiserror::Error;

/// Errors produced while loading mappings, selecting constructors, and
/// instantiating factory implementations.
#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Configuration error in [{location}]: {message}")]
    Configuration { location: String, message: String },

    #[error("Factory class [{class_name}] is already registered with this loading context")]
    AlreadyRegistered { class_name: String },

    #[error("Factory class [{class_name}] is not registered with the loading context")]
    ClassNotFound { class_name: String },

    #[error("Factory class [{class_name}] is not assignable to factory type [{factory_type}]")]
    IncompatibleType {
        class_name: String,
        factory_type: String,
    },

    #[error("Class [{class_name}] has no suitable constructor")]
    NoSuitableConstructor { class_name: String },

    #[error("Class [{class_name}] has no matching argument of type [{parameter_type}]")]
    NoMatchingArgument {
        class_name: String,
        parameter_type: String,
    },

    #[error("Constructor of factory class [{class_name}] failed")]
    ConstructorFailed {
        class_name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Unable to instantiate factory class [{class_name}] for factory type [{factory_type}]")]
    UnableToInstantiate {
        class_name: String,
        factory_type: String,
        #[source]
        source: Box<ForgeError>,
    },

    /// Caller-supplied wrapping error from a custom throwing failure handler.
    #[error("{source}")]
    Custom {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ForgeError {
    /// Create a configuration error for a resource location
    pub fn configuration(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create a duplicate-registration error
    pub fn already_registered(class_name: impl Into<String>) -> Self {
        Self::AlreadyRegistered {
            class_name: class_name.into(),
        }
    }

    /// Create an unknown-class error
    pub fn class_not_found(class_name: impl Into<String>) -> Self {
        Self::ClassNotFound {
            class_name: class_name.into(),
        }
    }

    /// Create an assignability error
    pub fn incompatible_type(
        class_name: impl Into<String>,
        factory_type: impl Into<String>,
    ) -> Self {
        Self::IncompatibleType {
            class_name: class_name.into(),
            factory_type: factory_type.into(),
        }
    }

    /// Create a constructor-selection error
    pub fn no_suitable_constructor(class_name: impl Into<String>) -> Self {
        Self::NoSuitableConstructor {
            class_name: class_name.into(),
        }
    }

    /// Create a missing-argument error for a constructor parameter
    pub fn no_matching_argument(
        class_name: impl Into<String>,
        parameter_type: impl Into<String>,
    ) -> Self {
        Self::NoMatchingArgument {
            class_name: class_name.into(),
            parameter_type: parameter_type.into(),
        }
    }

    /// Wrap an error returned by an implementation's constructor
    pub fn constructor_failed(
        class_name: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::ConstructorFailed {
            class_name: class_name.into(),
            source,
        }
    }

    /// Wrap a per-candidate failure in the standard instantiation error
    pub fn unable_to_instantiate(
        class_name: impl Into<String>,
        factory_type: impl Into<String>,
        cause: ForgeError,
    ) -> Self {
        Self::UnableToInstantiate {
            class_name: class_name.into(),
            factory_type: factory_type.into(),
            source: Box::new(cause),
        }
    }

    /// Wrap a caller-supplied error type
    pub fn custom(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Custom {
            source: Box::new(source),
        }
    }

    /// Create an internal invariant-violation error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ForgeError>;

#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Forge Core
//!
//! Factory discovery and instantiation registry for plugin-style
//! components.
//!
//! ## Overview
//!
//! Forge Core locates the implementations registered for an abstract
//! "factory type" in resource files, loads and caches those mappings per
//! (resource location, loading context), and instantiates the named
//! implementations with constructor arguments drawn from a composable
//! resolver. It is a lightweight service locator, not a dependency
//! injection container: no graph resolution, no scoping beyond the mapping
//! cache.
//!
//! ## Module Organization
//!
//! - [`registry`] - Factory discovery, instantiation, and caching
//! - [`config`] - Loader settings and environment detection
//! - [`error`] - Structured error handling
//! - [`logging`] - Tracing initialization
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use forge_core::{ArgumentResolver, FactoryLoader, FactoryType};
//!
//! trait Transport: Send {
//!     fn dial(&self, address: &str) -> bool;
//! }
//!
//! impl FactoryType for dyn Transport {
//!     const NAME: &'static str = "app.Transport";
//! }
//!
//! # fn main() -> forge_core::Result<()> {
//! forge_core::logging::init_logging();
//!
//! let loader = FactoryLoader::for_default_resource_location(None)?;
//! let transports = loader.load_with_resolver::<dyn Transport>(
//!     &ArgumentResolver::of::<String>("tcp".to_string()),
//! )?;
//! for transport in &transports {
//!     transport.dial("localhost:9");
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod registry;

pub use config::LoaderSettings;
pub use error::{ForgeError, Result};
pub use registry::{
    load_factories, ArgumentResolver, BoxedValue, CacheStats, Constructed, ConstructError,
    FactoryClass, FactoryClassBuilder, FactoryInstantiator, FactoryLoader, FactoryMapping,
    FactoryType, FailureHandler, LoaderCache, LoadingContext, Visibility,
    DEFAULT_RESOURCE_LOCATION,
};

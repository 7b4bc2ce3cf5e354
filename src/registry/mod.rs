//! # Factory Registry
//!
//! Discovery and instantiation of factory implementations declared in
//! resource files.
//!
//! ## Overview
//!
//! The registry module composes four capabilities: a mapping loader that
//! reads factory-type-name to implementation-name lists from resource
//! files, an instantiator that selects and invokes constructors, an
//! argument resolver that supplies constructor arguments by type, and a
//! failure handler that decides what one failed candidate does to the rest
//! of the load.
//!
//! ## Architecture
//!
//! ```text
//! Factory Registry
//! ├── FactoryLoader        (Façade + per-(location, context) cache)
//! ├── FactoryMapping       (Resource discovery + parsing)
//! ├── LoadingContext       (Class catalog + resource roots)
//! ├── FactoryInstantiator  (Constructor selection + invocation)
//! ├── ArgumentResolver     (Type-keyed argument chain)
//! └── FailureHandler       (Per-candidate failure policy)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use forge_core::{
//!     ArgumentResolver, FactoryClass, FactoryLoader, FactoryType, LoadingContext, Visibility,
//! };
//!
//! trait Codec: Send {
//!     fn name(&self) -> &str;
//! }
//!
//! impl FactoryType for dyn Codec {
//!     const NAME: &'static str = "demo.Codec";
//! }
//!
//! struct Plain;
//!
//! impl Codec for Plain {
//!     fn name(&self) -> &str {
//!         "plain"
//!     }
//! }
//!
//! # fn main() -> forge_core::Result<()> {
//! // Register the implementation with an isolated context; discovery then
//! // works off whatever resource files its roots contain.
//! let context = LoadingContext::isolated(["fixtures"]);
//! context.register(
//!     FactoryClass::of::<dyn Codec>("demo.Plain")
//!         .with_nullary(Visibility::Public, || Ok(Box::new(Plain)))
//!         .build(),
//! )?;
//!
//! let loader = FactoryLoader::for_default_resource_location(Some(context))?;
//! let codecs = loader.load::<dyn Codec>()?;
//! assert!(codecs.is_empty() || codecs[0].name() == "plain");
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod failure;
pub mod instantiator;
pub mod loader;
pub mod mapping;
pub mod resolver;

// Re-export main types for easy access
pub use catalog::{
    Constructed, ConstructError, FactoryClass, FactoryClassBuilder, FactoryType, LoadingContext,
    Visibility,
};
pub use failure::FailureHandler;
pub use instantiator::FactoryInstantiator;
pub use loader::{
    load_factories, CacheStats, FactoryLoader, LoaderCache, DEFAULT_RESOURCE_LOCATION,
};
pub use mapping::FactoryMapping;
pub use resolver::{ArgumentResolver, BoxedValue};

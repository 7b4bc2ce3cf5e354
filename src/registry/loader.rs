//! # Factory Loader
//!
//! Façade for loading factory implementations from mapped resource files,
//! with thread-safe loader caching.
//!
//! ## Overview
//!
//! A [`FactoryLoader`] is bound to one (resource location, loading context)
//! pair. Its mapping is read eagerly when the loader is built, so malformed
//! resource content surfaces at construction, never per entry. Loaders are
//! cached per (location, context) for the life of the process; the cache is
//! also constructible standalone for isolated scopes.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use forge_core::{ArgumentResolver, FactoryLoader, FactoryType};
//!
//! trait Codec: Send {
//!     fn encode(&self, text: &str) -> Vec<u8>;
//! }
//!
//! impl FactoryType for dyn Codec {
//!     const NAME: &'static str = "demo.Codec";
//! }
//!
//! # fn main() -> forge_core::Result<()> {
//! let loader = FactoryLoader::for_default_resource_location(None)?;
//! let codecs = loader.load_with_resolver::<dyn Codec>(
//!     &ArgumentResolver::of::<String>("utf-8".to_string()),
//! )?;
//! for codec in &codecs {
//!     let _ = codec.encode("payload");
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{ForgeError, Result};
use crate::registry::catalog::{FactoryType, LoadingContext};
use crate::registry::failure::FailureHandler;
use crate::registry::instantiator::FactoryInstantiator;
use crate::registry::mapping::FactoryMapping;
use crate::registry::resolver::ArgumentResolver;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, trace};

/// Well-known location searched when no explicit location is given.
pub const DEFAULT_RESOURCE_LOCATION: &str = "config/forge.factories";

type CacheKey = (String, u64);

struct CacheEntry {
    loader: Arc<FactoryLoader>,
    created_at: DateTime<Utc>,
}

/// Cache of [`FactoryLoader`] instances keyed by (location, context).
///
/// A process-wide instance backs [`FactoryLoader::for_resource_location`];
/// independent instances can be built for isolated scopes and tests.
pub struct LoaderCache {
    entries: DashMap<CacheKey, CacheEntry>,
}

impl LoaderCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Return the cached loader for (location, context), building and
    /// caching it on first access. Concurrent first accesses for the same
    /// key observe the same instance.
    pub fn loader_for(
        &self,
        location: &str,
        context: Option<Arc<LoadingContext>>,
    ) -> Result<Arc<FactoryLoader>> {
        let context = LoadingContext::normalize(context);
        let key = (location.to_string(), context.id());
        match self.entries.entry(key) {
            Entry::Occupied(entry) => {
                trace!(location, context = context.id(), "reusing cached factory loader");
                Ok(Arc::clone(&entry.get().loader))
            }
            Entry::Vacant(slot) => {
                let mapping = FactoryMapping::load(location, &context)?;
                debug!(
                    location,
                    context = context.id(),
                    factory_types = mapping.len(),
                    "built factory loader"
                );
                let loader = Arc::new(FactoryLoader {
                    location: location.to_string(),
                    context,
                    mapping,
                });
                slot.insert(CacheEntry {
                    loader: Arc::clone(&loader),
                    created_at: Utc::now(),
                });
                Ok(loader)
            }
        }
    }

    /// Drop every cached loader. Administrative/test hook.
    pub fn clear(&self) {
        self.entries.clear();
        info!("factory loader cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the cache contents for diagnostics.
    pub fn stats(&self) -> CacheStats {
        let mut cache_keys: Vec<String> = self
            .entries
            .iter()
            .map(|entry| {
                let ((location, context), value) = (entry.key(), entry.value());
                format!(
                    "{location} (context {context}, created {})",
                    value.created_at.to_rfc3339()
                )
            })
            .collect();
        cache_keys.sort();
        CacheStats {
            cached_loaders: cache_keys.len(),
            cache_keys,
            captured_at: Utc::now(),
        }
    }
}

impl Default for LoaderCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the loader cache contents.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub cached_loaders: usize,
    pub cache_keys: Vec<String>,
    pub captured_at: DateTime<Utc>,
}

static GLOBAL_CACHE: OnceLock<LoaderCache> = OnceLock::new();

/// Loads factory implementations registered under a factory type name in
/// the resource files of one (location, context) pair.
#[derive(Debug)]
pub struct FactoryLoader {
    location: String,
    context: Arc<LoadingContext>,
    mapping: FactoryMapping,
}

impl FactoryLoader {
    /// The process-wide loader cache. Administrative/test hook.
    pub fn cache() -> &'static LoaderCache {
        GLOBAL_CACHE.get_or_init(LoaderCache::new)
    }

    /// Loader for [`DEFAULT_RESOURCE_LOCATION`] in `context` (platform
    /// default when `None`).
    pub fn for_default_resource_location(
        context: Option<Arc<LoadingContext>>,
    ) -> Result<Arc<FactoryLoader>> {
        Self::for_resource_location(DEFAULT_RESOURCE_LOCATION, context)
    }

    /// Loader for `location` in `context` (platform default when `None`),
    /// reused from the process-wide cache when already built.
    pub fn for_resource_location(
        location: &str,
        context: Option<Arc<LoadingContext>>,
    ) -> Result<Arc<FactoryLoader>> {
        Self::cache().loader_for(location, context)
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn context(&self) -> &Arc<LoadingContext> {
        &self.context
    }

    /// The merged mapping this loader serves.
    pub fn mapping(&self) -> &FactoryMapping {
        &self.mapping
    }

    /// Implementation class names registered for `T`, without instantiating
    /// anything.
    pub fn factory_names<T>(&self) -> Vec<String>
    where
        T: FactoryType + ?Sized,
    {
        self.mapping.names(T::NAME).to_vec()
    }

    /// Load every implementation of `T` with no constructor arguments,
    /// aborting on the first failure.
    pub fn load<T>(&self) -> Result<Vec<Box<T>>>
    where
        T: FactoryType + ?Sized,
    {
        self.load_with(&ArgumentResolver::none(), &FailureHandler::throwing())
    }

    /// Load every implementation of `T`, resolving constructor arguments
    /// through `resolver` and aborting on the first failure.
    pub fn load_with_resolver<T>(&self, resolver: &ArgumentResolver) -> Result<Vec<Box<T>>>
    where
        T: FactoryType + ?Sized,
    {
        self.load_with(resolver, &FailureHandler::throwing())
    }

    /// Load every implementation of `T` with no constructor arguments,
    /// routing per-candidate failures through `failure_handler`.
    pub fn load_with_failure_handler<T>(
        &self,
        failure_handler: &FailureHandler,
    ) -> Result<Vec<Box<T>>>
    where
        T: FactoryType + ?Sized,
    {
        self.load_with(&ArgumentResolver::none(), failure_handler)
    }

    /// Load every implementation of `T` in registration order.
    ///
    /// Per-candidate instantiation failures are routed through
    /// `failure_handler`; when the handler returns `Ok` the entry is
    /// dropped and loading continues. Configuration and
    /// constructor-selection errors always propagate.
    pub fn load_with<T>(
        &self,
        resolver: &ArgumentResolver,
        failure_handler: &FailureHandler,
    ) -> Result<Vec<Box<T>>>
    where
        T: FactoryType + ?Sized,
    {
        let names = self.mapping.names(T::NAME);
        let mut factories: Vec<Box<T>> = Vec::with_capacity(names.len());
        for class_name in names {
            match self.instantiate_factory::<T>(class_name, resolver) {
                Ok(factory) => factories.push(factory),
                Err(error @ ForgeError::NoSuitableConstructor { .. }) => return Err(error),
                Err(cause) => failure_handler.handle_failure(T::NAME, class_name, cause)?,
            }
        }
        trace!(
            factory_type = T::NAME,
            location = %self.location,
            loaded = factories.len(),
            registered = names.len(),
            "loaded factories"
        );
        Ok(factories)
    }

    fn instantiate_factory<T>(
        &self,
        class_name: &str,
        resolver: &ArgumentResolver,
    ) -> Result<Box<T>>
    where
        T: FactoryType + ?Sized,
    {
        let class = self
            .context
            .lookup_class(class_name)
            .ok_or_else(|| ForgeError::class_not_found(class_name))?;
        if !class.produces::<T>() {
            return Err(ForgeError::incompatible_type(class_name, T::NAME));
        }
        let instance = FactoryInstantiator::for_class(&class)?.instantiate(resolver)?;
        instance
            .downcast::<Box<T>>()
            .map(|factory| *factory)
            .map_err(|_| {
                ForgeError::internal(format!(
                    "factory class [{class_name}] produced a value of unexpected type"
                ))
            })
    }
}

/// Load every implementation of `T` from the default resource location with
/// no constructor arguments, aborting on the first failure.
pub fn load_factories<T>(context: Option<Arc<LoadingContext>>) -> Result<Vec<Box<T>>>
where
    T: FactoryType + ?Sized,
{
    FactoryLoader::for_default_resource_location(context)?.load::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::catalog::{FactoryClass, Visibility};
    use std::fs;
    use tempfile::TempDir;

    trait Probe: Send {
        fn id(&self) -> u32;
    }

    impl FactoryType for dyn Probe {
        const NAME: &'static str = "loader.test.Probe";
    }

    struct FixedProbe(u32);

    impl Probe for FixedProbe {
        fn id(&self) -> u32 {
            self.0
        }
    }

    fn probe_context(dir: &TempDir) -> Arc<LoadingContext> {
        let context = LoadingContext::isolated([dir.path()]);
        context
            .register(
                FactoryClass::of::<dyn Probe>("loader.test.FixedProbe")
                    .with_nullary(Visibility::Public, || Ok(Box::new(FixedProbe(7))))
                    .build(),
            )
            .unwrap();
        context
    }

    fn write_factories(dir: &TempDir, content: &str) {
        let path = dir.path().join(DEFAULT_RESOURCE_LOCATION);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn cache_populates_once_per_key() {
        let dir = TempDir::new().unwrap();
        write_factories(&dir, "loader.test.Probe = loader.test.FixedProbe\n");
        let context = probe_context(&dir);
        let cache = LoaderCache::new();

        let first = cache
            .loader_for(DEFAULT_RESOURCE_LOCATION, Some(Arc::clone(&context)))
            .unwrap();
        let second = cache
            .loader_for(DEFAULT_RESOURCE_LOCATION, Some(context))
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_empties_the_cache() {
        let dir = TempDir::new().unwrap();
        write_factories(&dir, "loader.test.Probe = loader.test.FixedProbe\n");
        let context = probe_context(&dir);
        let cache = LoaderCache::new();

        cache
            .loader_for(DEFAULT_RESOURCE_LOCATION, Some(context))
            .unwrap();
        assert!(!cache.is_empty());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn stats_reflect_entries_and_serialize() {
        let dir = TempDir::new().unwrap();
        write_factories(&dir, "loader.test.Probe = loader.test.FixedProbe\n");
        let context = probe_context(&dir);
        let cache = LoaderCache::new();

        cache
            .loader_for(DEFAULT_RESOURCE_LOCATION, Some(Arc::clone(&context)))
            .unwrap();
        cache
            .loader_for("config/alternate.factories", Some(context))
            .unwrap();

        let stats = cache.stats();
        assert_eq!(stats.cached_loaders, 2);
        assert_eq!(stats.cache_keys.len(), 2);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["cached_loaders"], 2);
    }

    #[test]
    fn malformed_content_fails_loader_construction() {
        let dir = TempDir::new().unwrap();
        write_factories(&dir, "no separator here\n");
        let context = probe_context(&dir);
        let cache = LoaderCache::new();

        let error = cache
            .loader_for(DEFAULT_RESOURCE_LOCATION, Some(context))
            .expect_err("malformed mapping must fail construction");
        assert!(matches!(error, ForgeError::Configuration { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn global_cache_reuses_default_context_entry() {
        let loader_for_none = FactoryLoader::for_default_resource_location(None).unwrap();
        let loader_for_default =
            FactoryLoader::for_default_resource_location(Some(LoadingContext::platform_default()))
                .unwrap();

        assert!(Arc::ptr_eq(&loader_for_none, &loader_for_default));
        assert!(FactoryLoader::cache().len() >= 1);
    }
}

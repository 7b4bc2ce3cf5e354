//! # Factory Mapping
//!
//! Discovery and parsing of factory resource files.
//!
//! A resource location is a relative path resolved against every resource
//! root visible to a loading context; all files found are merged in
//! discovery order. The format is line oriented:
//!
//! ```text
//! # comment
//! demo.Codec = demo.JsonCodec, demo.YamlCodec
//! demo.Codec = demo.TomlCodec
//! ```
//!
//! Entries for the same factory type concatenate, in file order first and
//! cross-file discovery order second. Nothing is deduplicated or re-sorted.

use crate::error::{ForgeError, Result};
use crate::registry::catalog::LoadingContext;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Mapping from factory type name to the ordered implementation class names
/// registered for it.
#[derive(Debug, Default)]
pub struct FactoryMapping {
    entries: HashMap<String, Vec<String>>,
}

impl FactoryMapping {
    /// Load and merge every resource file visible at `location` through
    /// `context`. A location matching no file yields an empty mapping.
    pub(crate) fn load(location: &str, context: &LoadingContext) -> Result<FactoryMapping> {
        let mut mapping = FactoryMapping::default();
        for root in context.enumerate_roots() {
            let path = root.join(location);
            if !path.is_file() {
                continue;
            }
            let content = fs::read_to_string(&path).map_err(|error| {
                ForgeError::configuration(
                    location,
                    format!("failed to read {}: {error}", path.display()),
                )
            })?;
            mapping.parse_into(&content, location, &path)?;
            debug!(
                location,
                file = %path.display(),
                context = context.id(),
                "merged factory resource file"
            );
        }
        Ok(mapping)
    }

    /// Implementation class names registered under `factory_type_name`, in
    /// registration order. Unknown names yield an empty slice.
    pub fn names(&self, factory_type_name: &str) -> &[String] {
        self.entries
            .get(factory_type_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Factory type names present in this mapping, sorted for determinism.
    pub fn factory_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn parse_into(&mut self, content: &str, location: &str, path: &Path) -> Result<()> {
        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(malformed(
                    location,
                    path,
                    index,
                    "expected 'factory.type = implementation, ...'",
                ));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(malformed(location, path, index, "empty factory type name"));
            }

            let names = self.entries.entry(key.to_string()).or_default();
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            for item in value.split(',') {
                let item = item.trim();
                if item.is_empty() {
                    return Err(malformed(
                        location,
                        path,
                        index,
                        "empty implementation class name",
                    ));
                }
                names.push(item.to_string());
            }
        }
        Ok(())
    }
}

fn malformed(location: &str, path: &Path, index: usize, reason: &str) -> ForgeError {
    ForgeError::configuration(
        location,
        format!("{}:{}: {reason}", path.display(), index + 1),
    )
}

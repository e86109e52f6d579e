//! Allow-list of externally hosted modules and entry point candidates.
//!
//! Generated components may only import bare specifiers that appear in
//! [`ExternalModules`]. Everything else is rejected at resolve time.
//!
//! # Examples
//!
//! ```
//! use uigen_core::ExternalModules;
//!
//! let externals = ExternalModules::default();
//! assert!(externals.get("react").is_some());
//! assert!(externals.get("left-pad").is_none());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Entry point candidates in priority order. The first existing file wins.
pub const ENTRY_CANDIDATES: [&str; 4] = ["/App.jsx", "/App.tsx", "/index.jsx", "/index.tsx"];

const REACT_VERSION: &str = "19.1.0";

/// A single allow-listed module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalModule {
    /// Bare import name, e.g. `react-dom/client`
    pub name: String,
    /// Hosted ES module URL
    pub url: String,
}

/// Mapping of bare import names to hosted module URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalModules {
    modules: BTreeMap<String, String>,
}

impl ExternalModules {
    /// Name of the UI framework module the JSX factory comes from.
    pub const FRAMEWORK: &'static str = "react";

    /// Name of the module that mounts a component into the frame.
    pub const MOUNT: &'static str = "react-dom/client";

    /// Creates an empty allow-list.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            modules: BTreeMap::new(),
        }
    }

    /// Adds or replaces an entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use uigen_core::ExternalModules;
    ///
    /// let externals = ExternalModules::empty().with("react", "https://esm.sh/react");
    /// assert_eq!(externals.len(), 1);
    /// ```
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.insert(name, url);
        self
    }

    /// Adds or replaces an entry in place.
    pub fn insert(&mut self, name: impl Into<String>, url: impl Into<String>) {
        self.modules.insert(name.into(), url.into());
    }

    /// Looks up a bare specifier. Only exact names match.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ExternalModule> {
        self.modules.get(name).map(|url| ExternalModule {
            name: name.to_string(),
            url: url.clone(),
        })
    }

    /// Returns `true` if the name is allow-listed.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Iterates over `(name, url)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.modules.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of allow-listed modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` if nothing is allow-listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for ExternalModules {
    fn default() -> Self {
        let react = format!("https://esm.sh/react@{REACT_VERSION}");
        let react_dom = format!("https://esm.sh/react-dom@{REACT_VERSION}");
        Self::empty()
            .with("react", react.clone())
            .with("react/jsx-runtime", format!("{react}/jsx-runtime"))
            .with("react-dom", format!("{react_dom}?external=react"))
            .with("react-dom/client", format!("{react_dom}/client?external=react"))
            .with(
                "lucide-react",
                "https://esm.sh/lucide-react@0.469.0?external=react",
            )
            .with("clsx", "https://esm.sh/clsx@2.1.1")
            .with("tailwind-merge", "https://esm.sh/tailwind-merge@2.6.0")
            .with(
                "class-variance-authority",
                "https://esm.sh/class-variance-authority@0.7.1",
            )
    }
}

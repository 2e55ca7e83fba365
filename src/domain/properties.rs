//! Build property bag
//!
//! Flattened `name -> value` view over TeamCity's resulting properties.

use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// One `{name, value}` entry from a TeamCity property list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Read-only mapping from dotted property name to value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyBag {
    entries: BTreeMap<String, String>,
}

impl PropertyBag {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build types referenced by `dep.<buildType>.system.build.(vcs.)?number`
    pub fn dependency_build_types(&self) -> BTreeSet<String> {
        self.entries
            .keys()
            .filter_map(|name| {
                dependency_number_pattern()
                    .captures(name)
                    .map(|caps| caps["build_type"].to_string())
            })
            .collect()
    }
}

impl FromIterator<Property> for PropertyBag {
    /// Later duplicates of a name overwrite earlier ones
    fn from_iter<I: IntoIterator<Item = Property>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|p| (p.name, p.value)).collect(),
        }
    }
}

fn dependency_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^dep\.(?P<build_type>[^.]+)\.system\.build\.(vcs\.)?number$")
            .expect("dependency property pattern is valid")
    })
}

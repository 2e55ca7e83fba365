//! Build domain types
//!
//! Identifiers and handles for CI build records, plus the locator
//! strings TeamCity uses to address them.

use serde::Deserialize;
use std::fmt;

/// Immutable key for one CI run
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildIdentifier {
    pub build_type_id: String,
    pub build_number: String,
}

impl BuildIdentifier {
    pub fn new(build_type_id: impl Into<String>, build_number: impl Into<String>) -> Self {
        Self {
            build_type_id: build_type_id.into(),
            build_number: build_number.into(),
        }
    }

    /// TeamCity build locator, e.g. `buildType:bt_main,number:1234`
    pub fn locator(&self) -> String {
        format!(
            "buildType:{},number:{}",
            self.build_type_id, self.build_number
        )
    }

    /// Locator selecting every build related to this one through `kind`
    /// dependencies, the build itself included
    pub fn closure_locator(&self, kind: DependencyKind) -> String {
        format!(
            "{}:(to:({}),includeInitial:true)",
            kind.locator_dimension(),
            self.locator()
        )
    }
}

impl fmt::Display for BuildIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.build_type_id, self.build_number)
    }
}

/// Kind of dependency edge between two builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// Downstream build consumed upstream artifacts
    Artifact,
    /// Downstream build was started from upstream VCS state
    Snapshot,
}

impl DependencyKind {
    pub fn locator_dimension(&self) -> &'static str {
        match self {
            Self::Artifact => "artifactDependency",
            Self::Snapshot => "snapshotDependency",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Artifact => "artifact",
            Self::Snapshot => "snapshot",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque handle to a build returned by a closure query
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildHandle {
    pub href: String,
}

impl BuildHandle {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }

    /// Pin sub-resource of this build
    pub fn pin_info_href(&self) -> String {
        format!("{}/pinInfo", self.href.trim_end_matches('/'))
    }
}

/// Directional edge between two builds in a dependency closure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub from_build: BuildIdentifier,
    pub to_build: BuildHandle,
    pub kind: DependencyKind,
}

impl fmt::Display for DependencyEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.from_build, self.kind, self.to_build.href)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_display() {
        let edge = DependencyEdge {
            from_build: BuildIdentifier::new("bt", "42"),
            to_build: BuildHandle::new("/app/rest/builds/id:7"),
            kind: DependencyKind::Snapshot,
        };
        assert_eq!(edge.to_string(), "bt#42 -[snapshot]-> /app/rest/builds/id:7");
    }

    #[test]
    fn test_locator() {
        let build = BuildIdentifier::new("flight_sw__main", "1234");
        assert_eq!(build.locator(), "buildType:flight_sw__main,number:1234");
        assert_eq!(build.to_string(), "flight_sw__main#1234");
    }

    #[test]
    fn test_closure_locators() {
        let build = BuildIdentifier::new("bt", "42");
        assert_eq!(
            build.closure_locator(DependencyKind::Artifact),
            "artifactDependency:(to:(buildType:bt,number:42),includeInitial:true)"
        );
        assert_eq!(
            build.closure_locator(DependencyKind::Snapshot),
            "snapshotDependency:(to:(buildType:bt,number:42),includeInitial:true)"
        );
    }

    #[test]
    fn test_pin_info_href() {
        let handle = BuildHandle::new("/app/rest/builds/id:77");
        assert_eq!(handle.pin_info_href(), "/app/rest/builds/id:77/pinInfo");

        let trailing = BuildHandle::new("/app/rest/builds/id:77/");
        assert_eq!(trailing.pin_info_href(), "/app/rest/builds/id:77/pinInfo");
    }
}

//! Hierarchical element identity.
//!
//! Every configuration element is addressed by an [`ElementId`]: the owning
//! service, an optional declaring type, a field or instance discriminator,
//! and an optional path into nested instance data. Identifiers are immutable
//! and compared component-wise.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of element an identifier points at.
///
/// The kind is fixed at construction and never re-derived from string
/// inspection afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// A service, the root namespace for types and instances.
    Service,
    /// An object type declared by a service.
    Type,
    /// A field declared by an object type.
    Field,
    /// A configuration instance of an object type.
    Instance,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Service => "service",
            Self::Type => "type",
            Self::Field => "field",
            Self::Instance => "instance",
        };
        write!(f, "{label}")
    }
}

/// One step into nested instance data.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathSegment {
    /// Descent into a map entry by key.
    Key(String),
    /// Descent into a list entry by position.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{key}"),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Immutable hierarchical identity of a configuration element.
///
/// Identifiers form a containment hierarchy: a service contains types, a type
/// contains fields and instances, and an instance contains the nested values
/// of its data. Equality and ordering are component-wise.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId {
    service: String,
    kind: ElementKind,
    type_name: Option<String>,
    name: Option<String>,
    path: Vec<PathSegment>,
}

impl ElementId {
    /// Creates the identifier of a service.
    #[must_use]
    pub fn service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            kind: ElementKind::Service,
            type_name: None,
            name: None,
            path: Vec::new(),
        }
    }

    /// Creates the identifier of an object type declared by a service.
    #[must_use]
    pub fn object_type(service: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            kind: ElementKind::Type,
            type_name: Some(type_name.into()),
            name: None,
            path: Vec::new(),
        }
    }

    /// Creates the identifier of a field declared by an object type.
    #[must_use]
    pub fn field(
        service: impl Into<String>,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            kind: ElementKind::Field,
            type_name: Some(type_name.into()),
            name: Some(field_name.into()),
            path: Vec::new(),
        }
    }

    /// Creates the identifier of an instance of an object type.
    #[must_use]
    pub fn instance(
        service: impl Into<String>,
        type_name: impl Into<String>,
        instance_name: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            kind: ElementKind::Instance,
            type_name: Some(type_name.into()),
            name: Some(instance_name.into()),
            path: Vec::new(),
        }
    }

    /// Returns a child identifier descending into a map entry by key.
    #[must_use]
    pub fn join_key(&self, key: impl Into<String>) -> Self {
        let mut child = self.clone();
        child.path.push(PathSegment::Key(key.into()));
        child
    }

    /// Returns a child identifier descending into a list entry by position.
    #[must_use]
    pub fn join_index(&self, index: usize) -> Self {
        let mut child = self.clone();
        child.path.push(PathSegment::Index(index));
        child
    }

    /// Returns the kind of the identified element.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Returns the owning service name.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service
    }

    /// Returns the declaring type name, if any.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Returns the field or instance name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the path into nested instance data.
    #[must_use]
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// Returns true if this identifier points into nested instance data.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        !self.path.is_empty()
    }

    /// Returns true if this identifier names a top-level element.
    ///
    /// Top-level elements are types, fields, and instances; nested value
    /// paths and the service namespace itself are not top-level.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.path.is_empty() && self.kind != ElementKind::Service
    }

    /// Returns the identifier of the top-level element containing this one.
    ///
    /// For a top-level identifier this is the identifier itself.
    #[must_use]
    pub fn top_level_parent(&self) -> Self {
        if self.path.is_empty() {
            return self.clone();
        }
        let mut parent = self.clone();
        parent.path.clear();
        parent
    }

    /// Returns the identifier of the immediate parent element, if any.
    ///
    /// Nested paths step up one segment; fields and instances step up to
    /// their declaring type; types step up to their service; the service
    /// has no parent.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if !self.path.is_empty() {
            let mut parent = self.clone();
            parent.path.pop();
            return Some(parent);
        }
        match (self.kind, self.type_name.as_ref()) {
            (ElementKind::Field | ElementKind::Instance, Some(type_name)) => {
                Some(Self::object_type(self.service.clone(), type_name.clone()))
            }
            (ElementKind::Field | ElementKind::Instance | ElementKind::Type, _) => {
                Some(Self::service(self.service.clone()))
            }
            (ElementKind::Service, _) => None,
        }
    }

    /// Returns true if this identifier is a proper ancestor of `other`.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        let mut current = other.parent();
        while let Some(ancestor) = current {
            if ancestor == *self {
                return true;
            }
            current = ancestor.parent();
        }
        false
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.service)?;
        if let Some(type_name) = &self.type_name {
            write!(f, ".{type_name}")?;
        }
        match self.kind {
            ElementKind::Field | ElementKind::Instance => {
                if let Some(name) = &self.name {
                    write!(f, ".{}.{name}", self.kind)?;
                }
            }
            ElementKind::Service | ElementKind::Type => {}
        }
        for segment in &self.path {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

//! Owner identity lookup.
//!
//! A load site needs the identity of the component it is nested in to find
//! its non-global bundle. The host exposes that explicitly: the render
//! handle names the enclosing component type, and an [`OwnerIdentityLookup`]
//! maps the type to its identity and origin package.

use std::fmt;

use arcstr::ArcStr;
use dashmap::DashMap;
use tracing::debug;

use crate::naming;

/// Handle given to a load site when the host attaches it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderHandle {
    enclosing_type: Option<ArcStr>,
}

impl RenderHandle {
    /// Handle for a site nested inside the component type `enclosing_type`.
    pub fn new(enclosing_type: impl Into<ArcStr>) -> Self {
        Self {
            enclosing_type: Some(enclosing_type.into()),
        }
    }

    /// Handle for a site rendered at the root, with no enclosing component.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn enclosing_type(&self) -> Option<&str> {
        self.enclosing_type.as_deref()
    }
}

/// Where a component's bundles are served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// The hosting application.
    App,
    /// A library package the application depends on.
    Library,
}

/// Identity of the component enclosing a load site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerInfo {
    /// Qualified identity (`{namespace}.{name}`).
    pub identity: ArcStr,
    /// Package the component was compiled into.
    pub package_id: ArcStr,
    pub origin: Origin,
    /// JS class name the build wraps this component's scripts in.
    pub class_name: ArcStr,
}

impl fmt::Display for OwnerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.identity, self.package_id)
    }
}

pub trait OwnerIdentityLookup: Send + Sync {
    /// Identity of the component type `enclosing_type`, if known.
    fn owner_of(&self, enclosing_type: &str) -> Option<OwnerInfo>;
}

// ---------------------------------------------------------------------------
// OwnerTable
// ---------------------------------------------------------------------------

/// Host-populated table of component types.
#[derive(Debug)]
pub struct OwnerTable {
    app_package: ArcStr,
    entries: DashMap<ArcStr, OwnerInfo>,
}

impl OwnerTable {
    /// Table for an application whose own package is `app_package`.
    pub fn new(app_package: impl Into<ArcStr>) -> Self {
        Self {
            app_package: app_package.into(),
            entries: DashMap::new(),
        }
    }

    /// Register a component type. Its origin is [`Origin::App`] when it was
    /// compiled into the application package, [`Origin::Library`] otherwise.
    pub fn register(
        &self,
        type_name: impl Into<ArcStr>,
        namespace: Option<&str>,
        name: &str,
        package_id: impl Into<ArcStr>,
    ) {
        let package_id = package_id.into();
        let origin = if package_id == self.app_package {
            Origin::App
        } else {
            Origin::Library
        };
        let info = OwnerInfo {
            identity: naming::owner_identity(namespace, name).into(),
            package_id,
            origin,
            class_name: naming::js_class_name(namespace, name).into(),
        };
        self.entries.insert(type_name.into(), info);
    }

    /// Make `derived_type` resolve to the identity of `declaring_type`, for
    /// components that inherit their render logic.
    pub fn alias(&self, derived_type: impl Into<ArcStr>, declaring_type: &str) -> bool {
        let Some(info) = self.entries.get(declaring_type).map(|e| e.value().clone()) else {
            return false;
        };
        self.entries.insert(derived_type.into(), info);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl OwnerIdentityLookup for OwnerTable {
    fn owner_of(&self, enclosing_type: &str) -> Option<OwnerInfo> {
        self.entries.get(enclosing_type).map(|e| e.value().clone())
    }
}

// ---------------------------------------------------------------------------
// CachedOwnerLookup
// ---------------------------------------------------------------------------

/// Memoizes a (possibly expensive) lookup per enclosing type.
/// Only successful lookups are cached.
pub struct CachedOwnerLookup<L> {
    inner: L,
    cache: DashMap<ArcStr, OwnerInfo>,
}

impl<L: OwnerIdentityLookup> CachedOwnerLookup<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl<L: OwnerIdentityLookup> OwnerIdentityLookup for CachedOwnerLookup<L> {
    fn owner_of(&self, enclosing_type: &str) -> Option<OwnerInfo> {
        if let Some(hit) = self.cache.get(enclosing_type) {
            return Some(hit.value().clone());
        }
        let info = self.inner.owner_of(enclosing_type)?;
        debug!(enclosing_type, owner = %info, "cached owner identity");
        self.cache.insert(ArcStr::from(enclosing_type), info.clone());
        Some(info)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

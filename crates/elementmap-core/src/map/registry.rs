//! Type dispatch: per-kind loaders plus plugin handlers for unknown kinds.
//!
//! Loaders are registered explicitly at startup. A kind without a loader is
//! offered to every [`MapDataHandler`] in registration order; if none
//! returns anything the ids are dropped without an error. Handler entries
//! backed by an element row get `can_view` from the same [`Authorization`]
//! the loaders use.

use rusqlite::Connection;
use std::collections::BTreeMap;
use std::fmt;

use super::loaders;
use crate::auth::{Authorization, Principal};
use crate::config::MapSettings;
use crate::db::query;
use crate::error::MapError;
use crate::model::{ElementKind, MapEntry};

/// Everything a loader needs to build entries for one request.
pub struct LoadContext<'a> {
    pub conn: &'a Connection,
    pub settings: &'a MapSettings,
    pub site_id: i64,
    pub authorization: &'a dyn Authorization,
    pub principal: &'a Principal,
}

impl fmt::Debug for LoadContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadContext")
            .field("site_id", &self.site_id)
            .field("settings", self.settings)
            .field("principal", self.principal)
            .finish_non_exhaustive()
    }
}

/// Batch loader for one element kind.
pub trait TypeLoader {
    fn kind(&self) -> ElementKind;

    /// Coarse ordering prefix placed first in every entry's sort key.
    fn sort_priority(&self) -> &str;

    /// Build entries for `ids`. A repeated id is loaded once; ids that
    /// cannot be found are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage query fails.
    fn load(&self, ctx: &LoadContext<'_>, ids: &[i64]) -> anyhow::Result<Vec<MapEntry>>;
}

/// Ids of a kind no loader handles, offered to plugin handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapDataRequest {
    pub kind: ElementKind,
    pub ids: Vec<i64>,
    pub site_id: i64,
    /// Viewer the map is rendered for.
    pub principal: Principal,
}

/// Plugin hook for element kinds unknown to this crate.
pub trait MapDataHandler {
    /// Entries for the requested ids, or an empty list to decline.
    ///
    /// # Errors
    ///
    /// Returns an error if the handler fails; the whole resolution fails
    /// with it.
    fn handle(&self, request: &MapDataRequest) -> anyhow::Result<Vec<MapEntry>>;
}

impl<F> MapDataHandler for F
where
    F: Fn(&MapDataRequest) -> anyhow::Result<Vec<MapEntry>>,
{
    fn handle(&self, request: &MapDataRequest) -> anyhow::Result<Vec<MapEntry>> {
        self(request)
    }
}

/// Kind → loader table plus the ordered plugin handler list.
#[derive(Default)]
pub struct TypeRegistry {
    loaders: BTreeMap<ElementKind, Box<dyn TypeLoader>>,
    handlers: Vec<Box<dyn MapDataHandler>>,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("loaders", &self.registered_kinds())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl TypeRegistry {
    /// Empty registry with no loaders or handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the ten built-in loaders.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for loader in loaders::builtin_loaders() {
            registry.register_loader(loader);
        }
        registry
    }

    /// Add a loader, replacing any loader already registered for its kind.
    pub fn register_loader(&mut self, loader: Box<dyn TypeLoader>) -> &mut Self {
        let kind = loader.kind();
        if self.loaders.insert(kind.clone(), loader).is_some() {
            tracing::debug!(kind = %kind, "replaced type loader");
        }
        self
    }

    /// Append a plugin handler.
    pub fn register_handler(&mut self, handler: Box<dyn MapDataHandler>) -> &mut Self {
        self.handlers.push(handler);
        self
    }

    pub fn resolve(&self, kind: &ElementKind) -> Option<&dyn TypeLoader> {
        self.loaders.get(kind).map(|loader| &**loader)
    }

    /// Kinds with a loader, in kind order.
    pub fn registered_kinds(&self) -> Vec<ElementKind> {
        self.loaders.keys().cloned().collect()
    }

    /// Build entries for one partition of same-kind ids.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Storage`] when a loader query fails and
    /// [`MapError::Handler`] when a plugin handler fails.
    pub fn dispatch(
        &self,
        ctx: &LoadContext<'_>,
        kind: &ElementKind,
        ids: &[i64],
    ) -> Result<Vec<MapEntry>, MapError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(loader) = self.resolve(kind) {
            let entries = loader
                .load(ctx, ids)
                .map_err(|err| err.context(format!("load {kind} entries")))?;
            tracing::debug!(kind = %kind, ids = ids.len(), entries = entries.len(), "loaded");
            return Ok(entries);
        }

        let request = MapDataRequest {
            kind: kind.clone(),
            ids: ids.to_vec(),
            site_id: ctx.site_id,
            principal: ctx.principal.clone(),
        };
        let mut entries = Vec::new();
        for handler in &self.handlers {
            let handled = handler.handle(&request).map_err(|source| MapError::Handler {
                kind: kind.clone(),
                source,
            })?;
            entries.extend(handled);
        }

        if entries.is_empty() {
            tracing::debug!(kind = %kind, ids = ids.len(), "no loader or handler, ids dropped");
            return Ok(entries);
        }

        Self::authorize(ctx, &mut entries)?;
        Ok(entries)
    }

    /// Overwrite `can_view` on handler entries that have an element row.
    /// Entries without one keep the handler's answer.
    fn authorize(ctx: &LoadContext<'_>, entries: &mut [MapEntry]) -> Result<(), MapError> {
        let ids: Vec<i64> = entries.iter().map(|entry| entry.id).collect();
        let records = query::get_elements(ctx.conn, &ids)?;
        for entry in entries.iter_mut() {
            if let Some(record) = records.get(&entry.id) {
                entry.can_view = ctx.authorization.can_view(record, ctx.principal);
            }
        }
        Ok(())
    }
}

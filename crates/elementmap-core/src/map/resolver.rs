//! The map pipeline: expand the node, follow relation edges, normalize
//! fragments, dispatch by kind, sort.

use rusqlite::Connection;
use std::collections::HashMap;
use std::path::Path;

use super::group;
use super::registry::{LoadContext, TypeRegistry};
use crate::auth::{Authorization, Principal};
use crate::config::{self, MapSettings};
use crate::db::query::{self, RelatedRef, RelationDirection, SiteFilter};
use crate::error::MapError;
use crate::graph::containment;
use crate::model::{ElementRef, MapEntry, MapResult, ReferenceCounts};

/// Computes reference maps against one store connection.
///
/// Everything the pipeline depends on is injected; the resolver holds no
/// state between calls.
pub struct MapResolver<'a> {
    conn: &'a Connection,
    settings: MapSettings,
    registry: &'a TypeRegistry,
    authorization: &'a dyn Authorization,
}

impl std::fmt::Debug for MapResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapResolver")
            .field("settings", &self.settings)
            .field("registry", self.registry)
            .finish_non_exhaustive()
    }
}

impl<'a> MapResolver<'a> {
    pub fn new(
        conn: &'a Connection,
        settings: MapSettings,
        registry: &'a TypeRegistry,
        authorization: &'a dyn Authorization,
    ) -> Self {
        Self {
            conn,
            settings,
            registry,
            authorization,
        }
    }

    /// Resolver using the settings found for `project_root` (project file,
    /// then user file, then defaults).
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Config`] if a settings file exists but cannot be
    /// read or parsed.
    pub fn for_project(
        conn: &'a Connection,
        project_root: &Path,
        registry: &'a TypeRegistry,
        authorization: &'a dyn Authorization,
    ) -> Result<Self, MapError> {
        let settings = config::resolve_settings(project_root).map_err(MapError::Config)?;
        Ok(Self::new(conn, settings, registry, authorization))
    }

    pub const fn settings(&self) -> &MapSettings {
        &self.settings
    }

    /// Everything `node` references, including references made from
    /// fragments nested inside it and from its variants.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Storage`] if any query fails and
    /// [`MapError::Handler`] if a plugin handler fails.
    pub fn outgoing(
        &self,
        node: &ElementRef,
        site_id: i64,
        principal: &Principal,
    ) -> Result<Vec<MapEntry>, MapError> {
        let mut sources = vec![node.id];
        sources.extend(containment::owned_variant_ids(self.conn, &[node.id])?);
        sources.extend(containment::contained_ids(
            self.conn,
            node.id,
            self.settings.max_containment_depth,
        )?);

        let refs = query::related_refs(
            self.conn,
            &sources,
            RelationDirection::Outgoing,
            self.site_filter(site_id),
        )?;
        tracing::debug!(node = node.id, sources = sources.len(), edges = refs.len(), "outgoing edges");
        self.entries_for(refs, site_id, principal)
    }

    /// Everything referencing `node`. Drafts and revisions report against
    /// their published original.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Storage`] if any query fails and
    /// [`MapError::Handler`] if a plugin handler fails.
    pub fn incoming(
        &self,
        node: &ElementRef,
        site_id: i64,
        principal: &Principal,
    ) -> Result<Vec<MapEntry>, MapError> {
        let target = node.canonical_or_self();
        let mut targets = vec![target];
        targets.extend(containment::owned_variant_ids(self.conn, &[target])?);

        let refs = query::related_refs(
            self.conn,
            &targets,
            RelationDirection::Incoming,
            self.site_filter(site_id),
        )?;
        tracing::debug!(node = node.id, canonical = target, edges = refs.len(), "incoming edges");
        self.entries_for(refs, site_id, principal)
    }

    /// Both directions for `node`.
    ///
    /// # Errors
    ///
    /// Fails if either direction fails; there is no partial map.
    pub fn element_map(
        &self,
        node: &ElementRef,
        site_id: i64,
        principal: &Principal,
    ) -> Result<MapResult, MapError> {
        let result = MapResult {
            incoming: self.incoming(node, site_id, principal)?,
            outgoing: self.outgoing(node, site_id, principal)?,
        };
        tracing::debug!(
            node = node.id,
            site_id,
            incoming = result.incoming.len(),
            outgoing = result.outgoing.len(),
            "element map resolved"
        );
        Ok(result)
    }

    /// Entry counts for both directions, computed by the same pipeline as
    /// [`Self::element_map`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::element_map`].
    pub fn reference_counts(
        &self,
        node: &ElementRef,
        site_id: i64,
        principal: &Principal,
    ) -> Result<ReferenceCounts, MapError> {
        Ok(self.element_map(node, site_id, principal)?.counts())
    }

    const fn site_filter(&self, site_id: i64) -> SiteFilter {
        if self.settings.show_all_sites {
            SiteFilter::AnySite
        } else {
            SiteFilter::CurrentSite(site_id)
        }
    }

    fn entries_for(
        &self,
        refs: Vec<RelatedRef>,
        site_id: i64,
        principal: &Principal,
    ) -> Result<Vec<MapEntry>, MapError> {
        let refs = self.normalize(refs)?;
        let ctx = LoadContext {
            conn: self.conn,
            settings: &self.settings,
            site_id,
            authorization: self.authorization,
            principal,
        };

        let mut entries = Vec::new();
        for (kind, ids) in group::partition_by_kind(&refs) {
            entries.extend(self.registry.dispatch(&ctx, &kind, &ids)?);
        }

        group::sort_entries(&mut entries);
        if self.settings.dedupe_entries {
            entries = group::dedupe_entries(entries);
        }
        Ok(entries)
    }

    /// Replace edges landing on content blocks with the block's root owner.
    /// Blocks without an addressable owner are dropped.
    fn normalize(&self, refs: Vec<RelatedRef>) -> Result<Vec<RelatedRef>, MapError> {
        let mut roots: HashMap<i64, Option<RelatedRef>> = HashMap::new();
        let mut normalized = Vec::with_capacity(refs.len());

        for related in refs {
            if !related.kind.redirects_to_owner() {
                normalized.push(related);
                continue;
            }

            let root = if let Some(root) = roots.get(&related.id) {
                root.clone()
            } else {
                let root = containment::root_owner(
                    self.conn,
                    related.id,
                    self.settings.max_containment_depth,
                )?
                .filter(|root| !root.kind.redirects_to_owner())
                .map(|root| RelatedRef {
                    id: root.id,
                    kind: root.kind,
                });
                roots.insert(related.id, root.clone());
                root
            };

            match root {
                Some(root) => normalized.push(root),
                None => tracing::debug!(id = related.id, "fragment without addressable owner dropped"),
            }
        }
        Ok(normalized)
    }
}

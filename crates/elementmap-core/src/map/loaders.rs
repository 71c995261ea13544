//! Built-in batch loaders, one per element kind.
//!
//! Every loader issues a fixed number of queries per batch regardless of
//! how many ids it receives: localized rows first, then the containers,
//! owners and draft creators those rows point at.

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};

use super::registry::{LoadContext, TypeLoader};
use super::text::{
    PATH_SEPARATOR, UNKNOWN_TYPE_TEXT, edit_url, join_path, nested_fragment_text, state_suffix,
    thumbnail_url, type_label,
};
use crate::db::query::{self, SiteScope};
use crate::graph::containment;
use crate::model::{
    Container, ElementKind, ElementRecord, LocalizedElement, MapEntry, UserAccount,
};

const DEFAULT_ENTRY_ICON: &str = "newspaper";
const DEFAULT_ENTRY_COLOR: &str = "var(--black)";
const IMAGE_ASSET_KIND: &str = "image";

/// The ten built-in loaders in registration order.
pub fn builtin_loaders() -> Vec<Box<dyn TypeLoader>> {
    vec![
        Box::new(EntryLoader),
        Box::new(AddressLoader),
        Box::new(AssetLoader),
        Box::new(CategoryLoader),
        Box::new(TagLoader),
        Box::new(UserLoader),
        Box::new(GlobalSetLoader),
        Box::new(ProductLoader),
        Box::new(VariantLoader),
        Box::new(CampaignLoader),
    ]
}

// ---------------------------------------------------------------------------
// Shared batch plumbing
// ---------------------------------------------------------------------------

/// Localized rows for one batch plus the lookups needed to render them.
#[derive(Default)]
struct Batch {
    rows: Vec<LocalizedElement>,
    containers: HashMap<i64, Container>,
    creators: HashMap<i64, UserAccount>,
}

impl Batch {
    fn fetch(ctx: &LoadContext<'_>, ids: &[i64], scope: SiteScope) -> Result<Self> {
        let unique = unique_ids(ids);
        let rows = query::get_localized_elements(
            ctx.conn,
            &unique,
            scope,
            ctx.settings.show_revisions,
        )?;
        let mut batch = Self::default();
        batch.add_lookups(ctx, rows.iter().map(|row| &row.record))?;
        batch.rows = rows;
        Ok(batch)
    }

    /// Fetch containers and draft creators referenced by `records`.
    fn add_lookups<'r>(
        &mut self,
        ctx: &LoadContext<'_>,
        records: impl Iterator<Item = &'r ElementRecord> + Clone,
    ) -> Result<()> {
        let container_ids: Vec<i64> = unique_ids(
            &records
                .clone()
                .flat_map(|record| [record.container_id, record.subtype_id])
                .flatten()
                .filter(|id| !self.containers.contains_key(id))
                .collect::<Vec<_>>(),
        );
        self.containers
            .extend(query::get_containers(ctx.conn, &container_ids)?);

        let creator_ids: Vec<i64> = unique_ids(
            &records
                .filter(|record| record.is_provisional_draft)
                .filter_map(|record| record.draft_creator_id)
                .filter(|id| !self.creators.contains_key(id))
                .collect::<Vec<_>>(),
        );
        self.creators
            .extend(query::get_users(ctx.conn, &creator_ids)?);
        Ok(())
    }

    fn container(&self, id: Option<i64>) -> Option<&Container> {
        id.and_then(|id| self.containers.get(&id))
    }

    fn container_name(&self, id: Option<i64>) -> Option<&str> {
        self.container(id).map(|container| container.name.as_str())
    }

    fn container_handle(&self, id: Option<i64>) -> Option<&str> {
        self.container(id).map(|container| container.handle.as_str())
    }

    fn state_suffix(&self, record: &ElementRecord) -> String {
        let creator = record
            .draft_creator_id
            .and_then(|id| self.creators.get(&id))
            .map(|user| user.username.as_str());
        state_suffix(record, creator)
    }

    fn edit_url(&self, ctx: &LoadContext<'_>, record: &ElementRecord) -> String {
        edit_url(
            ctx.settings.base_url(),
            record,
            self.container_handle(record.container_id),
        )
        .unwrap_or_default()
    }
}

/// Root owners of the fragments in a batch, with their display rows.
struct Roots {
    /// Fragment id to its root owner; fragments that are their own root are
    /// absent.
    by_fragment: HashMap<i64, ElementRecord>,
    rows: HashMap<i64, LocalizedElement>,
    users: HashMap<i64, UserAccount>,
}

impl Roots {
    fn resolve<'r>(
        ctx: &LoadContext<'_>,
        batch: &mut Batch,
        fragments: impl Iterator<Item = &'r ElementRecord>,
    ) -> Result<Self> {
        let mut by_fragment = HashMap::new();
        for record in fragments {
            if record.is_independent() {
                continue;
            }
            let root = containment::root_owner(
                ctx.conn,
                record.id,
                ctx.settings.max_containment_depth,
            )
            .with_context(|| format!("root owner of {}", record.id))?;
            if let Some(root) = root.filter(|root| root.id != record.id) {
                by_fragment.insert(record.id, root);
            }
        }

        let root_ids = unique_ids(&by_fragment.values().map(|root| root.id).collect::<Vec<_>>());
        let rows = query::get_localized_elements(
            ctx.conn,
            &root_ids,
            SiteScope::Prefer(ctx.site_id),
            true,
        )?
        .into_iter()
        .map(|row| (row.id(), row))
        .collect();

        let user_ids: Vec<i64> = by_fragment
            .values()
            .filter(|root| root.kind == ElementKind::User)
            .map(|root| root.id)
            .collect();
        let users = query::get_users(ctx.conn, &unique_ids(&user_ids))?;

        batch.add_lookups(ctx, by_fragment.values())?;

        Ok(Self {
            by_fragment,
            rows,
            users,
        })
    }

    fn of(&self, fragment_id: i64) -> Option<&ElementRecord> {
        self.by_fragment.get(&fragment_id)
    }

    /// Display name of a root: the user's name for users, otherwise its
    /// localized title.
    fn title(&self, root: &ElementRecord) -> String {
        if let Some(user) = self.users.get(&root.id) {
            return user.display_name().to_string();
        }
        self.rows
            .get(&root.id)
            .map_or_else(|| format!("#{}", root.id), LocalizedElement::display_title)
    }
}

fn settings_scope(ctx: &LoadContext<'_>) -> SiteScope {
    if ctx.settings.show_all_sites {
        SiteScope::Prefer(ctx.site_id)
    } else {
        SiteScope::Only(ctx.site_id)
    }
}

fn can_view(ctx: &LoadContext<'_>, record: &ElementRecord) -> bool {
    ctx.authorization.can_view(record, ctx.principal)
}

/// Ids in first-seen order without repeats.
fn unique_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Each requested id's entries, once, in request order.
fn in_request_order(ids: &[i64], mut built: HashMap<i64, Vec<MapEntry>>) -> Vec<MapEntry> {
    unique_ids(ids)
        .into_iter()
        .filter_map(|id| built.remove(&id))
        .flatten()
        .collect()
}

fn own_title(row: &LocalizedElement) -> Option<&str> {
    row.title.as_deref().filter(|title| !title.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Entries, including entries nested inside other elements.
///
/// A nested entry is titled after its root owner and, unless
/// `link_to_nested_element` is set, points at the root owner.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryLoader;

impl TypeLoader for EntryLoader {
    fn kind(&self) -> ElementKind {
        ElementKind::Entry
    }

    fn sort_priority(&self) -> &str {
        "01"
    }

    fn load(&self, ctx: &LoadContext<'_>, ids: &[i64]) -> Result<Vec<MapEntry>> {
        let mut batch = Batch::fetch(ctx, ids, settings_scope(ctx))?;
        let records: Vec<ElementRecord> = batch.rows.iter().map(|row| row.record.clone()).collect();
        let roots = Roots::resolve(ctx, &mut batch, records.iter())?;

        let mut built: HashMap<i64, Vec<MapEntry>> = HashMap::new();
        for row in &batch.rows {
            let entry = self.build(ctx, &batch, &roots, row);
            built.entry(row.id()).or_default().push(entry);
        }
        Ok(in_request_order(ids, built))
    }
}

impl EntryLoader {
    fn build(
        &self,
        ctx: &LoadContext<'_>,
        batch: &Batch,
        roots: &Roots,
        row: &LocalizedElement,
    ) -> MapEntry {
        let record = &row.record;
        let entry_type = batch.container(record.subtype_id);
        let type_name = entry_type.map(|container| container.name.as_str());
        let section = batch.container(record.container_id);

        let (title, group, top) = match (section, roots.of(record.id)) {
            (Some(section), _) => (row.display_title(), section.name.clone(), record),
            (None, Some(root)) => {
                let fragment = nested_fragment_text(record.field_name.as_deref(), type_name);
                let title = if root.kind == ElementKind::User {
                    join_path(&roots.title(root), &fragment)
                } else {
                    join_path(&roots.title(root), own_title(row).unwrap_or(&fragment))
                };
                (title, Self::nested_group(batch, root, type_name), root)
            }
            (None, None) => {
                let title = own_title(row).map_or_else(
                    || nested_fragment_text(record.field_name.as_deref(), type_name),
                    ToString::to_string,
                );
                let group = format!("{PATH_SEPARATOR}{}", type_name.unwrap_or(UNKNOWN_TYPE_TEXT));
                (title, group, record)
            }
        };

        let title = format!("{title}{}", batch.state_suffix(top));
        let (id, url) = if ctx.settings.link_to_nested_element {
            (record.id, batch.edit_url(ctx, record))
        } else {
            (top.id, batch.edit_url(ctx, top))
        };

        let icon = entry_type
            .and_then(|container| container.icon.clone())
            .unwrap_or_else(|| DEFAULT_ENTRY_ICON.to_string());
        let color = entry_type
            .and_then(|container| container.color.clone())
            .unwrap_or_else(|| DEFAULT_ENTRY_COLOR.to_string());

        MapEntry::new(ElementKind::Entry, id, title, url, self.sort_priority(), group)
            .with_icon(icon)
            .with_color(Some(color))
            .with_can_view(can_view(ctx, record))
    }

    /// Group for a nested entry: the owner's section and the entry type, or
    /// the owner's product/campaign type.
    fn nested_group(batch: &Batch, root: &ElementRecord, type_name: Option<&str>) -> String {
        let type_name = type_name.unwrap_or(UNKNOWN_TYPE_TEXT);
        let owner_container = batch.container_name(root.container_id);
        match (&root.kind, owner_container) {
            (ElementKind::Entry, Some(section)) => join_path(section, type_name),
            (ElementKind::Product | ElementKind::Campaign, Some(container)) => {
                container.to_string()
            }
            _ => UNKNOWN_TYPE_TEXT.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Addresses render as their root owner and link to the owner's editor.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressLoader;

impl TypeLoader for AddressLoader {
    fn kind(&self) -> ElementKind {
        ElementKind::Address
    }

    fn sort_priority(&self) -> &str {
        "21"
    }

    fn load(&self, ctx: &LoadContext<'_>, ids: &[i64]) -> Result<Vec<MapEntry>> {
        let records = query::get_elements(ctx.conn, &unique_ids(ids))?;
        let records: Vec<ElementRecord> = unique_ids(ids)
            .into_iter()
            .filter_map(|id| records.get(&id).cloned())
            .filter(|record| ctx.settings.show_revisions || !record.is_revision)
            .collect();

        let mut batch = Batch::default();
        let roots = Roots::resolve(ctx, &mut batch, records.iter())?;

        let mut built: HashMap<i64, Vec<MapEntry>> = HashMap::new();
        for record in &records {
            let top = roots.of(record.id).unwrap_or(record);
            let title = format!(
                "{}{}{}",
                roots.title(top),
                type_label("Address"),
                batch.state_suffix(top)
            );
            let url = if top.id == record.id {
                String::new()
            } else {
                batch.edit_url(ctx, top)
            };
            let entry = MapEntry::new(
                ElementKind::Address,
                record.id,
                title,
                url,
                self.sort_priority(),
                "",
            )
            .with_color(Some(DEFAULT_ENTRY_COLOR.to_string()))
            .with_can_view(can_view(ctx, record));
            built.entry(record.id).or_default().push(entry);
        }
        Ok(in_request_order(ids, built))
    }
}

// ---------------------------------------------------------------------------
// Assets, categories, tags
// ---------------------------------------------------------------------------

/// Assets are grouped by volume and carry file and thumbnail URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetLoader;

impl TypeLoader for AssetLoader {
    fn kind(&self) -> ElementKind {
        ElementKind::Asset
    }

    fn sort_priority(&self) -> &str {
        "10"
    }

    fn load(&self, ctx: &LoadContext<'_>, ids: &[i64]) -> Result<Vec<MapEntry>> {
        let batch = Batch::fetch(ctx, ids, settings_scope(ctx))?;

        let mut built: HashMap<i64, Vec<MapEntry>> = HashMap::new();
        for row in &batch.rows {
            let record = &row.record;
            let volume = batch.container_name(record.container_id).unwrap_or_default();
            let title = format!("{}{}", row.display_title(), type_label(volume));
            let file_url = row.url.clone().filter(|url| !url.is_empty());
            let image_url = file_url
                .as_deref()
                .filter(|_| {
                    ctx.settings.show_thumbnails
                        && record.asset_kind.as_deref() == Some(IMAGE_ASSET_KIND)
                })
                .map(thumbnail_url);

            let entry = MapEntry::new(
                ElementKind::Asset,
                record.id,
                title,
                batch.edit_url(ctx, record),
                self.sort_priority(),
                volume,
            )
            .with_image_url(image_url)
            .with_file_url(file_url)
            .with_can_view(can_view(ctx, record));
            built.entry(record.id).or_default().push(entry);
        }
        Ok(in_request_order(ids, built))
    }
}

/// Categories link to their editor inside the category group.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryLoader;

impl TypeLoader for CategoryLoader {
    fn kind(&self) -> ElementKind {
        ElementKind::Category
    }

    fn sort_priority(&self) -> &str {
        "10"
    }

    fn load(&self, ctx: &LoadContext<'_>, ids: &[i64]) -> Result<Vec<MapEntry>> {
        let batch = Batch::fetch(ctx, ids, settings_scope(ctx))?;
        Ok(simple_entries(ctx, &batch, ids, ElementKind::Category, self.sort_priority()))
    }
}

/// Tags link to the management list of their tag group.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagLoader;

impl TypeLoader for TagLoader {
    fn kind(&self) -> ElementKind {
        ElementKind::Tag
    }

    fn sort_priority(&self) -> &str {
        "15"
    }

    fn load(&self, ctx: &LoadContext<'_>, ids: &[i64]) -> Result<Vec<MapEntry>> {
        let batch = Batch::fetch(ctx, ids, settings_scope(ctx))?;
        Ok(simple_entries(ctx, &batch, ids, ElementKind::Tag, self.sort_priority()))
    }
}

/// Title plus state suffix, grouped by container name.
fn simple_entries(
    ctx: &LoadContext<'_>,
    batch: &Batch,
    ids: &[i64],
    kind: ElementKind,
    priority: &str,
) -> Vec<MapEntry> {
    let mut built: HashMap<i64, Vec<MapEntry>> = HashMap::new();
    for row in &batch.rows {
        let record = &row.record;
        let title = format!("{}{}", row.display_title(), batch.state_suffix(record));
        let entry = MapEntry::new(
            kind.clone(),
            record.id,
            title,
            batch.edit_url(ctx, record),
            priority,
            batch.container_name(record.container_id).unwrap_or_default(),
        )
        .with_can_view(can_view(ctx, record));
        built.entry(record.id).or_default().push(entry);
    }
    in_request_order(ids, built)
}

// ---------------------------------------------------------------------------
// Users and global sets
// ---------------------------------------------------------------------------

/// Users are site-independent and titled by full name or username.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserLoader;

impl TypeLoader for UserLoader {
    fn kind(&self) -> ElementKind {
        ElementKind::User
    }

    fn sort_priority(&self) -> &str {
        "20"
    }

    fn load(&self, ctx: &LoadContext<'_>, ids: &[i64]) -> Result<Vec<MapEntry>> {
        let unique = unique_ids(ids);
        let records = query::get_elements(ctx.conn, &unique)?;
        let accounts = query::get_users(ctx.conn, &unique)?;

        let mut built: HashMap<i64, Vec<MapEntry>> = HashMap::new();
        for (id, account) in &accounts {
            let Some(record) = records.get(id) else {
                continue;
            };
            let url = edit_url(ctx.settings.base_url(), record, None).unwrap_or_default();
            let entry = MapEntry::new(
                ElementKind::User,
                *id,
                account.display_name(),
                url,
                self.sort_priority(),
                "",
            )
            .with_can_view(can_view(ctx, record));
            built.entry(*id).or_default().push(entry);
        }
        Ok(in_request_order(ids, built))
    }
}

/// Global sets always resolve, falling back to any site.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalSetLoader;

impl TypeLoader for GlobalSetLoader {
    fn kind(&self) -> ElementKind {
        ElementKind::GlobalSet
    }

    fn sort_priority(&self) -> &str {
        "99"
    }

    fn load(&self, ctx: &LoadContext<'_>, ids: &[i64]) -> Result<Vec<MapEntry>> {
        let batch = Batch::fetch(ctx, ids, SiteScope::Prefer(ctx.site_id))?;
        Ok(simple_entries(ctx, &batch, ids, ElementKind::GlobalSet, self.sort_priority()))
    }
}

// ---------------------------------------------------------------------------
// Commerce
// ---------------------------------------------------------------------------

/// Products carry their product type in the title and group.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductLoader;

impl TypeLoader for ProductLoader {
    fn kind(&self) -> ElementKind {
        ElementKind::Product
    }

    fn sort_priority(&self) -> &str {
        "30"
    }

    fn load(&self, ctx: &LoadContext<'_>, ids: &[i64]) -> Result<Vec<MapEntry>> {
        let batch = Batch::fetch(ctx, ids, settings_scope(ctx))?;

        let mut built: HashMap<i64, Vec<MapEntry>> = HashMap::new();
        for row in &batch.rows {
            let record = &row.record;
            let product_type = batch.container_name(record.container_id).unwrap_or_default();
            let title = format!(
                "{}{}{}",
                row.display_title(),
                type_label(product_type),
                batch.state_suffix(record)
            );
            let entry = MapEntry::new(
                ElementKind::Product,
                record.id,
                title,
                batch.edit_url(ctx, record),
                self.sort_priority(),
                product_type,
            )
            .with_can_view(can_view(ctx, record));
            built.entry(record.id).or_default().push(entry);
        }
        Ok(in_request_order(ids, built))
    }
}

/// Variants are titled after their product and open the product editor.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariantLoader;

impl TypeLoader for VariantLoader {
    fn kind(&self) -> ElementKind {
        ElementKind::Variant
    }

    fn sort_priority(&self) -> &str {
        "35"
    }

    fn load(&self, ctx: &LoadContext<'_>, ids: &[i64]) -> Result<Vec<MapEntry>> {
        let mut batch = Batch::fetch(ctx, ids, settings_scope(ctx))?;

        let product_ids = unique_ids(
            &batch
                .rows
                .iter()
                .filter_map(|row| row.record.owner_id)
                .collect::<Vec<_>>(),
        );
        let products: HashMap<i64, LocalizedElement> = query::get_localized_elements(
            ctx.conn,
            &product_ids,
            SiteScope::Prefer(ctx.site_id),
            true,
        )?
        .into_iter()
        .map(|row| (row.id(), row))
        .collect();
        batch.add_lookups(ctx, products.values().map(|row| &row.record))?;

        let mut built: HashMap<i64, Vec<MapEntry>> = HashMap::new();
        for row in &batch.rows {
            let record = &row.record;
            let product = record.owner_id.and_then(|id| products.get(&id));
            let (title, url, group) = match product {
                Some(product) => {
                    let product_type = batch
                        .container_name(product.record.container_id)
                        .unwrap_or_default();
                    (
                        format!(
                            "{}{}",
                            join_path(&product.display_title(), &row.display_title()),
                            type_label(product_type)
                        ),
                        batch.edit_url(ctx, &product.record),
                        product_type.to_string(),
                    )
                }
                None => (row.display_title(), String::new(), String::new()),
            };

            let entry = MapEntry::new(
                ElementKind::Variant,
                record.id,
                title,
                url,
                self.sort_priority(),
                group,
            )
            .with_can_view(can_view(ctx, record));
            built.entry(record.id).or_default().push(entry);
        }
        Ok(in_request_order(ids, built))
    }
}

// ---------------------------------------------------------------------------
// Campaigns
// ---------------------------------------------------------------------------

/// Campaigns list every localized copy, labelled with site and campaign type.
#[derive(Debug, Clone, Copy, Default)]
pub struct CampaignLoader;

impl TypeLoader for CampaignLoader {
    fn kind(&self) -> ElementKind {
        ElementKind::Campaign
    }

    fn sort_priority(&self) -> &str {
        "40"
    }

    fn load(&self, ctx: &LoadContext<'_>, ids: &[i64]) -> Result<Vec<MapEntry>> {
        let batch = Batch::fetch(ctx, ids, SiteScope::All)?;
        let sites = query::get_sites(ctx.conn)?;

        let mut built: HashMap<i64, Vec<MapEntry>> = HashMap::new();
        for row in &batch.rows {
            let record = &row.record;
            let site_name = sites
                .get(&row.site_id)
                .map_or(UNKNOWN_TYPE_TEXT, |site| site.name.as_str());
            let campaign_type = batch
                .container_name(record.container_id)
                .unwrap_or(UNKNOWN_TYPE_TEXT);
            let title = format!(
                "{} ({site_name}, {campaign_type}){}",
                row.display_title(),
                batch.state_suffix(record)
            );
            let entry = MapEntry::new(
                ElementKind::Campaign,
                record.id,
                title,
                batch.edit_url(ctx, record),
                self.sort_priority(),
                campaign_type,
            )
            .with_can_view(can_view(ctx, record));
            built.entry(record.id).or_default().push(entry);
        }
        Ok(in_request_order(ids, built))
    }
}

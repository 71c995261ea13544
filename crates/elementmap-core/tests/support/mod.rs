//! Content-graph builder shared by the integration tests.

#![allow(dead_code)]

use elementmap_core::db::{self, migrations, query};
use elementmap_core::{AllowAll, ElementRef, MapResolver, MapSettings, TypeRegistry};
use rusqlite::{Connection, params};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

pub const SITE_EN: i64 = 1;
pub const SITE_FR: i64 = 2;

/// Route library logs to the test harness; `RUST_LOG=elementmap_core=debug`
/// shows the pipeline steps of a failing test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A migrated store with two sites, on disk or in memory.
pub struct Graph {
    pub conn: Connection,
    _dir: Option<TempDir>,
}

impl Graph {
    /// Store file inside a fresh temp dir, opened through `open_store`.
    pub fn on_disk() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let conn = db::open_store(&dir.path().join("content.db")).expect("open store");
        Self::with_sites(conn, Some(dir))
    }

    pub fn in_memory() -> Self {
        let mut conn = Connection::open_in_memory().expect("open in-memory");
        migrations::migrate(&mut conn).expect("migrate");
        Self::with_sites(conn, None)
    }

    fn with_sites(conn: Connection, dir: Option<TempDir>) -> Self {
        init_tracing();
        conn.execute_batch(
            "INSERT INTO sites (site_id, handle, name) VALUES (1, 'en', 'English');
             INSERT INTO sites (site_id, handle, name) VALUES (2, 'fr', 'French');",
        )
        .expect("insert sites");
        Self { conn, _dir: dir }
    }

    pub fn container(&self, id: i64, category: &str, name: &str) -> &Self {
        self.conn
            .execute(
                "INSERT INTO containers (container_id, category, handle, name) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, category, name.to_lowercase(), name],
            )
            .expect("insert container");
        self
    }

    pub fn element(&self, id: i64, kind: &str) -> Node<'_> {
        Node {
            graph: self,
            id,
            kind: kind.to_string(),
            canonical_id: None,
            owner_id: None,
            field_name: None,
            container_id: None,
            subtype_id: None,
            draft: None,
            provisional: false,
            revision: None,
            asset_kind: None,
            localized: Vec::new(),
        }
    }

    pub fn user(&self, id: i64, username: &str, full_name: Option<&str>) -> &Self {
        self.element(id, "user").title(full_name.unwrap_or(username)).insert();
        self.conn
            .execute(
                "INSERT INTO users (element_id, username, full_name) VALUES (?1, ?2, ?3)",
                params![id, username, full_name],
            )
            .expect("insert user");
        self
    }

    pub fn relate(&self, source: i64, target: i64) -> &Self {
        self.relate_on(source, target, None)
    }

    pub fn relate_on(&self, source: i64, target: i64, site: Option<i64>) -> &Self {
        self.conn
            .execute(
                "INSERT INTO relations (source_id, target_id, source_site_id) VALUES (?1, ?2, ?3)",
                params![source, target, site],
            )
            .expect("insert relation");
        self
    }

    /// The node for `id` as a caller would look it up.
    pub fn node(&self, id: i64) -> ElementRef {
        query::get_element_ref(&self.conn, id, SITE_EN)
            .expect("query")
            .expect("node exists")
    }

    pub fn resolver<'a>(
        &'a self,
        settings: MapSettings,
        registry: &'a TypeRegistry,
    ) -> MapResolver<'a> {
        MapResolver::new(&self.conn, settings, registry, &AllowAll)
    }
}

/// Pending `elements` row plus its localized rows.
pub struct Node<'g> {
    graph: &'g Graph,
    id: i64,
    kind: String,
    canonical_id: Option<i64>,
    owner_id: Option<i64>,
    field_name: Option<String>,
    container_id: Option<i64>,
    subtype_id: Option<i64>,
    draft: Option<(i64, Option<String>)>,
    provisional: bool,
    revision: Option<i64>,
    asset_kind: Option<String>,
    localized: Vec<(i64, String, Option<String>)>,
}

impl Node<'_> {
    pub fn owner(mut self, owner_id: i64, field: &str) -> Self {
        self.owner_id = Some(owner_id);
        self.field_name = Some(field.to_string());
        self
    }

    pub fn filed_in(mut self, container_id: i64) -> Self {
        self.container_id = Some(container_id);
        self
    }

    pub fn typed(mut self, subtype_id: i64) -> Self {
        self.subtype_id = Some(subtype_id);
        self
    }

    pub fn draft_of(mut self, canonical_id: i64, creator: i64, name: Option<&str>) -> Self {
        self.canonical_id = Some(canonical_id);
        self.draft = Some((creator, name.map(ToString::to_string)));
        self
    }

    pub fn provisional_of(mut self, canonical_id: i64, creator: i64) -> Self {
        self.provisional = true;
        self.draft_of(canonical_id, creator, None)
    }

    pub fn revision_of(mut self, canonical_id: i64, num: i64) -> Self {
        self.canonical_id = Some(canonical_id);
        self.revision = Some(num);
        self
    }

    pub fn image(mut self) -> Self {
        self.asset_kind = Some("image".to_string());
        self
    }

    /// Localized title on the primary site.
    pub fn title(self, title: &str) -> Self {
        self.localized_on(SITE_EN, title, None)
    }

    pub fn localized_on(mut self, site: i64, title: &str, url: Option<&str>) -> Self {
        self.localized
            .push((site, title.to_string(), url.map(ToString::to_string)));
        self
    }

    pub fn insert(self) {
        let (is_draft, creator, draft_name) = match &self.draft {
            Some((creator, name)) => (true, Some(*creator), name.clone()),
            None => (false, None, None),
        };
        self.graph
            .conn
            .execute(
                "INSERT INTO elements (element_id, kind, canonical_id, owner_id, field_name, \
                 container_id, subtype_id, is_draft, is_provisional_draft, is_revision, \
                 draft_creator_id, draft_name, revision_num, asset_kind) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    self.id,
                    self.kind,
                    self.canonical_id,
                    self.owner_id,
                    self.field_name,
                    self.container_id,
                    self.subtype_id,
                    is_draft,
                    self.provisional,
                    self.revision.is_some(),
                    creator,
                    draft_name,
                    self.revision,
                    self.asset_kind,
                ],
            )
            .expect("insert element");

        for (site, title, url) in &self.localized {
            self.graph
                .conn
                .execute(
                    "INSERT INTO element_sites (element_id, site_id, title, url) \
                     VALUES (?1, ?2, ?3, ?4)",
                    params![self.id, site, title, url],
                )
                .expect("insert localized row");
        }
    }
}

//! In-memory store builders shared by unit tests.

use rusqlite::{Connection, params};

pub const DEFAULT_SITE: i64 = 1;
pub const SECOND_SITE: i64 = 2;

/// Migrated in-memory store with two sites.
pub fn test_db() -> Connection {
    let mut conn = Connection::open_in_memory().expect("open in-memory db");
    crate::db::migrations::migrate(&mut conn).expect("migrate");
    conn.execute_batch(
        "INSERT INTO sites (site_id, handle, name) VALUES (1, 'default', 'Default');
         INSERT INTO sites (site_id, handle, name) VALUES (2, 'fr', 'French');",
    )
    .expect("insert sites");
    conn
}

pub fn insert_container(conn: &Connection, id: i64, category: &str, name: &str) {
    conn.execute(
        "INSERT INTO containers (container_id, category, handle, name) VALUES (?1, ?2, ?3, ?4)",
        params![id, category, name.to_ascii_lowercase().replace(' ', "-"), name],
    )
    .expect("insert container");
}

/// Row builder for the `elements` table.
#[derive(Debug, Clone, Default)]
pub struct NewElement {
    id: i64,
    kind: String,
    canonical_id: Option<i64>,
    owner_id: Option<i64>,
    field_name: Option<String>,
    container_id: Option<i64>,
    subtype_id: Option<i64>,
    is_draft: bool,
    is_provisional_draft: bool,
    is_revision: bool,
    draft_creator_id: Option<i64>,
    draft_name: Option<String>,
    revision_num: Option<i64>,
    asset_kind: Option<String>,
}

impl NewElement {
    pub fn new(id: i64, kind: &str) -> Self {
        Self {
            id,
            kind: kind.to_string(),
            ..Self::default()
        }
    }

    pub fn owner(mut self, owner_id: i64) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn field(mut self, name: &str) -> Self {
        self.field_name = Some(name.to_string());
        self
    }

    pub fn container(mut self, id: i64) -> Self {
        self.container_id = Some(id);
        self
    }

    pub fn subtype(mut self, id: i64) -> Self {
        self.subtype_id = Some(id);
        self
    }

    pub fn canonical(mut self, id: i64) -> Self {
        self.canonical_id = Some(id);
        self
    }

    pub fn draft(mut self, creator: i64, name: &str) -> Self {
        self.is_draft = true;
        self.draft_creator_id = Some(creator);
        self.draft_name = Some(name.to_string());
        self
    }

    pub fn provisional(mut self, creator: i64) -> Self {
        self.is_draft = true;
        self.is_provisional_draft = true;
        self.draft_creator_id = Some(creator);
        self
    }

    pub fn revision(mut self, num: i64) -> Self {
        self.is_revision = true;
        self.revision_num = Some(num);
        self
    }

    pub fn asset_kind(mut self, kind: &str) -> Self {
        self.asset_kind = Some(kind.to_string());
        self
    }

    pub fn insert(self, conn: &Connection) {
        conn.execute(
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
                self.is_draft,
                self.is_provisional_draft,
                self.is_revision,
                self.draft_creator_id,
                self.draft_name,
                self.revision_num,
                self.asset_kind,
            ],
        )
        .expect("insert element");
    }
}

pub fn localize(conn: &Connection, id: i64, site_id: i64, title: &str, url: Option<&str>) {
    conn.execute(
        "INSERT INTO element_sites (element_id, site_id, title, url) VALUES (?1, ?2, ?3, ?4)",
        params![id, site_id, title, url],
    )
    .expect("insert element site");
}

pub fn insert_user(conn: &Connection, id: i64, username: &str, full_name: Option<&str>) {
    NewElement::new(id, "user").insert(conn);
    conn.execute(
        "INSERT INTO users (element_id, username, full_name) VALUES (?1, ?2, ?3)",
        params![id, username, full_name],
    )
    .expect("insert user");
    localize(conn, id, DEFAULT_SITE, full_name.unwrap_or(username), None);
}

pub fn relate(conn: &Connection, source: i64, target: i64, source_site_id: Option<i64>) {
    conn.execute(
        "INSERT INTO relations (source_id, target_id, source_site_id) VALUES (?1, ?2, ?3)",
        params![source, target, source_site_id],
    )
    .expect("insert relation");
}

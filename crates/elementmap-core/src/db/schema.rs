//! SQLite schema for the content-graph store.
//!
//! - `elements` holds one site-independent row per node, including the
//!   owner link used by containment and the draft/revision flags
//! - `element_sites` holds the localized title/url for each site the
//!   element exists in
//! - `relations` holds directed reference edges; `source_site_id = NULL`
//!   means the edge applies to every site
//! - `containers`, `sites` and `users` carry the display metadata loaders
//!   join against
//! - `store_meta` mirrors `PRAGMA user_version` for external tooling

/// Migration v1: tables plus store metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS sites (
    site_id INTEGER PRIMARY KEY,
    handle TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS containers (
    container_id INTEGER PRIMARY KEY,
    category TEXT NOT NULL CHECK (category IN (
        'section', 'entry_type', 'volume', 'category_group',
        'tag_group', 'product_type', 'campaign_type'
    )),
    handle TEXT NOT NULL,
    name TEXT NOT NULL,
    icon TEXT,
    color TEXT
);

CREATE TABLE IF NOT EXISTS elements (
    element_id INTEGER PRIMARY KEY,
    kind TEXT NOT NULL CHECK (length(trim(kind)) > 0),
    canonical_id INTEGER,
    owner_id INTEGER,
    field_name TEXT,
    container_id INTEGER REFERENCES containers(container_id) ON DELETE SET NULL,
    subtype_id INTEGER REFERENCES containers(container_id) ON DELETE SET NULL,
    is_draft INTEGER NOT NULL DEFAULT 0 CHECK (is_draft IN (0, 1)),
    is_provisional_draft INTEGER NOT NULL DEFAULT 0 CHECK (is_provisional_draft IN (0, 1)),
    is_revision INTEGER NOT NULL DEFAULT 0 CHECK (is_revision IN (0, 1)),
    draft_creator_id INTEGER,
    draft_name TEXT,
    revision_num INTEGER,
    asset_kind TEXT,
    CHECK (owner_id IS NULL OR owner_id <> element_id)
);

CREATE TABLE IF NOT EXISTS element_sites (
    element_id INTEGER NOT NULL REFERENCES elements(element_id) ON DELETE CASCADE,
    site_id INTEGER NOT NULL REFERENCES sites(site_id) ON DELETE CASCADE,
    title TEXT,
    url TEXT,
    PRIMARY KEY (element_id, site_id)
);

CREATE TABLE IF NOT EXISTS users (
    element_id INTEGER PRIMARY KEY REFERENCES elements(element_id) ON DELETE CASCADE,
    username TEXT NOT NULL CHECK (length(trim(username)) > 0),
    full_name TEXT
);

CREATE TABLE IF NOT EXISTS relations (
    relation_id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id INTEGER NOT NULL,
    target_id INTEGER NOT NULL,
    source_site_id INTEGER,
    field_name TEXT,
    sort_order INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (1, 1);
";

/// Migration v2: read-path indexes for relation, containment and site lookups.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_relations_source
    ON relations(source_id, source_site_id);

CREATE INDEX IF NOT EXISTS idx_relations_target
    ON relations(target_id, source_site_id);

CREATE INDEX IF NOT EXISTS idx_elements_owner_kind
    ON elements(owner_id, kind);

CREATE INDEX IF NOT EXISTS idx_elements_canonical
    ON elements(canonical_id);

CREATE INDEX IF NOT EXISTS idx_element_sites_site
    ON element_sites(site_id, element_id);
";

/// Indexes every migrated store must carry.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_relations_source",
    "idx_relations_target",
    "idx_elements_owner_kind",
    "idx_elements_canonical",
    "idx_element_sites_site",
];

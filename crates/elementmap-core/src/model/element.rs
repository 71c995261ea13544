use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::{fmt, str::FromStr};

/// Concrete type tag of a content-graph element.
///
/// Unknown tags parse to [`ElementKind::Other`] so that externally
/// registered types travel through the pipeline untouched. Construct
/// `Other` through [`FromStr`]/[`From`] rather than directly: a
/// hand-built `Other("entry")` does not compare equal to `Entry`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ElementKind {
    Entry,
    Address,
    ContentBlock,
    Asset,
    Category,
    Tag,
    GlobalSet,
    User,
    Product,
    Variant,
    Campaign,
    Other(String),
}

impl ElementKind {
    /// Every built-in kind, in declaration order.
    pub const BUILTIN: [Self; 11] = [
        Self::Entry,
        Self::Address,
        Self::ContentBlock,
        Self::Asset,
        Self::Category,
        Self::Tag,
        Self::GlobalSet,
        Self::User,
        Self::Product,
        Self::Variant,
        Self::Campaign,
    ];

    /// Kinds that may be structurally owned by another element.
    pub const FRAGMENTS: [Self; 3] = [Self::Entry, Self::Address, Self::ContentBlock];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Entry => "entry",
            Self::Address => "address",
            Self::ContentBlock => "content_block",
            Self::Asset => "asset",
            Self::Category => "category",
            Self::Tag => "tag",
            Self::GlobalSet => "global_set",
            Self::User => "user",
            Self::Product => "product",
            Self::Variant => "variant",
            Self::Campaign => "campaign",
            Self::Other(tag) => tag,
        }
    }

    /// Whether elements of this kind can live inside an owner.
    pub const fn is_fragment(&self) -> bool {
        matches!(self, Self::Entry | Self::Address | Self::ContentBlock)
    }

    /// Whether a relation landing on this kind is redirected to the
    /// fragment's root owner before dispatch.
    pub const fn redirects_to_owner(&self) -> bool {
        matches!(self, Self::ContentBlock)
    }

    pub const fn is_builtin(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl FromStr for ElementKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        let kind = Self::BUILTIN
            .into_iter()
            .find(|kind| kind.as_str() == tag)
            .unwrap_or_else(|| Self::Other(tag.to_string()));
        Ok(kind)
    }
}

impl From<&str> for ElementKind {
    fn from(tag: &str) -> Self {
        match tag.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl From<String> for ElementKind {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl From<ElementKind> for String {
    fn from(kind: ElementKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The node a map is requested for.
///
/// Drafts and revisions share `canonical_id` with their published original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRef {
    pub id: i64,
    pub kind: ElementKind,
    pub site_id: i64,
    pub canonical_id: Option<i64>,
    pub is_draft: bool,
    pub is_provisional_draft: bool,
    pub is_revision: bool,
    pub draft_creator_id: Option<i64>,
    pub revision_num: Option<i64>,
}

impl ElementRef {
    /// Minimal published element reference.
    pub fn new(id: i64, kind: impl Into<ElementKind>, site_id: i64) -> Self {
        Self {
            id,
            kind: kind.into(),
            site_id,
            canonical_id: None,
            is_draft: false,
            is_provisional_draft: false,
            is_revision: false,
            draft_creator_id: None,
            revision_num: None,
        }
    }

    /// The published identity: `canonical_id` when set, otherwise `id`.
    pub fn canonical_or_self(&self) -> i64 {
        self.canonical_id.unwrap_or(self.id)
    }
}

/// A site-independent row of the `elements` table.
///
/// `container_id` points at the independent container (section, volume,
/// category group, tag group, product type, campaign type); `subtype_id`
/// at the entry type for entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRecord {
    pub id: i64,
    pub kind: ElementKind,
    pub canonical_id: Option<i64>,
    pub owner_id: Option<i64>,
    pub field_name: Option<String>,
    pub container_id: Option<i64>,
    pub subtype_id: Option<i64>,
    pub is_draft: bool,
    pub is_provisional_draft: bool,
    pub is_revision: bool,
    pub draft_creator_id: Option<i64>,
    pub draft_name: Option<String>,
    pub revision_num: Option<i64>,
    pub asset_kind: Option<String>,
}

impl ElementRecord {
    pub fn to_ref(&self, site_id: i64) -> ElementRef {
        ElementRef {
            id: self.id,
            kind: self.kind.clone(),
            site_id,
            canonical_id: self.canonical_id,
            is_draft: self.is_draft,
            is_provisional_draft: self.is_provisional_draft,
            is_revision: self.is_revision,
            draft_creator_id: self.draft_creator_id,
            revision_num: self.revision_num,
        }
    }

    /// An element is independently addressable when it is not a fragment,
    /// has no owner, or is an entry filed in a section.
    pub const fn is_independent(&self) -> bool {
        !self.kind.is_fragment()
            || self.owner_id.is_none()
            || (matches!(self.kind, ElementKind::Entry) && self.container_id.is_some())
    }
}

/// An element together with the localized row chosen for the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedElement {
    pub record: ElementRecord,
    pub site_id: i64,
    pub title: Option<String>,
    pub url: Option<String>,
}

impl LocalizedElement {
    pub const fn id(&self) -> i64 {
        self.record.id
    }

    /// Title, or `#{id}` for untitled elements.
    pub fn display_title(&self) -> String {
        self.title
            .as_deref()
            .filter(|title| !title.trim().is_empty())
            .map_or_else(|| format!("#{}", self.record.id), ToString::to_string)
    }
}

/// What a `containers` row groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerCategory {
    Section,
    EntryType,
    Volume,
    CategoryGroup,
    TagGroup,
    ProductType,
    CampaignType,
}

impl ContainerCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::EntryType => "entry_type",
            Self::Volume => "volume",
            Self::CategoryGroup => "category_group",
            Self::TagGroup => "tag_group",
            Self::ProductType => "product_type",
            Self::CampaignType => "campaign_type",
        }
    }
}

impl FromStr for ContainerCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim() {
            "section" => Ok(Self::Section),
            "entry_type" => Ok(Self::EntryType),
            "volume" => Ok(Self::Volume),
            "category_group" => Ok(Self::CategoryGroup),
            "tag_group" => Ok(Self::TagGroup),
            "product_type" => Ok(Self::ProductType),
            "campaign_type" => Ok(Self::CampaignType),
            other => bail!("unknown container category '{other}'"),
        }
    }
}

impl fmt::Display for ContainerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named grouping an element is filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: i64,
    pub category: ContainerCategory,
    pub handle: String,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub id: i64,
    pub handle: String,
    pub name: String,
}

/// Account details for `user` elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
}

impl UserAccount {
    /// Full name when present, otherwise the username.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

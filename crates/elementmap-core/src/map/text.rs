//! Title and URL composition shared by the built-in loaders.

use crate::model::{ElementKind, ElementRecord};

/// Separator between an owner and the fragment inside it.
pub const PATH_SEPARATOR: &str = " -> ";

/// Field name stored for fields whose label is hidden.
pub const BLANK_FIELD_NAME: &str = "__blank__";

/// Text used when a fragment's entry type cannot be resolved.
pub const UNKNOWN_TYPE_TEXT: &str = "n/a";

/// `"{owner} -> {child}"`.
pub fn join_path(owner: &str, child: &str) -> String {
    format!("{owner}{PATH_SEPARATOR}{child}")
}

/// `" ({name})"`, or nothing for an empty name.
pub fn type_label(name: &str) -> String {
    if name.trim().is_empty() {
        String::new()
    } else {
        format!(" ({name})")
    }
}

/// Parenthesized draft/revision marker for `record`.
///
/// Provisional drafts win over drafts, drafts over revisions; published
/// elements get an empty string. Missing creator or draft names are left
/// out rather than rendered empty.
pub fn state_suffix(record: &ElementRecord, creator_username: Option<&str>) -> String {
    let parts: Vec<String> = if record.is_provisional_draft {
        std::iter::once("Provisional Draft".to_string())
            .chain(non_blank(creator_username).map(ToString::to_string))
            .collect()
    } else if record.is_draft {
        std::iter::once("Draft".to_string())
            .chain(non_blank(record.draft_name.as_deref()).map(ToString::to_string))
            .collect()
    } else if record.is_revision {
        match record.revision_num {
            Some(num) => vec![format!("Revision {num}")],
            None => vec!["Revision".to_string()],
        }
    } else {
        return String::new();
    };

    format!(" ({})", parts.join(", "))
}

/// Describes an untitled fragment by the field holding it and its type:
/// `"{field}/{type}"`, or just the type when the field label is hidden.
pub fn nested_fragment_text(field_name: Option<&str>, type_name: Option<&str>) -> String {
    let Some(type_name) = non_blank(type_name) else {
        return UNKNOWN_TYPE_TEXT.to_string();
    };
    match non_blank(field_name).filter(|name| *name != BLANK_FIELD_NAME) {
        Some(field) => format!("{field}/{type_name}"),
        None => type_name.to_string(),
    }
}

/// Control-panel path of the editor for `record`, relative to the base URL.
///
/// `container` is the handle of the section, category group, product type
/// or campaign type the element is filed under. Kinds edited through their
/// owner (addresses, variants, content blocks) and unknown kinds have no
/// path of their own.
pub fn edit_path(record: &ElementRecord, container: Option<&str>) -> Option<String> {
    let id = record.canonical_id.unwrap_or(record.id);
    let filed = |prefix: &str| match container {
        Some(handle) => format!("{prefix}/{handle}/{id}"),
        None => format!("{prefix}/{id}"),
    };

    let path = match record.kind {
        ElementKind::Entry => filed("entries"),
        ElementKind::Category => filed("categories"),
        ElementKind::Product => filed("commerce/products"),
        ElementKind::Campaign => filed("campaign/campaigns"),
        ElementKind::Asset => format!("assets/edit/{id}"),
        ElementKind::User => format!("users/{id}"),
        ElementKind::GlobalSet => format!("globals/{id}"),
        ElementKind::Tag => format!("settings/tags/{}", record.container_id?),
        ElementKind::Address
        | ElementKind::Variant
        | ElementKind::ContentBlock
        | ElementKind::Other(_) => return None,
    };
    Some(path)
}

/// Absolute editor URL for `record`, addressing the draft or revision
/// itself when the record is one.
pub fn edit_url(base_url: &str, record: &ElementRecord, container: Option<&str>) -> Option<String> {
    let path = edit_path(record, container)?;
    let base = base_url.trim_end_matches('/');
    let url = if record.is_draft {
        format!("{base}/{path}?draftId={}", record.id)
    } else if record.is_revision {
        format!("{base}/{path}?revisionId={}", record.id)
    } else {
        format!("{base}/{path}")
    };
    Some(url)
}

/// 32x32 transform URL for an image file.
pub fn thumbnail_url(file_url: &str) -> String {
    let separator = if file_url.contains('?') { '&' } else { '?' };
    format!("{file_url}{separator}width=32&height=32")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: ElementKind) -> ElementRecord {
        ElementRecord {
            id: 12,
            kind,
            canonical_id: None,
            owner_id: None,
            field_name: None,
            container_id: None,
            subtype_id: None,
            is_draft: false,
            is_provisional_draft: false,
            is_revision: false,
            draft_creator_id: None,
            draft_name: None,
            revision_num: None,
            asset_kind: None,
        }
    }

    #[test]
    fn state_suffix_priority() {
        let mut element = record(ElementKind::Entry);
        assert_eq!(state_suffix(&element, Some("ada")), "");

        element.is_revision = true;
        element.revision_num = Some(4);
        assert_eq!(state_suffix(&element, None), " (Revision 4)");

        element.is_draft = true;
        element.draft_name = Some("Spring copy".into());
        assert_eq!(state_suffix(&element, None), " (Draft, Spring copy)");

        element.is_provisional_draft = true;
        assert_eq!(
            state_suffix(&element, Some("ada")),
            " (Provisional Draft, ada)"
        );
        assert_eq!(state_suffix(&element, None), " (Provisional Draft)");
    }

    #[test]
    fn draft_without_name_omits_it() {
        let mut element = record(ElementKind::Entry);
        element.is_draft = true;
        element.draft_name = Some("  ".into());
        assert_eq!(state_suffix(&element, None), " (Draft)");
    }

    #[test]
    fn nested_fragment_text_variants() {
        assert_eq!(nested_fragment_text(Some("body"), Some("Text")), "body/Text");
        assert_eq!(nested_fragment_text(Some(BLANK_FIELD_NAME), Some("Text")), "Text");
        assert_eq!(nested_fragment_text(None, Some("Text")), "Text");
        assert_eq!(nested_fragment_text(Some("body"), None), UNKNOWN_TYPE_TEXT);
    }

    #[test]
    fn edit_urls_by_kind() {
        let base = "/admin/";
        assert_eq!(
            edit_url(base, &record(ElementKind::Entry), Some("news")).as_deref(),
            Some("/admin/entries/news/12")
        );
        assert_eq!(
            edit_url(base, &record(ElementKind::Asset), None).as_deref(),
            Some("/admin/assets/edit/12")
        );

        let mut tag = record(ElementKind::Tag);
        assert_eq!(edit_url(base, &tag, None), None);
        tag.container_id = Some(3);
        assert_eq!(
            edit_url(base, &tag, None).as_deref(),
            Some("/admin/settings/tags/3")
        );

        assert_eq!(edit_url(base, &record(ElementKind::Variant), None), None);
        assert_eq!(
            edit_url(base, &record(ElementKind::from("custom:widget")), None),
            None
        );
    }

    #[test]
    fn edit_url_addresses_drafts_and_revisions() {
        let mut draft = record(ElementKind::Entry);
        draft.canonical_id = Some(5);
        draft.is_draft = true;
        assert_eq!(
            edit_url("/admin", &draft, Some("news")).as_deref(),
            Some("/admin/entries/news/5?draftId=12")
        );

        draft.is_draft = false;
        draft.is_revision = true;
        assert_eq!(
            edit_url("/admin", &draft, Some("news")).as_deref(),
            Some("/admin/entries/news/5?revisionId=12")
        );
    }

    #[test]
    fn thumbnail_url_appends_transform() {
        assert_eq!(
            thumbnail_url("/files/cat.jpg"),
            "/files/cat.jpg?width=32&height=32"
        );
        assert_eq!(
            thumbnail_url("/files/cat.jpg?v=2"),
            "/files/cat.jpg?v=2&width=32&height=32"
        );
    }

    #[test]
    fn labels_and_paths() {
        assert_eq!(join_path("Home", "body/Text"), "Home -> body/Text");
        assert_eq!(type_label("Clothing"), " (Clothing)");
        assert_eq!(type_label(""), "");
    }
}

use bookmarks_core::{Bookmark, LinkMetadata, NewBookmark};
use serde_json::json;

#[test]
fn bookmark_serializes_with_snake_case_fields() {
    let bookmark = Bookmark {
        id: 3,
        url: "https://vimeo.com/1".to_string(),
        title: "Clip".to_string(),
        author_name: "ann".to_string(),
        added_date: 1_700_000_000_000,
        width: 640,
        height: 360,
        duration: 42,
        keywords: vec!["video".to_string()],
    };

    let value = serde_json::to_value(&bookmark).unwrap();
    assert_eq!(
        value,
        json!({
            "id": 3,
            "url": "https://vimeo.com/1",
            "title": "Clip",
            "author_name": "ann",
            "added_date": 1_700_000_000_000_i64,
            "width": 640,
            "height": 360,
            "duration": 42,
            "keywords": ["video"],
        })
    );
}

#[test]
fn new_bookmark_accepts_minimal_payload() {
    let draft: NewBookmark =
        serde_json::from_value(json!({ "url": "https://flickr.com/p/9" })).unwrap();

    assert_eq!(draft.url, "https://flickr.com/p/9");
    assert!(draft.added_date.is_none());
    assert!(draft.keywords.is_empty());
    assert!(draft.validate().is_err());
}

#[test]
fn link_metadata_completes_a_bare_draft() {
    let mut draft: NewBookmark =
        serde_json::from_value(json!({ "url": "https://vimeo.com/2", "width": 1280 })).unwrap();
    let link: LinkMetadata = serde_json::from_value(json!({
        "title": "Clip",
        "author_name": "ann",
        "width": 640,
        "height": 360,
        "duration": 12,
    }))
    .unwrap();

    draft.fill_from_link(&link);

    assert_eq!(draft.title, "Clip");
    assert_eq!(draft.author_name, "ann");
    assert_eq!(draft.width, 1280);
    assert_eq!(draft.height, 360);
    assert_eq!(draft.duration, 12);
    assert!(draft.validate().is_ok());
}

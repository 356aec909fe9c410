use bookmarks_core::db::open_db_in_memory;
use bookmarks_core::{
    BookmarkFilter, BookmarkId, BookmarkRepository, EventLogger, NewBookmark, Pager,
    SqliteBookmarkRepository,
};
use rusqlite::Connection;

fn seed(conn: &mut Connection, count: usize) -> Vec<BookmarkId> {
    let mut repo = SqliteBookmarkRepository::try_new(conn, EventLogger::process()).unwrap();
    (0..count)
        .map(|index| {
            repo.insert(
                &NewBookmark::new(
                    format!("https://photos.example/{index}"),
                    format!("Photo {index}"),
                    "ann",
                )
                .with_keywords([format!("tag{}", index % 3)]),
            )
            .unwrap()
            .id
        })
        .collect()
}

fn page_filter(page: u32, size: u32) -> BookmarkFilter {
    BookmarkFilter {
        id: None,
        pager: Pager::new(page, size),
    }
}

#[test]
fn second_page_returns_rows_five_through_nine_with_full_total() {
    let mut conn = open_db_in_memory().unwrap();
    let ids = seed(&mut conn, 12);
    let repo = SqliteBookmarkRepository::try_new(&mut conn, EventLogger::process()).unwrap();

    let (items, total) = repo.list(&page_filter(2, 5)).unwrap();

    assert_eq!(total, 12);
    let got: Vec<BookmarkId> = items.iter().map(|bookmark| bookmark.id).collect();
    assert_eq!(got, ids[5..10].to_vec());
    assert!(items.iter().all(|bookmark| bookmark.keywords.len() == 1));
}

#[test]
fn last_partial_page_and_page_past_the_end() {
    let mut conn = open_db_in_memory().unwrap();
    let ids = seed(&mut conn, 12);
    let repo = SqliteBookmarkRepository::try_new(&mut conn, EventLogger::process()).unwrap();

    let (items, total) = repo.list(&page_filter(3, 5)).unwrap();
    assert_eq!(total, 12);
    let got: Vec<BookmarkId> = items.iter().map(|bookmark| bookmark.id).collect();
    assert_eq!(got, ids[10..].to_vec());

    let (items, total) = repo.list(&page_filter(4, 5)).unwrap();
    assert!(items.is_empty());
    assert_eq!(total, 12);
}

#[test]
fn unpaged_list_returns_everything_in_id_order() {
    let mut conn = open_db_in_memory().unwrap();
    let ids = seed(&mut conn, 7);
    let repo = SqliteBookmarkRepository::try_new(&mut conn, EventLogger::process()).unwrap();

    for filter in [
        BookmarkFilter::default(),
        BookmarkFilter {
            id: None,
            pager: Some(Pager::All),
        },
    ] {
        let (items, total) = repo.list(&filter).unwrap();
        assert_eq!(total, 7);
        let got: Vec<BookmarkId> = items.iter().map(|bookmark| bookmark.id).collect();
        assert_eq!(got, ids);
    }
}

#[test]
fn empty_store_lists_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::try_new(&mut conn, EventLogger::process()).unwrap();

    let (items, total) = repo.list(&page_filter(1, 5)).unwrap();
    assert!(items.is_empty());
    assert_eq!(total, 0);
    assert_eq!(Pager::new(1, 5).unwrap().page_count(total), 0);
}

#[test]
fn pager_locates_a_row_by_index() {
    let pager = Pager::new(1, 5).unwrap();
    assert_eq!(pager.page_of(11), 3);
    assert_eq!(pager.page_of(0), 1);
    assert_eq!(Pager::All.page_of(11), 1);
}

use bookmarks_core::db::open_db_in_memory;
use bookmarks_core::{
    BookmarkRepository, BookmarkService, ConflictKind, EventLogger, NewBookmark, RepoError,
    ServiceError, SqliteBookmarkRepository,
};
use rusqlite::Connection;

type Service<'a> = BookmarkService<SqliteBookmarkRepository<&'a mut Connection>>;

fn new_service(conn: &mut Connection) -> Service<'_> {
    BookmarkService::new(SqliteBookmarkRepository::try_new(conn, EventLogger::process()).unwrap())
}

fn draft(index: usize) -> NewBookmark {
    NewBookmark::new(
        format!("https://videos.example/{index}"),
        format!("Clip {index}"),
        "ann",
    )
}

#[test]
fn list_page_normalizes_page_and_reports_navigation() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = new_service(&mut conn);
    for index in 0..12 {
        service.create(&draft(index)).unwrap();
    }

    let first = service.list_page(0, 5).unwrap();
    assert_eq!(first.page, 1);
    assert_eq!(first.items.len(), 5);
    assert_eq!(first.total, 12);
    assert_eq!(first.last_page, 3);
    assert_eq!(first.pages, vec![1, 2, 3]);

    let negative = service.list_page(-4, 5).unwrap();
    assert_eq!(negative.items, first.items);

    let last = service.list_page(3, 5).unwrap();
    assert_eq!(last.items.len(), 2);
}

#[test]
fn list_page_on_empty_store_has_no_pages() {
    let mut conn = open_db_in_memory().unwrap();
    let service = new_service(&mut conn);

    let page = service.list_page(1, 5).unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 0);
    assert_eq!(page.last_page, 0);
    assert!(page.pages.is_empty());
}

#[test]
fn list_page_rejects_zero_page_size() {
    let mut conn = open_db_in_memory().unwrap();
    let service = new_service(&mut conn);

    let err = service.list_page(1, 0).unwrap_err();
    assert!(matches!(err, ServiceError::InvalidPageSize(0)));
}

#[test]
fn create_surfaces_duplicate_url_without_retrying() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = new_service(&mut conn);
    service.create(&draft(1)).unwrap();

    let err = service.create(&draft(1)).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Repo(RepoError::Conflict(ConflictKind::DuplicateUrl(_)))
    ));
    assert_eq!(service.list_all().unwrap().len(), 1);
}

#[test]
fn set_keywords_returns_updated_bookmark() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = new_service(&mut conn);
    let created = service
        .create(&draft(1).with_keywords(["old"]))
        .unwrap();

    let updated = service
        .set_keywords(created.id, vec!["New".to_string(), "other".to_string()])
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.keywords, vec!["new".to_string(), "other".to_string()]);
    assert_eq!(
        service.list_keywords().unwrap(),
        vec!["new".to_string(), "old".to_string(), "other".to_string()]
    );
}

#[test]
fn set_keywords_on_missing_bookmark_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = new_service(&mut conn);

    let err = service
        .set_keywords(77, vec!["x".to_string()])
        .unwrap_err();
    assert!(matches!(err, ServiceError::BookmarkNotFound(77)));
}

#[test]
fn delete_returns_removed_bookmark_once() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = new_service(&mut conn);
    let created = service
        .create(&draft(1).with_keywords(["gone"]))
        .unwrap();

    let removed = service.delete(created.id).unwrap();
    assert_eq!(removed, created);
    assert!(service.get(created.id).unwrap().is_none());
    assert!(service
        .repository()
        .by_id(created.id)
        .unwrap()
        .is_none());

    let err = service.delete(created.id).unwrap_err();
    assert!(matches!(err, ServiceError::BookmarkNotFound(id) if id == created.id));
}

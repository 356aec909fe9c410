//! CLI smoke entry point.
//!
//! # Responsibility
//! - Wire `bookmarks_core` config, logging and storage end to end.
//! - Print one bookmark page with deterministic, line-oriented output.
//!
//! Usage: `bookmarks_cli [page]`. Configuration comes from `BOOKMARKS_*` env vars.

use bookmarks_core::{
    core_version, init_logging, BookmarkService, CoreConfig, EventLogger,
    SqliteBookmarkRepository,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_exit module=cli status=error error={err}");
            eprintln!("bookmarks_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::from_env()?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(config.log_level, &log_dir.to_string_lossy())?;
    }

    let page = match std::env::args().nth(1) {
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|err| format!("invalid page `{raw}`: {err}"))?,
        None => 1,
    };

    let conn = config.open_db()?;
    let repo = SqliteBookmarkRepository::try_new(conn, EventLogger::process())?;
    let service = BookmarkService::new(repo);
    let listing = service.list_page(page, config.page_size)?;

    println!("bookmarks_core version={}", core_version());
    println!(
        "page={} last_page={} total={}",
        listing.page, listing.last_page, listing.total
    );
    for bookmark in &listing.items {
        println!(
            "{}\t{}\t{}\t{}",
            bookmark.id,
            bookmark.url,
            bookmark.title,
            bookmark.keywords.join(",")
        );
    }
    log::info!(
        "event=cli_list module=cli status=ok page={} items={}",
        listing.page,
        listing.items.len()
    );
    Ok(())
}

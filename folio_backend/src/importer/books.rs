use super::rss::{clean_text, parse_items, RssItem};
use super::source::HttpSource;
use super::ImportBatch;
use crate::config::ImporterConfig;
use crate::database::models::RecentBookRecord;
use crate::utils::normalize_feed_date;
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashSet;

/// How many books are kept.
pub const BOOK_LIMIT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Genre {
    Classics,
    Business,
}

impl Genre {
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Classics => "Classics",
            Genre::Business => "Business",
        }
    }
}

/// First tag, in page order, that names a tracked genre.
pub fn classify_genre<S: AsRef<str>>(tags: &[S]) -> Option<Genre> {
    tags.iter().find_map(|tag| {
        let tag = tag.as_ref().to_lowercase();
        if tag.contains("classic") {
            Some(Genre::Classics)
        } else if tag.contains("business") {
            Some(Genre::Business)
        } else {
            None
        }
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookPage {
    pub title: String,
    pub author: String,
    pub genres: Vec<String>,
    pub cover_url: Option<String>,
}

pub fn parse_book_page(html: &str) -> Result<BookPage> {
    let title_re = Regex::new(r#"(?s)<h1\b[^>]*data-testid="bookTitle"[^>]*>(.*?)</h1>"#)?;
    let author_re = Regex::new(
        r#"(?s)<span\b[^>]*class="[^"]*\bContributorLink__name\b[^"]*"[^>]*>(.*?)</span>"#,
    )?;
    let genre_button_re =
        Regex::new(r#"class="[^"]*\bBookPageMetadataSection__genreButton\b[^"]*"[^>]*>"#)?;
    let label_re = Regex::new(
        r#"(?s)<span\b[^>]*class="[^"]*\bButton__labelItem\b[^"]*"[^>]*>(.*?)</span>"#,
    )?;
    let img_re = Regex::new(r#"<img\b[^>]*>"#)?;
    let src_re = Regex::new(r#"\bsrc="([^"]*)""#)?;
    let class_re = Regex::new(r#"\bclass="[^"]*\bResponsiveImage\b[^"]*""#)?;

    let first_text = |re: &Regex| {
        re.captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| clean_text(m.as_str()))
            .unwrap_or_default()
    };

    // Each label is looked up only inside its own button: up to the link's
    // closing tag, and never past the next genre button.
    let openers: Vec<_> = genre_button_re.find_iter(html).collect();
    let genres = openers
        .iter()
        .enumerate()
        .filter_map(|(idx, opener)| {
            let start = opener.end();
            let next = openers.get(idx + 1).map_or(html.len(), |m| m.start());
            let end = html[start..next]
                .find("</a>")
                .map_or(next, |offset| start + offset);
            label_re
                .captures(&html[start..end])
                .and_then(|caps| caps.get(1))
                .map(|m| clean_text(m.as_str()))
        })
        .filter(|genre| !genre.is_empty())
        .collect();

    let cover_url = img_re
        .find_iter(html)
        .map(|tag| tag.as_str())
        .find(|tag| class_re.is_match(tag))
        .and_then(|tag| src_re.captures(tag))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|src| !src.is_empty());

    Ok(BookPage {
        title: first_text(&title_re),
        author: first_text(&author_re),
        genres,
        cover_url,
    })
}

/// Walks the read shelf in feed order and keeps the first [`BOOK_LIMIT`]
/// books tagged as classics or business. At most `book_scan_limit` detail
/// pages are fetched; items past the last accepted book are never requested.
pub async fn collect_books(
    source: &dyn HttpSource,
    config: &ImporterConfig,
) -> Result<ImportBatch<RecentBookRecord>> {
    let feed_url = config.require_book_feed_url()?;
    let feed = source
        .get_text(feed_url)
        .await
        .context("failed to fetch read-shelf feed")?;
    let items = parse_items(&feed).context("failed to parse read-shelf feed")?;

    let mut batch = ImportBatch::default();
    let mut seen = HashSet::new();
    for item in items {
        if batch.records.len() >= BOOK_LIMIT {
            break;
        }
        let Some(book_id) = item.get("book_id") else {
            tracing::warn!(
                importer = "books",
                link = item.get("link").unwrap_or_default(),
                "feed item has no book id, skipping"
            );
            batch.skipped += 1;
            continue;
        };
        if !seen.insert(book_id.to_string()) {
            tracing::debug!(importer = "books", external_id = book_id, "repeat shelf entry, skipping");
            batch.skipped += 1;
            continue;
        }
        if batch.scanned >= config.book_scan_limit {
            tracing::info!(
                importer = "books",
                limit = config.book_scan_limit,
                accepted = batch.records.len(),
                "book page budget exhausted"
            );
            break;
        }
        batch.scanned += 1;

        match resolve_book(source, config, book_id, &item).await {
            Ok(Some(record)) => batch.records.push(record),
            Ok(None) => batch.skipped += 1,
            Err(err) => {
                tracing::warn!(
                    importer = "books",
                    external_id = book_id,
                    error = ?err,
                    "book page lookup failed, skipping"
                );
                batch.skipped += 1;
            }
        }
    }
    Ok(batch)
}

async fn resolve_book(
    source: &dyn HttpSource,
    config: &ImporterConfig,
    book_id: &str,
    item: &RssItem,
) -> Result<Option<RecentBookRecord>> {
    let url = format!(
        "{}/book/show/{book_id}",
        config.goodreads_base.trim_end_matches('/')
    );
    let html = source.get_text(&url).await?;
    let page = parse_book_page(&html)?;

    if page.title.is_empty() || page.author.is_empty() {
        tracing::warn!(importer = "books", external_id = book_id, "book page missing title or author");
        return Ok(None);
    }
    let Some(genre) = classify_genre(&page.genres) else {
        tracing::debug!(importer = "books", external_id = book_id, "no tracked genre");
        return Ok(None);
    };

    Ok(Some(RecentBookRecord {
        external_id: book_id.to_string(),
        title: page.title,
        author: page.author,
        cover_url: page
            .cover_url
            .or_else(|| item.get("book_large_image_url").map(str::to_string)),
        read_date: item.get("user_read_at").and_then(normalize_feed_date),
        source_permalink: item.get("link").unwrap_or_default().to_string(),
        genre: genre.as_str().to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repositories::RecentMediaRepository;
    use crate::database::test_database;
    use crate::importer::sink::MediaSink;
    use crate::importer::source::fake::FakeSource;

    const FEED_URL: &str = "https://feeds.test/shelf/read";
    const GOODREADS: &str = "https://books.test";

    fn config(scan_limit: usize) -> ImporterConfig {
        ImporterConfig {
            book_feed_url: Some(FEED_URL.into()),
            goodreads_base: GOODREADS.into(),
            book_scan_limit: scan_limit,
            ..Default::default()
        }
    }

    fn feed(ids: impl IntoIterator<Item = u32>) -> String {
        let items: String = ids
            .into_iter()
            .map(|id| {
                format!(
                    "<item><link>https://books.test/review/{id}</link><book_id>{id}</book_id>\
                     <user_read_at><![CDATA[Sat, 06 Jan 2024 10:00:00 -0800]]></user_read_at>\
                     <book_large_image_url>https://img.test/feed-{id}.jpg</book_large_image_url></item>"
                )
            })
            .collect();
        format!("<rss><channel>{items}</channel></rss>")
    }

    fn page(title: &str, genres: &[&str], cover: bool) -> String {
        let genres: String = genres
            .iter()
            .map(|genre| {
                format!(
                    r#"<span class="BookPageMetadataSection__genreButton"><a class="Button Button--tag-inline" href="/genres/x"><span class="Button__labelItem">{genre}</span></a></span>"#
                )
            })
            .collect();
        let cover = if cover {
            r#"<img class="ResponsiveImage" src="https://img.test/page.jpg" alt="">"#
        } else {
            ""
        };
        format!(
            r#"<html><body><div class="BookCover">{cover}</div>
            <h1 class="Text Text__title1" data-testid="bookTitle" aria-label="Book title: {title}">{title}</h1>
            <a class="ContributorLink" href="/author/1"><span class="ContributorLink__name" data-testid="name">Jane&nbsp;Austen</span></a>
            <div data-testid="genresList"><span class="BookPageMetadataSection__genres">{genres}</span>
            <button class="Button"><span class="Button__labelItem">...more</span></button></div>
            </body></html>"#
        )
    }

    fn book_url(id: u32) -> String {
        format!("{GOODREADS}/book/show/{id}")
    }

    #[test]
    fn first_matching_tag_decides_the_genre() {
        assert_eq!(classify_genre(&["Fiction", "Classics"]), Some(Genre::Classics));
        assert_eq!(classify_genre(&["Business", "Classics"]), Some(Genre::Business));
        assert_eq!(classify_genre(&["CLASSIC literature"]), Some(Genre::Classics));
        assert_eq!(classify_genre(&["Fantasy", "Romance"]), None);
        assert_eq!(classify_genre::<&str>(&[]), None);
    }

    #[test]
    fn page_fields_are_extracted() {
        let parsed = parse_book_page(&page("Pride &amp; Prejudice", &["Classics", "Romance"], true)).unwrap();
        assert_eq!(parsed.title, "Pride & Prejudice");
        assert_eq!(parsed.author, "Jane Austen");
        assert_eq!(parsed.genres, vec!["Classics", "Romance"]);
        assert_eq!(parsed.cover_url.as_deref(), Some("https://img.test/page.jpg"));

        let bare = parse_book_page("<html></html>").unwrap();
        assert_eq!(bare, BookPage::default());
    }

    #[tokio::test]
    async fn ten_item_shelf_accepts_four_and_stops() {
        let accepted = [1, 3, 5, 6];
        let mut source = FakeSource::default().with(FEED_URL, feed(1..=10));
        for id in 1..=10u32 {
            let genres: &[&str] = if accepted.contains(&id) {
                if id == 5 {
                    &["Nonfiction", "Business"]
                } else {
                    &["Classics"]
                }
            } else {
                &["Fantasy"]
            };
            source = source.with(book_url(id), page(&format!("Book {id}"), genres, id != 3));
        }

        let batch = collect_books(&source, &config(30)).await.unwrap();
        let ids: Vec<_> = batch.records.iter().map(|b| b.external_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3", "5", "6"]);
        assert_eq!(batch.scanned, 6);
        assert_eq!(batch.skipped, 2);
        assert_eq!(batch.records[2].genre, "Business");
        assert!(batch
            .records
            .iter()
            .all(|b| (b.genre == "Classics" || b.genre == "Business") && !b.author.is_empty()));
        assert_eq!(batch.records[0].read_date.as_deref(), Some("2024-01-06"));
        assert_eq!(
            batch.records[1].cover_url.as_deref(),
            Some("https://img.test/feed-3.jpg")
        );

        let requests = source.requests();
        for id in 7..=10 {
            assert!(!requests.contains(&book_url(id)), "book {id} was fetched");
        }
    }

    #[test]
    fn unlabeled_genre_buttons_do_not_borrow_other_labels() {
        let html = r#"<div data-testid="genresList">
            <span class="BookPageMetadataSection__genreButton"><a class="Button" href="/genres/fantasy"><span class="Button__labelItem">Fantasy</span></a></span>
            <span class="BookPageMetadataSection__genreButton"><a class="Button" href="/genres/x"></a></span>
            </div>
            <button class="Button"><span class="Button__labelItem">Classics you may like</span></button>"#;
        let parsed = parse_book_page(html).unwrap();
        assert_eq!(parsed.genres, vec!["Fantasy"]);
        assert_eq!(classify_genre(&parsed.genres), None);
    }

    #[tokio::test]
    async fn repeated_shelf_entries_are_counted_once() {
        let source = FakeSource::default()
            .with(FEED_URL, feed([1, 1, 2]))
            .with(book_url(1), page("Emma", &["Classics"], true))
            .with(book_url(2), page("Persuasion", &["Classics"], true));

        let batch = collect_books(&source, &config(30)).await.unwrap();
        let ids: Vec<_> = batch.records.iter().map(|b| b.external_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(batch.scanned, 2);
        assert_eq!(batch.skipped, 1);
        let page_fetches = source
            .requests()
            .iter()
            .filter(|url| **url == book_url(1))
            .count();
        assert_eq!(page_fetches, 1);

        let db = test_database();
        db.replace_books(&batch.records).await.unwrap();
        let stored = db
            .with_repositories(|repos| repos.recent_media().list_books())
            .unwrap();
        assert_eq!(stored.len(), batch.records.len());
    }

    #[tokio::test]
    async fn scan_budget_caps_page_fetches() {
        let mut source = FakeSource::default().with(FEED_URL, feed(1..=10));
        for id in 1..=10u32 {
            source = source.with(book_url(id), page("Other", &["Poetry"], true));
        }
        let batch = collect_books(&source, &config(3)).await.unwrap();
        assert!(batch.records.is_empty());
        assert_eq!(batch.scanned, 3);
        // One feed request plus three pages.
        assert_eq!(source.requests().len(), 4);
    }

    #[tokio::test]
    async fn failed_pages_do_not_stop_the_run() {
        let source = FakeSource::default()
            .with(FEED_URL, feed([1, 2]))
            .with(book_url(2), page("Walden", &["Classics"], true));
        let batch = collect_books(&source, &config(30)).await.unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].title, "Walden");
        assert_eq!(batch.skipped, 1);
    }
}

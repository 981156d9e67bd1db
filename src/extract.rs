use crate::PostRecord;
use itertools::Itertools;
use lazy_regex::regex;
use lazy_static::lazy_static;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

const E: &str = "Invalid selector";
lazy_static! {
    static ref LIST_ITEM: Selector = Selector::parse("li.post-list-item").expect(E);
    static ref POST_TITLE: Selector = Selector::parse("div.post-title").expect(E);
    static ref TITLE: Selector = Selector::parse("title").expect(E);
    static ref A: Selector = Selector::parse("a").expect(E);
}

/// Substrings of an href that mark a link to a single post. Site specific.
const POST_HREF_MARKERS: [&str; 3] = ["/post-", "/t/", "/topic/"];

/// Records found in one page, tagged with the strategy that produced them.
#[derive(Debug, PartialEq, Eq)]
pub enum Extraction {
    /// Found through the forum list item structure.
    Listing(Vec<PostRecord>),
    /// Found by scanning anchors after the listing structure gave nothing.
    Anchors(Vec<PostRecord>),
}

impl Extraction {
    pub fn posts(&self) -> &[PostRecord] {
        match self {
            Extraction::Listing(posts) | Extraction::Anchors(posts) => posts,
        }
    }

    pub fn into_posts(self) -> Vec<PostRecord> {
        match self {
            Extraction::Listing(posts) | Extraction::Anchors(posts) => posts,
        }
    }

    pub fn strategy(&self) -> &'static str {
        match self {
            Extraction::Listing(_) => "listing",
            Extraction::Anchors(_) => "anchors",
        }
    }
}

pub fn extract(markup: &str, base_url: &str) -> Extraction {
    let doc = Html::parse_document(markup);

    debug!(
        "Page title: {}",
        doc.select(&TITLE)
            .next()
            .map(visible_text)
            .unwrap_or_else(|| "None".to_string())
    );

    let listing = extract_listing(&doc, base_url);
    if !listing.is_empty() {
        return Extraction::Listing(listing);
    }

    Extraction::Anchors(extract_anchors(&doc, base_url))
}

fn extract_listing(doc: &Html, base_url: &str) -> Vec<PostRecord> {
    let items = doc.select(&LIST_ITEM).collect::<Vec<_>>();
    debug!("Found {} post list items", items.len());

    items
        .into_iter()
        .filter_map(|item| {
            let link = item.select(&POST_TITLE).next()?.select(&A).next()?;
            to_record(link, base_url)
        })
        .collect()
}

fn extract_anchors(doc: &Html, base_url: &str) -> Vec<PostRecord> {
    doc.select(&A)
        .filter(|a| {
            a.value()
                .attr("href")
                .map(|href| POST_HREF_MARKERS.iter().any(|m| href.contains(m)))
                .unwrap_or(false)
        })
        .filter_map(|a| to_record(a, base_url))
        .collect()
}

fn to_record(anchor: ElementRef, base_url: &str) -> Option<PostRecord> {
    let title = visible_text(anchor);
    let href = anchor.value().attr("href").map(str::trim).unwrap_or("");
    if title.is_empty() || href.is_empty() {
        return None;
    }

    let post = PostRecord {
        id: href.to_string(),
        title,
        link: resolve_link(href, base_url),
    };
    debug!("Parsed post: {} | {}", post.title, post.link);
    Some(post)
}

fn visible_text(el: ElementRef) -> String {
    el.text().collect::<String>().split_whitespace().join(" ")
}

/// Resolves `href` against `base_url` unless it already starts with a scheme.
pub fn resolve_link(href: &str, base_url: &str) -> String {
    if regex!(r"^[A-Za-z][A-Za-z0-9+.\-]*:").is_match(href) {
        return href.to_string();
    }

    match Url::parse(base_url).and_then(|base| base.join(href)) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}{}", base_url.trim_end_matches('/'), href),
    }
}

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::warn;

use super::{element_text, RawRecord};

const WIKI_BASE: &str = "https://thebazaar.wiki";

static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.wikitable.sortable.jquery-tablesorter").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tbody tr").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());
static TYPE_TAG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r##"font[color="#9aabff"]"##).unwrap());

/// Cell layout: 0 icon, 1 name link, 2 effect markup, 3 starting tier,
/// 4 color-coded type tags. Shorter rows are decoration and get skipped.
pub fn extract(html: &str) -> Vec<RawRecord> {
    let doc = Html::parse_document(html);
    let Some(table) = doc.select(&TABLE).next() else {
        warn!("no sortable wiki table in document");
        return Vec::new();
    };

    let mut records = Vec::new();
    for row in table.select(&ROW) {
        let cells: Vec<_> = row.select(&CELL).collect();
        if cells.len() < 5 {
            continue;
        }

        let mut rec = RawRecord::default();
        if let Some(link) = cells[1].select(&LINK).next() {
            rec.name = element_text(link);
        }
        if let Some(img) = cells[0].select(&IMG).next() {
            rec.icon = icon_url(img.value().attr("src").unwrap_or_default());
        }
        // Effect cell stays raw markup; the normalizer flattens it.
        rec.effects.push(cells[2].inner_html());
        rec.tier = element_text(cells[3]);
        rec.types = cells[4].select(&TYPE_TAG).map(element_text).collect();
        records.push(rec);
    }
    records
}

/// Wiki icons come as site-relative paths with cache-buster queries.
fn icon_url(src: &str) -> String {
    if src.starts_with("/images/") {
        let path = src.split('?').next().unwrap_or(src);
        format!("{}{}", WIKI_BASE, path)
    } else {
        src.to_string()
    }
}

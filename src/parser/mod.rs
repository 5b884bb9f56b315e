pub mod cards;
pub mod wiki;

use scraper::ElementRef;
use tracing::{debug, warn};

/// Source template families the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Card-grid export with obfuscated utility-class markup.
    GridCard,
    /// Sortable wiki table.
    WikiTable,
}

/// One extracted block/row, before normalization.
///
/// Every field is always present; whatever the source omits stays empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub name: String,
    pub icon: String,
    pub hero: String,
    pub size: String,
    pub types: Vec<String>,
    pub tier: String,
    pub rarities: Vec<String>,
    pub effects: Vec<String>,
    /// (name, effect) pairs; first occurrence of a name wins.
    pub enchants: Vec<(String, String)>,
}

/// Extract every record of the given template kind from one HTML document.
///
/// Blocks without an extractable name are dropped with a warning and
/// extraction keeps going.
pub fn extract_records(html: &str, kind: TemplateKind) -> Vec<RawRecord> {
    let raw = match kind {
        TemplateKind::GridCard => cards::extract(html),
        TemplateKind::WikiTable => wiki::extract(html),
    };

    let mut records = Vec::with_capacity(raw.len());
    for rec in raw {
        if rec.name.trim().is_empty() {
            warn!(kind = ?kind, "dropping block without a name");
            continue;
        }
        debug!(name = %rec.name, kind = ?kind, "extracted record");
        records.push(rec);
    }
    records
}

pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unnamed_grid_block_yields_nothing() {
        // A card block with every field except the name paragraph.
        let html = r#"
            <div class="x6ac99c x1qhigcl x1n2onr6 x1n9hxaw x25l62i xiy17q3 x19l6gds x4bs4gw">
                <p class="x2fl5vp x5gn1fm">Vanessa</p>
                <div role="radiogroup"><label><div class="x2lah0s">Bronze</div></label></div>
            </div>"#;
        let records = extract_records(html, TemplateKind::GridCard);
        assert!(records.is_empty());
    }

    #[test]
    fn nameless_wiki_row_is_dropped() {
        let html = r#"
            <table class="wikitable sortable jquery-tablesorter"><tbody>
                <tr><td></td><td>no link here</td><td>Effect</td><td>Bronze</td><td></td></tr>
                <tr><td></td><td><a href="/x">Real Skill</a></td><td>Effect</td><td>Silver</td><td></td></tr>
            </tbody></table>"#;
        let records = extract_records(html, TemplateKind::WikiTable);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Real Skill");
    }
}

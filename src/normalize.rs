use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use crate::model::{EntityKind, EntityRecord};
use crate::parser::RawRecord;

static WS_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Known bad type tags seen in the wild → corrected form.
const TYPE_FIXUPS: &[(&str, &str)] = &[("Sheild", "Shield"), ("Posion", "Poison")];

pub fn normalize_records(records: Vec<RawRecord>, kind: EntityKind) -> Vec<EntityRecord> {
    records
        .into_iter()
        .map(|rec| normalize_record(rec, kind))
        .collect()
}

pub fn normalize_record(raw: RawRecord, kind: EntityKind) -> EntityRecord {
    let mut rec = EntityRecord {
        name: collapse_ws(&raw.name),
        size: collapse_ws(&raw.size),
        icon: raw.icon.trim().to_string(),
        ..EntityRecord::default()
    };

    rec.heroes = split_heroes(&raw.hero);

    for tag in &raw.types {
        push_unique(&mut rec.types, fix_type(tag));
    }

    for rarity in &raw.rarities {
        push_unique(&mut rec.rarities, collapse_ws(rarity));
    }
    // The wiki starting tier is a rarity by another name.
    push_unique(&mut rec.rarities, collapse_ws(&raw.tier));

    for effect in &raw.effects {
        push_unique(&mut rec.effects, strip_markup(effect));
    }

    if kind == EntityKind::Items {
        for (name, effect) in &raw.enchants {
            let name = collapse_ws(name);
            if name.is_empty() || rec.enchants.iter().any(|(n, _)| *n == name) {
                continue;
            }
            rec.enchants.push((name, escape_enchant_effect(effect)));
        }
    }

    rec
}

pub fn collapse_ws(s: &str) -> String {
    WS_RUN.replace_all(s.trim(), " ").into_owned()
}

/// Flatten an HTML fragment to plain text, one space between nodes.
pub fn strip_markup(fragment: &str) -> String {
    let doc = Html::parse_fragment(fragment);
    let text = doc.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_ws(&text)
}

/// Hero lines may carry a comma-joined list.
pub fn split_heroes(line: &str) -> Vec<String> {
    let mut heroes = Vec::new();
    for part in line.split(',') {
        push_unique(&mut heroes, collapse_ws(part));
    }
    heroes
}

/// Trim, strip stray `Reference` suffixes, then apply the misspelling map.
pub fn fix_type(tag: &str) -> String {
    let mut fixed = collapse_ws(tag);
    if let Some(stripped) = fixed.strip_suffix("Reference") {
        if !stripped.is_empty() {
            fixed = stripped.trim_end().to_string();
        }
    }
    for (from, to) in TYPE_FIXUPS {
        if fixed == *from {
            return (*to).to_string();
        }
    }
    fixed
}

/// Read queries comma-join list values, so commas inside enchantment effect
/// text become spaces.
pub fn escape_enchant_effect(effect: &str) -> String {
    collapse_ws(&effect.replace(',', " "))
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !value.is_empty() && !list.contains(&value) {
        list.push(value);
    }
}

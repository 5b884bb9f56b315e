/// Parent-table families the catalog tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Items,
    Skills,
}

impl EntityKind {
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Items => "items",
            EntityKind::Skills => "skills",
        }
    }
}

/// One normalized catalog record, ready for reconciliation.
///
/// Fields an entity kind does not use stay empty: skills carry no size or
/// enchantments, items carry no icon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityRecord {
    pub name: String,
    pub size: String,
    pub icon: String,
    pub heroes: Vec<String>,
    pub types: Vec<String>,
    pub rarities: Vec<String>,
    pub effects: Vec<String>,
    pub enchants: Vec<(String, String)>,
}

pub const RARITY_ORDER: &[&str] = &["Bronze", "Silver", "Gold", "Diamond", "Legendary"];
pub const SIZE_ORDER: &[&str] = &["Small", "Medium", "Large"];

/// Bronze=1 .. Legendary=5; anything unrecognized ranks 6.
pub fn rarity_rank(rarity: &str) -> usize {
    RARITY_ORDER
        .iter()
        .position(|r| *r == rarity)
        .map(|i| i + 1)
        .unwrap_or(RARITY_ORDER.len() + 1)
}

/// Rank-sort in place; unknown rarities keep their original order at the end.
pub fn sort_rarities(rarities: &mut [String]) {
    rarities.sort_by_key(|r| rarity_rank(r));
}

pub fn size_rank(size: &str) -> usize {
    SIZE_ORDER
        .iter()
        .position(|s| *s == size)
        .unwrap_or(SIZE_ORDER.len())
}

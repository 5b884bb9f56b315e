pub mod items;
pub mod skills;
pub mod videos;

use anyhow::Result;
use rusqlite::Connection;

use crate::model::RARITY_ORDER;

const DB_PATH: &str = "bazaar.db";

pub fn connect() -> Result<Connection> {
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS items (
            id   INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            size TEXT NOT NULL DEFAULT ''
        );
        CREATE INDEX IF NOT EXISTS idx_item_name ON items(name);
        CREATE INDEX IF NOT EXISTS idx_item_size ON items(size);

        CREATE TABLE IF NOT EXISTS item_types (
            item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
            type    TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_item_type ON item_types(type);
        CREATE INDEX IF NOT EXISTS idx_item_types_item ON item_types(item_id);

        CREATE TABLE IF NOT EXISTS item_rarities (
            item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
            rarity  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_item_rarity ON item_rarities(rarity);
        CREATE INDEX IF NOT EXISTS idx_item_rarities_item ON item_rarities(item_id);

        CREATE TABLE IF NOT EXISTS item_effects (
            item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
            effect  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_item_effects_item ON item_effects(item_id);

        CREATE TABLE IF NOT EXISTS item_heroes (
            item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
            hero    TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_item_hero ON item_heroes(hero);
        CREATE INDEX IF NOT EXISTS idx_item_heroes_item ON item_heroes(item_id);

        CREATE TABLE IF NOT EXISTS enchantments (
            item_id            INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
            enchantment_name   TEXT NOT NULL,
            enchantment_effect TEXT NOT NULL,
            PRIMARY KEY (item_id, enchantment_name)
        );
        CREATE INDEX IF NOT EXISTS idx_enchantment_item_id ON enchantments(item_id);

        CREATE TABLE IF NOT EXISTS skills (
            id       INTEGER PRIMARY KEY,
            name     TEXT NOT NULL UNIQUE,
            icon_ref TEXT NOT NULL DEFAULT ''
        );
        CREATE INDEX IF NOT EXISTS idx_skill_name ON skills(name);

        CREATE TABLE IF NOT EXISTS skill_types (
            skill_id INTEGER NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
            type     TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_skill_type ON skill_types(type);
        CREATE INDEX IF NOT EXISTS idx_skill_types_skill ON skill_types(skill_id);

        CREATE TABLE IF NOT EXISTS skill_rarities (
            skill_id INTEGER NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
            rarity   TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_skill_rarity ON skill_rarities(rarity);
        CREATE INDEX IF NOT EXISTS idx_skill_rarities_skill ON skill_rarities(skill_id);

        CREATE TABLE IF NOT EXISTS skill_effects (
            skill_id INTEGER NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
            effect   TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_skill_effects_skill ON skill_effects(skill_id);

        CREATE TABLE IF NOT EXISTS skill_heroes (
            skill_id INTEGER NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
            hero     TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_skill_hero ON skill_heroes(hero);
        CREATE INDEX IF NOT EXISTS idx_skill_heroes_skill ON skill_heroes(skill_id);

        CREATE TABLE IF NOT EXISTS videos (
            id          INTEGER PRIMARY KEY,
            title       TEXT NOT NULL,
            type        TEXT NOT NULL,
            date        TEXT,
            status      TEXT,
            description TEXT,
            local_path  TEXT,
            url         TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_video_date ON videos(date);

        CREATE TABLE IF NOT EXISTS video_skills (
            video_id INTEGER NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
            skill_id INTEGER NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
            PRIMARY KEY (video_id, skill_id)
        );

        CREATE TABLE IF NOT EXISTS video_items (
            video_id INTEGER NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
            item_id  INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
            PRIMARY KEY (video_id, item_id)
        );

        CREATE TABLE IF NOT EXISTS video_heroes (
            video_id  INTEGER NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
            hero_name TEXT NOT NULL,
            PRIMARY KEY (video_id, hero_name)
        );
        ",
    )?;
    Ok(())
}

// ── Shared query helpers ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Name,
    Rarity,
    Types,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// `?N,?N+1,...` for an IN list starting after `taken` bound params.
pub(crate) fn numbered_placeholders(taken: usize, count: usize) -> String {
    (0..count)
        .map(|i| format!("?{}", taken + i + 1))
        .collect::<Vec<_>>()
        .join(",")
}

/// `MIN(CASE <col> WHEN 'Bronze' THEN 1 ... ELSE 6 END)` for rarity sorts.
pub(crate) fn rarity_rank_sql(col: &str) -> String {
    let whens: String = RARITY_ORDER
        .iter()
        .enumerate()
        .map(|(i, r)| format!(" WHEN '{}' THEN {}", r, i + 1))
        .collect();
    format!("MIN(CASE {}{} ELSE {} END)", col, whens, RARITY_ORDER.len() + 1)
}

/// Split a GROUP_CONCAT column into trimmed, deduplicated parts.
pub(crate) fn split_list(concat: Option<String>) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(joined) = concat {
        for part in joined.split(',') {
            let part = part.trim();
            if !part.is_empty() && !out.iter().any(|p| p == part) {
                out.push(part.to_string());
            }
        }
    }
    out
}

// ── Stats ──

pub struct Stats {
    pub items: usize,
    pub skills: usize,
    pub videos: usize,
    pub enchantment_rows: usize,
    pub heroes: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let items: usize = conn.query_row("SELECT COUNT(*) FROM items", [], |r| r.get(0))?;
    let skills: usize = conn.query_row("SELECT COUNT(*) FROM skills", [], |r| r.get(0))?;
    let videos: usize = conn.query_row("SELECT COUNT(*) FROM videos", [], |r| r.get(0))?;
    let enchantment_rows: usize =
        conn.query_row("SELECT COUNT(*) FROM enchantments", [], |r| r.get(0))?;
    let heroes: usize = conn.query_row(
        "SELECT COUNT(*) FROM (
            SELECT hero FROM item_heroes UNION SELECT hero FROM skill_heroes
        )",
        [],
        |r| r.get(0),
    )?;
    Ok(Stats {
        items,
        skills,
        videos,
        enchantment_rows,
        heroes,
    })
}

#[cfg(test)]
pub(crate) fn test_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
    init_schema(&conn).unwrap();
    conn
}

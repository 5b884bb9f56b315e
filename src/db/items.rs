use anyhow::Result;
use rusqlite::Connection;

use crate::model::{rarity_rank, size_rank, sort_rarities, RARITY_ORDER, SIZE_ORDER};

use super::{numbered_placeholders, rarity_rank_sql, split_list, SortBy, SortOrder};

/// Optional filters for the item query; empty means no constraint.
#[derive(Debug, Default, Clone)]
pub struct ItemFilter {
    pub name: Option<String>,
    pub rarities: Vec<String>,
    pub types: Vec<String>,
    pub effect: Option<String>,
    pub heroes: Vec<String>,
    pub size: Option<String>,
}

#[derive(Debug)]
pub struct ItemRow {
    pub id: i64,
    pub name: String,
    pub size: String,
    pub rarities: Vec<String>,
    pub effects: Vec<String>,
    pub types: Vec<String>,
    pub heroes: Vec<String>,
    /// Rendered `Name: effect` pairs.
    pub enchantments: Vec<String>,
}

pub fn query_items(
    conn: &Connection,
    filter: &ItemFilter,
    sort_by: SortBy,
    order: SortOrder,
) -> Result<Vec<ItemRow>> {
    let mut conditions: Vec<String> = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(name) = filter.name.as_deref().filter(|s| !s.is_empty()) {
        conditions.push(format!("i.name LIKE ?{}", params.len() + 1));
        params.push(Box::new(format!("%{}%", name)));
    }
    if !filter.rarities.is_empty() {
        let ph = numbered_placeholders(params.len(), filter.rarities.len());
        conditions.push(format!(
            "i.id IN (SELECT item_id FROM item_rarities WHERE rarity IN ({}))",
            ph
        ));
        for rarity in &filter.rarities {
            params.push(Box::new(rarity.clone()));
        }
    }
    if !filter.types.is_empty() {
        let ph = numbered_placeholders(params.len(), filter.types.len());
        conditions.push(format!(
            "i.id IN (SELECT item_id FROM item_types WHERE type IN ({}))",
            ph
        ));
        for t in &filter.types {
            params.push(Box::new(t.clone()));
        }
    }
    if let Some(effect) = filter.effect.as_deref().filter(|s| !s.is_empty()) {
        conditions.push(format!("ie.effect LIKE ?{}", params.len() + 1));
        params.push(Box::new(format!("%{}%", effect)));
    }
    if !filter.heroes.is_empty() {
        // Items without any hero tag match every hero filter.
        let ph = numbered_placeholders(params.len(), filter.heroes.len());
        conditions.push(format!(
            "(i.id IN (SELECT item_id FROM item_heroes WHERE hero IN ({})) \
             OR i.id NOT IN (SELECT item_id FROM item_heroes))",
            ph
        ));
        for hero in &filter.heroes {
            params.push(Box::new(hero.clone()));
        }
    }
    if let Some(size) = filter.size.as_deref().filter(|s| !s.is_empty()) {
        conditions.push(format!("i.size = ?{}", params.len() + 1));
        params.push(Box::new(size.to_string()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    let order_clause = match sort_by {
        SortBy::Name => format!("i.name {}", order.sql()),
        SortBy::Rarity => format!("{} {}", rarity_rank_sql("ir.rarity"), order.sql()),
        SortBy::Types => format!("GROUP_CONCAT(DISTINCT it.type) {}", order.sql()),
    };

    let sql = format!(
        "SELECT i.id, i.name, i.size,
                GROUP_CONCAT(DISTINCT ir.rarity),
                GROUP_CONCAT(DISTINCT ie.effect),
                GROUP_CONCAT(DISTINCT it.type),
                GROUP_CONCAT(DISTINCT ih.hero),
                GROUP_CONCAT(DISTINCT e.enchantment_name || ': ' || e.enchantment_effect)
         FROM items i
         LEFT JOIN item_rarities ir ON ir.item_id = i.id
         LEFT JOIN item_effects  ie ON ie.item_id = i.id
         LEFT JOIN item_types    it ON it.item_id = i.id
         LEFT JOIN item_heroes   ih ON ih.item_id = i.id
         LEFT JOIN enchantments  e  ON e.item_id  = i.id{}
         GROUP BY i.id
         ORDER BY {}",
        where_clause, order_clause
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let raw = stmt
        .query_map(param_refs.as_slice(), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut items = Vec::with_capacity(raw.len());
    for (id, name, size, rarities, effects, types, heroes, enchantments) in raw {
        let mut rarities = split_list(rarities);
        sort_rarities(&mut rarities);
        items.push(ItemRow {
            id,
            name,
            size,
            rarities,
            effects: split_list(effects),
            types: split_list(types),
            heroes: split_list(heroes),
            enchantments: split_list(enchantments),
        });
    }
    Ok(items)
}

/// Distinct known rarities in rank order (unknown labels are not offered
/// as filter values).
pub fn get_rarities(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT rarity FROM item_rarities")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    let mut known: Vec<String> = rows
        .into_iter()
        .filter(|r| RARITY_ORDER.contains(&r.as_str()))
        .collect();
    known.sort_by_key(|r| rarity_rank(r));
    Ok(known)
}

pub fn get_types(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT type FROM item_types ORDER BY type")?;
    let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_heroes(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT hero FROM item_heroes ORDER BY hero")?;
    let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Distinct known sizes in Small/Medium/Large order.
pub fn get_sizes(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT size FROM items")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    let mut known: Vec<String> = rows
        .into_iter()
        .filter(|s| SIZE_ORDER.contains(&s.as_str()))
        .collect();
    known.sort_by_key(|s| size_rank(s));
    Ok(known)
}

/// (id, name) pairs for pickers.
pub fn get_all_items(conn: &Connection) -> Result<Vec<(i64, String)>> {
    let mut stmt = conn.prepare("SELECT id, name FROM items ORDER BY name")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn;
    use rusqlite::params;

    fn seed_item(
        conn: &Connection,
        name: &str,
        size: &str,
        rarities: &[&str],
        types: &[&str],
        heroes: &[&str],
        effects: &[&str],
    ) -> i64 {
        conn.execute(
            "INSERT INTO items (name, size) VALUES (?1, ?2)",
            params![name, size],
        )
        .unwrap();
        let id = conn.last_insert_rowid();
        for r in rarities {
            conn.execute(
                "INSERT INTO item_rarities (item_id, rarity) VALUES (?1, ?2)",
                params![id, r],
            )
            .unwrap();
        }
        for t in types {
            conn.execute(
                "INSERT INTO item_types (item_id, type) VALUES (?1, ?2)",
                params![id, t],
            )
            .unwrap();
        }
        for h in heroes {
            conn.execute(
                "INSERT INTO item_heroes (item_id, hero) VALUES (?1, ?2)",
                params![id, h],
            )
            .unwrap();
        }
        for e in effects {
            conn.execute(
                "INSERT INTO item_effects (item_id, effect) VALUES (?1, ?2)",
                params![id, e],
            )
            .unwrap();
        }
        id
    }

    #[test]
    fn unfiltered_query_returns_everything_sorted_by_name() {
        let conn = test_conn();
        seed_item(&conn, "Zweihander", "Large", &["Gold"], &["Weapon"], &[], &[]);
        seed_item(&conn, "Anchor", "Medium", &["Bronze"], &["Weapon"], &[], &[]);

        let rows = query_items(&conn, &ItemFilter::default(), SortBy::Name, SortOrder::Asc).unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Anchor", "Zweihander"]);
    }

    #[test]
    fn name_filter_is_substring_match() {
        let conn = test_conn();
        seed_item(&conn, "Cudgel", "Small", &[], &[], &[], &[]);
        seed_item(&conn, "Crow's Nest", "Large", &[], &[], &[], &[]);

        let filter = ItemFilter {
            name: Some("udge".to_string()),
            ..ItemFilter::default()
        };
        let rows = query_items(&conn, &filter, SortBy::Name, SortOrder::Asc).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Cudgel");
    }

    #[test]
    fn hero_filter_keeps_untagged_items() {
        let conn = test_conn();
        seed_item(&conn, "Cutlass", "Medium", &[], &[], &["Vanessa"], &[]);
        seed_item(&conn, "Fang", "Small", &[], &[], &["Pygmalien"], &[]);
        seed_item(&conn, "Shared Tool", "Small", &[], &[], &[], &[]);

        let filter = ItemFilter {
            heroes: vec!["Vanessa".to_string()],
            ..ItemFilter::default()
        };
        let rows = query_items(&conn, &filter, SortBy::Name, SortOrder::Asc).unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Cutlass", "Shared Tool"]);
    }

    #[test]
    fn rarity_sort_uses_rank_not_lexical() {
        let conn = test_conn();
        seed_item(&conn, "A Legendary Thing", "Small", &["Legendary"], &[], &[], &[]);
        seed_item(&conn, "B Bronze Thing", "Small", &["Bronze"], &[], &[], &[]);
        seed_item(&conn, "C Diamond Thing", "Small", &["Diamond"], &[], &[], &[]);

        let rows = query_items(&conn, &ItemFilter::default(), SortBy::Rarity, SortOrder::Asc).unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["B Bronze Thing", "C Diamond Thing", "A Legendary Thing"]
        );
    }

    #[test]
    fn row_rarities_come_back_rank_sorted() {
        let conn = test_conn();
        seed_item(&conn, "Cudgel", "Small", &["Gold", "Bronze"], &[], &[], &[]);

        let rows = query_items(&conn, &ItemFilter::default(), SortBy::Name, SortOrder::Asc).unwrap();
        assert_eq!(rows[0].rarities, vec!["Bronze", "Gold"]);
    }

    #[test]
    fn enchantments_render_name_colon_effect() {
        let conn = test_conn();
        let id = seed_item(&conn, "Cudgel", "Small", &[], &[], &[], &[]);
        conn.execute(
            "INSERT INTO enchantments (item_id, enchantment_name, enchantment_effect)
             VALUES (?1, 'Heavy', 'Slow 1 item.')",
            params![id],
        )
        .unwrap();

        let rows = query_items(&conn, &ItemFilter::default(), SortBy::Name, SortOrder::Asc).unwrap();
        assert_eq!(rows[0].enchantments, vec!["Heavy: Slow 1 item."]);
    }

    #[test]
    fn effect_filter_narrows_to_matching_rows() {
        let conn = test_conn();
        seed_item(&conn, "Cudgel", "Small", &[], &[], &[], &["Deal 10 damage."]);
        seed_item(&conn, "Bandage", "Small", &[], &[], &[], &["Heal 5."]);

        let filter = ItemFilter {
            effect: Some("damage".to_string()),
            ..ItemFilter::default()
        };
        let rows = query_items(&conn, &filter, SortBy::Name, SortOrder::Asc).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Cudgel");
    }

    #[test]
    fn distinct_listings() {
        let conn = test_conn();
        seed_item(
            &conn,
            "Cudgel",
            "Small",
            &["Gold", "Bronze", "Homebrew"],
            &["Weapon"],
            &["Vanessa"],
            &[],
        );
        seed_item(&conn, "Crate", "Large", &["Silver"], &["Tool"], &[], &[]);

        assert_eq!(get_rarities(&conn).unwrap(), vec!["Bronze", "Silver", "Gold"]);
        assert_eq!(get_types(&conn).unwrap(), vec!["Tool", "Weapon"]);
        assert_eq!(get_heroes(&conn).unwrap(), vec!["Vanessa"]);
        assert_eq!(get_sizes(&conn).unwrap(), vec!["Small", "Large"]);
        assert_eq!(
            get_all_items(&conn).unwrap().len(),
            2,
        );
    }
}

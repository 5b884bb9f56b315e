use anyhow::Result;
use rusqlite::Connection;

use crate::model::{rarity_rank, sort_rarities, RARITY_ORDER};

use super::{numbered_placeholders, rarity_rank_sql, split_list, SortBy, SortOrder};

#[derive(Debug, Default, Clone)]
pub struct SkillFilter {
    pub name: Option<String>,
    pub rarities: Vec<String>,
    pub types: Vec<String>,
    pub effect: Option<String>,
    pub heroes: Vec<String>,
}

#[derive(Debug)]
pub struct SkillRow {
    pub id: i64,
    pub name: String,
    pub icon_ref: String,
    pub rarities: Vec<String>,
    pub effects: Vec<String>,
    pub types: Vec<String>,
    pub heroes: Vec<String>,
}

pub fn query_skills(
    conn: &Connection,
    filter: &SkillFilter,
    sort_by: SortBy,
    order: SortOrder,
) -> Result<Vec<SkillRow>> {
    let mut conditions: Vec<String> = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(name) = filter.name.as_deref().filter(|s| !s.is_empty()) {
        conditions.push(format!("s.name LIKE ?{}", params.len() + 1));
        params.push(Box::new(format!("%{}%", name)));
    }
    if !filter.rarities.is_empty() {
        let ph = numbered_placeholders(params.len(), filter.rarities.len());
        conditions.push(format!(
            "s.id IN (SELECT skill_id FROM skill_rarities WHERE rarity IN ({}))",
            ph
        ));
        for rarity in &filter.rarities {
            params.push(Box::new(rarity.clone()));
        }
    }
    if !filter.types.is_empty() {
        let ph = numbered_placeholders(params.len(), filter.types.len());
        conditions.push(format!(
            "s.id IN (SELECT skill_id FROM skill_types WHERE type IN ({}))",
            ph
        ));
        for t in &filter.types {
            params.push(Box::new(t.clone()));
        }
    }
    if let Some(effect) = filter.effect.as_deref().filter(|s| !s.is_empty()) {
        conditions.push(format!("se.effect LIKE ?{}", params.len() + 1));
        params.push(Box::new(format!("%{}%", effect)));
    }
    if !filter.heroes.is_empty() {
        let ph = numbered_placeholders(params.len(), filter.heroes.len());
        conditions.push(format!(
            "s.id IN (SELECT skill_id FROM skill_heroes WHERE hero IN ({}))",
            ph
        ));
        for hero in &filter.heroes {
            params.push(Box::new(hero.clone()));
        }
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    let order_clause = match sort_by {
        SortBy::Name => format!("s.name {}", order.sql()),
        SortBy::Rarity => format!("{} {}", rarity_rank_sql("sr.rarity"), order.sql()),
        SortBy::Types => format!("GROUP_CONCAT(DISTINCT st.type) {}", order.sql()),
    };

    let sql = format!(
        "SELECT s.id, s.name, s.icon_ref,
                GROUP_CONCAT(DISTINCT sr.rarity),
                GROUP_CONCAT(DISTINCT se.effect),
                GROUP_CONCAT(DISTINCT st.type),
                GROUP_CONCAT(DISTINCT sh.hero)
         FROM skills s
         LEFT JOIN skill_rarities sr ON sr.skill_id = s.id
         LEFT JOIN skill_effects  se ON se.skill_id = s.id
         LEFT JOIN skill_types    st ON st.skill_id = s.id
         LEFT JOIN skill_heroes   sh ON sh.skill_id = s.id{}
         GROUP BY s.id
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
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut skills = Vec::with_capacity(raw.len());
    for (id, name, icon_ref, rarities, effects, types, heroes) in raw {
        let mut rarities = split_list(rarities);
        sort_rarities(&mut rarities);
        skills.push(SkillRow {
            id,
            name,
            icon_ref,
            rarities,
            effects: split_list(effects),
            types: split_list(types),
            heroes: split_list(heroes),
        });
    }
    Ok(skills)
}

pub fn get_rarities(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT rarity FROM skill_rarities")?;
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
    let mut stmt = conn.prepare("SELECT DISTINCT type FROM skill_types ORDER BY type")?;
    let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Skill pickers offer heroes from both catalogs.
pub fn get_heroes(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT hero FROM (
            SELECT hero FROM skill_heroes
            UNION
            SELECT hero FROM item_heroes
        ) ORDER BY hero",
    )?;
    let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// (id, name) pairs for pickers.
pub fn get_all_skills(conn: &Connection) -> Result<Vec<(i64, String)>> {
    let mut stmt = conn.prepare("SELECT id, name FROM skills ORDER BY name")?;
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

    fn seed_skill(
        conn: &Connection,
        name: &str,
        icon_ref: &str,
        rarities: &[&str],
        types: &[&str],
        heroes: &[&str],
        effects: &[&str],
    ) -> i64 {
        conn.execute(
            "INSERT INTO skills (name, icon_ref) VALUES (?1, ?2)",
            params![name, icon_ref],
        )
        .unwrap();
        let id = conn.last_insert_rowid();
        for r in rarities {
            conn.execute(
                "INSERT INTO skill_rarities (skill_id, rarity) VALUES (?1, ?2)",
                params![id, r],
            )
            .unwrap();
        }
        for t in types {
            conn.execute(
                "INSERT INTO skill_types (skill_id, type) VALUES (?1, ?2)",
                params![id, t],
            )
            .unwrap();
        }
        for h in heroes {
            conn.execute(
                "INSERT INTO skill_heroes (skill_id, hero) VALUES (?1, ?2)",
                params![id, h],
            )
            .unwrap();
        }
        for e in effects {
            conn.execute(
                "INSERT INTO skill_effects (skill_id, effect) VALUES (?1, ?2)",
                params![id, e],
            )
            .unwrap();
        }
        id
    }

    #[test]
    fn hero_filter_is_strict_for_skills() {
        let conn = test_conn();
        seed_skill(&conn, "Keen Eye", "", &[], &[], &["Vanessa"], &[]);
        seed_skill(&conn, "Untagged", "", &[], &[], &[], &[]);

        let filter = SkillFilter {
            heroes: vec!["Vanessa".to_string()],
            ..SkillFilter::default()
        };
        let rows = query_skills(&conn, &filter, SortBy::Name, SortOrder::Asc).unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        // Unlike items, skills without hero tags do not match hero filters.
        assert_eq!(names, vec!["Keen Eye"]);
    }

    #[test]
    fn type_filter_and_icon_come_back() {
        let conn = test_conn();
        seed_skill(
            &conn,
            "Focused Rage",
            "https://thebazaar.wiki/images/4/4a/Focused_Rage.png",
            &["Bronze"],
            &["Damage"],
            &[],
            &[],
        );
        seed_skill(&conn, "Patience", "", &["Silver"], &["Economy"], &[], &[]);

        let filter = SkillFilter {
            types: vec!["Damage".to_string()],
            ..SkillFilter::default()
        };
        let rows = query_skills(&conn, &filter, SortBy::Name, SortOrder::Asc).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].icon_ref,
            "https://thebazaar.wiki/images/4/4a/Focused_Rage.png"
        );
    }

    #[test]
    fn rarity_sort_descending() {
        let conn = test_conn();
        seed_skill(&conn, "Bronze Skill", "", &["Bronze"], &[], &[], &[]);
        seed_skill(&conn, "Gold Skill", "", &["Gold"], &[], &[], &[]);

        let rows = query_skills(
            &conn,
            &SkillFilter::default(),
            SortBy::Rarity,
            SortOrder::Desc,
        )
        .unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Gold Skill", "Bronze Skill"]);
    }

    #[test]
    fn hero_listing_unions_item_heroes() {
        let conn = test_conn();
        seed_skill(&conn, "Keen Eye", "", &[], &[], &["Vanessa"], &[]);
        conn.execute("INSERT INTO items (name, size) VALUES ('Cudgel', 'Small')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO item_heroes (item_id, hero) VALUES (1, 'Dooley')",
            [],
        )
        .unwrap();

        assert_eq!(get_heroes(&conn).unwrap(), vec!["Dooley", "Vanessa"]);
    }
}

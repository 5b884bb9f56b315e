use anyhow::Result;
use rusqlite::Connection;

use crate::enchant::{is_canonical, CANONICAL_ENCHANTMENTS};

/// One item whose enchantment rows disagree with the canonical twelve.
#[derive(Debug)]
pub struct AuditFinding {
    pub item_id: i64,
    pub name: String,
    pub row_count: usize,
    pub unexpected: Vec<String>,
    pub missing: Vec<String>,
}

/// Check every stored item against the canonical enchantment set.
pub fn audit_enchantments(conn: &Connection) -> Result<Vec<AuditFinding>> {
    let mut items_stmt = conn.prepare("SELECT id, name FROM items ORDER BY name")?;
    let items = items_stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut enchant_stmt =
        conn.prepare("SELECT enchantment_name FROM enchantments WHERE item_id = ?1")?;

    let mut findings = Vec::new();
    for (item_id, name) in items {
        let names = enchant_stmt
            .query_map([item_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let unexpected: Vec<String> = names
            .iter()
            .filter(|n| !is_canonical(n))
            .cloned()
            .collect();
        let missing: Vec<String> = CANONICAL_ENCHANTMENTS
            .iter()
            .filter(|c| !names.iter().any(|n| n == *c))
            .map(|c| c.to_string())
            .collect();

        if names.len() != CANONICAL_ENCHANTMENTS.len() || !unexpected.is_empty() || !missing.is_empty()
        {
            findings.push(AuditFinding {
                item_id,
                name,
                row_count: names.len(),
                unexpected,
                missing,
            });
        }
    }
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn;
    use crate::enchant::fill_defaults;
    use rusqlite::params;

    fn seed_item_with_enchants(conn: &Connection, name: &str, enchants: &[(String, String)]) -> i64 {
        conn.execute(
            "INSERT INTO items (name, size) VALUES (?1, 'Small')",
            params![name],
        )
        .unwrap();
        let id = conn.last_insert_rowid();
        for (n, e) in enchants {
            conn.execute(
                "INSERT INTO enchantments (item_id, enchantment_name, enchantment_effect)
                 VALUES (?1, ?2, ?3)",
                params![id, n, e],
            )
            .unwrap();
        }
        id
    }

    #[test]
    fn complete_item_is_clean() {
        let conn = test_conn();
        let mut enchants = Vec::new();
        fill_defaults(&mut enchants);
        seed_item_with_enchants(&conn, "Cudgel", &enchants);

        assert!(audit_enchantments(&conn).unwrap().is_empty());
    }

    #[test]
    fn short_set_reports_missing_names() {
        let conn = test_conn();
        let enchants = vec![
            ("Heavy".to_string(), "Slow 1.".to_string()),
            ("Icy".to_string(), "Freeze 1.".to_string()),
        ];
        seed_item_with_enchants(&conn, "Cudgel", &enchants);

        let findings = audit_enchantments(&conn).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].row_count, 2);
        assert_eq!(findings[0].missing.len(), 10);
        assert!(findings[0].unexpected.is_empty());
    }

    #[test]
    fn rogue_name_is_reported() {
        let conn = test_conn();
        let mut enchants = Vec::new();
        fill_defaults(&mut enchants);
        enchants.push(("Cursed".to_string(), "???".to_string()));
        seed_item_with_enchants(&conn, "Cudgel", &enchants);

        let findings = audit_enchantments(&conn).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].unexpected, vec!["Cursed"]);
        assert!(findings[0].missing.is_empty());
        assert_eq!(findings[0].row_count, 13);
    }

    #[test]
    fn empty_store_is_clean() {
        let conn = test_conn();
        assert!(audit_enchantments(&conn).unwrap().is_empty());
    }
}

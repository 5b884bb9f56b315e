use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{info, warn};

use crate::enchant;
use crate::error::CatalogError;
use crate::model::{EntityKind, EntityRecord};
use crate::normalize;
use crate::parser::{self, TemplateKind};

/// One source document queued for a run.
#[derive(Debug, Clone)]
pub struct SourceDoc {
    pub path: PathBuf,
    pub template: TemplateKind,
    pub entity: EntityKind,
}

/// Counters for a whole run, across entity kinds.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed_records: usize,
    pub failed_documents: usize,
}

impl RunSummary {
    pub fn print(&self) {
        println!(
            "Inserted {}, updated {}, deleted {}.",
            self.inserted, self.updated, self.deleted
        );
        if self.failed_records > 0 {
            println!("Skipped {} records that failed to apply.", self.failed_records);
        }
        if self.failed_documents > 0 {
            println!("{} source documents could not be read.", self.failed_documents);
        }
    }
}

/// Counters for one entity-kind batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchCounts {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Parse, normalize and reconcile every source document in one run.
///
/// Documents are grouped by entity kind so the per-run seen set (and the
/// obsolete cleanup it gates) covers all documents of that kind together.
/// Unreadable documents are skipped; the run reports partial completion.
pub fn run(conn: &Connection, sources: &[SourceDoc], delete_obsolete: bool) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    let mut batches: Vec<(EntityKind, Vec<EntityRecord>)> = Vec::new();
    let mut incomplete_kinds: HashSet<&'static str> = HashSet::new();

    for doc in sources {
        let html = match fs::read_to_string(&doc.path) {
            Ok(html) => html,
            Err(source) => {
                let err = CatalogError::SourceRead {
                    path: doc.path.clone(),
                    source,
                };
                warn!("{err}");
                summary.failed_documents += 1;
                incomplete_kinds.insert(doc.entity.label());
                continue;
            }
        };

        let raw = parser::extract_records(&html, doc.template);
        info!(
            path = %doc.path.display(),
            records = raw.len(),
            "extracted {} document",
            doc.entity.label()
        );
        let mut records = normalize::normalize_records(raw, doc.entity);
        if doc.entity == EntityKind::Items {
            for rec in &mut records {
                enchant::fill_defaults(&mut rec.enchants);
            }
        }

        match batches.iter_mut().find(|(kind, _)| *kind == doc.entity) {
            Some((_, list)) => list.extend(records),
            None => batches.push((doc.entity, records)),
        }
    }

    for (kind, records) in &batches {
        // A kind with an unreadable document has an incomplete seen set;
        // deleting against it would drop rows we simply failed to read.
        let cleanup = delete_obsolete && !incomplete_kinds.contains(kind.label());
        if delete_obsolete && !cleanup {
            warn!(
                kind = kind.label(),
                "skipping obsolete cleanup: a source document was unreadable"
            );
        }
        let counts = reconcile_batch(conn, *kind, records, cleanup)?;
        summary.inserted += counts.inserted;
        summary.updated += counts.updated;
        summary.deleted += counts.deleted;
        summary.failed_records += counts.failed;
    }
    Ok(summary)
}

/// Apply one batch of records of a single entity kind.
///
/// The batch runs in one transaction committed at the end. Each record gets
/// its own savepoint: a failing record rolls back alone and the batch keeps
/// going. Names present in the store but absent from the batch are deleted
/// when `delete_obsolete` is set.
pub fn reconcile_batch(
    conn: &Connection,
    kind: EntityKind,
    records: &[EntityRecord],
    delete_obsolete: bool,
) -> Result<BatchCounts> {
    let tables = tables_for(kind);
    let mut counts = BatchCounts::default();
    let mut seen: HashSet<String> = HashSet::new();

    let mut tx = conn.unchecked_transaction()?;

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    for rec in records {
        let sp = tx.savepoint()?;
        match apply_record(&sp, tables, kind, rec) {
            Ok(Outcome::Inserted) => {
                sp.commit()?;
                counts.inserted += 1;
                info!(name = %rec.name, kind = kind.label(), "inserted");
            }
            Ok(Outcome::Updated) => {
                sp.commit()?;
                counts.updated += 1;
                info!(name = %rec.name, kind = kind.label(), "updated");
            }
            Err(source) => {
                // Dropping the savepoint rolls this record back.
                let err = CatalogError::RecordProcessing {
                    name: rec.name.clone(),
                    source,
                };
                warn!("{err}; skipping record");
                counts.failed += 1;
            }
        }
        seen.insert(rec.name.clone());
        pb.inc(1);
    }
    pb.finish_and_clear();

    if delete_obsolete {
        counts.deleted = delete_missing(&tx, tables, &seen)?;
    }

    tx.commit().map_err(CatalogError::Commit)?;
    Ok(counts)
}

enum Outcome {
    Inserted,
    Updated,
}

struct EntityTables {
    parent: &'static str,
    fk: &'static str,
    scalar: &'static str,
    /// (table, value column), paired positionally with [`child_values`].
    children: &'static [(&'static str, &'static str)],
    enchants: bool,
}

const ITEM_TABLES: EntityTables = EntityTables {
    parent: "items",
    fk: "item_id",
    scalar: "size",
    children: &[
        ("item_types", "type"),
        ("item_rarities", "rarity"),
        ("item_effects", "effect"),
        ("item_heroes", "hero"),
    ],
    enchants: true,
};

const SKILL_TABLES: EntityTables = EntityTables {
    parent: "skills",
    fk: "skill_id",
    scalar: "icon_ref",
    children: &[
        ("skill_types", "type"),
        ("skill_rarities", "rarity"),
        ("skill_effects", "effect"),
        ("skill_heroes", "hero"),
    ],
    enchants: false,
};

fn tables_for(kind: EntityKind) -> &'static EntityTables {
    match kind {
        EntityKind::Items => &ITEM_TABLES,
        EntityKind::Skills => &SKILL_TABLES,
    }
}

fn child_values(rec: &EntityRecord) -> [&[String]; 4] {
    [&rec.types, &rec.rarities, &rec.effects, &rec.heroes]
}

/// Insert-or-update one record by name. The scalar column is rewritten
/// only when its value changed (logged old to new); child rows are always
/// replaced wholesale. An existing name counts as updated even when
/// nothing changed.
fn apply_record(
    conn: &Connection,
    tables: &EntityTables,
    kind: EntityKind,
    rec: &EntityRecord,
) -> rusqlite::Result<Outcome> {
    let scalar = match kind {
        EntityKind::Items => &rec.size,
        EntityKind::Skills => &rec.icon,
    };

    let existing: Option<(i64, String)> = conn
        .query_row(
            &format!(
                "SELECT id, {} FROM {} WHERE name = ?1",
                tables.scalar, tables.parent
            ),
            params![rec.name],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let (id, outcome) = match existing {
        Some((id, stored)) => {
            if stored != *scalar {
                info!(
                    name = %rec.name,
                    old = %stored,
                    new = %scalar,
                    "{} changed",
                    tables.scalar
                );
                conn.execute(
                    &format!("UPDATE {} SET {} = ?1 WHERE id = ?2", tables.parent, tables.scalar),
                    params![scalar, id],
                )?;
            }
            for (table, _) in tables.children {
                conn.execute(
                    &format!("DELETE FROM {} WHERE {} = ?1", table, tables.fk),
                    params![id],
                )?;
            }
            if tables.enchants {
                conn.execute("DELETE FROM enchantments WHERE item_id = ?1", params![id])?;
            }
            (id, Outcome::Updated)
        }
        None => {
            conn.execute(
                &format!(
                    "INSERT INTO {} (name, {}) VALUES (?1, ?2)",
                    tables.parent, tables.scalar
                ),
                params![rec.name, scalar],
            )?;
            (conn.last_insert_rowid(), Outcome::Inserted)
        }
    };

    for ((table, col), values) in tables.children.iter().zip(child_values(rec)) {
        let mut stmt = conn.prepare(&format!(
            "INSERT INTO {} ({}, {}) VALUES (?1, ?2)",
            table, tables.fk, col
        ))?;
        for value in values {
            stmt.execute(params![id, value])?;
        }
    }
    if tables.enchants {
        let mut stmt = conn.prepare(
            "INSERT INTO enchantments (item_id, enchantment_name, enchantment_effect)
             VALUES (?1, ?2, ?3)",
        )?;
        for (name, effect) in &rec.enchants {
            stmt.execute(params![id, name, effect])?;
        }
    }

    Ok(outcome)
}

/// Delete every parent row whose name the run never produced. Child rows go
/// with it via cascade.
fn delete_missing(
    conn: &Connection,
    tables: &EntityTables,
    seen: &HashSet<String>,
) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare(&format!("SELECT id, name FROM {}", tables.parent))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut deleted = 0;
    for (id, name) in rows {
        if seen.contains(&name) {
            continue;
        }
        conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", tables.parent),
            params![id],
        )?;
        info!(name = %name, kind = tables.parent, "deleted obsolete row");
        deleted += 1;
    }
    Ok(deleted)
}

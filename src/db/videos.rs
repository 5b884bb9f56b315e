use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection};

use crate::error::CatalogError;

use super::{numbered_placeholders, split_list, SortOrder};

pub const VIDEO_TYPES: &[&str] = &["Short", "Long"];
pub const VIDEO_STATUSES: &[&str] = &["Draft", "Published"];

/// Everything a video form submits.
#[derive(Debug, Default, Clone)]
pub struct VideoInput {
    pub title: String,
    pub video_type: String,
    pub date: String,
    pub status: String,
    pub description: String,
    pub local_path: String,
    pub url: String,
    pub skill_ids: Vec<i64>,
    pub item_ids: Vec<i64>,
    pub heroes: Vec<String>,
}

#[derive(Debug)]
pub struct VideoRow {
    pub id: i64,
    pub title: String,
    pub video_type: String,
    pub date: String,
    pub status: String,
    pub description: String,
    pub local_path: String,
    pub url: String,
    pub skills: Vec<String>,
    pub items: Vec<String>,
    pub heroes: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct VideoFilter {
    pub video_type: Option<String>,
    pub status: Option<String>,
    pub skill_ids: Vec<i64>,
    pub item_ids: Vec<i64>,
    pub hero: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSortBy {
    #[default]
    Date,
    Title,
    Type,
    Status,
}

impl VideoSortBy {
    fn col(self) -> &'static str {
        match self {
            VideoSortBy::Date => "v.date",
            VideoSortBy::Title => "v.title",
            VideoSortBy::Type => "v.type",
            VideoSortBy::Status => "v.status",
        }
    }
}

/// Title, type, date and status are mandatory; the date must be YYYY-MM-DD.
fn validate(input: &VideoInput) -> Result<(), CatalogError> {
    let required = [
        ("title", &input.title),
        ("type", &input.video_type),
        ("date", &input.date),
        ("status", &input.status),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(CatalogError::InvalidInput(format!("{} is required", field)));
        }
    }
    if NaiveDate::parse_from_str(&input.date, "%Y-%m-%d").is_err() {
        return Err(CatalogError::InvalidInput(format!(
            "date '{}' is not in YYYY-MM-DD format",
            input.date
        )));
    }
    if !VIDEO_TYPES.contains(&input.video_type.as_str()) {
        return Err(CatalogError::InvalidInput(format!(
            "type must be one of {:?}",
            VIDEO_TYPES
        )));
    }
    if !VIDEO_STATUSES.contains(&input.status.as_str()) {
        return Err(CatalogError::InvalidInput(format!(
            "status must be one of {:?}",
            VIDEO_STATUSES
        )));
    }
    Ok(())
}

pub fn add_video(conn: &Connection, input: &VideoInput) -> Result<i64> {
    validate(input)?;
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO videos (title, type, date, status, description, local_path, url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            input.title,
            input.video_type,
            input.date,
            input.status,
            input.description,
            input.local_path,
            input.url,
        ],
    )?;
    let video_id = tx.last_insert_rowid();
    insert_junctions(&tx, video_id, input)?;
    tx.commit()?;
    Ok(video_id)
}

/// Full replace: row fields updated, all three junction sets rebuilt from
/// the submitted collections.
pub fn update_video(conn: &Connection, video_id: i64, input: &VideoInput) -> Result<()> {
    validate(input)?;
    let tx = conn.unchecked_transaction()?;
    let changed = tx.execute(
        "UPDATE videos
         SET title = ?1, type = ?2, date = ?3, status = ?4, description = ?5,
             local_path = ?6, url = ?7
         WHERE id = ?8",
        params![
            input.title,
            input.video_type,
            input.date,
            input.status,
            input.description,
            input.local_path,
            input.url,
            video_id,
        ],
    )?;
    if changed == 0 {
        return Err(CatalogError::InvalidInput(format!("no video with id {}", video_id)).into());
    }
    tx.execute("DELETE FROM video_skills WHERE video_id = ?1", params![video_id])?;
    tx.execute("DELETE FROM video_items WHERE video_id = ?1", params![video_id])?;
    tx.execute("DELETE FROM video_heroes WHERE video_id = ?1", params![video_id])?;
    insert_junctions(&tx, video_id, input)?;
    tx.commit()?;
    Ok(())
}

pub fn delete_video(conn: &Connection, video_id: i64) -> Result<bool> {
    let removed = conn.execute("DELETE FROM videos WHERE id = ?1", params![video_id])?;
    Ok(removed > 0)
}

fn insert_junctions(conn: &Connection, video_id: i64, input: &VideoInput) -> rusqlite::Result<()> {
    let mut skill_stmt =
        conn.prepare("INSERT INTO video_skills (video_id, skill_id) VALUES (?1, ?2)")?;
    for skill_id in &input.skill_ids {
        skill_stmt.execute(params![video_id, skill_id])?;
    }
    let mut item_stmt =
        conn.prepare("INSERT INTO video_items (video_id, item_id) VALUES (?1, ?2)")?;
    for item_id in &input.item_ids {
        item_stmt.execute(params![video_id, item_id])?;
    }
    let mut hero_stmt =
        conn.prepare("INSERT INTO video_heroes (video_id, hero_name) VALUES (?1, ?2)")?;
    for hero in &input.heroes {
        hero_stmt.execute(params![video_id, hero])?;
    }
    Ok(())
}

pub fn get_videos(
    conn: &Connection,
    filter: &VideoFilter,
    sort_by: VideoSortBy,
    order: SortOrder,
) -> Result<Vec<VideoRow>> {
    let mut conditions: Vec<String> = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(t) = filter.video_type.as_deref().filter(|s| !s.is_empty()) {
        conditions.push(format!("v.type = ?{}", params.len() + 1));
        params.push(Box::new(t.to_string()));
    }
    if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
        conditions.push(format!("v.status = ?{}", params.len() + 1));
        params.push(Box::new(status.to_string()));
    }
    if !filter.skill_ids.is_empty() {
        let ph = numbered_placeholders(params.len(), filter.skill_ids.len());
        conditions.push(format!(
            "v.id IN (SELECT video_id FROM video_skills WHERE skill_id IN ({}))",
            ph
        ));
        for id in &filter.skill_ids {
            params.push(Box::new(*id));
        }
    }
    if !filter.item_ids.is_empty() {
        let ph = numbered_placeholders(params.len(), filter.item_ids.len());
        conditions.push(format!(
            "v.id IN (SELECT video_id FROM video_items WHERE item_id IN ({}))",
            ph
        ));
        for id in &filter.item_ids {
            params.push(Box::new(*id));
        }
    }
    if let Some(hero) = filter.hero.as_deref().filter(|s| !s.is_empty()) {
        conditions.push(format!(
            "v.id IN (SELECT video_id FROM video_heroes WHERE hero_name LIKE ?{})",
            params.len() + 1
        ));
        params.push(Box::new(format!("%{}%", hero)));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT v.id, v.title, v.type, COALESCE(v.date, ''), COALESCE(v.status, ''),
                COALESCE(v.description, ''), COALESCE(v.local_path, ''), COALESCE(v.url, ''),
                GROUP_CONCAT(DISTINCT s.name),
                GROUP_CONCAT(DISTINCT i.name),
                GROUP_CONCAT(DISTINCT vh.hero_name)
         FROM videos v
         LEFT JOIN video_skills vs ON vs.video_id = v.id
         LEFT JOIN skills s ON s.id = vs.skill_id
         LEFT JOIN video_items vi ON vi.video_id = v.id
         LEFT JOIN items i ON i.id = vi.item_id
         LEFT JOIN video_heroes vh ON vh.video_id = v.id{}
         GROUP BY v.id
         ORDER BY {} {}",
        where_clause,
        sort_by.col(),
        order.sql()
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            Ok(VideoRow {
                id: row.get(0)?,
                title: row.get(1)?,
                video_type: row.get(2)?,
                date: row.get(3)?,
                status: row.get(4)?,
                description: row.get(5)?,
                local_path: row.get(6)?,
                url: row.get(7)?,
                skills: split_list(row.get(8)?),
                items: split_list(row.get(9)?),
                heroes: split_list(row.get(10)?),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Heroes offered by the video form: every hero tagged on a skill or item.
pub fn get_all_heroes(conn: &Connection) -> Result<Vec<String>> {
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

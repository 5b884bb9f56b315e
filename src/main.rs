mod audit;
mod db;
mod enchant;
mod error;
mod model;
mod normalize;
mod parser;
mod reconcile;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use tracing::warn;

use crate::model::EntityKind;
use crate::parser::TemplateKind;

#[derive(Parser)]
#[command(name = "bazaar_catalog", about = "The Bazaar card catalog: HTML extraction, reconciliation and queries")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse source documents and reconcile them into the catalog
    Reconcile {
        /// Source HTML files, classified by filename (default: var/item_data.html,
        /// var/skill_data.html, var/skill_w_types.html)
        files: Vec<PathBuf>,
        /// Delete stored entries whose names this run no longer produced
        #[arg(long)]
        delete_obsolete: bool,
        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check that every item carries exactly the twelve known enchantments
    Audit,
    /// Items overview table
    Items {
        /// Filter by name substring
        #[arg(long)]
        name: Option<String>,
        /// Filter by rarity (repeatable)
        #[arg(long)]
        rarity: Vec<String>,
        /// Filter by type (repeatable)
        #[arg(long = "type")]
        types: Vec<String>,
        /// Filter by effect substring
        #[arg(long)]
        effect: Option<String>,
        /// Filter by hero (repeatable)
        #[arg(long)]
        hero: Vec<String>,
        /// Filter by exact size (Small, Medium, Large)
        #[arg(long)]
        size: Option<String>,
        /// Sort key: name, rarity, types
        #[arg(long, default_value = "name")]
        sort: String,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Skills overview table
    Skills {
        /// Filter by name substring
        #[arg(long)]
        name: Option<String>,
        /// Filter by rarity (repeatable)
        #[arg(long)]
        rarity: Vec<String>,
        /// Filter by type (repeatable)
        #[arg(long = "type")]
        types: Vec<String>,
        /// Filter by effect substring
        #[arg(long)]
        effect: Option<String>,
        /// Filter by hero (repeatable)
        #[arg(long)]
        hero: Vec<String>,
        /// Sort key: name, rarity, types
        #[arg(long, default_value = "name")]
        sort: String,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Videos overview table
    Videos {
        /// Filter by type (Short, Long)
        #[arg(long = "type")]
        video_type: Option<String>,
        /// Filter by status (Draft, Published)
        #[arg(long)]
        status: Option<String>,
        /// Filter by linked skill id (repeatable)
        #[arg(long = "skill-id")]
        skill_ids: Vec<i64>,
        /// Filter by linked item id (repeatable)
        #[arg(long = "item-id")]
        item_ids: Vec<i64>,
        /// Filter by featured hero substring
        #[arg(long)]
        hero: Option<String>,
        /// Sort key: date, title, type, status
        #[arg(long, default_value = "date")]
        sort: String,
        /// Sort descending
        #[arg(long)]
        desc: bool,
    },
    /// Add a video entry
    AddVideo {
        #[command(flatten)]
        fields: VideoFields,
    },
    /// Replace a video entry's fields and links
    UpdateVideo {
        /// Video id to update
        id: i64,
        #[command(flatten)]
        fields: VideoFields,
    },
    /// Delete a video entry
    DeleteVideo {
        /// Video id to delete
        id: i64,
    },
    /// List the filter values the catalog currently offers
    Filters {
        /// items, skills or videos
        entity: String,
    },
    /// Show catalog statistics
    Stats,
}

#[derive(Args)]
struct VideoFields {
    /// Video title
    #[arg(long)]
    title: String,
    /// Short or Long
    #[arg(long = "type")]
    video_type: String,
    /// Publication date, YYYY-MM-DD
    #[arg(long)]
    date: String,
    /// Draft or Published
    #[arg(long)]
    status: String,
    /// Free-form notes
    #[arg(long, default_value = "")]
    description: String,
    /// Path of the local recording
    #[arg(long = "local-path", default_value = "")]
    local_path: String,
    /// Published URL
    #[arg(long, default_value = "")]
    url: String,
    /// Linked skill id (repeatable)
    #[arg(long = "skill-id")]
    skill_ids: Vec<i64>,
    /// Linked item id (repeatable)
    #[arg(long = "item-id")]
    item_ids: Vec<i64>,
    /// Featured hero (repeatable)
    #[arg(long)]
    hero: Vec<String>,
}

impl VideoFields {
    fn into_input(self) -> db::videos::VideoInput {
        db::videos::VideoInput {
            title: self.title,
            video_type: self.video_type,
            date: self.date,
            status: self.status,
            description: self.description,
            local_path: self.local_path,
            url: self.url,
            skill_ids: self.skill_ids,
            item_ids: self.item_ids,
            heroes: self.hero,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Reconcile { files, delete_obsolete, json } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let sources = resolve_sources(&files);
            if sources.is_empty() {
                println!("No recognizable source documents. Filenames must contain 'item', 'skill' or 'skill_w_types'.");
                return Ok(());
            }
            println!("Reconciling {} source documents...", sources.len());
            let summary = reconcile::run(&conn, &sources, delete_obsolete)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                summary.print();
            }
            Ok(())
        }
        Commands::Audit => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let findings = audit::audit_enchantments(&conn)?;
            if findings.is_empty() {
                println!("Audit clean: every item carries the twelve expected enchantment rows.");
                return Ok(());
            }
            println!("{} items with enchantment problems:", findings.len());
            for f in &findings {
                println!("  #{} {} ({} rows)", f.item_id, f.name, f.row_count);
                if !f.missing.is_empty() {
                    println!("      missing:    {}", f.missing.join(", "));
                }
                if !f.unexpected.is_empty() {
                    println!("      unexpected: {}", f.unexpected.join(", "));
                }
            }
            Ok(())
        }
        Commands::Items { name, rarity, types, effect, hero, size, sort, desc, limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let filter = db::items::ItemFilter {
                name,
                rarities: rarity,
                types,
                effect,
                heroes: hero,
                size,
            };
            let rows = db::items::query_items(&conn, &filter, parse_sort(&sort)?, order_from(desc))?;
            if rows.is_empty() {
                println!("No items found.");
                return Ok(());
            }

            println!(
                "{:>4} | {:<24} | {:<7} | {:<18} | {:<20} | {:<20}",
                "ID", "Item", "Size", "Rarities", "Types", "Heroes"
            );
            println!("{}", "-".repeat(104));
            for r in rows.iter().take(limit) {
                println!(
                    "{:>4} | {:<24} | {:<7} | {:<18} | {:<20} | {:<20}",
                    r.id,
                    truncate(&r.name, 24),
                    truncate(&r.size, 7),
                    truncate(&r.rarities.join(", "), 18),
                    truncate(&r.types.join(", "), 20),
                    truncate(&r.heroes.join(", "), 20),
                );
            }

            let detailed: Vec<_> = rows
                .iter()
                .take(limit)
                .filter(|r| {
                    !r.effects.is_empty()
                        || r.enchantments.iter().any(|e| !e.ends_with(": None"))
                })
                .collect();
            if !detailed.is_empty() {
                println!("\n--- Effects ---");
                for r in detailed {
                    println!("  {}:", truncate(&r.name, 24));
                    if !r.effects.is_empty() {
                        println!("      {}", truncate(&r.effects.join(", "), 90));
                    }
                    let enchants: Vec<String> = r
                        .enchantments
                        .iter()
                        .filter(|e| !e.ends_with(": None"))
                        .cloned()
                        .collect();
                    if !enchants.is_empty() {
                        println!("      enchants: {}", truncate(&enchants.join(" | "), 90));
                    }
                }
            }

            if rows.len() > limit {
                println!("\n{} of {} items shown (-n to adjust)", limit, rows.len());
            } else {
                println!("\n{} items", rows.len());
            }
            Ok(())
        }
        Commands::Skills { name, rarity, types, effect, hero, sort, desc, limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let filter = db::skills::SkillFilter {
                name,
                rarities: rarity,
                types,
                effect,
                heroes: hero,
            };
            let rows = db::skills::query_skills(&conn, &filter, parse_sort(&sort)?, order_from(desc))?;
            if rows.is_empty() {
                println!("No skills found.");
                return Ok(());
            }

            println!(
                "{:>4} | {:<24} | {:<18} | {:<20} | {:<20}",
                "ID", "Skill", "Rarities", "Types", "Heroes"
            );
            println!("{}", "-".repeat(94));
            for r in rows.iter().take(limit) {
                println!(
                    "{:>4} | {:<24} | {:<18} | {:<20} | {:<20}",
                    r.id,
                    truncate(&r.name, 24),
                    truncate(&r.rarities.join(", "), 18),
                    truncate(&r.types.join(", "), 20),
                    truncate(&r.heroes.join(", "), 20),
                );
            }

            let detailed: Vec<_> = rows
                .iter()
                .take(limit)
                .filter(|r| !r.effects.is_empty() || !r.icon_ref.is_empty())
                .collect();
            if !detailed.is_empty() {
                println!("\n--- Details ---");
                for r in detailed {
                    println!("  {}:", truncate(&r.name, 24));
                    if !r.effects.is_empty() {
                        println!("      effect: {}", truncate(&r.effects.join(", "), 90));
                    }
                    if !r.icon_ref.is_empty() {
                        println!("      icon:   {}", r.icon_ref);
                    }
                }
            }

            if rows.len() > limit {
                println!("\n{} of {} skills shown (-n to adjust)", limit, rows.len());
            } else {
                println!("\n{} skills", rows.len());
            }
            Ok(())
        }
        Commands::Videos { video_type, status, skill_ids, item_ids, hero, sort, desc } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let filter = db::videos::VideoFilter {
                video_type,
                status,
                skill_ids,
                item_ids,
                hero,
            };
            let rows =
                db::videos::get_videos(&conn, &filter, parse_video_sort(&sort)?, order_from(desc))?;
            if rows.is_empty() {
                println!("No videos found.");
                return Ok(());
            }

            println!(
                "{:>4} | {:<28} | {:<5} | {:<10} | {:<9}",
                "ID", "Title", "Type", "Date", "Status"
            );
            println!("{}", "-".repeat(68));
            for v in &rows {
                println!(
                    "{:>4} | {:<28} | {:<5} | {:<10} | {:<9}",
                    v.id,
                    truncate(&v.title, 28),
                    v.video_type,
                    v.date,
                    v.status
                );
            }

            let detailed: Vec<_> = rows
                .iter()
                .filter(|v| {
                    !v.skills.is_empty()
                        || !v.items.is_empty()
                        || !v.heroes.is_empty()
                        || !v.url.is_empty()
                        || !v.local_path.is_empty()
                        || !v.description.is_empty()
                })
                .collect();
            if !detailed.is_empty() {
                println!("\n--- Details ---");
                for v in detailed {
                    println!("  #{} {}", v.id, truncate(&v.title, 28));
                    if !v.skills.is_empty() {
                        println!("      skills: {}", v.skills.join(", "));
                    }
                    if !v.items.is_empty() {
                        println!("      items:  {}", v.items.join(", "));
                    }
                    if !v.heroes.is_empty() {
                        println!("      heroes: {}", v.heroes.join(", "));
                    }
                    if !v.url.is_empty() {
                        println!("      url:    {}", v.url);
                    }
                    if !v.local_path.is_empty() {
                        println!("      file:   {}", v.local_path);
                    }
                    if !v.description.is_empty() {
                        println!("      note:   {}", truncate(&v.description, 70));
                    }
                }
            }

            println!("\n{} videos", rows.len());
            Ok(())
        }
        Commands::AddVideo { fields } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let input = fields.into_input();
            let id = db::videos::add_video(&conn, &input)?;
            println!("Added video #{}: {}", id, input.title);
            Ok(())
        }
        Commands::UpdateVideo { id, fields } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let input = fields.into_input();
            db::videos::update_video(&conn, id, &input)?;
            println!("Updated video #{}: {}", id, input.title);
            Ok(())
        }
        Commands::DeleteVideo { id } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            if db::videos::delete_video(&conn, id)? {
                println!("Deleted video #{}.", id);
            } else {
                println!("No video with id {}.", id);
            }
            Ok(())
        }
        Commands::Filters { entity } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            match entity.as_str() {
                "items" => {
                    println!("Sizes:    {}", db::items::get_sizes(&conn)?.join(", "));
                    println!("Rarities: {}", db::items::get_rarities(&conn)?.join(", "));
                    println!("Types:    {}", db::items::get_types(&conn)?.join(", "));
                    println!("Heroes:   {}", db::items::get_heroes(&conn)?.join(", "));
                }
                "skills" => {
                    println!("Rarities: {}", db::skills::get_rarities(&conn)?.join(", "));
                    println!("Types:    {}", db::skills::get_types(&conn)?.join(", "));
                    println!("Heroes:   {}", db::skills::get_heroes(&conn)?.join(", "));
                }
                "videos" => {
                    println!("Types:    {}", db::videos::VIDEO_TYPES.join(", "));
                    println!("Statuses: {}", db::videos::VIDEO_STATUSES.join(", "));
                    println!("Heroes:   {}", db::videos::get_all_heroes(&conn)?.join(", "));
                    println!("\nLinkable skills:");
                    for (id, name) in db::skills::get_all_skills(&conn)? {
                        println!("  #{:<4} {}", id, name);
                    }
                    println!("Linkable items:");
                    for (id, name) in db::items::get_all_items(&conn)? {
                        println!("  #{:<4} {}", id, name);
                    }
                }
                other => bail!("unknown entity '{}' (expected items, skills or videos)", other),
            }
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Items:        {}", s.items);
            println!("Skills:       {}", s.skills);
            println!("Videos:       {}", s.videos);
            println!("Enchantments: {}", s.enchantment_rows);
            println!("Heroes:       {}", s.heroes);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Classify source files by name: `skill_w_types` marks the wiki-table skill
/// export, `skill` the grid-card skill export, `item` the grid-card item
/// export. Unrecognized files are skipped. No arguments means the default
/// trio under var/.
fn resolve_sources(files: &[PathBuf]) -> Vec<reconcile::SourceDoc> {
    let files: Vec<PathBuf> = if files.is_empty() {
        vec![
            PathBuf::from("var/item_data.html"),
            PathBuf::from("var/skill_data.html"),
            PathBuf::from("var/skill_w_types.html"),
        ]
    } else {
        files.to_vec()
    };

    let mut sources = Vec::new();
    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (template, entity) = if name.contains("skill_w_types") {
            (TemplateKind::WikiTable, EntityKind::Skills)
        } else if name.contains("skill") {
            (TemplateKind::GridCard, EntityKind::Skills)
        } else if name.contains("item") {
            (TemplateKind::GridCard, EntityKind::Items)
        } else {
            warn!(path = %path.display(), "cannot classify source document by filename; skipping");
            continue;
        };
        sources.push(reconcile::SourceDoc { path, template, entity });
    }
    sources
}

fn parse_sort(s: &str) -> anyhow::Result<db::SortBy> {
    match s {
        "name" => Ok(db::SortBy::Name),
        "rarity" => Ok(db::SortBy::Rarity),
        "types" => Ok(db::SortBy::Types),
        other => bail!("unknown sort key '{}' (expected name, rarity or types)", other),
    }
}

fn parse_video_sort(s: &str) -> anyhow::Result<db::videos::VideoSortBy> {
    match s {
        "date" => Ok(db::videos::VideoSortBy::Date),
        "title" => Ok(db::videos::VideoSortBy::Title),
        "type" => Ok(db::videos::VideoSortBy::Type),
        "status" => Ok(db::videos::VideoSortBy::Status),
        other => bail!("unknown sort key '{}' (expected date, title, type or status)", other),
    }
}

fn order_from(desc: bool) -> db::SortOrder {
    if desc {
        db::SortOrder::Desc
    } else {
        db::SortOrder::Asc
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

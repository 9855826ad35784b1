use anyhow::{Context, Result};
use rusqlite::{params, Connection, Transaction};
use std::path::Path;
use tracing::{debug, error, info};

use super::schema_gen::{generate_create_table, generate_indexes};
use crate::error::{LoadError, LoadStage};
use crate::schema::{TableSchema, ALL_TABLES};
use crate::transform::TransformedPokemon;

pub struct SqliteWriter {
    conn: Connection,
}

impl SqliteWriter {
    /// Open (or create) the database file. Existing data is kept.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory {:?}", parent))?;
        }

        info!(path = ?db_path, "Connecting to SQLite database");
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database {:?}", db_path))?;

        Self::with_connection(conn)
    }

    /// In-memory database, used by tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to create in-memory database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Create every table that does not exist yet.
    ///
    /// Each definition is an independent statement; returns true only if
    /// all of them succeeded.
    pub fn ensure_schema(&self) -> bool {
        info!("Starting table creation");
        let created = ALL_TABLES
            .iter()
            .filter(|schema| self.create_table(schema))
            .count();

        if created == ALL_TABLES.len() {
            info!(created, "All tables created or already present");
        } else {
            error!(created, total = ALL_TABLES.len(), "Some tables failed to create");
        }
        created == ALL_TABLES.len()
    }

    fn create_table(&self, schema: &TableSchema) -> bool {
        let statements =
            std::iter::once(generate_create_table(schema)).chain(generate_indexes(schema));

        for sql in statements {
            if let Err(e) = self.conn.execute(&sql, []) {
                error!(table = schema.name, error = %e, "Failed to create table");
                return false;
            }
        }

        debug!(table = schema.name, "Table created or already exists");
        true
    }

    /// Load one transformed Pokémon atomically. Rows that already exist are
    /// left untouched; any error rolls back everything for this record.
    pub fn load_pokemon(&mut self, data: &TransformedPokemon) -> Result<(), LoadError> {
        let pokemon_id = data.main.id;
        let fail = |stage: LoadStage| {
            move |source: rusqlite::Error| {
                error!(pokemon_id, %stage, error = %source, "Load failed, rolling back");
                LoadError {
                    pokemon_id,
                    stage,
                    source,
                }
            }
        };

        info!(pokemon_id, name = %data.main.name, "Starting load");

        // Dropping the transaction without commit rolls it back
        let tx = self.conn.transaction().map_err(fail(LoadStage::Begin))?;
        insert_lookups(&tx, data).map_err(fail(LoadStage::Lookups))?;
        insert_evolution_chain(&tx, data).map_err(fail(LoadStage::EvolutionChain))?;
        insert_main(&tx, data).map_err(fail(LoadStage::Pokemon))?;
        insert_junctions(&tx, data).map_err(fail(LoadStage::Junctions))?;
        tx.commit().map_err(fail(LoadStage::Commit))?;

        info!(pokemon_id, name = %data.main.name, "Fully loaded Pokémon");
        Ok(())
    }

    /// Finalize the database before closing
    pub fn finalize(self) -> Result<()> {
        self.conn.execute_batch("PRAGMA optimize;")?;
        self.conn
            .close()
            .map_err(|(_, e)| e)
            .context("Failed to close database connection")?;
        info!("Database connection closed");
        Ok(())
    }
}

fn insert_lookups(tx: &Transaction, data: &TransformedPokemon) -> rusqlite::Result<()> {
    let mut types = tx.prepare_cached("INSERT OR IGNORE INTO types (name) VALUES (?1)")?;
    for name in &data.types {
        types.execute([name])?;
    }

    let mut abilities = tx.prepare_cached("INSERT OR IGNORE INTO abilities (name) VALUES (?1)")?;
    for name in &data.abilities {
        abilities.execute([name])?;
    }

    let mut stats = tx.prepare_cached("INSERT OR IGNORE INTO stats (name) VALUES (?1)")?;
    for stat in &data.stats {
        stats.execute([&stat.stat_name])?;
    }

    debug!(
        types = data.types.len(),
        abilities = data.abilities.len(),
        stats = data.stats.len(),
        "Inserted lookup rows"
    );
    Ok(())
}

fn insert_evolution_chain(tx: &Transaction, data: &TransformedPokemon) -> rusqlite::Result<()> {
    tx.execute(
        "INSERT OR IGNORE INTO evolution_chains (chain_identifier) VALUES (?1)",
        [&data.evolution_chain_identifier],
    )?;
    let chain_id: i64 = tx.query_row(
        "SELECT id FROM evolution_chains WHERE chain_identifier = ?1",
        [&data.evolution_chain_identifier],
        |row| row.get(0),
    )?;

    let mut links = tx.prepare_cached(
        "INSERT OR IGNORE INTO evolution_links (chain_id, pokemon_name, stage) VALUES (?1, ?2, ?3)",
    )?;
    for link in &data.evolution_links {
        links.execute(params![chain_id, link.name, link.stage])?;
    }

    debug!(chain_id, links = data.evolution_links.len(), "Inserted evolution chain");
    Ok(())
}

fn insert_main(tx: &Transaction, data: &TransformedPokemon) -> rusqlite::Result<()> {
    let main = &data.main;
    let inserted = tx.execute(
        "INSERT OR IGNORE INTO pokemon (id, name, is_evolved) VALUES (?1, ?2, ?3)",
        params![main.id, main.name, main.is_evolved],
    )?;
    if inserted == 0 {
        debug!(pokemon_id = main.id, "Pokémon already present, skipped");
    }
    Ok(())
}

fn insert_junctions(tx: &Transaction, data: &TransformedPokemon) -> rusqlite::Result<()> {
    let id = data.main.id;

    let mut types = tx.prepare_cached(
        "INSERT OR IGNORE INTO pokemon_types (pokemon_id, type_name) VALUES (?1, ?2)",
    )?;
    for name in &data.types {
        types.execute(params![id, name])?;
    }

    let mut abilities = tx.prepare_cached(
        "INSERT OR IGNORE INTO pokemon_abilities (pokemon_id, ability_name) VALUES (?1, ?2)",
    )?;
    for name in &data.abilities {
        abilities.execute(params![id, name])?;
    }

    let mut stats = tx.prepare_cached(
        "INSERT OR IGNORE INTO pokemon_stats (pokemon_id, stat_name, base_stat) VALUES (?1, ?2, ?3)",
    )?;
    for stat in &data.stats {
        stats.execute(params![id, stat.stat_name, stat.base_stat])?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::OpenFlags;
    use crate::transform::{EvolutionLink, PokemonMain, StatValue};

    fn pikachu() -> TransformedPokemon {
        TransformedPokemon {
            main: PokemonMain {
                id: 25,
                name: "pikachu".into(),
                is_evolved: true,
            },
            types: vec!["electric".into()],
            abilities: vec!["static".into()],
            stats: vec![StatValue {
                stat_name: "hp".into(),
                base_stat: 35,
            }],
            evolution_chain_identifier: "pichu".into(),
            evolution_links: ["pichu", "pikachu", "raichu"]
                .iter()
                .zip(1..)
                .map(|(name, stage)| EvolutionLink {
                    name: name.to_string(),
                    stage,
                })
                .collect(),
        }
    }

    fn writer() -> SqliteWriter {
        let writer = SqliteWriter::open_in_memory().unwrap();
        assert!(writer.ensure_schema());
        writer
    }

    fn count(writer: &SqliteWriter, table: &str) -> i64 {
        writer
            .connection()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    fn all_counts(writer: &SqliteWriter) -> Vec<i64> {
        crate::schema::table_names()
            .into_iter()
            .map(|t| count(writer, t))
            .collect()
    }

    #[test]
    fn test_ensure_schema_creates_all_tables() {
        let writer = writer();
        let mut stmt = writer
            .connection()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap();
        let mut names: Vec<String> = stmt
            .query_map([], |r| r.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        names.sort();

        let mut expected = crate::schema::table_names();
        expected.sort();
        assert_eq!(names, expected);

        // Second call is a no-op
        assert!(writer.ensure_schema());
    }

    #[test]
    fn test_ensure_schema_reports_partial_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readonly.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch(&generate_create_table(&crate::schema::POKEMON))
            .unwrap();

        // Existing table succeeds, every other definition needs a write
        let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY).unwrap();
        let writer = SqliteWriter::with_connection(conn).unwrap();
        assert!(!writer.ensure_schema());

        let tables: i64 = writer
            .connection()
            .query_row("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[test]
    fn test_load_full_pokemon() {
        let mut writer = writer();
        writer.load_pokemon(&pikachu()).unwrap();
        let conn = writer.connection();

        let (name, evolved): (String, bool) = conn
            .query_row("SELECT name, is_evolved FROM pokemon WHERE id = 25", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(name, "pikachu");
        assert!(evolved);

        let type_name: String = conn
            .query_row("SELECT type_name FROM pokemon_types WHERE pokemon_id = 25", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(type_name, "electric");

        let hp: i64 = conn
            .query_row(
                "SELECT base_stat FROM pokemon_stats WHERE pokemon_id = 25 AND stat_name = 'hp'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(hp, 35);

        let mut stmt = conn
            .prepare(
                "SELECT pokemon_name, stage FROM evolution_links
                 WHERE chain_id = (SELECT id FROM evolution_chains WHERE chain_identifier = 'pichu')
                 ORDER BY stage",
            )
            .unwrap();
        let links: Vec<(String, i64)> = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(
            links,
            vec![
                ("pichu".to_string(), 1),
                ("pikachu".to_string(), 2),
                ("raichu".to_string(), 3)
            ]
        );
    }

    #[test]
    fn test_load_is_idempotent() {
        let mut writer = writer();
        writer.load_pokemon(&pikachu()).unwrap();
        let before = all_counts(&writer);

        writer.load_pokemon(&pikachu()).unwrap();
        assert_eq!(all_counts(&writer), before);
    }

    #[test]
    fn test_existing_rows_are_not_overwritten() {
        let mut writer = writer();
        writer.load_pokemon(&pikachu()).unwrap();

        let mut changed = pikachu();
        changed.stats[0].base_stat = 99;
        changed.main.is_evolved = false;
        writer.load_pokemon(&changed).unwrap();

        let (hp, evolved): (i64, bool) = writer
            .connection()
            .query_row(
                "SELECT s.base_stat, p.is_evolved FROM pokemon p
                 JOIN pokemon_stats s ON s.pokemon_id = p.id AND s.stat_name = 'hp'
                 WHERE p.id = 25",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(hp, 35);
        assert!(evolved);
    }

    #[test]
    fn test_junction_failure_rolls_back_everything() {
        let mut writer = writer();
        writer
            .connection()
            .execute_batch("DROP TABLE pokemon_types;")
            .unwrap();

        let err = writer.load_pokemon(&pikachu()).unwrap_err();
        assert_eq!(err.stage, LoadStage::Junctions);
        assert_eq!(err.pokemon_id, 25);

        for table in [
            "types",
            "abilities",
            "stats",
            "pokemon",
            "pokemon_stats",
            "evolution_chains",
            "evolution_links",
        ] {
            assert_eq!(count(&writer, table), 0, "{} should be empty", table);
        }
    }

    #[test]
    fn test_name_conflict_rolls_back_new_lookups() {
        let mut writer = writer();
        writer.load_pokemon(&pikachu()).unwrap();

        // Same name under another id: the main row is skipped, so the
        // junction rows have no parent and the whole record is rejected
        let mut impostor = pikachu();
        impostor.main.id = 26;
        impostor.types = vec!["ghost".into()];
        impostor.evolution_chain_identifier = "mimikyu".into();

        assert!(writer.load_pokemon(&impostor).is_err());
        assert_eq!(count(&writer, "pokemon"), 1);
        assert_eq!(count(&writer, "types"), 1);
        assert_eq!(count(&writer, "evolution_chains"), 1);
    }

    #[test]
    fn test_shared_chain_and_lookups_are_deduplicated() {
        let mut writer = writer();
        writer.load_pokemon(&pikachu()).unwrap();

        let mut raichu = pikachu();
        raichu.main.id = 26;
        raichu.main.name = "raichu".into();
        writer.load_pokemon(&raichu).unwrap();

        assert_eq!(count(&writer, "pokemon"), 2);
        assert_eq!(count(&writer, "types"), 1);
        assert_eq!(count(&writer, "evolution_chains"), 1);
        assert_eq!(count(&writer, "evolution_links"), 3);
        assert_eq!(count(&writer, "pokemon_types"), 2);
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("pokemon.db");
        let writer = SqliteWriter::open(&path).unwrap();
        assert!(writer.ensure_schema());
        writer.finalize().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_open_keeps_existing_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pokemon.db");

        let mut writer = SqliteWriter::open(&path).unwrap();
        writer.ensure_schema();
        writer.load_pokemon(&pikachu()).unwrap();
        writer.finalize().unwrap();

        let writer = SqliteWriter::open(&path).unwrap();
        assert!(writer.ensure_schema());
        assert_eq!(count(&writer, "pokemon"), 1);
    }
}

//! Table schema definitions for the Pokémon store

use super::types::*;

// =============================================================================
// Main and lookup tables (no FK dependencies)
// =============================================================================

pub static POKEMON: TableSchema = TableSchema {
    name: "pokemon",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("name", ColumnType::Text).unique(),
        Column::required("is_evolved", ColumnType::Boolean),
    ],
    primary_key: PrimaryKey::Column("id"),
    foreign_keys: &[],
};

pub static TYPES: TableSchema = TableSchema {
    name: "types",
    columns: &[Column::required("name", ColumnType::Text)],
    primary_key: PrimaryKey::Column("name"),
    foreign_keys: &[],
};

pub static ABILITIES: TableSchema = TableSchema {
    name: "abilities",
    columns: &[Column::required("name", ColumnType::Text)],
    primary_key: PrimaryKey::Column("name"),
    foreign_keys: &[],
};

pub static STATS: TableSchema = TableSchema {
    name: "stats",
    columns: &[Column::required("name", ColumnType::Text)],
    primary_key: PrimaryKey::Column("name"),
    foreign_keys: &[],
};

// =============================================================================
// Junction tables
// =============================================================================

pub static POKEMON_TYPES: TableSchema = TableSchema {
    name: "pokemon_types",
    columns: &[
        Column::new("pokemon_id", ColumnType::Integer),
        Column::new("type_name", ColumnType::Text),
    ],
    primary_key: PrimaryKey::Composite(&["pokemon_id", "type_name"]),
    foreign_keys: &[
        ForeignKey::new("pokemon_id", "pokemon"),
        ForeignKey::new("type_name", "types").to("name"),
    ],
};

pub static POKEMON_ABILITIES: TableSchema = TableSchema {
    name: "pokemon_abilities",
    columns: &[
        Column::new("pokemon_id", ColumnType::Integer),
        Column::new("ability_name", ColumnType::Text),
    ],
    primary_key: PrimaryKey::Composite(&["pokemon_id", "ability_name"]),
    foreign_keys: &[
        ForeignKey::new("pokemon_id", "pokemon"),
        ForeignKey::new("ability_name", "abilities").to("name"),
    ],
};

pub static POKEMON_STATS: TableSchema = TableSchema {
    name: "pokemon_stats",
    columns: &[
        Column::new("pokemon_id", ColumnType::Integer),
        Column::new("stat_name", ColumnType::Text),
        Column::required("base_stat", ColumnType::Integer),
    ],
    primary_key: PrimaryKey::Composite(&["pokemon_id", "stat_name"]),
    foreign_keys: &[
        ForeignKey::new("pokemon_id", "pokemon"),
        ForeignKey::new("stat_name", "stats").to("name"),
    ],
};

// =============================================================================
// Evolution chains
// =============================================================================

pub static EVOLUTION_CHAINS: TableSchema = TableSchema {
    name: "evolution_chains",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("chain_identifier", ColumnType::Text).unique(),
    ],
    primary_key: PrimaryKey::AutoIncrement("id"),
    foreign_keys: &[],
};

pub static EVOLUTION_LINKS: TableSchema = TableSchema {
    name: "evolution_links",
    columns: &[
        Column::new("chain_id", ColumnType::Integer),
        Column::new("pokemon_name", ColumnType::Text),
        Column::new("stage", ColumnType::Integer),
    ],
    primary_key: PrimaryKey::Composite(&["chain_id", "pokemon_name"]),
    foreign_keys: &[ForeignKey::new("chain_id", "evolution_chains")],
};

/// All tables in dependency order (parents before children)
pub static ALL_TABLES: &[&TableSchema] = &[
    &POKEMON,
    &TYPES,
    &ABILITIES,
    &STATS,
    &POKEMON_TYPES,
    &POKEMON_ABILITIES,
    &POKEMON_STATS,
    &EVOLUTION_CHAINS,
    &EVOLUTION_LINKS,
];

/// Look up a table by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}

/// Names of all tables, in creation order
pub fn table_names() -> Vec<&'static str> {
    ALL_TABLES.iter().map(|t| t.name).collect()
}

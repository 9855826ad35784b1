use std::collections::HashSet;

/// Column data type
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    Integer,
    Text,
    /// Stored as INTEGER 0/1
    Boolean,
}

impl ColumnType {
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer | ColumnType::Boolean => "INTEGER",
            ColumnType::Text => "TEXT",
        }
    }
}

/// Column definition
#[derive(Debug, Clone)]
pub struct Column {
    pub name: &'static str,
    pub col_type: ColumnType,
    pub nullable: bool,
    pub unique: bool,
}

impl Column {
    /// Create an optional (nullable) column
    pub const fn new(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: true,
            unique: false,
        }
    }

    /// Create a required (non-nullable) column
    pub const fn required(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: false,
            unique: false,
        }
    }

    /// Mark the column as UNIQUE
    pub const fn unique(self) -> Self {
        Self {
            unique: true,
            ..self
        }
    }
}

/// Primary key shape
#[derive(Debug, Clone)]
pub enum PrimaryKey {
    /// Single column key declared inline
    Column(&'static str),
    /// `INTEGER PRIMARY KEY AUTOINCREMENT` surrogate key
    AutoIncrement(&'static str),
    /// Table-level composite key
    Composite(&'static [&'static str]),
}

impl PrimaryKey {
    /// Whether `column` is declared inline as the key
    pub fn is_inline(&self, column: &str) -> bool {
        match self {
            PrimaryKey::Column(name) | PrimaryKey::AutoIncrement(name) => *name == column,
            PrimaryKey::Composite(_) => false,
        }
    }
}

/// Foreign key reference
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references_table: &'static str,
    pub references_column: &'static str,
}

impl ForeignKey {
    pub const fn new(column: &'static str, references_table: &'static str) -> Self {
        Self {
            column,
            references_table,
            references_column: "id",
        }
    }

    /// Reference a column other than `id` (lookup tables are keyed by name)
    pub const fn to(self, references_column: &'static str) -> Self {
        Self {
            references_column,
            ..self
        }
    }
}

/// Table schema definition
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub primary_key: PrimaryKey,
    pub foreign_keys: &'static [ForeignKey],
}

impl TableSchema {
    /// Get all tables this table depends on (FK parents)
    pub fn dependencies(&self) -> HashSet<&'static str> {
        self.foreign_keys
            .iter()
            .map(|fk| fk.references_table)
            .collect()
    }
}

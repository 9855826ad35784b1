use crate::schema::{PrimaryKey, TableSchema};

/// Generate an idempotent CREATE TABLE statement for a table schema
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", schema.name);
    let mut columns = Vec::new();

    for col in schema.columns {
        let pk = match &schema.primary_key {
            PrimaryKey::AutoIncrement(name) if *name == col.name => " PRIMARY KEY AUTOINCREMENT",
            key if key.is_inline(col.name) => " PRIMARY KEY",
            _ => "",
        };
        let null_constraint = if !col.nullable { " NOT NULL" } else { "" };
        let unique = if col.unique { " UNIQUE" } else { "" };

        columns.push(format!(
            "    {} {}{}{}{}",
            col.name,
            col.col_type.sql_type(),
            pk,
            null_constraint,
            unique
        ));
    }

    if let PrimaryKey::Composite(key_columns) = &schema.primary_key {
        columns.push(format!("    PRIMARY KEY ({})", key_columns.join(", ")));
    }

    for fk in schema.foreign_keys {
        columns.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {}({})",
            fk.column, fk.references_table, fk.references_column
        ));
    }

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements for foreign key columns that are not
/// already the leading column of the primary key
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    let leading = match &schema.primary_key {
        PrimaryKey::Composite(cols) => cols.first().copied(),
        PrimaryKey::Column(col) | PrimaryKey::AutoIncrement(col) => Some(*col),
    };

    schema
        .foreign_keys
        .iter()
        .filter(|fk| Some(fk.column) != leading)
        .map(|fk| {
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{}_{} ON {}({})",
                schema.name, fk.column, schema.name, fk.column
            )
        })
        .collect()
}

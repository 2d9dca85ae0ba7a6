//! Schema model for the normalized source tables.
//!
//! Tables are defined once, dialect-agnostically, and rendered to PostgreSQL
//! or DuckDB DDL by the source backends.

use std::collections::HashMap;

/// Target database dialect for DDL rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    DuckDb,
}

/// SQL data types (dialect-agnostic)
#[derive(Debug, Clone, PartialEq)]
pub enum SqlType {
    /// Auto-assigned 64-bit key (BIGSERIAL in PG, sequence default in DuckDB)
    Serial,
    /// 32-bit integer
    Integer,
    /// 64-bit integer
    BigInt,
    /// Variable-length string
    VarChar(u16),
    /// Decimal with precision and scale
    Decimal(u8, u8),
    /// Timestamp without time zone
    Timestamp,
    /// Date only
    Date,
}

impl SqlType {
    /// Returns the PostgreSQL type string
    pub fn to_postgres(&self) -> String {
        match self {
            SqlType::Serial => "BIGSERIAL".to_string(),
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::VarChar(n) => format!("VARCHAR({})", n),
            SqlType::Decimal(p, s) => format!("NUMERIC({},{})", p, s),
            SqlType::Timestamp => "TIMESTAMP".to_string(),
            SqlType::Date => "DATE".to_string(),
        }
    }

    /// Returns the DuckDB type string
    pub fn to_duckdb(&self) -> String {
        match self {
            SqlType::Serial | SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::VarChar(n) => format!("VARCHAR({})", n),
            SqlType::Decimal(p, s) => format!("DECIMAL({},{})", p, s),
            SqlType::Timestamp => "TIMESTAMP".to_string(),
            SqlType::Date => "DATE".to_string(),
        }
    }
}

/// Foreign key constraint
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub to_table: String,
    pub to_column: String,
}

/// Column definition
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub sql_type: SqlType,
    pub not_null: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub foreign_key: Option<ForeignKey>,
}

impl Column {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            not_null: false,
            primary_key: false,
            unique: false,
            foreign_key: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKey {
            to_table: table.into(),
            to_column: column.into(),
        });
        self
    }

    fn is_generated(&self) -> bool {
        self.sql_type == SqlType::Serial
    }
}

/// Table definition
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, col: Column) -> Self {
        self.columns.push(col);
        self
    }

    /// Get the primary key column name (assumes single-column PK)
    pub fn primary_key_column(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .map(|c| c.name.as_str())
    }

    /// Get all foreign key relationships
    pub fn foreign_keys(&self) -> Vec<(&str, &ForeignKey)> {
        self.columns
            .iter()
            .filter_map(|c| c.foreign_key.as_ref().map(|fk| (c.name.as_str(), fk)))
            .collect()
    }

    /// Columns supplied on INSERT (everything except database-assigned keys)
    pub fn insert_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| !c.is_generated()).collect()
    }

    /// Name of the sequence backing the serial key in DuckDB
    pub fn sequence_name(&self) -> String {
        format!("{}_id_seq", self.name)
    }

    /// Render `CREATE ... IF NOT EXISTS` statements for this table.
    ///
    /// DuckDB has no SERIAL type, so the key draws from a sequence created first.
    /// Foreign keys are only emitted for PostgreSQL.
    pub fn create_statements(&self, dialect: Dialect) -> Vec<String> {
        let mut statements = Vec::new();
        let mut defs = Vec::with_capacity(self.columns.len());

        for col in &self.columns {
            let mut def = match dialect {
                Dialect::Postgres => format!("{} {}", col.name, col.sql_type.to_postgres()),
                Dialect::DuckDb => format!("{} {}", col.name, col.sql_type.to_duckdb()),
            };
            if dialect == Dialect::DuckDb && col.is_generated() {
                statements.push(format!(
                    "CREATE SEQUENCE IF NOT EXISTS {}",
                    self.sequence_name()
                ));
                def.push_str(&format!(" DEFAULT nextval('{}')", self.sequence_name()));
            }
            if col.primary_key {
                def.push_str(" PRIMARY KEY");
            } else if col.not_null {
                def.push_str(" NOT NULL");
            }
            if col.unique {
                def.push_str(" UNIQUE");
            }
            if let (Dialect::Postgres, Some(fk)) = (dialect, &col.foreign_key) {
                def.push_str(&format!(" REFERENCES {}({})", fk.to_table, fk.to_column));
            }
            defs.push(def);
        }

        statements.push(format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.name,
            defs.join(",\n    ")
        ));
        statements
    }
}

/// Complete schema definition
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub tables: Vec<Table>,
    table_index: HashMap<String, usize>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: Table) -> Self {
        let idx = self.tables.len();
        self.table_index.insert(table.name.clone(), idx);
        self.tables.push(table);
        self
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.table_index.get(name).map(|&idx| &self.tables[idx])
    }

    /// Get tables in topological order (dependencies first)
    pub fn tables_in_order(&self) -> Vec<&Table> {
        let mut visited = vec![false; self.tables.len()];
        let mut result = Vec::with_capacity(self.tables.len());

        fn visit<'a>(
            idx: usize,
            tables: &'a [Table],
            table_index: &HashMap<String, usize>,
            visited: &mut [bool],
            result: &mut Vec<&'a Table>,
        ) {
            if visited[idx] {
                return;
            }
            visited[idx] = true;

            for (_, fk) in tables[idx].foreign_keys() {
                if let Some(&dep_idx) = table_index.get(&fk.to_table) {
                    visit(dep_idx, tables, table_index, visited, result);
                }
            }

            result.push(&tables[idx]);
        }

        for idx in 0..self.tables.len() {
            visit(
                idx,
                &self.tables,
                &self.table_index,
                &mut visited,
                &mut result,
            );
        }

        result
    }
}

/// The normalized e-commerce source schema
pub fn source_schema() -> Schema {
    Schema::new()
        .table(
            Table::new("users")
                .column(Column::new("id", SqlType::Serial).primary_key())
                .column(Column::new("name", SqlType::VarChar(100)).not_null())
                .column(
                    Column::new("email", SqlType::VarChar(255))
                        .not_null()
                        .unique(),
                )
                .column(Column::new("signup_date", SqlType::Date).not_null()),
        )
        .table(
            Table::new("products")
                .column(Column::new("id", SqlType::Serial).primary_key())
                .column(Column::new("name", SqlType::VarChar(255)).not_null())
                .column(Column::new("category", SqlType::VarChar(100)).not_null())
                .column(Column::new("price", SqlType::Decimal(10, 2)).not_null()),
        )
        .table(
            Table::new("orders")
                .column(Column::new("id", SqlType::Serial).primary_key())
                .column(
                    Column::new("user_id", SqlType::BigInt)
                        .not_null()
                        .references("users", "id"),
                )
                .column(Column::new("order_date", SqlType::Timestamp).not_null())
                .column(Column::new("total_amount", SqlType::Decimal(12, 2)).not_null()),
        )
        .table(
            Table::new("order_items")
                .column(Column::new("id", SqlType::Serial).primary_key())
                .column(
                    Column::new("order_id", SqlType::BigInt)
                        .not_null()
                        .references("orders", "id"),
                )
                .column(
                    Column::new("product_id", SqlType::BigInt)
                        .not_null()
                        .references("products", "id"),
                )
                .column(Column::new("quantity", SqlType::Integer).not_null())
                .column(Column::new("price", SqlType::Decimal(10, 2)).not_null()),
        )
}

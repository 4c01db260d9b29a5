//! Structural metadata discovered from relational catalogs.

use serde::Serialize;

/// A base table in the public schema of one logical database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TableInfo {
    pub database_name: String,
    pub schema_name: String,
    pub table_name: String,
}

/// Graph identity of a table node: `(database, name)`.
pub type TableKey = (String, String);

impl TableInfo {
    pub fn new(
        database_name: impl Into<String>,
        schema_name: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        Self {
            database_name: database_name.into(),
            schema_name: schema_name.into(),
            table_name: table_name.into(),
        }
    }

    /// Identity used to match table nodes. The schema name is not part of it.
    pub fn key(&self) -> TableKey {
        (self.database_name.clone(), self.table_name.clone())
    }
}

/// One column-level foreign-key constraint.
///
/// Source and target tables always live in `database_name`; cross-database
/// references cannot be expressed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ForeignKeyInfo {
    pub database_name: String,
    pub constraint_name: String,
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
}

/// Graph identity of a foreign-key edge:
/// `(database, source_table, target_table, constraint, source_column, target_column)`.
pub type ForeignKeyKey = (String, String, String, String, String, String);

impl ForeignKeyInfo {
    pub fn key(&self) -> ForeignKeyKey {
        (
            self.database_name.clone(),
            self.source_table.clone(),
            self.target_table.clone(),
            self.constraint_name.clone(),
            self.source_column.clone(),
            self.target_column.clone(),
        )
    }

    /// Table key of the referencing side.
    pub fn source_key(&self) -> TableKey {
        (self.database_name.clone(), self.source_table.clone())
    }

    /// Table key of the referenced side.
    pub fn target_key(&self) -> TableKey {
        (self.database_name.clone(), self.target_table.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders_fk() -> ForeignKeyInfo {
        ForeignKeyInfo {
            database_name: "orders_db".to_string(),
            constraint_name: "fk_orders_customer".to_string(),
            source_table: "orders".to_string(),
            source_column: "customer_id".to_string(),
            target_table: "customers".to_string(),
            target_column: "id".to_string(),
        }
    }

    #[test]
    fn test_table_key_ignores_schema() {
        let a = TableInfo::new("orders_db", "public", "orders");
        let b = TableInfo::new("orders_db", "sales", "orders");
        assert_eq!(a.key(), b.key());
        assert_ne!(a, b);
    }

    #[test]
    fn test_table_key_includes_database() {
        let a = TableInfo::new("orders_db", "public", "items");
        let b = TableInfo::new("products_db", "public", "items");
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_foreign_key_endpoints_share_database() {
        let fk = orders_fk();
        assert_eq!(fk.source_key(), ("orders_db".to_string(), "orders".to_string()));
        assert_eq!(fk.target_key(), ("orders_db".to_string(), "customers".to_string()));
    }

    #[test]
    fn test_foreign_key_key_distinguishes_columns() {
        let a = orders_fk();
        let mut b = orders_fk();
        b.source_column = "billing_customer_id".to_string();
        assert_ne!(a.key(), b.key());
    }
}

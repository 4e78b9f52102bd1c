//! Table naming conventions
//!
//! Naming is configured per store instance. Nothing here is process-global.

use serde::{Deserialize, Serialize};

/// How logical table and field names map to physical names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingStrategy {
    /// Treat the first underscore-separated segment as a schema name
    /// (`shop_order_items` becomes `shop.order_items`) and lowercase the first
    /// letter of column names (`CustomerId` becomes `customerId`)
    pub schema_qualified: bool,
}

impl NamingStrategy {
    /// Names are used as given
    pub fn plain() -> Self {
        Self::default()
    }

    /// `schema_table` names become `schema.table`, columns start lowercase
    pub fn schema_qualified() -> Self {
        Self {
            schema_qualified: true,
        }
    }

    /// Resolve a logical table name
    pub fn table_name(&self, name: &str) -> String {
        if !self.schema_qualified {
            return name.to_string();
        }

        // Only the first underscore separates; empty halves are kept
        match name.split_once('_') {
            Some((schema, table)) => format!("{}.{}", schema, table),
            None => name.to_string(),
        }
    }

    /// Resolve a logical field name to a column name
    pub fn column_name(&self, field: &str) -> String {
        if !self.schema_qualified {
            return field.to_string();
        }

        let mut chars = field.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names_unchanged() {
        assert_eq!(NamingStrategy::plain().table_name("shop_orders"), "shop_orders");
    }

    #[test]
    fn test_schema_qualified_names() {
        let naming = NamingStrategy::schema_qualified();
        assert_eq!(naming.table_name("shop_order_items"), "shop.order_items");
        assert_eq!(naming.table_name("widgets"), "widgets");
        assert_eq!(naming.table_name("_hidden"), ".hidden");
        assert_eq!(naming.table_name("shop_"), "shop.");
    }

    #[test]
    fn test_column_names() {
        let naming = NamingStrategy::schema_qualified();
        assert_eq!(naming.column_name("CustomerId"), "customerId");
        assert_eq!(naming.column_name("total"), "total");
        assert_eq!(naming.column_name("Élan"), "élan");
        assert_eq!(naming.column_name(""), "");

        assert_eq!(NamingStrategy::plain().column_name("CustomerId"), "CustomerId");
    }
}

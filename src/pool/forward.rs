//! Typed wrappers over `ClusterPool::invoke`.

use serde_json::Value;

use crate::error::PoolError;
use crate::pool::ClusterPool;

/// Generate one method per operation, forwarding to the current primary.
///
/// Each argument is converted into a `serde_json::Value`; only the
/// required arguments are exposed. Use `invoke` for the optional ones.
macro_rules! forward_operations {
    ($( $(#[$meta:meta])* $name:ident ( $($arg:ident : $ty:ty),* ); )*) => {
        impl ClusterPool {
            $(
                $(#[$meta])*
                pub fn $name(&self $(, $arg: $ty)*) -> Result<Value, PoolError> {
                    self.invoke(stringify!($name), &[$(Value::from($arg)),*])
                }
            )*
        }
    };
}

forward_operations! {
    /// Run a statement, ignoring its result set.
    execute(sql: &str);
    /// Run a statement and return its result set.
    exec_query(sql: &str);
    /// All rows of a query.
    select_all(sql: &str);
    /// First row of a query.
    select_one(sql: &str);
    /// First column of the first row.
    select_value(sql: &str);
    /// First column of every row.
    select_values(sql: &str);
    /// Rows as positional arrays.
    select_rows(sql: &str);
    /// Run an insert statement.
    insert(sql: &str);
    /// Run an update statement.
    update(sql: &str);
    /// Run a delete statement.
    delete(sql: &str);
    /// Quote a value for inclusion in SQL.
    quote(value: Value);
    /// Quote a table identifier.
    quote_table_name(name: &str);
    /// Column descriptions of `table`.
    columns(table: &str);
    /// Names of every table.
    tables();
    /// Whether `table` exists.
    table_exists(table: &str);
    /// Indexes defined on `table`.
    indexes(table: &str);
    /// Open a transaction on the current primary.
    begin_db_transaction();
    /// Commit the open transaction.
    commit_db_transaction();
    /// Roll back the open transaction.
    rollback_db_transaction();
}

//! Table-creation, column-addition, and row-insertion validators:
//! predicates over the catalog that the engine runs before committing
//! a mutation, grounded in the source program's `TableValidator` and
//! `RowValidator`.

use std::collections::HashSet;

use crate::catalog::{Catalog, Column, ForeignKey, Row, Table};
use crate::error::{Error, Result};

/// A table has a primary key, no existing table shares its name, and
/// its column names are unique.
pub fn validate_table_creation(table: &Table, catalog: &Catalog) -> Result<()> {
    if table.primary_key.is_none() {
        return Err(Error::Schema("table must have a primary key".to_string()));
    }
    if catalog.tables.contains_key(&table.name) {
        return Err(Error::Schema(format!(
            "table '{}' already exists",
            table.name
        )));
    }
    let mut seen = HashSet::new();
    for column in &table.columns {
        if !seen.insert(column.name.as_str()) {
            return Err(Error::Schema(format!(
                "duplicate column name '{}'",
                column.name
            )));
        }
    }
    Ok(())
}

/// A column being added to an existing table must not collide with an
/// already-present name.
pub fn validate_column_addition(table: &Table, column: &Column) -> Result<()> {
    if table.column_index(&column.name).is_some() {
        return Err(Error::Schema(format!(
            "column '{}' already exists on table '{}'",
            column.name, table.name
        )));
    }
    Ok(())
}

/// NOT_NULL/UNIQUE/PRIMARY_KEY per column against the table's existing
/// rows, plus non-NULL foreign-key values must exist in their
/// referenced table.
pub fn validate_row_insertion(table: &Table, catalog: &Catalog, row: &Row) -> Result<()> {
    for (index, column) in table.columns.iter().enumerate() {
        let value = &row.values[index];
        if column.is_not_null() && value.is_absent() {
            return Err(Error::Constraint(format!(
                "column '{}' cannot be NULL",
                column.name
            )));
        }
        if column.is_unique() && !value.is_absent() {
            let collides = table
                .rows
                .iter()
                .any(|existing| existing.values[index].value_eq(value));
            if collides {
                return Err(Error::Constraint(format!(
                    "duplicate value for unique column '{}'",
                    column.name
                )));
            }
        }
    }

    for fk in &table.foreign_keys {
        let value = &row.values[fk.column];
        if value.is_absent() {
            continue;
        }
        validate_foreign_key_value(fk, catalog, value, &table.columns[fk.column].name)?;
    }

    Ok(())
}

fn validate_foreign_key_value(
    fk: &ForeignKey,
    catalog: &Catalog,
    value: &crate::value::BoxedValue,
    local_column_name: &str,
) -> Result<()> {
    let referenced_table = catalog.tables.get(&fk.referenced_table).ok_or_else(|| {
        Error::Name(format!(
            "referenced table '{}' does not exist",
            fk.referenced_table
        ))
    })?;
    let found = referenced_table
        .rows
        .iter()
        .any(|r| r.values[fk.referenced_column].value_eq(value));
    if !found {
        return Err(Error::Constraint(format!(
            "no matching value in '{}' for foreign key column '{}'",
            fk.referenced_table, local_column_name
        )));
    }
    Ok(())
}

/// A redesign of `ALTER TABLE ... ADD FOREIGN_KEY`: unlike the source
/// program, this re-validates every existing row against the new
/// constraint instead of silently accepting rows that would already
/// violate it. See DESIGN.md.
pub fn validate_existing_rows_against_new_fk(
    table: &Table,
    catalog: &Catalog,
    fk: &ForeignKey,
) -> Result<()> {
    let local_column_name = table.columns[fk.column].name.clone();
    for row in &table.rows {
        let value = &row.values[fk.column];
        if value.is_absent() {
            continue;
        }
        validate_foreign_key_value(fk, catalog, value, &local_column_name)?;
    }
    Ok(())
}

//! The engine: holds the catalog and implements the effects of the
//! five statement kinds, including WHERE evaluation and result
//! materialization. This is the crate's only public entry point for
//! mutating or querying state — there is no global/singleton catalog.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::{
    AlterOperation, AlterTableStatement, ColumnConstraint, ComparisonOp, Condition,
    ConditionGroup, ConditionNode, CreateTableStatement, DropTableStatement, InsertStatement,
    LogicalOp, SelectStatement, Statement,
};
use crate::catalog::{Catalog, Column, ForeignKey, PrimaryKey, Relation, Row, Table};
use crate::error::{Error, Result};
use crate::parser::Parser;
use crate::value::{BoxedValue, DataType};

/// A read-only view of a table's schema, returned by
/// [`Engine::get_table`] for introspection by an external collaborator
/// (a REPL, a backup routine) without exposing the live catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSnapshot {
    pub name: String,
    pub data_type: DataType,
    pub constraints: Vec<ColumnConstraint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub name: String,
    pub columns: Vec<ColumnSnapshot>,
    pub row_count: usize,
}

/// The tabular result of a statement. DDL/DML statements return an
/// empty result set; SELECT populates `columns` and `rows`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultSet {
    pub fn empty() -> Self {
        ResultSet::default()
    }
}

impl fmt::Display for ResultSet {
    /// Box-drawn rendering: a `+---+---+` separator between the
    /// header, every row, and the footer, with each cell center-padded
    /// to `max(header width, widest cell in that column)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            return Ok(());
        }
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let cell_width = self
                    .rows
                    .iter()
                    .map(|row| row[i].chars().count())
                    .max()
                    .unwrap_or(0);
                name.chars().count().max(cell_width)
            })
            .collect();

        let separator = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            for w in &widths {
                write!(f, "+{}", "-".repeat(w + 2))?;
            }
            writeln!(f, "+")
        };

        let write_row = |f: &mut fmt::Formatter<'_>, cells: &[String]| -> fmt::Result {
            for (cell, w) in cells.iter().zip(&widths) {
                write!(f, "| {:^width$} ", cell, width = w)?;
            }
            writeln!(f, "|")
        };

        separator(f)?;
        write_row(f, &self.columns)?;
        separator(f)?;
        for row in &self.rows {
            write_row(f, row)?;
            separator(f)?;
        }
        Ok(())
    }
}

/// Holds the catalog; the sole mutable entry point for statements.
#[derive(Debug, Default)]
pub struct Engine {
    catalog: Catalog,
}

impl Engine {
    pub fn new() -> Self {
        Engine {
            catalog: Catalog::new(),
        }
    }

    /// Lexes, parses, and executes one statement. Errors abort the
    /// statement with no partial mutation of the catalog; a batch of
    /// statements (driven by the caller) should continue to the next
    /// one after reporting an error from this call.
    pub fn execute(&mut self, query_text: &str) -> Result<ResultSet> {
        let statement = Parser::new(query_text)?.parse_statement()?;
        tracing::debug!(kind = statement_kind(&statement), "executing statement");
        let result = match statement {
            Statement::Select(s) => self.execute_select(&s),
            Statement::Insert(s) => self.execute_insert(s).map(|()| ResultSet::empty()),
            Statement::CreateTable(s) => self.execute_create_table(s).map(|()| ResultSet::empty()),
            Statement::AlterTable(s) => self.execute_alter_table(s).map(|()| ResultSet::empty()),
            Statement::DropTable(s) => self.execute_drop_table(&s).map(|()| ResultSet::empty()),
        };
        if let Err(ref e) = result {
            tracing::warn!(error = %e, "statement failed");
        }
        result
    }

    /// A read-only schema snapshot for introspection; `None` if the
    /// table doesn't exist.
    pub fn get_table(&self, name: &str) -> Option<TableSnapshot> {
        self.catalog.tables.get(name).map(|t| TableSnapshot {
            name: t.name.clone(),
            columns: t
                .columns
                .iter()
                .map(|c| ColumnSnapshot {
                    name: c.name.clone(),
                    data_type: c.data_type,
                    constraints: c.constraints.clone(),
                })
                .collect(),
            row_count: t.rows.len(),
        })
    }

    // ---- CREATE TABLE ----

    fn execute_create_table(&mut self, stmt: CreateTableStatement) -> Result<()> {
        let mut table = Table::new(stmt.table.clone());
        for col in stmt.columns {
            table.columns.push(Column {
                name: col.name,
                data_type: col.data_type,
                constraints: col.constraints,
            });
        }

        let pk_columns: Vec<usize> = table
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.has(ColumnConstraint::PrimaryKey))
            .map(|(i, _)| i)
            .collect();
        match pk_columns.as_slice() {
            [only] => table.primary_key = Some(PrimaryKey { column: *only }),
            [] => return Err(Error::Schema("table must have a primary key".to_string())),
            _ => {
                return Err(Error::Schema(
                    "table may have at most one primary key".to_string(),
                ))
            }
        }

        for fk_def in stmt.foreign_keys {
            let local_index = table.column_index(&fk_def.column).ok_or_else(|| {
                Error::Name(format!("unknown column '{}'", fk_def.column))
            })?;
            let referenced_table = self
                .catalog
                .tables
                .get(&fk_def.referenced_table)
                .ok_or_else(|| {
                    Error::Name(format!(
                        "referenced table '{}' does not exist",
                        fk_def.referenced_table
                    ))
                })?;
            let referenced_index = referenced_table
                .column_index(&fk_def.referenced_column)
                .ok_or_else(|| {
                    Error::Name(format!(
                        "unknown referenced column '{}'",
                        fk_def.referenced_column
                    ))
                })?;
            let referenced_column = &referenced_table.columns[referenced_index];
            if !(referenced_column.has(ColumnConstraint::PrimaryKey)
                || referenced_column.has(ColumnConstraint::Unique))
            {
                return Err(Error::Schema(format!(
                    "foreign key must reference a PRIMARY_KEY or UNIQUE column, '{}' is neither",
                    fk_def.referenced_column
                )));
            }
            let fk = ForeignKey {
                column: local_index,
                referenced_table: fk_def.referenced_table,
                referenced_column: referenced_index,
            };
            table.relations.push(Relation {
                foreign_key: fk.clone(),
            });
            table.foreign_keys.push(fk);
        }

        crate::validate::validate_table_creation(&table, &self.catalog)?;
        self.catalog.tables.insert(stmt.table, table);
        Ok(())
    }

    // ---- INSERT ----

    fn execute_insert(&mut self, stmt: InsertStatement) -> Result<()> {
        let table = self
            .catalog
            .tables
            .get(&stmt.table)
            .ok_or_else(|| Error::Name(format!("unknown table '{}'", stmt.table)))?;

        let target_columns: Vec<usize> = if stmt.columns.is_empty() {
            if stmt.values.len() != table.columns.len() {
                return Err(Error::Schema(format!(
                    "expected {} values, found {}",
                    table.columns.len(),
                    stmt.values.len()
                )));
            }
            (0..table.columns.len()).collect()
        } else {
            if stmt.values.len() != stmt.columns.len() {
                return Err(Error::Schema(format!(
                    "expected {} values, found {}",
                    stmt.columns.len(),
                    stmt.values.len()
                )));
            }
            stmt.columns
                .iter()
                .map(|name| {
                    table
                        .column_index(name)
                        .ok_or_else(|| Error::Name(format!("unknown column '{name}'")))
                })
                .collect::<Result<_>>()?
        };

        let mut slots: Vec<Option<BoxedValue>> = vec![None; table.columns.len()];
        for (index, literal) in target_columns.iter().zip(stmt.values.iter()) {
            let column = &table.columns[*index];
            slots[*index] = Some(BoxedValue::from_text(&literal.0, column.data_type)?);
        }
        let values: Vec<BoxedValue> = table
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| slots[i].take().unwrap_or_else(|| BoxedValue::null(c.data_type)))
            .collect();
        let row = Row { values };

        crate::validate::validate_row_insertion(table, &self.catalog, &row)?;

        self.catalog
            .tables
            .get_mut(&stmt.table)
            .expect("table existed moments ago")
            .rows
            .push(row);
        Ok(())
    }

    // ---- ALTER TABLE ----

    fn execute_alter_table(&mut self, stmt: AlterTableStatement) -> Result<()> {
        let mut table = self
            .catalog
            .tables
            .get(&stmt.table)
            .cloned()
            .ok_or_else(|| Error::Name(format!("unknown table '{}'", stmt.table)))?;

        for op in stmt.operations {
            match op {
                AlterOperation::AddColumn(def) => {
                    let column = Column {
                        name: def.name,
                        data_type: def.data_type,
                        constraints: def.constraints,
                    };
                    crate::validate::validate_column_addition(&table, &column)?;
                    if column.has(ColumnConstraint::PrimaryKey) {
                        return Err(Error::Schema(
                            "cannot add a PRIMARY_KEY column".to_string(),
                        ));
                    }
                    if column.has(ColumnConstraint::NotNull) {
                        return Err(Error::Schema(
                            "cannot add a NOT_NULL column".to_string(),
                        ));
                    }
                    let data_type = column.data_type;
                    table.columns.push(column);
                    for row in &mut table.rows {
                        row.values.push(BoxedValue::null(data_type));
                    }
                }
                AlterOperation::DropColumn(name) => {
                    let index = table
                        .column_index(&name)
                        .ok_or_else(|| Error::Name(format!("unknown column '{name}'")))?;
                    if table.primary_key.map(|pk| pk.column) == Some(index) {
                        return Err(Error::Schema(
                            "cannot drop the primary key column".to_string(),
                        ));
                    }
                    table.columns.remove(index);
                    for row in &mut table.rows {
                        row.values.remove(index);
                    }
                    table.foreign_keys.retain(|fk| fk.column != index);
                    table.relations.retain(|r| r.foreign_key.column != index);
                    if let Some(pk) = table.primary_key.as_mut() {
                        if pk.column > index {
                            pk.column -= 1;
                        }
                    }
                    for fk in &mut table.foreign_keys {
                        if fk.column > index {
                            fk.column -= 1;
                        }
                    }
                    for rel in &mut table.relations {
                        if rel.foreign_key.column > index {
                            rel.foreign_key.column -= 1;
                        }
                    }
                }
                AlterOperation::AddForeignKey(def) => {
                    let local_index = table
                        .column_index(&def.column)
                        .ok_or_else(|| Error::Name(format!("unknown column '{}'", def.column)))?;
                    if table.foreign_keys.iter().any(|fk| fk.column == local_index) {
                        return Err(Error::Schema(format!(
                            "column '{}' is already a foreign key",
                            def.column
                        )));
                    }
                    let referenced_table =
                        self.catalog.tables.get(&def.referenced_table).ok_or_else(|| {
                            Error::Name(format!(
                                "referenced table '{}' does not exist",
                                def.referenced_table
                            ))
                        })?;
                    let referenced_index = referenced_table
                        .column_index(&def.referenced_column)
                        .ok_or_else(|| {
                            Error::Name(format!(
                                "unknown referenced column '{}'",
                                def.referenced_column
                            ))
                        })?;
                    let referenced_column = &referenced_table.columns[referenced_index];
                    if !(referenced_column.has(ColumnConstraint::PrimaryKey)
                        || referenced_column.has(ColumnConstraint::Unique))
                    {
                        return Err(Error::Schema(format!(
                            "foreign key must reference a PRIMARY_KEY or UNIQUE column, '{}' is neither",
                            def.referenced_column
                        )));
                    }
                    let fk = ForeignKey {
                        column: local_index,
                        referenced_table: def.referenced_table,
                        referenced_column: referenced_index,
                    };
                    crate::validate::validate_existing_rows_against_new_fk(
                        &table,
                        &self.catalog,
                        &fk,
                    )?;
                    table.relations.push(Relation {
                        foreign_key: fk.clone(),
                    });
                    table.foreign_keys.push(fk);
                }
            }
        }

        self.catalog.tables.insert(stmt.table, table);
        Ok(())
    }

    // ---- DROP TABLE ----

    fn execute_drop_table(&mut self, stmt: &DropTableStatement) -> Result<()> {
        if self.catalog.tables.remove(&stmt.table).is_none() {
            return Err(Error::Name(format!("unknown table '{}'", stmt.table)));
        }
        Ok(())
    }

    // ---- SELECT ----

    fn execute_select(&self, stmt: &SelectStatement) -> Result<ResultSet> {
        let table = self
            .catalog
            .tables
            .get(&stmt.table)
            .ok_or_else(|| Error::Name(format!("unknown table '{}'", stmt.table)))?;

        let column_names: Vec<String> = if stmt.columns.len() == 1 && stmt.columns[0] == "*" {
            table.columns.iter().map(|c| c.name.clone()).collect()
        } else {
            stmt.columns.clone()
        };
        let column_indices: Vec<usize> = column_names
            .iter()
            .map(|name| {
                table
                    .column_index(name)
                    .ok_or_else(|| Error::Name(format!("unknown column '{name}'")))
            })
            .collect::<Result<_>>()?;

        let mut rows = Vec::new();
        for row in &table.rows {
            let keep = match &stmt.where_clause {
                None => true,
                Some(group) => evaluate_group(group, table, row)?,
            };
            if keep {
                rows.push(
                    column_indices
                        .iter()
                        .map(|&i| row.values[i].to_text())
                        .collect(),
                );
            }
        }
        Ok(ResultSet {
            columns: column_names,
            rows,
        })
    }
}

fn statement_kind(statement: &Statement) -> &'static str {
    match statement {
        Statement::Select(_) => "select",
        Statement::Insert(_) => "insert",
        Statement::CreateTable(_) => "create_table",
        Statement::AlterTable(_) => "alter_table",
        Statement::DropTable(_) => "drop_table",
    }
}

fn evaluate_group(group: &ConditionGroup, table: &Table, row: &Row) -> Result<bool> {
    match group.op {
        LogicalOp::And => {
            for child in &group.children {
                if !evaluate_node(child, table, row)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        LogicalOp::Or => {
            for child in &group.children {
                if evaluate_node(child, table, row)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

fn evaluate_node(node: &ConditionNode, table: &Table, row: &Row) -> Result<bool> {
    match node {
        ConditionNode::Group(group) => evaluate_group(group, table, row),
        ConditionNode::Condition(condition) => evaluate_condition(condition, table, row),
    }
}

/// An unknown WHERE column makes the condition false, for every
/// operator including `IS_NULL`/`IS_NOT_NULL` — the row lookup happens
/// once, before dispatching on the operator, exactly as in the source
/// program's `satisfiesCondition`.
fn evaluate_condition(condition: &Condition, table: &Table, row: &Row) -> Result<bool> {
    let (column_name, index) = match condition {
        Condition::IsNull { column } | Condition::IsNotNull { column } => {
            (column.as_str(), table.column_index(column))
        }
        Condition::Compare { column, .. } => (column.as_str(), table.column_index(column)),
    };
    let Some(index) = index else {
        let _ = column_name;
        return Ok(false);
    };

    match condition {
        Condition::IsNull { .. } => Ok(row.values[index].is_absent()),
        Condition::IsNotNull { .. } => Ok(!row.values[index].is_absent()),
        Condition::Compare { op, value, .. } => {
            let column = &table.columns[index];
            let rhs = BoxedValue::from_text(&value.0, column.data_type)?;
            let ordering = row.values[index].compare(&rhs)?;
            Ok(match op {
                ComparisonOp::Eq => ordering == Ordering::Equal,
                ComparisonOp::NotEq => ordering != Ordering::Equal,
                ComparisonOp::Lt => ordering == Ordering::Less,
                ComparisonOp::LtEq => ordering != Ordering::Greater,
                ComparisonOp::Gt => ordering == Ordering::Greater,
                ComparisonOp::GtEq => ordering != Ordering::Less,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_insert_select_round_trip() {
        let mut engine = Engine::new();
        engine
            .execute("CREATE TABLE people (id INTEGER PRIMARY_KEY, name TEXT NOT_NULL);")
            .unwrap();
        engine
            .execute("INSERT INTO people (id, name) VALUES (1, 'Ada');")
            .unwrap();
        engine
            .execute("INSERT INTO people (id, name) VALUES (2, 'Lin');")
            .unwrap();
        let result = engine.execute("SELECT * FROM people;").unwrap();
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0], vec!["1".to_string(), "Ada".to_string()]);
        assert_eq!(result.rows[1], vec!["2".to_string(), "Lin".to_string()]);
    }

    #[test]
    fn unique_violation_leaves_table_unchanged() {
        let mut engine = Engine::new();
        engine
            .execute("CREATE TABLE people (id INTEGER PRIMARY_KEY, name TEXT NOT_NULL);")
            .unwrap();
        engine
            .execute("INSERT INTO people (id, name) VALUES (1, 'Ada');")
            .unwrap();
        let err = engine
            .execute("INSERT INTO people (id, name) VALUES (1, 'X');")
            .unwrap_err();
        assert!(matches!(err, Error::Constraint(_)));
        assert_eq!(engine.get_table("people").unwrap().row_count, 1);
    }

    #[test]
    fn foreign_key_reject_then_accept() {
        let mut engine = Engine::new();
        engine
            .execute("CREATE TABLE people (id INTEGER PRIMARY_KEY, name TEXT NOT_NULL);")
            .unwrap();
        engine
            .execute("INSERT INTO people (id, name) VALUES (1, 'Ada');")
            .unwrap();
        engine
            .execute(
                "CREATE TABLE pets (pid INTEGER PRIMARY_KEY, owner INTEGER, FOREIGN_KEY owner REFERENCES people id);",
            )
            .unwrap();
        let err = engine
            .execute("INSERT INTO pets (pid, owner) VALUES (10, 99);")
            .unwrap_err();
        assert!(matches!(err, Error::Constraint(_)));
        assert_eq!(engine.get_table("pets").unwrap().row_count, 0);
        engine
            .execute("INSERT INTO pets (pid, owner) VALUES (10, 1);")
            .unwrap();
        assert_eq!(engine.get_table("pets").unwrap().row_count, 1);
    }

    #[test]
    fn where_precedence_and_binds_tighter_than_or() {
        let mut engine = Engine::new();
        engine
            .execute("CREATE TABLE people (id INTEGER PRIMARY_KEY, name TEXT NOT_NULL);")
            .unwrap();
        engine
            .execute("INSERT INTO people (id, name) VALUES (1, 'Ada');")
            .unwrap();
        engine
            .execute("INSERT INTO people (id, name) VALUES (2, 'Lin');")
            .unwrap();

        let loose = engine
            .execute("SELECT name FROM people WHERE id = 1 OR id = 2 AND name = 'Lin';")
            .unwrap();
        assert_eq!(loose.rows.len(), 2);

        let strict = engine
            .execute("SELECT name FROM people WHERE (id = 1 OR id = 2) AND name = 'Lin';")
            .unwrap();
        assert_eq!(strict.rows, vec![vec!["Lin".to_string()]]);
    }

    #[test]
    fn alter_add_and_drop_column_with_primary_key_protection() {
        let mut engine = Engine::new();
        engine
            .execute("CREATE TABLE people (id INTEGER PRIMARY_KEY, name TEXT NOT_NULL);")
            .unwrap();
        engine
            .execute("INSERT INTO people (id, name) VALUES (1, 'Ada');")
            .unwrap();

        engine
            .execute("ALTER TABLE people ADD COLUMN age INTEGER;")
            .unwrap();
        let snapshot = engine.get_table("people").unwrap();
        assert_eq!(snapshot.columns.len(), 3);

        let both_null = engine
            .execute("SELECT name FROM people WHERE age IS_NULL;")
            .unwrap();
        assert_eq!(both_null.rows.len(), 1);

        engine
            .execute("ALTER TABLE people DROP COLUMN age;")
            .unwrap();
        assert_eq!(engine.get_table("people").unwrap().columns.len(), 2);

        let err = engine
            .execute("ALTER TABLE people DROP COLUMN id;")
            .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn unknown_where_column_makes_condition_false() {
        let mut engine = Engine::new();
        engine
            .execute("CREATE TABLE people (id INTEGER PRIMARY_KEY);")
            .unwrap();
        engine.execute("INSERT INTO people (id) VALUES (1);").unwrap();
        let result = engine
            .execute("SELECT id FROM people WHERE nonexistent = 1;")
            .unwrap();
        assert!(result.rows.is_empty());
    }

    #[test]
    fn result_set_renders_as_box_drawn_table() {
        let mut engine = Engine::new();
        engine
            .execute("CREATE TABLE people (id INTEGER PRIMARY_KEY, name TEXT NOT_NULL);")
            .unwrap();
        engine
            .execute("INSERT INTO people (id, name) VALUES (1, 'Ada');")
            .unwrap();
        let result = engine.execute("SELECT * FROM people;").unwrap();
        let rendered = result.to_string();
        assert!(rendered.starts_with("+----+------+\n"));
        assert!(rendered.contains("| id | name |\n"));
        assert!(rendered.contains("| 1  | Ada  |\n"));
    }
}

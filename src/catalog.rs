//! Catalog entities: `Column`, `Row`, `Table`, `PrimaryKey`,
//! `ForeignKey`, `Relation`, and the `Catalog` itself.
//!
//! Columns are owned by their table's `Vec<Column>` and referred back
//! to by index rather than through a shared, cyclic owning graph —
//! the arena/handle scheme this engine's design favors over a
//! `Rc`/`Weak` back-reference mesh. `PrimaryKey`/`ForeignKey`/
//! `Relation` likewise hold column indices (and, for foreign keys, the
//! referenced table's name) instead of pointers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ast::ColumnConstraint;
use crate::value::{BoxedValue, DataType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub constraints: Vec<ColumnConstraint>,
}

impl Column {
    pub fn has(&self, constraint: ColumnConstraint) -> bool {
        self.constraints.contains(&constraint)
    }

    pub fn is_not_null(&self) -> bool {
        self.has(ColumnConstraint::NotNull) || self.has(ColumnConstraint::PrimaryKey)
    }

    pub fn is_unique(&self) -> bool {
        self.has(ColumnConstraint::Unique) || self.has(ColumnConstraint::PrimaryKey)
    }
}

/// A single row. Values are positional, parallel to the owning
/// table's `columns`; every column always has an entry (possibly
/// NULL) since rows are never partially populated.
#[derive(Debug, Clone)]
pub struct Row {
    pub values: Vec<BoxedValue>,
}

/// A single-column primary key, referring to its column by index into
/// the owning table's `columns`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryKey {
    pub column: usize,
}

/// A single-column foreign key: a local column index plus the name
/// and column index of what it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: usize,
    pub referenced_table: String,
    pub referenced_column: usize,
}

/// A navigable pairing of a `ForeignKey` with its referenced table,
/// kept alongside `foreign_keys` for lookups that want the target
/// table name without re-deriving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub foreign_key: ForeignKey,
}

#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub primary_key: Option<PrimaryKey>,
    pub foreign_keys: Vec<ForeignKey>,
    pub relations: Vec<Relation>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Table {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.column_index(name).map(|i| &self.columns[i])
    }
}

/// Mapping from table name to `Table`; process-wide (well,
/// engine-instance-wide) state, constructed and torn down explicitly
/// with the `Engine` that owns it rather than as a singleton.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub tables: BTreeMap<String, Table>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            tables: BTreeMap::new(),
        }
    }
}

//! The typed query AST. Statement kinds and WHERE-tree nodes are sum
//! types; the engine dispatches on them by matching, never by virtual
//! method calls.

use crate::value::DataType;

/// A per-column constraint named in DDL. `PrimaryKey` implies
/// `NotNull` and `Unique` semantically but is still its own variant —
/// the engine, not the AST, is responsible for that implication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ColumnConstraint {
    NotNull,
    Unique,
    PrimaryKey,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    pub constraints: Vec<ColumnConstraint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyDef {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// A literal as it appeared in the source text: raw, untyped, kept
/// verbatim until the engine interprets it against a column's
/// declared type. Preserving the literal's text rather than an
/// eagerly-typed value means a quoted `'NULL'` and a bare `NULL` are
/// indistinguishable by the time they reach value parsing — a quirk
/// inherited from the source program's own literal handling.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    IsNull { column: String },
    IsNotNull { column: String },
    Compare {
        column: String,
        op: ComparisonOp,
        value: Literal,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// A boolean tree node combining children with AND or OR. A single
/// condition is always wrapped in an AND group by the parser so that
/// evaluation never needs to special-case a bare condition.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionGroup {
    pub op: LogicalOp,
    pub children: Vec<ConditionNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    Condition(Condition),
    Group(ConditionGroup),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// Column names in projection order, or `["*"]` for "all columns".
    pub columns: Vec<String>,
    pub table: String,
    pub where_clause: Option<ConditionGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: String,
    /// Empty means "use the table's full column list, in order".
    pub columns: Vec<String>,
    pub values: Vec<Literal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    pub table: String,
    pub columns: Vec<ColumnDef>,
    pub foreign_keys: Vec<ForeignKeyDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlterOperation {
    AddColumn(ColumnDef),
    DropColumn(String),
    AddForeignKey(ForeignKeyDef),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterTableStatement {
    pub table: String,
    pub operations: Vec<AlterOperation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStatement {
    pub table: String,
}

/// The five statement kinds this engine understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectStatement),
    Insert(InsertStatement),
    CreateTable(CreateTableStatement),
    AlterTable(AlterTableStatement),
    DropTable(DropTableStatement),
}

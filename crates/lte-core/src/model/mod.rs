//! Learning-task data model
//!
//! - [`Dependency`]: provenance edge with a staleness flag
//! - [`Field`]: content cell keyed by [`ColumnKey`]
//! - [`Row`]: one field per column
//! - [`Task`]: ordered rows

pub mod column;
pub mod dependency;
pub mod field;
pub mod ids;
pub mod row;

pub use column::{columns, ColumnDef, ColumnKey, UnknownColumn};
pub use dependency::{Dependency, DependencyKind};
pub use field::Field;
pub use ids::{DependencyId, FieldId, RequestId, RowId, TaskId};
pub use row::{Row, Task};

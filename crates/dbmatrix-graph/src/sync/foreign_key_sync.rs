//! Foreign key synchronization to Neo4j.
//!
//! Creates relationships between table nodes of the same database:
//! - (:Table)-[:HAS_FOREIGN_KEY {constraintName, sourceColumn, targetColumn, database}]->(:Table)

use tracing::debug;

use dbmatrix_core::ForeignKeyInfo;

use crate::store::{GraphResult, GraphSession, GraphStatement};

/// Upsert one relationship per foreign-key column.
///
/// Returns `(linked, skipped)`; a foreign key is skipped, not failed, when
/// either endpoint node does not exist.
pub async fn link_foreign_keys<S: GraphSession>(
    session: &mut S,
    foreign_keys: &[ForeignKeyInfo],
) -> GraphResult<(usize, usize)> {
    let mut linked = 0;
    let mut skipped = 0;

    for fk in foreign_keys {
        let outcome = session.run(&GraphStatement::LinkForeignKey(fk)).await?;
        if outcome.affected > 0 {
            linked += 1;
            debug!(
                database = %fk.database_name,
                constraint = %fk.constraint_name,
                source = %fk.source_table,
                target = %fk.target_table,
                "Linked foreign key"
            );
        } else {
            skipped += 1;
            debug!(
                database = %fk.database_name,
                constraint = %fk.constraint_name,
                source = %fk.source_table,
                target = %fk.target_table,
                "Skipped foreign key, endpoint table not in graph"
            );
        }
    }

    Ok((linked, skipped))
}

//! Postgres-backed BOM store.
//!
//! Every unit of work is one transaction that first takes a transaction
//! scoped advisory lock on [`BOM_GRAPH_LOCK_KEY`]. The lock is released by
//! Postgres at commit or rollback, so dropping an uncommitted unit of work
//! needs no cleanup beyond the transaction's own rollback.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use meridian_utils::bom::{
    BomGraph, BomResult, BomSnapshot, BomStore, BomUnitOfWork, CatalogSnapshot, ChangeSet, EdgeChange,
    ProductFacts,
};

use crate::repositories::component_edge;
use crate::repositories::product::ProductFactsRow;

/// Advisory lock key guarding every write to `component_edges`
pub const BOM_GRAPH_LOCK_KEY: i64 = 0x4d45_5249_4449_414e;

pub(crate) async fn lock_bom_graph(conn: &mut PgConnection) -> Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(BOM_GRAPH_LOCK_KEY)
        .execute(conn)
        .await
        .context("Failed to acquire BOM graph lock")?;
    Ok(())
}

async fn load_snapshot(conn: &mut PgConnection) -> Result<BomSnapshot> {
    let rows: Vec<ProductFactsRow> =
        sqlx::query_as("SELECT id, kind, direct_cost, rolled_up_cost FROM products")
            .fetch_all(&mut *conn)
            .await
            .context("Failed to load product facts")?;

    let catalog = rows
        .into_iter()
        .map(|row| {
            let id = row.id;
            ProductFacts::try_from(row).map(|facts| (id, facts))
        })
        .collect::<Result<CatalogSnapshot>>()?;

    let graph = BomGraph::from_edges(component_edge::load_all(conn).await?);

    Ok(BomSnapshot { graph, catalog })
}

async fn apply_changes(conn: &mut PgConnection, changes: &ChangeSet) -> Result<()> {
    for change in &changes.edges {
        match change {
            EdgeChange::Inserted(edge) => component_edge::insert(&mut *conn, edge).await?,
            EdgeChange::Updated(edge) => {
                if !component_edge::update_quantity(&mut *conn, edge).await? {
                    bail!(
                        "BOM edge {} -> {} vanished while locked",
                        edge.parent_id,
                        edge.component_id
                    );
                }
            }
            EdgeChange::Removed {
                parent_id,
                component_id,
            } => {
                if !component_edge::delete(&mut *conn, *parent_id, *component_id).await? {
                    bail!("BOM edge {} -> {} vanished while locked", parent_id, component_id);
                }
            }
        }
    }

    for (product_id, direct_cost) in &changes.direct_costs {
        let result = sqlx::query(
            "UPDATE products SET direct_cost = $2, updated_at = NOW() WHERE id = $1 AND kind = 'leaf'",
        )
        .bind(product_id)
        .bind(direct_cost)
        .execute(&mut *conn)
        .await
        .context("Failed to update direct cost")?;
        if result.rows_affected() == 0 {
            bail!("Leaf product {} vanished while locked", product_id);
        }
    }

    if !changes.invalidated.is_empty() {
        let ids: Vec<Uuid> = changes.invalidated.iter().copied().collect();
        sqlx::query("UPDATE products SET rolled_up_cost = NULL WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut *conn)
            .await
            .context("Failed to invalidate rolled-up costs")?;
    }

    for (product_id, cost) in &changes.cost_writes {
        sqlx::query("UPDATE products SET rolled_up_cost = $2 WHERE id = $1 AND kind = 'composite'")
            .bind(product_id)
            .bind(cost)
            .execute(&mut *conn)
            .await
            .context("Failed to cache rolled-up cost")?;
    }

    debug!(
        edges = changes.edges.len(),
        direct_costs = changes.direct_costs.len(),
        invalidated = changes.invalidated.len(),
        cost_writes = changes.cost_writes.len(),
        "Applied BOM change set"
    );
    Ok(())
}

#[derive(Clone)]
pub struct PgBomStore {
    pool: PgPool,
}

impl PgBomStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BomStore for PgBomStore {
    async fn snapshot(&self) -> BomResult<BomSnapshot> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;
        let snapshot = load_snapshot(&mut tx).await?;
        tx.commit().await?;
        Ok(snapshot)
    }

    async fn begin(&self) -> BomResult<Box<dyn BomUnitOfWork>> {
        let mut tx = self.pool.begin().await?;
        lock_bom_graph(&mut tx).await?;
        let snapshot = load_snapshot(&mut tx).await?;
        Ok(Box::new(PgUnitOfWork { tx, snapshot }))
    }

    async fn has_dependent_edges(&self, product_id: Uuid) -> BomResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM component_edges WHERE parent_id = $1 OR component_id = $1)",
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
    snapshot: BomSnapshot,
}

#[async_trait]
impl BomUnitOfWork for PgUnitOfWork {
    fn snapshot(&self) -> &BomSnapshot {
        &self.snapshot
    }

    async fn commit(self: Box<Self>, changes: ChangeSet) -> BomResult<()> {
        let PgUnitOfWork { mut tx, .. } = *self;
        apply_changes(&mut tx, &changes).await?;
        tx.commit().await?;
        Ok(())
    }
}

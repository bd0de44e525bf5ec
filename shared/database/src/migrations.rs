use anyhow::Result;
use sqlx::PgPool;

pub async fn run_postgres_migrations(pool: &PgPool) -> Result<()> {
    tracing::info!("Running PostgreSQL migrations");

    // Product catalog. rolled_up_cost caches the BOM rollup of composites.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            part_number VARCHAR(100) NOT NULL UNIQUE,
            name VARCHAR(500) NOT NULL,
            kind VARCHAR(16) NOT NULL CHECK (kind IN ('leaf', 'composite')),
            direct_cost NUMERIC,
            rolled_up_cost NUMERIC,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CHECK (direct_cost IS NULL OR direct_cost >= 0),
            CHECK (kind = 'leaf' OR direct_cost IS NULL)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // BOM lines
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS component_edges (
            parent_id UUID NOT NULL REFERENCES products(id) ON DELETE RESTRICT,
            component_id UUID NOT NULL REFERENCES products(id) ON DELETE RESTRICT,
            quantity NUMERIC NOT NULL CHECK (quantity > 0),
            created_by VARCHAR NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_by VARCHAR NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (parent_id, component_id),
            CHECK (parent_id <> component_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Where-used lookups walk edges by component
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_component_edges_component_id ON component_edges(component_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_kind ON products(kind)")
        .execute(pool)
        .await?;

    tracing::info!("PostgreSQL migrations completed successfully");
    Ok(())
}

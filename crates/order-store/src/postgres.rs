use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{EntityId, NewOrder, OrderRecord, Result, StoreError, store::OrderStore};

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_record(row: PgRow) -> Result<OrderRecord> {
        Ok(OrderRecord {
            id: EntityId::new(row.try_get("id")?),
            datetime: row.try_get("datetime")?,
            state: row.try_get("state")?,
        })
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn save(&self, order: NewOrder) -> Result<OrderRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO orders (datetime, state)
            VALUES ($1, $2)
            RETURNING id, datetime, state
            "#,
        )
        .bind(order.datetime)
        .bind(&order.state)
        .fetch_one(&self.pool)
        .await?;

        let record = Self::row_to_record(row)?;
        tracing::debug!(order_id = %record.id, state = %record.state, "order saved");
        Ok(record)
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<OrderRecord>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, datetime, state
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn compare_and_set_state(
        &self,
        id: EntityId,
        expected: &str,
        new_state: &str,
    ) -> Result<OrderRecord> {
        let updated: Option<PgRow> = sqlx::query(
            r#"
            UPDATE orders
            SET state = $3
            WHERE id = $1 AND state = $2
            RETURNING id, datetime, state
            "#,
        )
        .bind(id.as_i64())
        .bind(expected)
        .bind(new_state)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = updated {
            return Self::row_to_record(row);
        }

        // Nothing matched: tell a missing row apart from a stale expectation
        match self.find_by_id(id).await? {
            Some(current) => Err(StoreError::Conflict {
                id,
                expected: expected.to_string(),
                actual: current.state,
            }),
            None => Err(StoreError::NotFound(id)),
        }
    }
}

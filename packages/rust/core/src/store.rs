//! Row-store interface. The concrete tabular-store adapter lives outside
//! this workspace; the pipeline only needs these two operations.

use async_trait::async_trait;

use orgsift_shared::{Result, Row};

/// Backing tabular store for organization rows.
///
/// `fetch_rows` returns rows in store order, each stamped with the
/// addressing key. `batch_update` persists a full row replacement; the
/// addressing key itself is never written back.
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn fetch_rows(&self) -> Result<Vec<Row>>;
    async fn batch_update(&self, rows: &[Row]) -> Result<()>;
}

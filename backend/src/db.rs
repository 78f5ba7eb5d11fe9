use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};

use crate::error::StoreError;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Builds the shared connection pool and runs a test query through it.
pub fn establish_pool(database_url: &str, max_size: u32) -> Result<PgPool, StoreError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(|e| {
            log::error!("Failed to establish database pool: {}", e);
            StoreError::Pool(e.to_string())
        })?;

    let mut conn = pool.get().map_err(|e| StoreError::Pool(e.to_string()))?;
    let check: i32 = diesel::select(diesel::dsl::sql::<diesel::sql_types::Integer>("1"))
        .get_result(&mut conn)?;
    log::info!("Database connection pool ready (select 1 = {})", check);

    Ok(pool)
}

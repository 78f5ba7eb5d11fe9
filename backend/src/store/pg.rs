use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{Array, Text};
use tokio::task;

use super::Store;
use crate::db::PgPool;
use crate::error::StoreError;
use crate::models::{Mesken, MeskenStatus, User};
use crate::schema::{meskens, users};

diesel::define_sql_function! {
    fn array_append(list: Array<Text>, item: Text) -> Array<Text>;
}

diesel::define_sql_function! {
    fn array_remove(list: Array<Text>, item: Text) -> Array<Text>;
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs a blocking diesel closure on the blocking thread pool.
    async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| StoreError::Pool(e.to_string()))?;
            f(&mut *conn)
        })
        .await
        .map_err(|e| StoreError::Internal(e.to_string()))?
    }
}

fn duplicate_or(err: DieselError, what: &str) -> StoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            StoreError::Duplicate(what.to_string())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            StoreError::NotFound
        }
        other => StoreError::Database(other),
    }
}

/// Conditional write on (`mesken_id`, `version`); bumps the version on success.
fn write_versioned(conn: &mut PgConnection, mesken: &Mesken) -> Result<Mesken, StoreError> {
    let mut next = mesken.clone();
    next.version = mesken.version + 1;

    let written = diesel::update(
        meskens::table
            .filter(meskens::mesken_id.eq(&mesken.mesken_id))
            .filter(meskens::version.eq(mesken.version)),
    )
    .set(&next)
    .returning(Mesken::as_returning())
    .get_result(conn)
    .optional()?;

    match written {
        Some(saved) => Ok(saved),
        None => {
            let actual = meskens::table
                .find(&mesken.mesken_id)
                .select(meskens::version)
                .first::<i64>(conn)
                .optional()?;
            match actual {
                Some(actual) => Err(StoreError::VersionConflict {
                    expected: mesken.version,
                    actual,
                }),
                None => Err(StoreError::NotFound),
            }
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn user_exists_by_tckn(&self, tckn: &str) -> Result<bool, StoreError> {
        let tckn = tckn.to_string();
        self.run(move |conn| {
            let exists = diesel::select(diesel::dsl::exists(users::table.find(&tckn)))
                .get_result::<bool>(conn)?;
            Ok(exists)
        })
        .await
    }

    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        self.run(move |conn| {
            diesel::insert_into(users::table)
                .values(&user)
                .returning(User::as_returning())
                .get_result(conn)
                .map_err(|e| duplicate_or(e, "User"))
        })
        .await
    }

    async fn find_user_by_tckn(&self, tckn: &str) -> Result<Option<User>, StoreError> {
        let tckn = tckn.to_string();
        self.run(move |conn| {
            let user = users::table
                .find(&tckn)
                .select(User::as_select())
                .first(conn)
                .optional()?;
            Ok(user)
        })
        .await
    }

    async fn find_user_by_address(&self, address: &str) -> Result<Option<User>, StoreError> {
        let address = address.to_string();
        self.run(move |conn| {
            let user = users::table
                .filter(users::public_address.eq(&address))
                .select(User::as_select())
                .first(conn)
                .optional()?;
            Ok(user)
        })
        .await
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.run(|conn| {
            let all = users::table
                .order_by(users::created_at.asc())
                .select(User::as_select())
                .load(conn)?;
            Ok(all)
        })
        .await
    }

    async fn set_public_address(&self, tckn: &str, address: &str) -> Result<bool, StoreError> {
        let tckn = tckn.to_string();
        let address = address.to_string();
        self.run(move |conn| {
            let updated = diesel::update(users::table.find(&tckn))
                .set(users::public_address.eq(&address))
                .execute(conn)
                .map_err(|e| duplicate_or(e, "Public address"))?;
            Ok(updated == 1)
        })
        .await
    }

    async fn set_nonce(&self, tckn: &str, expected: i64, nonce: i64) -> Result<bool, StoreError> {
        let tckn = tckn.to_string();
        self.run(move |conn| {
            let updated = diesel::update(
                users::table
                    .find(&tckn)
                    .filter(users::nonce.eq(expected)),
            )
            .set(users::nonce.eq(nonce))
            .execute(conn)?;
            Ok(updated == 1)
        })
        .await
    }

    async fn insert_mesken(&self, mesken: Mesken) -> Result<Mesken, StoreError> {
        self.run(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let created: Mesken = diesel::insert_into(meskens::table)
                    .values(&mesken)
                    .returning(Mesken::as_returning())
                    .get_result(conn)
                    .map_err(|e| duplicate_or(e, "Mesken"))?;

                let owners = diesel::update(users::table.find(&created.owner_tckn))
                    .set(users::meskens.eq(array_append(users::meskens, created.mesken_id.clone())))
                    .execute(conn)?;
                if owners != 1 {
                    return Err(StoreError::NotFound);
                }
                Ok(created)
            })
        })
        .await
    }

    async fn find_mesken(&self, mesken_id: &str) -> Result<Option<Mesken>, StoreError> {
        let mesken_id = mesken_id.to_string();
        self.run(move |conn| {
            let found = meskens::table
                .find(&mesken_id)
                .select(Mesken::as_select())
                .first(conn)
                .optional()?;
            Ok(found)
        })
        .await
    }

    async fn list_meskens_by_owner(&self, tckn: &str) -> Result<Vec<Mesken>, StoreError> {
        let tckn = tckn.to_string();
        self.run(move |conn| {
            let owned = meskens::table
                .filter(meskens::owner_tckn.eq(&tckn))
                .order_by(meskens::created_at.desc())
                .select(Mesken::as_select())
                .load(conn)?;
            Ok(owned)
        })
        .await
    }

    async fn list_meskens_on_sale(&self) -> Result<Vec<Mesken>, StoreError> {
        self.run(|conn| {
            let listed = meskens::table
                .filter(meskens::status.eq(MeskenStatus::OnSale.as_str()))
                .order_by(meskens::updated_at.desc())
                .select(Mesken::as_select())
                .load(conn)?;
            Ok(listed)
        })
        .await
    }

    async fn save_mesken(&self, mesken: Mesken) -> Result<Mesken, StoreError> {
        self.run(move |conn| write_versioned(conn, &mesken)).await
    }

    async fn transfer_mesken(&self, mesken: Mesken, seller: &str) -> Result<Mesken, StoreError> {
        let seller = seller.to_string();
        self.run(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let saved = write_versioned(conn, &mesken)?;

                diesel::update(users::table.find(&seller))
                    .set(users::meskens.eq(array_remove(users::meskens, saved.mesken_id.clone())))
                    .execute(conn)?;

                let buyers = diesel::update(users::table.find(&saved.owner_tckn))
                    .set(users::meskens.eq(array_append(users::meskens, saved.mesken_id.clone())))
                    .execute(conn)?;
                if buyers != 1 {
                    return Err(StoreError::NotFound);
                }
                Ok(saved)
            })
        })
        .await
    }
}

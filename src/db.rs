use futures::future::BoxFuture;
use uuid::Uuid;

use crate::errors::BackendError;
use crate::package::{Package, PackageExtra, State};

pub trait Db {
    fn create_package(&self, name: &str) -> BoxFuture<Result<Package, BackendError>>;

    fn retrieve_package(&self, id: &Uuid) -> BoxFuture<Result<Option<Package>, BackendError>>;

    /// Deletes a package and, in the same transaction, the extras it owns.
    fn delete_package(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>>;

    /// All extras for a package, ordered by (package_id, key).
    fn extras(&self, package_id: &Uuid) -> BoxFuture<Result<Vec<PackageExtra>, BackendError>>;

    fn extra(
        &self,
        package_id: &Uuid,
        key: &str,
    ) -> BoxFuture<Result<Option<PackageExtra>, BackendError>>;

    /// Updates the value stored under `key` or inserts a new row bound to
    /// the package.
    fn set_extra(
        &self,
        package_id: &Uuid,
        key: &str,
        value: &str,
    ) -> BoxFuture<Result<PackageExtra, BackendError>>;

    /// Physically removes the row stored under `key`.
    fn remove_extra(&self, package_id: &Uuid, key: &str) -> BoxFuture<Result<(), BackendError>>;

    /// Flips the lifecycle state of the row stored under `key`; the
    /// soft-deletion path.
    fn set_extra_state(
        &self,
        package_id: &Uuid,
        key: &str,
        state: State,
    ) -> BoxFuture<Result<(), BackendError>>;
}

pub use self::postgres::*;

mod postgres {
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use sqlx::{
        self,
        postgres::{PgPool, PgRow},
    };
    use uuid::Uuid;

    use crate::errors::BackendError;
    use crate::package::{Package, PackageExtra, State};

    const EXTRAS_PACKAGE_CONSTRAINT: &str = "package_extras_package_id_fkey";

    pub struct PgDb {
        pool: PgPool,
    }

    impl PgDb {
        pub fn new(pool: PgPool) -> Self {
            PgDb { pool }
        }
    }

    // these can be simplified once async functions in traits are stabilized
    impl super::Db for PgDb {
        fn create_package(&self, name: &str) -> BoxFuture<Result<Package, BackendError>> {
            let name = name.to_string();

            async move {
                let id = Uuid::new_v4();
                let query = sqlx::query_as(include_str!("queries/create_package.sql"));

                let (state,): (String,) = query
                    .bind(id)
                    .bind(&name)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(Package::new(id, name, State::parse(&state)?))
            }
            .boxed()
        }

        fn retrieve_package(
            &self,
            id: &Uuid,
        ) -> BoxFuture<Result<Option<Package>, BackendError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/retrieve_package.sql"));

                let package: Option<Package> = query
                    .bind(id)
                    .try_map(map_package_row)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(package)
            }
            .boxed()
        }

        fn delete_package(&self, id: &Uuid) -> BoxFuture<Result<(), BackendError>> {
            let id = *id;

            async move {
                let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

                sqlx::query(include_str!("queries/delete_package_extras.sql"))
                    .bind(id)
                    .execute(&mut tx)
                    .await
                    .map_err(map_sqlx_error)?;

                let count = sqlx::query(include_str!("queries/delete_package.sql"))
                    .bind(id)
                    .execute(&mut tx)
                    .await
                    .map_err(map_sqlx_error)?
                    .rows_affected();

                if count == 0 {
                    // dropping the transaction rolls the extras back
                    return Err(BackendError::NonExistentId(id));
                }

                tx.commit().await.map_err(map_sqlx_error)?;

                Ok(())
            }
            .boxed()
        }

        fn extras(
            &self,
            package_id: &Uuid,
        ) -> BoxFuture<Result<Vec<PackageExtra>, BackendError>> {
            let package_id = *package_id;

            async move {
                let query = sqlx::query(include_str!("queries/retrieve_extras.sql"));

                let extras: Vec<PackageExtra> = query
                    .bind(package_id)
                    .try_map(map_extra_row)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(extras)
            }
            .boxed()
        }

        fn extra(
            &self,
            package_id: &Uuid,
            key: &str,
        ) -> BoxFuture<Result<Option<PackageExtra>, BackendError>> {
            let package_id = *package_id;
            let key = key.to_string();

            async move { fetch_extra(&self.pool, &package_id, &key).await }.boxed()
        }

        fn set_extra(
            &self,
            package_id: &Uuid,
            key: &str,
            value: &str,
        ) -> BoxFuture<Result<PackageExtra, BackendError>> {
            let package_id = *package_id;
            let key = key.to_string();
            let value = value.to_string();

            async move {
                match fetch_extra(&self.pool, &package_id, &key).await? {
                    Some(existing) => {
                        sqlx::query(include_str!("queries/update_extra.sql"))
                            .bind(package_id)
                            .bind(&key)
                            .bind(&value)
                            .execute(&self.pool)
                            .await
                            .map_err(map_sqlx_error)?;

                        Ok(PackageExtra::from_parts(
                            *existing.id(),
                            package_id,
                            key,
                            value,
                            existing.state(),
                        ))
                    }
                    None => {
                        let extra = PackageExtra::new(package_id, key, value);

                        sqlx::query(include_str!("queries/create_extra.sql"))
                            .bind(extra.id())
                            .bind(extra.package_id())
                            .bind(extra.key())
                            .bind(extra.value())
                            .bind(extra.state().as_str())
                            .execute(&self.pool)
                            .await
                            .map_err(map_sqlx_error)?;

                        Ok(extra)
                    }
                }
            }
            .boxed()
        }

        fn remove_extra(
            &self,
            package_id: &Uuid,
            key: &str,
        ) -> BoxFuture<Result<(), BackendError>> {
            let package_id = *package_id;
            let key = key.to_string();

            async move {
                let count = sqlx::query(include_str!("queries/remove_extra.sql"))
                    .bind(package_id)
                    .bind(&key)
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?
                    .rows_affected();

                if count == 0 {
                    Err(BackendError::NonExistentExtra { package_id, key })
                } else {
                    Ok(())
                }
            }
            .boxed()
        }

        fn set_extra_state(
            &self,
            package_id: &Uuid,
            key: &str,
            state: State,
        ) -> BoxFuture<Result<(), BackendError>> {
            let package_id = *package_id;
            let key = key.to_string();

            async move {
                let count = sqlx::query(include_str!("queries/set_extra_state.sql"))
                    .bind(package_id)
                    .bind(&key)
                    .bind(state.as_str())
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?
                    .rows_affected();

                if count == 0 {
                    Err(BackendError::NonExistentExtra { package_id, key })
                } else {
                    Ok(())
                }
            }
            .boxed()
        }
    }

    async fn fetch_extra(
        pool: &PgPool,
        package_id: &Uuid,
        key: &str,
    ) -> Result<Option<PackageExtra>, BackendError> {
        let query = sqlx::query(include_str!("queries/retrieve_extra.sql"));

        let extra: Option<PackageExtra> = query
            .bind(package_id)
            .bind(key)
            .try_map(map_extra_row)
            .fetch_optional(pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(extra)
    }

    fn map_package_row(row: PgRow) -> Result<Package, sqlx::Error> {
        let id: Uuid = try_get(&row, "id")?;
        let name: String = try_get(&row, "name")?;
        let state: String = try_get(&row, "state")?;
        let state = State::parse(&state).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Package::new(id, name, state))
    }

    fn map_extra_row(row: PgRow) -> Result<PackageExtra, sqlx::Error> {
        let id: Uuid = try_get(&row, "id")?;
        let package_id: Uuid = try_get(&row, "package_id")?;
        let key: String = try_get(&row, "key")?;
        let value: String = try_get(&row, "value")?;
        let state: String = try_get(&row, "state")?;
        let state = State::parse(&state).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(PackageExtra::from_parts(id, package_id, key, value, state))
    }

    fn try_get<'a, T: sqlx::Type<sqlx::Postgres> + sqlx::decode::Decode<'a, sqlx::Postgres>>(
        row: &'a PgRow,
        column: &str,
    ) -> Result<T, sqlx::Error> {
        use sqlx::prelude::*;

        row.try_get(column)
    }

    fn map_sqlx_error(error: sqlx::Error) -> BackendError {
        use sqlx::Error;

        match error {
            Error::Database(ref e) if e.constraint() == Some(EXTRAS_PACKAGE_CONSTRAINT) => {
                BackendError::OwningPackageMissing
            }
            _ => BackendError::Sqlx { source: error },
        }
    }
}

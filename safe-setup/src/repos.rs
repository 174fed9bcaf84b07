#[cfg(feature = "postgres")]
mod postgres_repo;
mod repo;

#[cfg(feature = "postgres")]
pub use postgres_repo::{Conn as PostgresRepoConn, Pool as PostgresRepoPool, PostgresRepo};
pub use repo::{Migratable, Repo, RepoError, RepoMigrations, SQLikeMigrations};

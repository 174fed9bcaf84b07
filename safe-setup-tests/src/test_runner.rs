use std::env;
use std::future::Future;

use dotenvy::dotenv;
use safe_setup::{Migratable, PostgresRepo, RepoMigrations};

use crate::MemoryRepo;

pub async fn run_test<TestFn, Fut>(test_fn: TestFn)
where
    TestFn: FnOnce(MemoryRepo) -> Fut,
    Fut: Future<Output = ()>,
{
    test_fn(MemoryRepo::new()).await;
}

/// Runs against the database in `TEST_DATABASE_URL` and does nothing when it
/// is not set. Rows are never cleaned up, so tests must use keys of their own.
pub async fn run_postgres_test<TestFn, Fut>(test_fn: TestFn)
where
    TestFn: FnOnce(PostgresRepo) -> Fut,
    Fut: Future<Output = ()>,
{
    let Some(database_url) = database_url() else {
        return;
    };

    let repo = PostgresRepo::new(&database_url).await.unwrap();
    repo.migrate(PostgresRepo::get_internal_migrations()).await.unwrap();

    test_fn(repo).await;
}

fn database_url() -> Option<String> {
    dotenv().ok();

    env::var("TEST_DATABASE_URL").ok()
}

use crate::{PostgresRepo, RepoMigrations, SQLikeMigrations};

impl RepoMigrations for PostgresRepo {
    fn create_interval_schedules_migration() -> &'static [&'static str] {
        SQLikeMigrations::create_interval_schedules()
    }

    fn create_periodic_tasks_migration() -> &'static [&'static str] {
        SQLikeMigrations::create_periodic_tasks()
    }

    fn create_master_copies_migration() -> &'static [&'static str] {
        SQLikeMigrations::create_master_copies()
    }

    fn create_proxy_factories_migration() -> &'static [&'static str] {
        SQLikeMigrations::create_proxy_factories()
    }
}

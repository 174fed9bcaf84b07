#[cfg(test)]
mod upserts {
    use std::num::NonZeroU32;

    use safe_setup::{
        upserts, Address, ContractRegistryEntry, Period, Repo, ScheduleSpec,
        UnsavedIntervalSchedule, UnsavedMasterCopy, UnsavedPeriodicTask, UnsavedProxyFactory,
        Upserted, Upserts,
    };

    use crate::{test_runner, unique_suffix};

    fn unique_entry() -> ContractRegistryEntry {
        ContractRegistryEntry::new(Address::from_low_u64_be(unique_suffix()), 100)
    }

    fn unique_interval() -> NonZeroU32 {
        NonZeroU32::new((unique_suffix() % 2_000_000_000) as u32 + 1).unwrap()
    }

    #[tokio::test]
    pub async fn finds_interval_schedules_by_cadence() {
        test_runner::run_postgres_test(|repo| async move {
            let unsaved = UnsavedIntervalSchedule::new(unique_interval(), Period::Microseconds)
                .unwrap();

            let created = upserts::upsert(&repo, &unsaved).await.unwrap();
            let found = upserts::upsert(&repo, &unsaved).await.unwrap();

            assert!(matches!(created, Upserted::Created(_)));
            assert!(matches!(found, Upserted::AlreadyPresent(_)));
            assert_eq!(created.record().id, found.record().id);
        })
        .await;
    }

    #[tokio::test]
    pub async fn creates_one_record_when_racing_on_the_same_key() {
        test_runner::run_postgres_test(|repo| async move {
            let unsaved = UnsavedIntervalSchedule::new(unique_interval(), Period::Microseconds)
                .unwrap();

            let (left, right) =
                tokio::join!(repo.find_or_create(&unsaved), repo.find_or_create(&unsaved));
            let (left, left_created) = left.unwrap();
            let (right, right_created) = right.unwrap();

            assert_eq!(left.id, right.id);
            assert!(left_created ^ right_created);
        })
        .await;
    }

    #[tokio::test]
    pub async fn moves_periodic_tasks_to_their_new_interval() {
        test_runner::run_postgres_test(|repo| async move {
            let task_name = format!("tasks.test_{}", unique_suffix());
            let spec = ScheduleSpec::new(&task_name, "Test", unique_interval(), Period::Seconds);
            let moved_spec = ScheduleSpec {
                interval: unique_interval(),
                ..spec.clone()
            };

            let mut upserted = vec![];
            for spec in [&spec, &moved_spec] {
                let interval = UnsavedIntervalSchedule::new(spec.interval, spec.period).unwrap();
                let interval = upserts::upsert(&repo, &interval).await.unwrap().into_record();

                upserted.push(
                    upserts::upsert(&repo, &UnsavedPeriodicTask::new(spec, &interval))
                        .await
                        .unwrap(),
                );
            }
            assert!(matches!(upserted[0], Upserted::Created(_)));
            assert!(matches!(upserted[1], Upserted::Reconciled(_)));

            let periodic_task = repo
                .get_all_periodic_tasks()
                .await
                .unwrap()
                .into_iter()
                .find(|t| t.task == task_name)
                .unwrap();
            let interval = repo
                .get_all_interval_schedules()
                .await
                .unwrap()
                .into_iter()
                .find(|s| s.id == periodic_task.interval_id)
                .unwrap();

            assert_eq!(interval.every as u32, moved_spec.interval.get());
            assert_eq!(periodic_task.name, "Test");
        })
        .await;
    }

    #[tokio::test]
    pub async fn corrects_master_copy_versions() {
        test_runner::run_postgres_test(|repo| async move {
            let entry = unique_entry().with_version("1.0.0");
            let unsaved = UnsavedMasterCopy::new(&entry).unwrap();
            upserts::upsert(&repo, &unsaved).await.unwrap();

            let upserted = upserts::upsert(
                &repo,
                &UnsavedMasterCopy::new(&ContractRegistryEntry {
                    initial_block_number: 200,
                    ..entry.clone().with_version("1.2.0")
                })
                .unwrap(),
            )
            .await
            .unwrap();

            assert!(matches!(upserted, Upserted::Reconciled(_)));

            let master_copy = upserted.into_record();
            assert_eq!(master_copy.address, entry.get_checksummed_address());
            assert_eq!(master_copy.version.as_deref(), Some("1.2.0"));
            assert_eq!(master_copy.initial_block_number, 100);
            assert_eq!(master_copy.tx_block_number, 100);
        })
        .await;
    }

    #[tokio::test]
    pub async fn keeps_proxy_factories_as_created() {
        test_runner::run_postgres_test(|repo| async move {
            let entry = unique_entry();
            let unsaved = UnsavedProxyFactory::new(&entry).unwrap();
            upserts::upsert(&repo, &unsaved).await.unwrap();

            let upserted = upserts::upsert(
                &repo,
                &UnsavedProxyFactory::new(&ContractRegistryEntry {
                    initial_block_number: 200,
                    ..entry.clone().with_version("1.2.0")
                })
                .unwrap(),
            )
            .await
            .unwrap();

            assert!(matches!(upserted, Upserted::AlreadyPresent(_)));
            assert_eq!(upserted.record().initial_block_number, 100);
        })
        .await;
    }
}

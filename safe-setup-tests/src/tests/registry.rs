#[cfg(test)]
mod reconcile_registry {
    use safe_setup::{contracts, Outcome, RegistryKind, Repo, Step};

    use crate::factory::{
        checksummed, master_copy_entry, proxy_factory_entry, ANOTHER_MASTER_COPY_ADDRESS,
        MASTER_COPY_ADDRESS, OTHER_MASTER_COPY_ADDRESS, PROXY_FACTORY_ADDRESS,
    };
    use crate::test_runner;

    #[tokio::test]
    pub async fn starts_the_cursor_at_the_initial_block_number() {
        test_runner::run_test(|repo| async move {
            let entries = [master_copy_entry(MASTER_COPY_ADDRESS, 100, "1.1.1")];

            let report_entries =
                contracts::reconcile(&repo, RegistryKind::MasterCopy, &entries).await;

            assert_eq!(report_entries[0].step, Step::MasterCopy);
            assert_eq!(report_entries[0].subject, checksummed(MASTER_COPY_ADDRESS));
            assert_eq!(report_entries[0].outcome, Outcome::Created);

            let master_copies = repo.get_all_master_copies().await.unwrap();
            assert_eq!(master_copies.len(), 1);
            assert_eq!(master_copies[0].address, checksummed(MASTER_COPY_ADDRESS));
            assert_eq!(master_copies[0].initial_block_number, 100);
            assert_eq!(master_copies[0].tx_block_number, 100);
            assert_eq!(master_copies[0].version.as_deref(), Some("1.1.1"));
        })
        .await;
    }

    #[tokio::test]
    pub async fn stores_lowercase_catalog_addresses_checksummed() {
        test_runner::run_test(|repo| async move {
            let lowercase = PROXY_FACTORY_ADDRESS.to_lowercase();
            let entries = [proxy_factory_entry(&lowercase, 369855)];

            contracts::reconcile(&repo, RegistryKind::ProxyFactory, &entries).await;

            let proxy_factories = repo.get_all_proxy_factories().await.unwrap();
            assert_eq!(proxy_factories[0].address, checksummed(PROXY_FACTORY_ADDRESS));
        })
        .await;
    }

    #[tokio::test]
    pub async fn leaves_an_advanced_cursor_alone() {
        test_runner::run_test(|repo| async move {
            let entries = [master_copy_entry(MASTER_COPY_ADDRESS, 100, "1.1.1")];
            let address = checksummed(MASTER_COPY_ADDRESS);

            contracts::reconcile(&repo, RegistryKind::MasterCopy, &entries).await;
            repo.set_tx_block_number(&address, 500).await;

            let report_entries =
                contracts::reconcile(&repo, RegistryKind::MasterCopy, &entries).await;
            assert_eq!(report_entries[0].outcome, Outcome::AlreadyPresent);

            let master_copies = repo.get_all_master_copies().await.unwrap();
            assert_eq!(master_copies[0].initial_block_number, 100);
            assert_eq!(master_copies[0].tx_block_number, 500);
        })
        .await;
    }

    #[tokio::test]
    pub async fn corrects_only_the_version_of_master_copies() {
        test_runner::run_test(|repo| async move {
            let address = checksummed(MASTER_COPY_ADDRESS);

            contracts::reconcile(
                &repo,
                RegistryKind::MasterCopy,
                &[master_copy_entry(MASTER_COPY_ADDRESS, 100, "1.0.0")],
            )
            .await;
            repo.set_tx_block_number(&address, 500).await;

            let report_entries = contracts::reconcile(
                &repo,
                RegistryKind::MasterCopy,
                &[master_copy_entry(MASTER_COPY_ADDRESS, 200, "1.2.0")],
            )
            .await;
            assert_eq!(report_entries[0].outcome, Outcome::Reconciled);

            let master_copies = repo.get_all_master_copies().await.unwrap();
            assert_eq!(master_copies[0].version.as_deref(), Some("1.2.0"));
            assert_eq!(master_copies[0].initial_block_number, 100);
            assert_eq!(master_copies[0].tx_block_number, 500);
        })
        .await;
    }

    #[tokio::test]
    pub async fn never_updates_proxy_factories() {
        test_runner::run_test(|repo| async move {
            contracts::reconcile(
                &repo,
                RegistryKind::ProxyFactory,
                &[proxy_factory_entry(PROXY_FACTORY_ADDRESS, 100)],
            )
            .await;

            let report_entries = contracts::reconcile(
                &repo,
                RegistryKind::ProxyFactory,
                &[proxy_factory_entry(PROXY_FACTORY_ADDRESS, 200).with_version("1.2.0")],
            )
            .await;
            assert_eq!(report_entries[0].outcome, Outcome::AlreadyPresent);

            let proxy_factories = repo.get_all_proxy_factories().await.unwrap();
            assert_eq!(proxy_factories[0].initial_block_number, 100);
            assert_eq!(proxy_factories[0].tx_block_number, 100);
        })
        .await;
    }

    #[tokio::test]
    pub async fn fails_entries_whose_block_number_cannot_be_stored() {
        test_runner::run_test(|repo| async move {
            let entries = [
                proxy_factory_entry(PROXY_FACTORY_ADDRESS, u64::MAX),
                proxy_factory_entry(MASTER_COPY_ADDRESS, 100),
            ];

            let report_entries =
                contracts::reconcile(&repo, RegistryKind::ProxyFactory, &entries).await;

            assert!(report_entries[0].outcome.is_failure());
            assert!(report_entries[0].to_string().contains("too large to store"));
            assert_eq!(report_entries[1].outcome, Outcome::Created);

            let proxy_factories = repo.get_all_proxy_factories().await.unwrap();
            assert_eq!(proxy_factories.len(), 1);
            assert_eq!(proxy_factories[0].address, checksummed(MASTER_COPY_ADDRESS));
        })
        .await;
    }

    #[tokio::test]
    pub async fn keeps_going_after_a_failing_entry() {
        test_runner::run_test(|repo| async move {
            repo.fail_on(&checksummed(OTHER_MASTER_COPY_ADDRESS)).await;

            let entries = [
                master_copy_entry(MASTER_COPY_ADDRESS, 1, "1.1.1"),
                master_copy_entry(OTHER_MASTER_COPY_ADDRESS, 2, "1.1.1"),
                master_copy_entry(ANOTHER_MASTER_COPY_ADDRESS, 3, "1.3.0"),
            ];
            let report_entries =
                contracts::reconcile(&repo, RegistryKind::MasterCopy, &entries).await;

            assert_eq!(report_entries.len(), 3);
            assert_eq!(report_entries[0].outcome, Outcome::Created);
            assert!(report_entries[1].outcome.is_failure());
            assert_eq!(report_entries[1].subject, checksummed(OTHER_MASTER_COPY_ADDRESS));
            assert_eq!(report_entries[2].outcome, Outcome::Created);

            let addresses: Vec<_> = repo
                .get_all_master_copies()
                .await
                .unwrap()
                .into_iter()
                .map(|master_copy| master_copy.address)
                .collect();
            assert_eq!(addresses.len(), 2);
            assert!(!addresses.contains(&checksummed(OTHER_MASTER_COPY_ADDRESS)));
        })
        .await;
    }
}

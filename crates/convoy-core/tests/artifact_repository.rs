//! Registry and version-store contract, run against every backend.

use std::sync::Arc;

use rstest::rstest;

use convoy_core::config::RegistryConfig;
use convoy_core::domain::{
    ArtifactError, ArtifactType, DeliveryArtifact, DeliveryArtifactVersion, Provenance,
    VersionOrdering,
};
use convoy_core::impls::{InMemoryArtifactRepository, SqliteArtifactRepository};
use convoy_core::ports::{
    ArtifactRegistry, ArtifactRepository, ArtifactVersionStore, IdGenerator, SystemClock,
    UlidGenerator,
};

#[derive(Debug, Clone, Copy)]
enum Backend {
    InMemory,
    Sqlite,
}

fn repository(backend: Backend, ordering: VersionOrdering) -> Arc<dyn ArtifactRepository> {
    let ids: Arc<dyn IdGenerator> = Arc::new(UlidGenerator::new(SystemClock));
    match backend {
        Backend::InMemory => Arc::new(InMemoryArtifactRepository::new(ids, ordering)),
        Backend::Sqlite => {
            let mut config = RegistryConfig::default();
            config.versions.ordering = ordering;
            Arc::new(SqliteArtifactRepository::open(&config, ids).unwrap())
        }
    }
}

fn artifact(name: &str, artifact_type: ArtifactType) -> DeliveryArtifact {
    DeliveryArtifact::new(name, artifact_type).unwrap()
}

fn version(artifact: &DeliveryArtifact, label: &str, uri: &str) -> DeliveryArtifactVersion {
    DeliveryArtifactVersion::new(artifact.clone(), label, Provenance::parse(uri).unwrap())
}

fn labels(versions: &[DeliveryArtifactVersion]) -> Vec<&str> {
    versions.iter().map(|v| v.version.as_str()).collect()
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registration_has_one_winner(#[case] backend: Backend) {
    let repo = repository(backend, VersionOrdering::Natural);
    let svc = artifact("svc-a", ArtifactType::Docker);

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let repo = Arc::clone(&repo);
            let svc = svc.clone();
            tokio::spawn(async move { repo.register(&svc).await })
        })
        .collect();

    let mut created = 0;
    let mut already = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(ArtifactError::AlreadyRegistered(a)) => {
                assert_eq!(a, svc);
                already += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(already, 31);
    assert!(repo.is_registered("svc-a", ArtifactType::Docker).await.unwrap());
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test]
async fn type_is_part_of_identity(#[case] backend: Backend) {
    let repo = repository(backend, VersionOrdering::Natural);

    let deb = repo.register(&artifact("svc-a", ArtifactType::Deb)).await.unwrap();
    let docker = repo
        .register(&artifact("svc-a", ArtifactType::Docker))
        .await
        .unwrap();

    assert_ne!(deb, docker);
    assert!(!repo.is_registered("svc-a", ArtifactType::GitRepo).await.unwrap());
}

#[rstest]
#[case::in_memory(Backend::InMemory, "1", "https://ci/build/1")]
#[case::sqlite(Backend::Sqlite, "1", "https://ci/build/1")]
#[case::in_memory_odd_label(Backend::InMemory, "", "git://example.com/repo#deadbeef")]
#[case::sqlite_odd_label(Backend::Sqlite, "", "git://example.com/repo#deadbeef")]
#[tokio::test]
async fn store_requires_registration(
    #[case] backend: Backend,
    #[case] label: &str,
    #[case] uri: &str,
) {
    let repo = repository(backend, VersionOrdering::Natural);
    let ghost = artifact("ghost", ArtifactType::Deb);

    let err = repo.store(&version(&ghost, label, uri)).await.unwrap_err();

    assert!(matches!(err, ArtifactError::NoSuchArtifact(a) if a == ghost));
    assert!(!repo.is_registered("ghost", ArtifactType::Deb).await.unwrap());
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test]
async fn versions_of_unregistered_artifact_fail(#[case] backend: Backend) {
    let repo = repository(backend, VersionOrdering::Natural);

    let err = repo
        .versions(&artifact("ghost", ArtifactType::Docker))
        .await
        .unwrap_err();

    assert!(matches!(err, ArtifactError::NoSuchArtifact(_)));
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test]
async fn registered_artifact_without_versions_lists_nothing(#[case] backend: Backend) {
    let repo = repository(backend, VersionOrdering::Natural);
    let svc = artifact("svc-a", ArtifactType::Docker);
    repo.register(&svc).await.unwrap();

    assert!(repo.versions(&svc).await.unwrap().is_empty());
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test]
async fn storing_twice_is_idempotent(#[case] backend: Backend) {
    let repo = repository(backend, VersionOrdering::Natural);
    let svc = artifact("svc-a", ArtifactType::Docker);
    repo.register(&svc).await.unwrap();
    let v = version(&svc, "7", "https://ci/build/7");

    assert!(repo.store(&v).await.unwrap());
    let before = repo.versions(&svc).await.unwrap().len();
    assert!(!repo.store(&v).await.unwrap());
    let after = repo.versions(&svc).await.unwrap().len();

    assert_eq!(before, 1);
    assert_eq!(after, 1);
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_store_of_one_version_creates_one_row(#[case] backend: Backend) {
    let repo = repository(backend, VersionOrdering::Natural);
    let svc = artifact("svc-a", ArtifactType::Docker);
    repo.register(&svc).await.unwrap();
    let v = version(&svc, "3", "https://ci/build/3");

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let repo = Arc::clone(&repo);
            let v = v.clone();
            tokio::spawn(async move { repo.store(&v).await })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(repo.versions(&svc).await.unwrap(), vec![v]);
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test]
async fn versions_come_back_newest_first(#[case] backend: Backend) {
    let repo = repository(backend, VersionOrdering::Natural);
    let svc = artifact("svc-a", ArtifactType::Docker);
    repo.register(&svc).await.unwrap();

    assert!(repo.store(&version(&svc, "10", "https://ci/build/10")).await.unwrap());
    assert!(repo.store(&version(&svc, "9", "https://ci/build/9")).await.unwrap());

    let versions = repo.versions(&svc).await.unwrap();
    assert_eq!(
        versions,
        vec![
            version(&svc, "10", "https://ci/build/10"),
            version(&svc, "9", "https://ci/build/9"),
        ]
    );
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test]
async fn lexical_ordering_compares_raw_strings(#[case] backend: Backend) {
    let repo = repository(backend, VersionOrdering::Lexical);
    let svc = artifact("svc-a", ArtifactType::Docker);
    repo.register(&svc).await.unwrap();

    for label in ["10", "9", "1.10.0", "1.9.3"] {
        repo.store(&version(&svc, label, "https://ci/build")).await.unwrap();
    }

    let versions = repo.versions(&svc).await.unwrap();
    assert_eq!(labels(&versions), ["9", "10", "1.9.3", "1.10.0"]);
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test]
async fn versions_are_scoped_to_their_artifact(#[case] backend: Backend) {
    let repo = repository(backend, VersionOrdering::Natural);
    let deb = artifact("svc-a", ArtifactType::Deb);
    let docker = artifact("svc-a", ArtifactType::Docker);
    repo.register(&deb).await.unwrap();
    repo.register(&docker).await.unwrap();

    repo.store(&version(&deb, "1", "https://ci/deb/1")).await.unwrap();
    repo.store(&version(&docker, "2", "https://ci/docker/2")).await.unwrap();

    assert_eq!(labels(&repo.versions(&deb).await.unwrap()), ["1"]);
    assert_eq!(labels(&repo.versions(&docker).await.unwrap()), ["2"]);
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test]
async fn payments_walkthrough(#[case] backend: Backend) {
    let repo = repository(backend, VersionOrdering::Natural);
    let payments = artifact("payments", ArtifactType::Deb);

    repo.register(&payments).await.unwrap();
    assert!(matches!(
        repo.register(&payments).await,
        Err(ArtifactError::AlreadyRegistered(_))
    ));

    let release = version(&payments, "1.2.0", "https://ci/build/42");
    assert!(repo.store(&release).await.unwrap());
    assert!(!repo.store(&release).await.unwrap());

    assert_eq!(repo.versions(&payments).await.unwrap(), vec![release]);
}

//! Behaviour tests for the release store lifecycle.
//!
//! Scenarios drive the ingestion service against a real JSON-lines store in a
//! temporary data directory and check what survives a reload.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use backend::domain::filter::ReleasePredicate;
use backend::domain::ports::{FindOptions, IngestReleaseRequest, ReleaseCommand, ReleaseRepository};
use backend::domain::{
    Architecture, ArchitectureSet, ContentDigest, Environment, Error, ErrorCode, OperatingSystem,
    Release, ReleaseIngestionService, ReleaseMetadata, ReleaseType, RepositoryLayout,
};
use backend::outbound::persistence::JsonLinesReleaseStore;
use bytes::Bytes;
use futures::StreamExt;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use tempfile::TempDir;
use tokio::runtime::Runtime;

/// Wrapper for non-Clone types to enable storage in `Slot`.
#[derive(Clone)]
struct RuntimeHandle(Arc<Runtime>);

#[derive(Clone)]
struct DataDir(Arc<TempDir>);

#[derive(Default, ScenarioState)]
struct ReleaseStoreWorld {
    runtime: Slot<RuntimeHandle>,
    data_dir: Slot<DataDir>,
    store: Slot<Arc<JsonLinesReleaseStore>>,
    skip_load: Slot<bool>,
    payload: Slot<Vec<u8>>,
    outcome: Slot<Result<Release, Error>>,
}

impl ReleaseStoreWorld {
    fn runtime(&self) -> Arc<Runtime> {
        self.runtime.get().expect("runtime").0
    }

    fn dir(&self) -> Arc<TempDir> {
        self.data_dir.get().expect("data directory").0
    }

    /// Open a fresh store handle over the data directory, loading it unless
    /// the scenario asked otherwise.
    fn open_store(&self) -> Arc<JsonLinesReleaseStore> {
        let store = Arc::new(JsonLinesReleaseStore::in_data_dir(self.dir().path()));
        if !self.skip_load.get().unwrap_or(false) {
            self.runtime()
                .block_on(store.load())
                .expect("store loads");
        }
        self.store.set(store.clone());
        store
    }

    fn store(&self) -> Arc<JsonLinesReleaseStore> {
        self.store.get().unwrap_or_else(|| self.open_store())
    }

    fn ingest(&self, environment: Environment, release_type: ReleaseType) {
        let payload = b"PK\x03\x04".repeat(256);
        let chunks: Vec<std::io::Result<Bytes>> = payload
            .chunks(100)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        let service = ReleaseIngestionService::new(
            self.store(),
            RepositoryLayout::new(self.dir().path()),
            ArchitectureSet::default(),
            Arc::new(mockable::DefaultClock),
        );
        let request = IngestReleaseRequest {
            environment,
            release_type,
            metadata: ReleaseMetadata::default(),
            file_name: "app.zip".to_owned(),
            declared_size: Some(u64::try_from(payload.len()).expect("payload size")),
            body: futures::stream::iter(chunks).boxed(),
        };
        let outcome = self.runtime().block_on(service.ingest(request));
        self.payload.set(payload);
        self.outcome.set(outcome);
    }

    fn stored_release(&self) -> Release {
        self.outcome
            .get()
            .expect("ingestion attempted")
            .expect("ingestion succeeded")
    }

    fn rejection(&self) -> Error {
        self.outcome
            .get()
            .expect("ingestion attempted")
            .expect_err("ingestion rejected")
    }
}

fn count_files(dir: &Path) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .map(|entry| entry.expect("directory entry").path())
        .map(|path| if path.is_dir() { count_files(&path) } else { 1 })
        .sum()
}

#[fixture]
fn world() -> ReleaseStoreWorld {
    ReleaseStoreWorld::default()
}

// -----------------------------------------------------------------------------
// Given Steps
// -----------------------------------------------------------------------------

#[given("an empty data directory")]
fn an_empty_data_directory(world: &ReleaseStoreWorld) {
    world
        .runtime
        .set(RuntimeHandle(Arc::new(Runtime::new().expect("create runtime"))));
    world
        .data_dir
        .set(DataDir(Arc::new(TempDir::new().expect("temp dir"))));
}

#[given("the store has not been loaded")]
fn the_store_has_not_been_loaded(world: &ReleaseStoreWorld) {
    world.skip_load.set(true);
}

// -----------------------------------------------------------------------------
// When Steps
// -----------------------------------------------------------------------------

#[when("a {os} {architecture} {kind} release is ingested")]
fn a_release_is_ingested(world: &ReleaseStoreWorld, os: String, architecture: String, kind: String) {
    let environment = Environment {
        operating_system: os.parse::<OperatingSystem>().expect("operating system"),
        architecture: architecture.parse::<Architecture>().expect("architecture"),
    };
    world.ingest(environment, kind.parse::<ReleaseType>().expect("release type"));
}

#[given("a {os} {architecture} {kind} release is ingested")]
fn a_release_was_ingested(
    world: &ReleaseStoreWorld,
    os: String,
    architecture: String,
    kind: String,
) {
    a_release_is_ingested(world, os, architecture, kind);
    world.stored_release();
}

#[when("the store is reloaded")]
fn the_store_is_reloaded(world: &ReleaseStoreWorld) {
    world.open_store();
}

#[when("the data file gains a torn final line")]
fn the_data_file_gains_a_torn_final_line(world: &ReleaseStoreWorld) {
    let path = world.store().path().to_path_buf();
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .expect("open data file");
    file.write_all(br#"{"_id":"00112233445566778899aabbccddeeff","date":"2024-"#)
        .expect("append torn line");
}

// -----------------------------------------------------------------------------
// Then Steps
// -----------------------------------------------------------------------------

#[then("the release can be fetched by id")]
fn the_release_can_be_fetched_by_id(world: &ReleaseStoreWorld) {
    let expected = world.stored_release();
    let found = world
        .runtime()
        .block_on(world.store().find_by_id(expected.id()))
        .expect("lookup succeeds");
    assert_eq!(found, Some(expected));
}

#[then("the stored artifact hashes to the recorded digest")]
fn the_stored_artifact_hashes_to_the_recorded_digest(world: &ReleaseStoreWorld) {
    let release = world.stored_release();
    let path = RepositoryLayout::new(world.dir().path()).resolve(release.id(), release.date());
    let bytes = fs::read(path).expect("artifact on disk");
    assert_eq!(bytes, world.payload.get().expect("payload"));
    assert_eq!(&ContentDigest::of(&bytes), release.sha1());
}

#[then("the ingestion is rejected as invalid")]
fn the_ingestion_is_rejected_as_invalid(world: &ReleaseStoreWorld) {
    assert_eq!(world.rejection().code(), ErrorCode::InvalidRequest);
}

#[then("the ingestion reports the store as unavailable")]
fn the_ingestion_reports_the_store_as_unavailable(world: &ReleaseStoreWorld) {
    assert_eq!(world.rejection().code(), ErrorCode::ServiceUnavailable);
}

#[then("the store holds {count} releases")]
fn the_store_holds_releases(world: &ReleaseStoreWorld, count: usize) {
    let releases = world
        .runtime()
        .block_on(
            world
                .store()
                .find(&ReleasePredicate::all(), FindOptions::default()),
        )
        .expect("listing succeeds");
    assert_eq!(releases.len(), count);
}

#[then("the repository holds {count} files")]
fn the_repository_holds_files(world: &ReleaseStoreWorld, count: usize) {
    let root = RepositoryLayout::new(world.dir().path());
    assert_eq!(count_files(root.repository_root()), count);
}

// -----------------------------------------------------------------------------
// Scenario Bindings
// -----------------------------------------------------------------------------

#[scenario(
    path = "tests/features/release_store.feature",
    name = "Ingested releases survive a restart"
)]
fn ingested_releases_survive_a_restart(world: ReleaseStoreWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release_store.feature",
    name = "Disallowed architectures leave no trace"
)]
fn disallowed_architectures_leave_no_trace(world: ReleaseStoreWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release_store.feature",
    name = "A torn final line is discarded on load"
)]
fn a_torn_final_line_is_discarded_on_load(world: ReleaseStoreWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release_store.feature",
    name = "An unloaded store refuses work"
)]
fn an_unloaded_store_refuses_work(world: ReleaseStoreWorld) {
    let _ = world;
}

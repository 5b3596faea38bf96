//! Bucket fixtures shared by the integration tests.

use std::sync::Arc;

use bytes::Bytes;
use object_store::ObjectStore;
use object_store::memory::InMemory;
use object_store::path::Path;

use logkeeper::{
    Build, BuildInfo, Chunk, Config, LogKeeper, LogLine, LogLineIterator, Test, TestInfo,
    Timestamp, build_metadata_path, chunk_path, encode_lines, test_metadata_path,
};

pub const BUILD_ID: &str = "5a75f537726934e4b62833ab6d5dca41";
pub const FIRST_TEST_ID: &str = "62dba0159041307f697e6ccc";
pub const SECOND_TEST_ID: &str = "72dba0159041307f697e6ccd";

pub fn build() -> Build {
    Build {
        id: BUILD_ID.to_string(),
        builder: "MCI_enterprise-rhel_job0".to_string(),
        build_num: 157865445,
        info: BuildInfo {
            task_id: "mongodb_mongo_master_enterprise_f98b3361fbab4e02683325cc0e6ebaa69d6af1df_22_07_22_11_24_37".to_string(),
        },
    }
}

pub fn test(id: &str, name: &str, phase: &str, command: &str, start: Timestamp) -> Test {
    Test {
        id: id.to_string(),
        build_id: BUILD_ID.to_string(),
        name: name.to_string(),
        info: TestInfo {
            task_id: "Task".to_string(),
        },
        phase: phase.to_string(),
        command: command.to_string(),
        start,
    }
}

pub async fn put_json<T: serde::Serialize>(store: &dyn ObjectStore, path: Path, value: &T) {
    let data = Bytes::from(serde_json::to_vec(value).unwrap());
    store.put(&path, data.into()).await.unwrap();
}

pub async fn put_build(store: &dyn ObjectStore, build: &Build) {
    put_json(store, build_metadata_path(&build.id), build).await;
}

pub async fn put_test(store: &dyn ObjectStore, test: &Test) {
    put_json(store, test_metadata_path(&test.build_id, &test.id), test).await;
}

/// Stores one chunk of a stream, named after its first and last keys.
pub async fn put_chunk(
    store: &dyn ObjectStore,
    build_id: &str,
    test_id: Option<&str>,
    lines: &[(Timestamp, &str)],
) -> Chunk {
    let lines: Vec<LogLine> = lines.iter().map(|(t, d)| LogLine::new(*t, *d)).collect();
    put_raw_chunk(store, build_id, test_id, &lines, encode_lines(&lines).unwrap()).await
}

/// Stores `blob` under the chunk name derived from `lines`.
pub async fn put_raw_chunk(
    store: &dyn ObjectStore,
    build_id: &str,
    test_id: Option<&str>,
    lines: &[LogLine],
    blob: Bytes,
) -> Chunk {
    let chunk = Chunk {
        build_id: build_id.to_string(),
        test_id: test_id.map(str::to_string),
        start: lines.iter().map(|l| l.timestamp).min().unwrap(),
        end: lines.iter().map(|l| l.timestamp).max().unwrap(),
        num_lines: lines.len() as u64,
    };
    store.put(&chunk_path(&chunk), blob.into()).await.unwrap();
    chunk
}

pub fn keeper(store: Arc<dyn ObjectStore>) -> LogKeeper {
    LogKeeper::new(store, Config::default())
}

pub async fn collect(mut lines: LogLineIterator) -> Vec<LogLine> {
    let mut out = Vec::new();
    while let Some(line) = lines.next().await.unwrap() {
        out.push(line);
    }
    out
}

pub async fn collect_data(lines: LogLineIterator) -> Vec<String> {
    collect(lines).await.into_iter().map(|l| l.data).collect()
}

/// One test starting at 1000, global lines before, during and after it.
pub async fn seed_simple(store: &dyn ObjectStore) {
    put_build(store, &build()).await;
    put_test(
        store,
        &test(FIRST_TEST_ID, "geo_max:CheckReplOplogs", "phase0", "command0", 1000),
    )
    .await;

    put_chunk(
        store,
        BUILD_ID,
        Some(FIRST_TEST_ID),
        &[
            (1000, "First Test Log Line"),
            (1001, r#"[js_test:geo_max:CheckReplOplogs] New session started with sessionID: {  "id" : UUID("4983fd5c-898a-4435-8523-2aef47ce91f3") } and options: {  "causalConsistency" : false }"#),
            (1003, "[js_test:geo_max:CheckReplOplogs] Recreating replica set from config {"),
            (1004, r#"[js_test:geo_max:CheckReplOplogs] \t"_id" : "rs","#),
        ],
    )
    .await;
    put_chunk(
        store,
        BUILD_ID,
        Some(FIRST_TEST_ID),
        &[
            (1005, r#"[js_test:geo_max:CheckReplOplogs] \t"version" : 5,"#),
            (1006, r#"[js_test:geo_max:CheckReplOplogs] \t"term" : 3,"#),
            (1007, r#"[js_test:geo_max:CheckReplOplogs] \t"members" : ["#),
            (1008, r#"[js_test:geo_max:CheckReplOplogs] \t\t{"#),
            (1009, r#"[js_test:geo_max:CheckReplOplogs] \t\t\t"_id" : 0,"#),
            (1010, r#"[js_test:geo_max:CheckReplOplogs] \t\t\t"host" : "localhost:20000","#),
            (1011, "Last Test Log Line"),
        ],
    )
    .await;

    put_chunk(
        store,
        BUILD_ID,
        None,
        &[(900, "I am a global log before the test started.")],
    )
    .await;
    put_chunk(
        store,
        BUILD_ID,
        None,
        &[
            (1002, "I am a global log within the test start/stop ranges."),
            (1013, r#"[j0:n1] {"t":{"$date":"2022-07-23T07:15:35.740+00:00"},"s":"D2", "c":"REPL_HB",  "id":4615618, "ctx":"ReplCoord-9","msg":"Scheduling heartbeat","attr":{"target":"localhost:20000","when":{"$date":"2022-07-23T07:15:37.740Z"}}}"#),
        ],
    )
    .await;
}

/// Two tests starting at 400 and 600, each with two chunks.
pub async fn seed_between(store: &dyn ObjectStore) {
    put_build(store, &build()).await;
    put_test(
        store,
        &test(SECOND_TEST_ID, "geo_max:CheckReplOplogs2", "phase1", "command1", 600),
    )
    .await;
    put_test(
        store,
        &test(FIRST_TEST_ID, "geo_max:CheckReplOplogs", "phase0", "command0", 400),
    )
    .await;

    put_chunk(store, BUILD_ID, Some(FIRST_TEST_ID), &[(401, "Test Log401")]).await;
    put_chunk(store, BUILD_ID, Some(FIRST_TEST_ID), &[(402, "Test Log402")]).await;
    put_chunk(store, BUILD_ID, Some(SECOND_TEST_ID), &[(601, "Test Log601")]).await;
    put_chunk(store, BUILD_ID, Some(SECOND_TEST_ID), &[(602, "Test Log602")]).await;

    put_chunk(store, BUILD_ID, None, &[(300, "Log300"), (350, "Log350")]).await;
    put_chunk(store, BUILD_ID, None, &[(501, "Log501"), (502, "Log502")]).await;
    put_chunk(store, BUILD_ID, None, &[(650, "Log650"), (700, "Log700")]).await;
}

/// One test starting at 400 whose chunks overlap the global chunks, with
/// several lines sharing a timestamp across the two streams.
pub async fn seed_overlapping(store: &dyn ObjectStore) {
    put_build(store, &build()).await;
    put_test(
        store,
        &test(FIRST_TEST_ID, "geo_max:CheckReplOplogs", "phase0", "command0", 400),
    )
    .await;

    put_chunk(
        store,
        BUILD_ID,
        Some(FIRST_TEST_ID),
        &[
            (400, "Test Log400"),
            (420, "Test Log420"),
            (440, "Test Log440"),
            (460, "Test Log460"),
            (480, "Test Log480"),
        ],
    )
    .await;
    put_chunk(
        store,
        BUILD_ID,
        Some(FIRST_TEST_ID),
        &[
            (500, "Test Log500"),
            (520, "Test Log520"),
            (540, "Test Log540"),
            (560, "Test Log560"),
            (600, "Test Log600"),
            (601, "Test Log601"),
        ],
    )
    .await;
    put_chunk(
        store,
        BUILD_ID,
        Some(FIRST_TEST_ID),
        &[
            (620, "Test Log620"),
            (640, "Test Log640"),
            (660, "Test Log660"),
            (680, "Test Log680"),
            (700, "Test Log700"),
            (720, "Test Log720"),
            (740, "Test Log740"),
            (760, "Test Log760"),
            (800, "Test Log800"),
        ],
    )
    .await;

    put_chunk(
        store,
        BUILD_ID,
        None,
        &[
            (300, "Log300"),
            (320, "Log320"),
            (340, "Log340"),
            (360, "Log360"),
            (380, "Log380"),
        ],
    )
    .await;
    put_chunk(
        store,
        BUILD_ID,
        None,
        &[
            (400, "Log400"),
            (420, "Log420"),
            (440, "Log440"),
            (460, "Log460"),
        ],
    )
    .await;
    put_chunk(
        store,
        BUILD_ID,
        None,
        &[
            (495, "Log500"),
            (501, "Log501"),
            (520, "Log520"),
            (540, "Log540"),
            (560, "Log560"),
            (580, "Log580"),
        ],
    )
    .await;
    put_chunk(
        store,
        BUILD_ID,
        None,
        &[
            (810, "Log810"),
            (820, "Log820"),
            (840, "Log840"),
            (860, "Log860"),
            (900, "Log900"),
        ],
    )
    .await;
}

pub fn memory_store() -> Arc<dyn ObjectStore> {
    Arc::new(InMemory::new())
}

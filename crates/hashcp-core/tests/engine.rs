//! End-to-end engine tests: copy runs, verification, cancellation.
//!
//! Each test builds a source tree in a tempdir, runs the engine against it,
//! and asserts on the destination bytes, the manifest, and the event stream.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use hashcp_core::checksum;
use hashcp_core::control::CancelToken;
use hashcp_core::engine::{self, CopyOptions, ProgressEvent, ProgressFn, VerifyOptions};
use hashcp_core::manifest::{self, EmptyManifest, MANIFEST_NAME};
use tempfile::tempdir;

const HELLO_SHA1: &str = "f572d396fae9206628714fb2ce00f72e94f2258f";
const BIN_SHA1: &str = "a02a05b025b928c039cf1ae7e8ee04e7c190c0db";

fn write_list(dir: &Path, entries: &[&str]) -> PathBuf {
    let list = dir.join("input.txt");
    fs::write(&list, entries.join("\n")).unwrap();
    list
}

fn event_collector() -> (Arc<Mutex<Vec<ProgressEvent>>>, ProgressFn) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let f: ProgressFn = Box::new(move |event| sink.lock().unwrap().push(event));
    (events, f)
}

/// Mirror of the engine's destination mapping, for expectations.
fn mirrored(source: &Path, dest_root: &Path) -> PathBuf {
    let rel = source.strip_prefix("/").unwrap_or(source);
    dest_root.join(rel)
}

#[tokio::test]
async fn basic_copy_writes_file_and_manifest() {
    let src_dir = tempdir().unwrap();
    let dest_dir = tempdir().unwrap();
    let source = src_dir.path().join("a.txt");
    fs::write(&source, b"hello\n").unwrap();
    let list = write_list(src_dir.path(), &[&source.display().to_string()]);

    let summary = engine::copy_from_list(&list, dest_dir.path(), CopyOptions::default())
        .await
        .expect("copy run");

    assert_eq!(summary.total, 1);
    assert_eq!(summary.copied, 1);
    assert_eq!(summary.errored, 0);
    assert!(!summary.cancelled);

    let dest = mirrored(&source, dest_dir.path());
    assert_eq!(fs::read(&dest).unwrap(), b"hello\n");

    let manifest_text =
        fs::read_to_string(dest_dir.path().join(MANIFEST_NAME)).unwrap();
    assert_eq!(
        manifest_text,
        format!("{}  {}\n", HELLO_SHA1, dest.display())
    );
}

#[tokio::test]
async fn directories_and_blank_lines_are_filtered() {
    let src_dir = tempdir().unwrap();
    let dest_dir = tempdir().unwrap();
    let sub = src_dir.path().join("x");
    fs::create_dir(&sub).unwrap();
    let binary = src_dir.path().join("b.bin");
    fs::write(&binary, [0u8, 1, 2, 3]).unwrap();
    let list = write_list(
        src_dir.path(),
        &[&sub.display().to_string(), "", &binary.display().to_string()],
    );

    let (events, sink) = event_collector();
    let opts = CopyOptions {
        on_progress: Some(sink),
        ..Default::default()
    };
    let summary = engine::copy_from_list(&list, dest_dir.path(), opts)
        .await
        .expect("copy run");

    assert_eq!(summary.total, 1, "directory and blank line never enqueue");
    assert_eq!(summary.copied, 1);

    let events = events.lock().unwrap();
    let done_count = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::FileDone { .. }))
        .count();
    assert_eq!(done_count, 1);

    let entries = manifest::parse_manifest(&summary.manifest_path).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].digest_hex, BIN_SHA1);
    assert_eq!(entries[0].path, mirrored(&binary, dest_dir.path()));
}

#[tokio::test]
async fn absolute_paths_mirror_under_destination() {
    let src_dir = tempdir().unwrap();
    let dest_dir = tempdir().unwrap();
    let nested = src_dir.path().join("src");
    fs::create_dir_all(&nested).unwrap();
    let source = nested.join("c.dat");
    fs::write(&source, b"payload").unwrap();
    assert!(source.is_absolute());
    let list = write_list(src_dir.path(), &[&source.display().to_string()]);

    let summary = engine::copy_from_list(&list, dest_dir.path(), CopyOptions::default())
        .await
        .expect("copy run");
    assert_eq!(summary.copied, 1);

    let dest = mirrored(&source, dest_dir.path());
    assert!(dest.starts_with(dest_dir.path()), "leading / is stripped");
    assert_eq!(fs::read(&dest).unwrap(), b"payload");
}

#[tokio::test]
async fn copy_then_verify_round_trip() {
    let src_dir = tempdir().unwrap();
    let dest_dir = tempdir().unwrap();
    let mut listed = Vec::new();
    for (name, content) in [("a.txt", &b"hello\n"[..]), ("b.bin", &[0u8, 1, 2, 3][..])] {
        let path = src_dir.path().join(name);
        fs::write(&path, content).unwrap();
        listed.push(path.display().to_string());
    }
    let nested = src_dir.path().join("deep/dir");
    fs::create_dir_all(&nested).unwrap();
    let third = nested.join("c.dat");
    fs::write(&third, b"three").unwrap();
    listed.push(third.display().to_string());

    let refs: Vec<&str> = listed.iter().map(String::as_str).collect();
    let list = write_list(src_dir.path(), &refs);

    let summary = engine::copy_from_list(&list, dest_dir.path(), CopyOptions::default())
        .await
        .expect("copy run");
    assert_eq!(summary.copied, 3);

    let verify = engine::verify_from_manifest(&summary.manifest_path, VerifyOptions::default())
        .await
        .expect("verify run");
    assert_eq!(verify.total, 3);
    assert_eq!(verify.ok, 3);
    assert_eq!(verify.mismatched, 0);
    assert_eq!(verify.errors, 0);
}

#[tokio::test]
async fn manifest_matches_independent_hashes_and_has_no_duplicates() {
    let src_dir = tempdir().unwrap();
    let dest_dir = tempdir().unwrap();
    let mut listed = Vec::new();
    for i in 0..8u8 {
        let path = src_dir.path().join(format!("f{}.bin", i));
        fs::write(&path, vec![i; 1024]).unwrap();
        listed.push(path.display().to_string());
    }
    let refs: Vec<&str> = listed.iter().map(String::as_str).collect();
    let list = write_list(src_dir.path(), &refs);

    let summary = engine::copy_from_list(&list, dest_dir.path(), CopyOptions::default())
        .await
        .expect("copy run");
    assert_eq!(summary.copied, 8);

    let entries = manifest::parse_manifest(&summary.manifest_path).unwrap();
    assert_eq!(entries.len(), 8);

    let mut seen = std::collections::HashSet::new();
    for entry in &entries {
        assert!(seen.insert(entry.path.clone()), "no entry appears twice");
        assert_eq!(
            checksum::sha1_path(&entry.path).unwrap(),
            entry.digest_hex,
            "manifest digest matches independent re-hash of {}",
            entry.path.display()
        );
    }
}

#[tokio::test]
async fn manifest_lines_are_sha1sum_shaped() {
    let src_dir = tempdir().unwrap();
    let dest_dir = tempdir().unwrap();
    let source = src_dir.path().join("a.txt");
    fs::write(&source, b"hello\n").unwrap();
    let list = write_list(src_dir.path(), &[&source.display().to_string()]);

    let summary = engine::copy_from_list(&list, dest_dir.path(), CopyOptions::default())
        .await
        .expect("copy run");

    let text = fs::read_to_string(&summary.manifest_path).unwrap();
    assert!(text.ends_with('\n'));
    for line in text.lines() {
        let (digest, rest) = line.split_at(40);
        assert_eq!(digest.len(), 40);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert!(rest.starts_with("  "), "exactly two ASCII spaces");
        assert!(!rest[2..].is_empty());
    }
}

#[tokio::test]
async fn mismatch_is_detected_and_listed() {
    let src_dir = tempdir().unwrap();
    let dest_dir = tempdir().unwrap();
    let binary = src_dir.path().join("b.bin");
    fs::write(&binary, [0u8, 1, 2, 3]).unwrap();
    let list = write_list(src_dir.path(), &[&binary.display().to_string()]);

    let summary = engine::copy_from_list(&list, dest_dir.path(), CopyOptions::default())
        .await
        .expect("copy run");
    let dest = mirrored(&binary, dest_dir.path());
    fs::write(&dest, [0u8, 1, 2, 4]).unwrap();

    let verify = engine::verify_from_manifest(&summary.manifest_path, VerifyOptions::default())
        .await
        .expect("verify run");
    assert_eq!(verify.total, 1);
    assert_eq!(verify.ok, 0);
    assert_eq!(verify.mismatched, 1);
    assert_eq!(verify.errors, 0);
    assert_eq!(verify.mismatched_paths, vec![dest]);
}

#[tokio::test]
async fn missing_target_counts_as_error() {
    let dir = tempdir().unwrap();
    let gone = dir.path().join("gone.txt");
    let manifest_path = dir.path().join(MANIFEST_NAME);
    fs::write(
        &manifest_path,
        format!("{}  {}\n", HELLO_SHA1, gone.display()),
    )
    .unwrap();

    let verify = engine::verify_from_manifest(&manifest_path, VerifyOptions::default())
        .await
        .expect("verify run");
    assert_eq!(verify.total, 1);
    assert_eq!(verify.ok, 0);
    assert_eq!(verify.mismatched, 0);
    assert_eq!(verify.errors, 1);
    assert_eq!(verify.error_paths, vec![gone]);
}

#[tokio::test]
async fn empty_manifest_is_an_input_error() {
    let dir = tempdir().unwrap();
    let manifest_path = dir.path().join(MANIFEST_NAME);
    fs::write(&manifest_path, "junk\n\nonefield\n").unwrap();

    let err = engine::verify_from_manifest(&manifest_path, VerifyOptions::default())
        .await
        .unwrap_err();
    assert!(err.downcast_ref::<EmptyManifest>().is_some());
}

#[tokio::test]
async fn uppercase_expected_digest_still_matches() {
    let src_dir = tempdir().unwrap();
    let dest_dir = tempdir().unwrap();
    let source = src_dir.path().join("a.txt");
    fs::write(&source, b"hello\n").unwrap();
    let list = write_list(src_dir.path(), &[&source.display().to_string()]);

    engine::copy_from_list(&list, dest_dir.path(), CopyOptions::default())
        .await
        .expect("copy run");

    let dest = mirrored(&source, dest_dir.path());
    let manifest_path = dest_dir.path().join(MANIFEST_NAME);
    fs::write(
        &manifest_path,
        format!("{}  {}\n", HELLO_SHA1.to_uppercase(), dest.display()),
    )
    .unwrap();

    let verify = engine::verify_from_manifest(&manifest_path, VerifyOptions::default())
        .await
        .expect("verify run");
    assert_eq!(verify.ok, 1);
    assert_eq!(verify.mismatched, 0);
}

#[tokio::test]
async fn per_file_errors_do_not_abort_the_run() {
    let src_dir = tempdir().unwrap();
    let dest_dir = tempdir().unwrap();
    let good = src_dir.path().join("good.txt");
    fs::write(&good, b"hello\n").unwrap();
    let missing = src_dir.path().join("missing.txt");
    let list = write_list(
        src_dir.path(),
        &[
            &missing.display().to_string(),
            &good.display().to_string(),
        ],
    );

    let (events, sink) = event_collector();
    let opts = CopyOptions {
        worker_count: Some(2),
        save_lists: true,
        on_progress: Some(sink),
        ..Default::default()
    };
    let summary = engine::copy_from_list(&list, dest_dir.path(), opts)
        .await
        .expect("copy run");

    assert_eq!(summary.total, 2);
    assert_eq!(summary.copied, 1);
    assert_eq!(summary.errored, 1);
    assert_eq!(summary.errored_sources, vec![missing.clone()]);

    // An errored task still gets its FileDone.
    let events = events.lock().unwrap();
    let done_count = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::FileDone { .. }))
        .count();
    assert_eq!(done_count, 2);

    let entries = manifest::parse_manifest(&summary.manifest_path).unwrap();
    assert_eq!(entries.len(), 1, "failed copies append no manifest line");

    let copied_txt = fs::read_to_string(dest_dir.path().join("copied.txt")).unwrap();
    assert_eq!(
        copied_txt,
        format!("{}\n", mirrored(&good, dest_dir.path()).display())
    );
    let errored_txt = fs::read_to_string(dest_dir.path().join("errored.txt")).unwrap();
    assert_eq!(errored_txt, format!("{}\n", missing.display()));
}

#[tokio::test]
async fn save_lists_creates_empty_files_when_nothing_matches() {
    let src_dir = tempdir().unwrap();
    let dest_dir = tempdir().unwrap();
    let list = write_list(src_dir.path(), &[]);

    let opts = CopyOptions {
        save_lists: true,
        ..Default::default()
    };
    let summary = engine::copy_from_list(&list, dest_dir.path(), opts)
        .await
        .expect("copy run");
    assert_eq!(summary.total, 0);

    assert_eq!(
        fs::read_to_string(dest_dir.path().join("copied.txt")).unwrap(),
        ""
    );
    assert_eq!(
        fs::read_to_string(dest_dir.path().join("errored.txt")).unwrap(),
        ""
    );
}

#[tokio::test]
async fn event_counters_are_exact_and_monotonic() {
    let src_dir = tempdir().unwrap();
    let dest_dir = tempdir().unwrap();
    let mut listed = Vec::new();
    for i in 0..5u8 {
        let path = src_dir.path().join(format!("f{}", i));
        fs::write(&path, vec![i; 256]).unwrap();
        listed.push(path.display().to_string());
    }
    let refs: Vec<&str> = listed.iter().map(String::as_str).collect();
    let list = write_list(src_dir.path(), &refs);

    let (events, sink) = event_collector();
    let opts = CopyOptions {
        worker_count: Some(3),
        on_progress: Some(sink),
        ..Default::default()
    };
    engine::copy_from_list(&list, dest_dir.path(), opts)
        .await
        .expect("copy run");

    let events = events.lock().unwrap();
    assert_eq!(
        events.first(),
        Some(&ProgressEvent::Overall {
            completed_files: 0,
            total_files: 5
        })
    );

    let mut done_count = 0;
    let mut last_completed = 0;
    for event in events.iter() {
        let completed = match event {
            ProgressEvent::FileDone {
                completed_files, ..
            } => {
                done_count += 1;
                *completed_files
            }
            ProgressEvent::Overall {
                completed_files, ..
            } => *completed_files,
            ProgressEvent::FileProgress { .. } => continue,
        };
        assert!(completed >= last_completed, "counters never regress");
        last_completed = completed;
    }
    assert_eq!(done_count, 5, "exactly one FileDone per task");
    assert_eq!(last_completed, 5);
}

#[tokio::test]
async fn cancel_before_dispatch_emits_only_initial_overall() {
    let src_dir = tempdir().unwrap();
    let dest_dir = tempdir().unwrap();
    let source = src_dir.path().join("a.txt");
    fs::write(&source, b"hello\n").unwrap();
    let list = write_list(src_dir.path(), &[&source.display().to_string()]);

    let cancel = CancelToken::new();
    cancel.cancel();
    let (events, sink) = event_collector();
    let opts = CopyOptions {
        on_progress: Some(sink),
        cancel: Some(cancel),
        ..Default::default()
    };
    let summary = engine::copy_from_list(&list, dest_dir.path(), opts)
        .await
        .expect("cancelled run still returns a summary");

    assert!(summary.cancelled);
    assert_eq!(summary.copied, 0);
    assert_eq!(
        *events.lock().unwrap(),
        vec![ProgressEvent::Overall {
            completed_files: 0,
            total_files: 1
        }]
    );
    assert_eq!(
        fs::read_to_string(&summary.manifest_path).unwrap(),
        "",
        "no manifest lines are written"
    );
    assert!(!mirrored(&source, dest_dir.path()).exists());
}

#[tokio::test]
async fn cancel_mid_run_aborts_in_flight_and_skips_queued_tasks() {
    let src_dir = tempdir().unwrap();
    let dest_dir = tempdir().unwrap();
    // Dispatched first; large enough that it is still streaming when the
    // cancel lands.
    let huge = src_dir.path().join("huge.bin");
    fs::write(&huge, vec![0xABu8; 32 * 1024 * 1024]).unwrap();
    let tiny = src_dir.path().join("tiny.txt");
    fs::write(&tiny, b"hello\n").unwrap();
    let queued = src_dir.path().join("queued.txt");
    fs::write(&queued, b"never dispatched").unwrap();
    let list = write_list(
        src_dir.path(),
        &[
            &huge.display().to_string(),
            &tiny.display().to_string(),
            &queued.display().to_string(),
        ],
    );

    // Trip the token from the event sink the moment the tiny file completes;
    // the huge copy is mid-stream at that point and the third task is still
    // queued.
    let cancel = CancelToken::new();
    let trip = cancel.clone();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let on_progress: ProgressFn = Box::new(move |event| {
        if matches!(event, ProgressEvent::FileDone { .. }) {
            trip.cancel();
        }
        sink.lock().unwrap().push(event);
    });

    let opts = CopyOptions {
        worker_count: Some(2),
        on_progress: Some(on_progress),
        cancel: Some(cancel),
        ..Default::default()
    };
    let summary = engine::copy_from_list(&list, dest_dir.path(), opts)
        .await
        .expect("cancelled run still returns a partial summary");

    assert!(summary.cancelled);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.copied, 1, "only the finished file is recorded");
    assert_eq!(summary.errored, 0, "an aborted stream is not an error");

    let events = events.lock().unwrap();
    let done_paths: Vec<PathBuf> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::FileDone { path, .. } => Some(path.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        done_paths,
        vec![tiny.clone()],
        "aborted and never-dispatched tasks get no FileDone"
    );

    let entries = manifest::parse_manifest(&summary.manifest_path).unwrap();
    assert_eq!(entries.len(), 1, "the aborted copy appends no manifest line");
    assert_eq!(entries[0].path, mirrored(&tiny, dest_dir.path()));

    // The aborted copy leaves its partial destination in place; the queued
    // task never started.
    assert!(mirrored(&huge, dest_dir.path()).exists());
    assert!(!mirrored(&queued, dest_dir.path()).exists());
}

#[tokio::test]
async fn empty_list_emits_initial_overall_and_returns() {
    let src_dir = tempdir().unwrap();
    let dest_dir = tempdir().unwrap();
    let list = write_list(src_dir.path(), &[]);

    let (events, sink) = event_collector();
    let opts = CopyOptions {
        on_progress: Some(sink),
        ..Default::default()
    };
    let summary = engine::copy_from_list(&list, dest_dir.path(), opts)
        .await
        .expect("empty run");

    assert_eq!(summary.total, 0);
    assert_eq!(
        *events.lock().unwrap(),
        vec![ProgressEvent::Overall {
            completed_files: 0,
            total_files: 0
        }]
    );
}

#[tokio::test]
async fn rerun_replaces_stale_manifest() {
    let src_dir = tempdir().unwrap();
    let dest_dir = tempdir().unwrap();
    let source = src_dir.path().join("a.txt");
    fs::write(&source, b"hello\n").unwrap();
    let list = write_list(src_dir.path(), &[&source.display().to_string()]);

    engine::copy_from_list(&list, dest_dir.path(), CopyOptions::default())
        .await
        .expect("first run");
    let summary = engine::copy_from_list(&list, dest_dir.path(), CopyOptions::default())
        .await
        .expect("second run");

    let entries = manifest::parse_manifest(&summary.manifest_path).unwrap();
    assert_eq!(entries.len(), 1, "second run does not append to the first");
}

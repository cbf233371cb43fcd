// End-to-end engine tests against a local git repository.

use std::path::Path;
use std::process::Command;

use tinyci::{Engine, EngineConfig, EngineError, JobStatus, RunStatus, Trigger, TriggerKind};

fn git(args: &[&str], dir: &Path) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to invoke git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Create a local repository on branch `main` containing the given
/// pipeline definition, committed by "Test Dev".
fn scaffold_origin(dir: &Path, ci_yaml: &str) {
    git(&["init", "-b", "main"], dir);
    std::fs::write(dir.join(".ci.yaml"), ci_yaml).unwrap();
    git(&["add", ".ci.yaml"], dir);
    git(
        &[
            "-c",
            "user.name=Test Dev",
            "-c",
            "user.email=dev@example.com",
            "commit",
            "-m",
            "add pipeline",
        ],
        dir,
    );
}

fn trigger_for(origin: &Path, git_ref: &str) -> Trigger {
    Trigger {
        clone_url: origin.to_string_lossy().to_string(),
        git_ref: git_ref.to_string(),
        commit_sha: None,
        repo_full_name: "local/sample".to_string(),
        branch: "main".to_string(),
        triggered_by: "test".to_string(),
        kind: TriggerKind::Webhook,
    }
}

#[tokio::test]
async fn test_successful_run_end_to_end() {
    let origin = tempfile::tempdir().unwrap();
    scaffold_origin(
        origin.path(),
        r#"
name: greenfield
on: [push]
jobs:
  build:
    steps:
      - name: Produce artifact
        run: echo artifact > artifact.txt
  verify:
    needs: [build]
    steps:
      - name: Inspect artifact
        run: grep artifact artifact.txt
"#,
    );

    let root = tempfile::tempdir().unwrap();
    let engine = Engine::new(EngineConfig::rooted_at(root.path()));

    let record = engine
        .run(trigger_for(origin.path(), "refs/heads/main"))
        .await
        .unwrap();

    assert_eq!(record.status, RunStatus::Success);
    assert_eq!(record.results.len(), 2);
    assert_eq!(record.results["build"].status, JobStatus::Success);
    assert_eq!(record.results["verify"].status, JobStatus::Success);
    assert_eq!(record.commit_author, "Test Dev");
    assert_eq!(record.commit_message, "add pipeline");
    assert_eq!(record.branch, "main");
    assert_ne!(record.commit_sha, "unknown");

    // The record is durable and round-trips by id
    let loaded = engine.run_store().get_run(&record.id).unwrap();
    assert_eq!(loaded, record);
}

#[tokio::test]
async fn test_failing_job_skips_dependents_and_fails_run() {
    let origin = tempfile::tempdir().unwrap();
    scaffold_origin(
        origin.path(),
        r#"
name: redfield
jobs:
  build:
    steps:
      - name: Break
        run: "false"
  deploy:
    needs: [build]
    steps:
      - name: Should never run
        run: touch deployed.txt
  docs:
    steps:
      - name: Independent
        run: "true"
"#,
    );

    let root = tempfile::tempdir().unwrap();
    let engine = Engine::new(EngineConfig::rooted_at(root.path()));

    let record = engine
        .run(trigger_for(origin.path(), "refs/heads/main"))
        .await
        .unwrap();

    assert_eq!(record.status, RunStatus::Failure);
    assert_eq!(record.results["build"].status, JobStatus::Failure);
    assert_eq!(record.results["deploy"].status, JobStatus::Skipped);
    assert!(record.results["deploy"].steps.is_empty());
    assert_eq!(record.results["docs"].status, JobStatus::Success);
    assert!(!root.path().join("temp_repo/deployed.txt").exists());
}

#[tokio::test]
async fn test_unresolvable_ref_falls_back_to_default_branch() {
    let origin = tempfile::tempdir().unwrap();
    scaffold_origin(
        origin.path(),
        r#"
name: fallback
jobs:
  only:
    steps:
      - name: Noop
        run: "true"
"#,
    );

    let root = tempfile::tempdir().unwrap();
    let engine = Engine::new(EngineConfig::rooted_at(root.path()));

    // "weird-ref" resolves to no branch; acquisition proceeds on main
    let record = engine
        .run(trigger_for(origin.path(), "weird-ref"))
        .await
        .unwrap();

    assert_eq!(record.status, RunStatus::Success);
    assert_eq!(record.branch, "main");
    assert!(root.path().join("temp_repo/.ci.yaml").exists());
}

#[tokio::test]
async fn test_tag_ref_performs_no_clone() {
    let origin = tempfile::tempdir().unwrap();
    scaffold_origin(
        origin.path(),
        "name: tagged\njobs: {}\n",
    );

    let root = tempfile::tempdir().unwrap();
    let engine = Engine::new(EngineConfig::rooted_at(root.path()));

    let err = engine
        .run(trigger_for(origin.path(), "refs/tags/v1.0"))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::UnsupportedRefKind { .. }));
    assert!(!root.path().join("temp_repo").exists());
}

#[tokio::test]
async fn test_specific_commit_is_checked_out() {
    let origin = tempfile::tempdir().unwrap();
    scaffold_origin(
        origin.path(),
        r#"
name: pinned
jobs:
  stamp:
    steps:
      - name: Record marker
        run: cat marker.txt
"#,
    );

    // First commit carries marker "one"; second switches it to "two"
    std::fs::write(origin.path().join("marker.txt"), "one\n").unwrap();
    git(&["add", "marker.txt"], origin.path());
    git(
        &[
            "-c",
            "user.name=Test Dev",
            "-c",
            "user.email=dev@example.com",
            "commit",
            "-m",
            "marker one",
        ],
        origin.path(),
    );
    let pinned = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(origin.path())
        .output()
        .unwrap();
    let pinned_sha = String::from_utf8_lossy(&pinned.stdout).trim().to_string();

    std::fs::write(origin.path().join("marker.txt"), "two\n").unwrap();
    git(&["add", "marker.txt"], origin.path());
    git(
        &[
            "-c",
            "user.name=Test Dev",
            "-c",
            "user.email=dev@example.com",
            "commit",
            "-m",
            "marker two",
        ],
        origin.path(),
    );

    let root = tempfile::tempdir().unwrap();
    let engine = Engine::new(EngineConfig::rooted_at(root.path()));

    let mut trigger = trigger_for(origin.path(), "refs/heads/main");
    trigger.commit_sha = Some(pinned_sha.clone());

    let record = engine.run(trigger).await.unwrap();
    assert_eq!(record.commit_sha, pinned_sha);
    assert_eq!(record.commit_message, "marker one");
    assert!(record.results["stamp"].steps[0].logs.contains("one"));
}

#[tokio::test]
async fn test_clone_failure_surfaces_stderr() {
    let root = tempfile::tempdir().unwrap();
    let engine = Engine::new(EngineConfig::rooted_at(root.path()));

    let missing = root.path().join("no_such_repo");
    let err = engine
        .run(trigger_for(&missing, "refs/heads/main"))
        .await
        .unwrap_err();

    match err {
        EngineError::CloneFailed { stderr } => assert!(!stderr.is_empty()),
        other => panic!("expected CloneFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_recent_runs_are_listed_newest_first() {
    let origin = tempfile::tempdir().unwrap();
    scaffold_origin(
        origin.path(),
        r#"
name: listing
jobs:
  only:
    steps:
      - name: Noop
        run: "true"
"#,
    );

    let root = tempfile::tempdir().unwrap();
    let engine = Engine::new(EngineConfig::rooted_at(root.path()));

    let mut ids = Vec::new();
    for _ in 0..3 {
        let record = engine
            .run(trigger_for(origin.path(), "refs/heads/main"))
            .await
            .unwrap();
        ids.push(record.id);
    }

    let recent = engine.run_store().list_recent_runs(2).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].id, ids[2]);
    assert_eq!(recent[1].id, ids[1]);
}

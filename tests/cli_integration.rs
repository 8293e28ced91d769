//! Integration tests for the gitmeta binary surface.
//!
//! These drive the compiled binary with assert_cmd against real temp
//! repositories: exit codes, the `<ErrorKind>: <message>` stderr line,
//! and the set/get/setvalue/getvalue round trips.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Test fixture that creates a real git repository.
struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");

        run_git(dir.path(), &["init"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);

        std::fs::write(dir.path().join("README.md"), "# Test Repo\n").unwrap();
        run_git(dir.path(), &["add", "README.md"]);
        run_git(dir.path(), &["commit", "-m", "Initial commit"]);

        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn commit_file(&self, path: &str, content: &str, message: &str) -> String {
        let full = self.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, content).unwrap();
        run_git(self.path(), &["add", path]);
        run_git(self.path(), &["commit", "-m", message]);
        self.head()
    }

    fn head(&self) -> String {
        let output = std::process::Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(self.path())
            .output()
            .expect("git rev-parse failed");
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }

    /// A gitmeta command running inside this repository.
    fn gitmeta(&self) -> Command {
        let mut cmd = Command::cargo_bin("gitmeta").expect("binary builds");
        cmd.current_dir(self.path());
        cmd
    }
}

fn run_git(dir: &Path, args: &[&str]) {
    let output = std::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

// =============================================================================
// set / get
// =============================================================================

#[test]
fn set_then_get_round_trips() {
    let repo = TestRepo::new();
    let d1 = repo.commit_file("docs/a.txt", "content", "add docs/a.txt");

    std::fs::write(repo.path().join("payload.json"), r#"{"author":"X"}"#).unwrap();

    repo.gitmeta()
        .args([
            "set",
            &format!("s-{}:docs/a.txt:meta", d1),
            "payload.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("saved to stream 'meta'"));

    repo.gitmeta()
        .args(["get", &format!("s-{}:docs/a.txt:meta", d1)])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"author":"X"}"#));
}

#[test]
fn set_reads_payload_from_stdin() {
    let repo = TestRepo::new();
    let d1 = repo.commit_file("a.txt", "content", "add a.txt");

    repo.gitmeta()
        .args(["set", &format!("s-{}:a.txt", d1), "-"])
        .write_stdin("from stdin")
        .assert()
        .success();

    repo.gitmeta()
        .args(["get", &format!("s-{}:a.txt", d1)])
        .assert()
        .success()
        .stdout(predicate::str::contains("from stdin"));
}

#[test]
fn get_json_pretty_prints_and_rejects_non_json() {
    let repo = TestRepo::new();
    let d1 = repo.commit_file("a.txt", "content", "add a.txt");

    std::fs::write(repo.path().join("payload"), "not json at all").unwrap();
    repo.gitmeta()
        .args(["set", &format!("s-{}:a.txt", d1), "payload"])
        .assert()
        .success();

    repo.gitmeta()
        .args(["get", "--json", &format!("s-{}:a.txt", d1)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("MetadataFormatError:"));

    repo.gitmeta()
        .args(["get", "--dump", &format!("s-{}:a.txt", d1)])
        .assert()
        .success()
        .stdout(predicate::str::contains("not json at all"));
}

#[test]
fn get_missing_metadata_reports_blob_not_found() {
    let repo = TestRepo::new();
    let d1 = repo.commit_file("a.txt", "content", "add a.txt");

    // Seed the ref so the failure is about the blob, not the reference.
    std::fs::write(repo.path().join("payload"), "x").unwrap();
    repo.gitmeta()
        .args(["set", &format!("s-{}:README.md", d1), "payload"])
        .assert()
        .success();

    repo.gitmeta()
        .args(["get", &format!("s-{}:a.txt:nosuchstream", d1)])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("MetadataBlobNotFound:"));
}

// =============================================================================
// setvalue / getvalue
// =============================================================================

#[test]
fn setvalue_then_getvalue_with_filter() {
    let repo = TestRepo::new();
    let d1 = repo.commit_file("origin.pdf", "pdf bytes", "add origin.pdf");

    repo.gitmeta()
        .args([
            "setvalue",
            &format!("s-{}:origin.pdf", d1),
            "author=Charles Darwin",
        ])
        .assert()
        .success();

    repo.gitmeta()
        .args([
            "setvalue",
            &format!("s-{}:origin.pdf", d1),
            "title=On the Origin of Species",
        ])
        .assert()
        .success();

    repo.gitmeta()
        .args(["getvalue", &format!("s-{}:origin.pdf", d1)])
        .assert()
        .success()
        .stdout(predicate::str::contains("author"))
        .stdout(predicate::str::contains("Charles Darwin"))
        .stdout(predicate::str::contains("title"));

    repo.gitmeta()
        .args([
            "getvalue",
            &format!("s-{}:origin.pdf", d1),
            "--key",
            "author",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Charles Darwin"))
        .stdout(predicate::str::contains("title").not());
}

#[test]
fn setvalue_rejects_malformed_pair() {
    let repo = TestRepo::new();
    let d1 = repo.commit_file("a.txt", "content", "add a.txt");

    repo.gitmeta()
        .args(["setvalue", &format!("s-{}:a.txt", d1), "no-equals-sign"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ParameterError:"));
}

#[test]
fn setvalue_on_dirty_file_without_revision_is_invalid() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", "committed", "add a.txt");
    std::fs::write(repo.path().join("a.txt"), "modified").unwrap();

    repo.gitmeta()
        .args(["setvalue", "s-:a.txt:meta", "key=value"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("MetadataInvalid:"));
}

// =============================================================================
// copy / list / log / ls
// =============================================================================

#[test]
fn copy_then_get_from_destination() {
    let repo = TestRepo::new();
    let d1 = repo.commit_file("pathA.txt", "A", "add pathA");

    std::fs::write(repo.path().join("payload"), "shared").unwrap();
    repo.gitmeta()
        .args(["set", &format!("s-{}:pathA.txt:streamA", d1), "payload"])
        .assert()
        .success();

    repo.gitmeta()
        .args([
            "copy",
            &format!("s-{}:pathA.txt:streamA", d1),
            &format!("s-{}:pathA.txt:streamB", d1),
        ])
        .assert()
        .success();

    repo.gitmeta()
        .args(["get", &format!("s-{}:pathA.txt:streamB", d1)])
        .assert()
        .success()
        .stdout(predicate::str::contains("shared"));
}

#[test]
fn list_renders_both_tables() {
    let repo = TestRepo::new();
    let d1 = repo.commit_file("a.txt", "v", "add a.txt");

    std::fs::write(repo.path().join("payload"), "m").unwrap();
    repo.gitmeta()
        .args(["set", &format!("s-{}:a.txt:meta", d1), "payload"])
        .assert()
        .success();

    repo.gitmeta()
        .args(["list", &format!("{}:a.txt:meta", d1)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Data commit ID containing metadata"))
        .stdout(predicate::str::contains(d1.as_str()))
        .stdout(predicate::str::contains("other versions of metadata"));
}

#[test]
fn log_marks_annotated_commits() {
    let repo = TestRepo::new();
    let d1 = repo.commit_file("a.txt", "v1", "add a.txt");
    repo.commit_file("a.txt", "v2", "change a.txt");

    std::fs::write(repo.path().join("payload"), "m").unwrap();
    repo.gitmeta()
        .args(["set", &format!("s-{}:a.txt:meta", d1), "payload"])
        .assert()
        .success();

    repo.gitmeta()
        .args(["log", "HEAD:a.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("M {}", d1)))
        .stdout(predicate::str::contains("* stream: meta"));
}

#[test]
fn ls_lists_annotated_paths() {
    let repo = TestRepo::new();
    let d1 = repo.commit_file("docs/a.txt", "v", "add docs/a.txt");

    std::fs::write(repo.path().join("payload"), "m").unwrap();
    repo.gitmeta()
        .args(["set", &format!("s-{}:docs/a.txt:meta", d1), "payload"])
        .assert()
        .success();

    repo.gitmeta()
        .args(["ls"])
        .assert()
        .success()
        .stdout(predicate::str::contains("docs/a.txt"))
        .stdout(predicate::str::contains("[meta]"));
}

// =============================================================================
// Global Flags
// =============================================================================

#[test]
fn bare_metadataref_is_qualified_to_refs_heads() {
    let repo = TestRepo::new();
    let d1 = repo.commit_file("a.txt", "v", "add a.txt");

    std::fs::write(repo.path().join("payload"), "m").unwrap();
    repo.gitmeta()
        .args([
            "-m",
            "annotations",
            "set",
            &format!("s-{}:a.txt:meta", d1),
            "payload",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("refs/heads/annotations"));

    let output = Command::new("git")
        .args(["rev-parse", "--verify", "refs/heads/annotations"])
        .current_dir(repo.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    // The default ref was never created.
    let output = Command::new("git")
        .args(["rev-parse", "--verify", "refs/heads/metadata"])
        .current_dir(repo.path())
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn verbose_failure_prints_a_trace_instead_of_the_short_form() {
    let repo = TestRepo::new();

    repo.gitmeta()
        .args(["get", "nonsense:too:many:colons"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ParameterError:"));

    repo.gitmeta()
        .args(["-v", "get", "nonsense:too:many:colons"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ParameterError:").not())
        .stderr(predicate::str::contains("could not parse"));
}

#[test]
fn missing_search_prefix_is_a_parameter_error() {
    let repo = TestRepo::new();
    let d1 = repo.commit_file("a.txt", "v", "add a.txt");

    repo.gitmeta()
        .args(["get", &format!("{}:a.txt:meta", d1)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ParameterError:"))
        .stderr(predicate::str::contains("s+"));
}

#[test]
fn outside_a_repository_reports_repository_not_found() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("payload"), "m").unwrap();

    let mut cmd = Command::cargo_bin("gitmeta").unwrap();
    cmd.current_dir(dir.path())
        .args(["set", "s-HEAD:payload", "payload"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("RepositoryNotFound:"));
}

mod common;

use common::{git_hash_object, git_repack, setup_bare_repo, vcsr};

#[test]
fn type_flag_reports_blob() {
    let (dir, repo) = setup_bare_repo();
    let oid = git_hash_object(dir.path(), b"hello\n");

    let result = vcsr(&repo, &["cat-file", "-t", &oid]);
    assert_eq!(result.exit_code, 0, "stderr: {}", result.stderr);
    assert_eq!(result.stdout.trim(), "blob");
}

#[test]
fn size_flag_reports_byte_count() {
    let (dir, repo) = setup_bare_repo();
    let content = b"hello, world\n";
    let oid = git_hash_object(dir.path(), content);

    let result = vcsr(&repo, &["cat-file", "-s", &oid]);
    assert_eq!(result.exit_code, 0, "stderr: {}", result.stderr);
    assert_eq!(result.stdout.trim(), content.len().to_string());
}

#[test]
fn pretty_flag_prints_blob_content() {
    let (dir, repo) = setup_bare_repo();
    let content = b"pretty print me\n";
    let oid = git_hash_object(dir.path(), content);

    let result = vcsr(&repo, &["cat-file", "-p", &oid]);
    assert_eq!(result.exit_code, 0, "stderr: {}", result.stderr);
    assert_eq!(result.stdout.as_bytes(), content);
}

#[test]
fn reads_object_after_repack() {
    let (dir, repo) = setup_bare_repo();
    let content = b"packed before read\n";
    let oid = git_hash_object(dir.path(), content);
    git_repack(dir.path());

    let result = vcsr(&repo, &["cat-file", "-p", &oid]);
    assert_eq!(result.exit_code, 0, "stderr: {}", result.stderr);
    assert_eq!(result.stdout.as_bytes(), content);
}

#[test]
fn missing_object_fails() {
    let (_dir, repo) = setup_bare_repo();
    let result = vcsr(&repo, &["cat-file", "-t", "0000000000000000000000000000000000000000"]);
    assert_ne!(result.exit_code, 0);
}

#[test]
fn typed_form_rejects_mismatched_type() {
    let (dir, repo) = setup_bare_repo();
    let oid = git_hash_object(dir.path(), b"a blob\n");

    let result = vcsr(&repo, &["cat-file", "tree", &oid]);
    assert_ne!(result.exit_code, 0);
    assert!(result.stderr.contains("expected"), "stderr: {}", result.stderr);
}

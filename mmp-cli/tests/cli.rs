use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("mmp-babel")
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// `mmp` running inside `dir`, away from any `.mmp.toml` of the source tree.
fn mmp_in(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("mmp");
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("MOZILLA_CENTRAL");
    cmd
}

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn convert_fixture_to_stdout() {
    let dir = TempDir::new().unwrap();
    let expected = fs::read_to_string(fixture_path("xpcshell.toml")).unwrap();

    mmp_in(dir.path())
        .arg("convert")
        .arg(fixture_path("xpcshell.ini"))
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn convert_reads_stdin() {
    let dir = TempDir::new().unwrap();
    mmp_in(dir.path())
        .args(["convert", "-"])
        .write_stdin("[DEFAULT]\nskip-if = os == \"win\"\n")
        .assert()
        .success()
        .stdout("[DEFAULT]\nskip-if = [\"os == \\\"win\\\"\"]\n");
}

#[test]
fn convert_write_puts_output_next_to_sources() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a/mochitest.ini", "[DEFAULT]\nsupport-files = foo.js\n");
    write(dir.path(), "b/browser.ini", "[browser_test.js]\ntags = foo bar\n");

    mmp_in(dir.path())
        .args(["convert", "a/mochitest.ini", "b/browser.ini", "--write"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mochitest.toml").and(predicate::str::contains("browser.toml")));

    assert_eq!(
        fs::read_to_string(dir.path().join("a/mochitest.toml")).unwrap(),
        "[DEFAULT]\nsupport-files = [\"foo.js\"]\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("b/browser.toml")).unwrap(),
        "[\"browser_test.js\"]\ntags = \"foo bar\"\n"
    );
}

#[test]
fn convert_to_output_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "chrome.ini", "[DEFAULT]\ntags = a b\n");

    mmp_in(dir.path())
        .args(["convert", "chrome.ini", "-o", "out.toml"])
        .assert()
        .success()
        .stdout("");
    assert_eq!(
        fs::read_to_string(dir.path().join("out.toml")).unwrap(),
        "[DEFAULT]\ntags = \"a b\"\n"
    );
}

#[test]
fn output_file_wants_a_single_input() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.ini", "[a]\n");
    write(dir.path(), "b.ini", "[b]\n");

    mmp_in(dir.path())
        .args(["convert", "a.ini", "b.ini", "-o", "out.toml"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--output takes a single input"));
}

#[test]
fn strict_conversion_of_illegal_manifest_fails() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "xpcshell.ini", "[DEFAULT]\nfoo = bar\n");

    mmp_in(dir.path())
        .args(["convert", "xpcshell.ini", "--strict", "--write"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("strict mode"));
    assert!(!dir.path().join("xpcshell.toml").exists());

    mmp_in(dir.path())
        .args(["convert", "xpcshell.ini"])
        .assert()
        .success()
        .stdout("[DEFAULT]\nfoo = \"bar\"\n");
}

#[test]
fn parse_errors_fail_but_other_files_convert() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "bad.ini", "[DEFAULT\n");
    write(dir.path(), "good.ini", "[DEFAULT]\ntags = a b\n");

    mmp_in(dir.path())
        .args(["convert", "bad.ini", "good.ini", "--write"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("bad.ini").and(predicate::str::contains("1 file(s) failed")));
    assert!(dir.path().join("good.toml").exists());
    assert!(!dir.path().join("bad.toml").exists());
}

#[test]
fn convert_toml_back_to_ini() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "a11y.toml",
        "[DEFAULT]\nsupport-files = [\"foo.js\"]\ntags = \"a b\"\n",
    );

    mmp_in(dir.path())
        .args(["convert", "a11y.toml", "--to", "ini"])
        .assert()
        .success()
        .stdout("[DEFAULT]\nsupport-files = foo.js\ntags = a b\n");
}

#[test]
fn convert_to_treeviz() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.ini", "[DEFAULT]\ntags = a b\n");

    mmp_in(dir.path())
        .args(["convert", "a.ini", "--to", "treeviz"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Manifest (legal").and(predicate::str::contains("DEFAULT")));
}

#[test]
fn unknown_format_is_reported() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.ini", "[a]\n");

    mmp_in(dir.path())
        .args(["convert", "a.ini", "--to", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Format 'yaml' not found"));
}

#[test]
fn local_config_is_picked_up() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), ".mmp.toml", "[convert]\ntarget = \"ini\"\n");
    write(dir.path(), "a.toml", "[DEFAULT]\ntags = \"a b\"\n");

    mmp_in(dir.path())
        .args(["convert", "a.toml"])
        .assert()
        .success()
        .stdout("[DEFAULT]\ntags = a b\n");
}

#[test]
fn find_lists_manifests() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "mach", "");
    write(root, "dom/tests/mochitest.ini", "[test_a.html]\n");
    write(root, "toolkit/xpcshell.ini", "[test_b.js]\n");
    write(root, "toolkit/shared.ini", "[include:xpcshell.ini]\n");
    write(root, "toolkit/other.ini", "[test_c.js]\n");
    write(root, "toolkit/xpcshell.toml", "[test_b.js]\n");
    write(root, "obj-x86_64/dist/browser.ini", "[test_d.js]\n");

    mmp_in(root)
        .arg("find")
        .assert()
        .success()
        .stdout("./dom/tests/mochitest.ini\n./toolkit/shared.ini\n./toolkit/xpcshell.ini\n");

    mmp_in(root)
        .args(["find", "--ignore-includes"])
        .assert()
        .success()
        .stdout("./dom/tests/mochitest.ini\n./toolkit/xpcshell.ini\n");
}

#[test]
fn find_follows_includes() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "mach", "");
    write(root, "a/browser.ini", "[include:common/base.ini]\n");
    write(root, "a/common/base.ini", "[test_a.js]\n");

    mmp_in(root)
        .args(["find", "--follow-includes"])
        .assert()
        .success()
        .stdout("./a/browser.ini\n./a/common/base.ini\n");
}

#[test]
fn find_uses_topsrcdir_from_environment() {
    let dir = TempDir::new().unwrap();
    let checkout = dir.path().join("mozilla-central");
    write(&checkout, "mach", "");
    write(&checkout, "a/chrome.ini", "[test_a.html]\n");

    mmp_in(dir.path())
        .arg("find")
        .env("MOZILLA_CENTRAL", &checkout)
        .assert()
        .success()
        .stdout("./a/chrome.ini\n");

    mmp_in(dir.path())
        .args(["find", "--match", r"chrome\.ini"])
        .arg("--topsrcdir")
        .arg(&checkout)
        .assert()
        .success()
        .stdout("./a/chrome.ini\n");
}

#[test]
fn find_rejects_non_checkout() {
    let dir = TempDir::new().unwrap();
    mmp_in(dir.path())
        .arg("find")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not a firefox repo"));
}

#[test]
fn read_sorts_sections_on_request() {
    let dir = TempDir::new().unwrap();
    let source = "[\"test_b.html\"] # flaky\nskip-if = [\"os == 'win'\"]\n\n[DEFAULT]\ntags = \"a\"\n\n[\"test_a.html\"]\nrun-if = [\"debug\"]\n";
    write(dir.path(), "mochitest.toml", source);

    mmp_in(dir.path())
        .args(["read", "mochitest.toml"])
        .assert()
        .success()
        .stdout(source);

    mmp_in(dir.path())
        .args(["read", "-s", "mochitest.toml", "-o", "sorted.toml"])
        .assert()
        .success()
        .stdout("");
    assert_eq!(
        fs::read_to_string(dir.path().join("sorted.toml")).unwrap(),
        "[DEFAULT]\ntags = \"a\"\n\n['test_a.html']\nrun-if = [\"debug\"]\n\n['test_b.html'] # flaky\nskip-if = [\"os == 'win'\"]\n"
    );
}

#[test]
fn read_rejects_invalid_toml() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "broken.toml", "[DEFAULT\n");

    mmp_in(dir.path())
        .args(["read", "--alpha-sort", "broken.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid TOML"));
}

#[test]
fn formats_lists_registry() {
    let dir = TempDir::new().unwrap();
    mmp_in(dir.path())
        .arg("formats")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("ini (parse, serialize)")
                .and(predicate::str::contains("toml (parse, serialize)"))
                .and(predicate::str::contains("treeviz (serialize)"))
                .and(predicate::str::contains("json (serialize)")),
        );
}

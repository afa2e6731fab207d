//! Directory tests against a stub `orb` executable: a shell script that
//! records every invocation and replays canned JSON, so the external
//! boundary is exercised without OrbStack installed.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use orbman_distro::{ActionKind, Registry};
use orbman_machine::{ActionOutcome, DirectoryError, MachineDirectory, MachineState};
use orbman_orb::OrbClient;
use tempfile::TempDir;

fn stub_orb(dir: &Path) -> PathBuf {
    let script = dir.join("orb");
    let body = format!(
        "#!/bin/sh\n\
         dir=\"{dir}\"\n\
         echo \"$*\" >> \"$dir/calls.log\"\n\
         if [ -e \"$dir/fail-$1-$2\" ]; then\n\
         \techo \"stub: induced failure\" >&2\n\
         \texit 1\n\
         fi\n\
         case \"$1\" in\n\
         \tlist) cat \"$dir/list.json\" ;;\n\
         \tinfo) cat \"$dir/info-$2.json\" ;;\n\
         esac\n\
         exit 0\n",
        dir = dir.display()
    );
    fs::write(&script, body).unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}

fn machine_json(name: &str, distro: &str, state: &str, id: &str) -> String {
    format!(
        r#"{{"name":"{name}","distro":"{distro}","version":"jammy","arch":"arm64","state":"{state}","id":"{id}"}}"#
    )
}

/// Write `info-<name>.json` for each machine and a `list.json` holding
/// them all, in the given (deliberately unsorted) order.
fn seed(dir: &Path, machines: &[(&str, &str, &str, &str)]) {
    let mut entries = Vec::new();
    for (name, distro, state, id) in machines {
        let json = machine_json(name, distro, state, id);
        fs::write(dir.join(format!("info-{name}.json")), &json).unwrap();
        entries.push(json);
    }
    fs::write(dir.join("list.json"), format!("[{}]", entries.join(","))).unwrap();
}

fn calls(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_owned)
        .collect()
}

async fn load_directory(dir: &Path) -> MachineDirectory {
    let client = OrbClient::with_program(stub_orb(dir));
    MachineDirectory::load(client, Registry::builtin())
        .await
        .unwrap()
}

#[tokio::test]
async fn list_is_name_sorted_regardless_of_listing_order() {
    let tmp = TempDir::new().unwrap();
    seed(
        tmp.path(),
        &[
            ("zebra", "ubuntu", "running", "m-1"),
            ("apple", "ubuntu", "stopped", "m-2"),
            ("mango", "centos", "running", "m-3"),
        ],
    );
    let directory = load_directory(tmp.path()).await;
    let names: Vec<_> = directory.list().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["apple", "mango", "zebra"]);
}

#[tokio::test]
async fn create_is_idempotent_by_name() {
    let tmp = TempDir::new().unwrap();
    seed(tmp.path(), &[("dev", "ubuntu", "running", "m-1")]);
    let mut directory = load_directory(tmp.path()).await;

    let record = directory
        .create("dev", "ubuntu", Some("jammy"), "arm64")
        .await
        .unwrap();
    assert_eq!(record.id.as_deref(), Some("m-1"));

    let record = directory
        .create("dev", "ubuntu", Some("jammy"), "arm64")
        .await
        .unwrap();
    assert_eq!(record.id.as_deref(), Some("m-1"));

    let create_calls: Vec<_> = calls(tmp.path())
        .into_iter()
        .filter(|line| line.starts_with("create"))
        .collect();
    assert!(create_calls.is_empty(), "no external create expected: {create_calls:?}");
}

#[tokio::test]
async fn create_inserts_and_resorts() {
    let tmp = TempDir::new().unwrap();
    seed(
        tmp.path(),
        &[
            ("apple", "ubuntu", "running", "m-1"),
            ("zebra", "ubuntu", "stopped", "m-2"),
        ],
    );
    let mut directory = load_directory(tmp.path()).await;

    // The stub serves info for any name it has a file for; give it the
    // machine that "create" is about to bring into existence.
    fs::write(
        tmp.path().join("info-mango.json"),
        machine_json("mango", "ubuntu", "running", "m-3"),
    )
    .unwrap();

    let record = directory
        .create("mango", "ubuntu", Some("jammy"), "arm64")
        .await
        .unwrap();
    assert_eq!(record.state, MachineState::Running);

    assert!(calls(tmp.path()).contains(&"create ubuntu:jammy mango -a arm64".to_owned()));
    let names: Vec<_> = directory.list().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["apple", "mango", "zebra"]);
}

#[tokio::test]
async fn create_without_version_omits_the_tag() {
    let tmp = TempDir::new().unwrap();
    seed(tmp.path(), &[("box", "arch", "running", "m-9")]);
    let mut directory = load_directory(tmp.path()).await;

    fs::write(
        tmp.path().join("info-pacbox.json"),
        machine_json("pacbox", "arch", "running", "m-10"),
    )
    .unwrap();
    directory
        .create("pacbox", "arch", None, "amd64")
        .await
        .unwrap();
    assert!(calls(tmp.path()).contains(&"create arch pacbox -a amd64".to_owned()));
}

#[tokio::test]
async fn rename_rekeys_the_record() {
    let tmp = TempDir::new().unwrap();
    seed(
        tmp.path(),
        &[
            ("zebra", "ubuntu", "running", "m-1"),
            ("apple", "ubuntu", "stopped", "m-2"),
        ],
    );
    let mut directory = load_directory(tmp.path()).await;

    directory.rename("zebra", "aardvark").await.unwrap();

    assert!(calls(tmp.path()).contains(&"rename zebra aardvark".to_owned()));
    assert!(directory.get("zebra").is_none());
    let renamed = directory.get("aardvark").unwrap();
    assert_eq!(renamed.id.as_deref(), Some("m-1"));
    assert_eq!(renamed.state, MachineState::Running);
    let names: Vec<_> = directory.list().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["aardvark", "apple"]);
}

#[tokio::test]
async fn rename_onto_existing_name_is_refused_locally() {
    let tmp = TempDir::new().unwrap();
    seed(
        tmp.path(),
        &[
            ("apple", "ubuntu", "running", "m-1"),
            ("zebra", "ubuntu", "stopped", "m-2"),
        ],
    );
    let mut directory = load_directory(tmp.path()).await;

    let err = directory.rename("apple", "zebra").await.unwrap_err();
    assert!(matches!(err, DirectoryError::DuplicateName { .. }));
    let rename_calls: Vec<_> = calls(tmp.path())
        .into_iter()
        .filter(|line| line.starts_with("rename"))
        .collect();
    assert!(rename_calls.is_empty());
}

#[tokio::test]
async fn start_refreshes_state_from_info() {
    let tmp = TempDir::new().unwrap();
    seed(tmp.path(), &[("dev", "ubuntu", "stopped", "m-1")]);
    let mut directory = load_directory(tmp.path()).await;

    // After the start call the tool reports the machine as running.
    fs::write(
        tmp.path().join("info-dev.json"),
        machine_json("dev", "ubuntu", "running", "m-1"),
    )
    .unwrap();
    directory.start("dev").await.unwrap();

    assert!(calls(tmp.path()).contains(&"start dev".to_owned()));
    assert_eq!(directory.get("dev").unwrap().state, MachineState::Running);
}

#[tokio::test]
async fn start_failure_leaves_state_unchanged() {
    let tmp = TempDir::new().unwrap();
    seed(tmp.path(), &[("dev", "ubuntu", "stopped", "m-1")]);
    let mut directory = load_directory(tmp.path()).await;

    fs::write(tmp.path().join("fail-start-dev"), "").unwrap();
    let err = directory.start("dev").await.unwrap_err();
    assert!(matches!(err, DirectoryError::Orb(_)));
    assert_eq!(directory.get("dev").unwrap().state, MachineState::Stopped);
}

#[tokio::test]
async fn start_all_is_best_effort_and_aggregates_failures() {
    let tmp = TempDir::new().unwrap();
    seed(
        tmp.path(),
        &[
            ("bad", "ubuntu", "stopped", "m-1"),
            ("good", "ubuntu", "stopped", "m-2"),
        ],
    );
    let mut directory = load_directory(tmp.path()).await;

    fs::write(tmp.path().join("fail-start-bad"), "").unwrap();
    fs::write(
        tmp.path().join("info-good.json"),
        machine_json("good", "ubuntu", "running", "m-2"),
    )
    .unwrap();

    let err = directory.start_all().await.unwrap_err();
    assert_eq!(err.attempted, 2);
    assert_eq!(err.failures.len(), 1);
    assert_eq!(err.failures[0].0, "bad");

    // The failing machine did not stop the rest from starting.
    assert!(calls(tmp.path()).contains(&"start good".to_owned()));
    assert_eq!(directory.get("good").unwrap().state, MachineState::Running);
    assert_eq!(directory.get("bad").unwrap().state, MachineState::Stopped);
}

#[tokio::test]
async fn run_action_executes_the_resolved_command() {
    let tmp = TempDir::new().unwrap();
    seed(tmp.path(), &[("dev", "ubuntu", "running", "m-1")]);
    let mut directory = load_directory(tmp.path()).await;

    let outcome = directory
        .run_action("dev", ActionKind::Upgrade)
        .await
        .unwrap();
    assert_eq!(outcome, ActionOutcome::Ran);
    assert!(calls(tmp.path())
        .contains(&"-m dev sh -c sudo apt update && sudo apt upgrade -y".to_owned()));
}

#[tokio::test]
async fn undefined_action_is_a_no_op() {
    let tmp = TempDir::new().unwrap();
    // centos defines no install command
    seed(tmp.path(), &[("cent", "centos", "running", "m-1")]);
    let mut directory = load_directory(tmp.path()).await;

    let outcome = directory
        .run_action("cent", ActionKind::Install)
        .await
        .unwrap();
    assert_eq!(outcome, ActionOutcome::Unsupported);
    let exec_calls: Vec<_> = calls(tmp.path())
        .into_iter()
        .filter(|line| line.starts_with("-m"))
        .collect();
    assert!(exec_calls.is_empty());
}

#[tokio::test]
async fn destroy_removes_only_on_success() {
    let tmp = TempDir::new().unwrap();
    seed(
        tmp.path(),
        &[
            ("apple", "ubuntu", "running", "m-1"),
            ("zebra", "ubuntu", "stopped", "m-2"),
        ],
    );
    let mut directory = load_directory(tmp.path()).await;

    directory.destroy("apple", true).await.unwrap();
    assert!(calls(tmp.path()).contains(&"delete apple --force".to_owned()));
    assert!(directory.get("apple").is_none());

    fs::write(tmp.path().join("fail-delete-zebra"), "").unwrap();
    let err = directory.destroy("zebra", true).await.unwrap_err();
    assert!(matches!(err, DirectoryError::Orb(_)));
    assert!(directory.get("zebra").is_some());
}

#[tokio::test]
async fn unknown_machine_is_reported() {
    let tmp = TempDir::new().unwrap();
    seed(tmp.path(), &[("dev", "ubuntu", "running", "m-1")]);
    let mut directory = load_directory(tmp.path()).await;

    let err = directory.start("ghost").await.unwrap_err();
    assert!(matches!(err, DirectoryError::MachineNotFound { .. }));
}

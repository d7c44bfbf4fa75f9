//! Tests for installing manifest dependencies into a project.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use gdpack_core::prelude::*;

fn run_git(repo: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(repo)
        .status()
        .expect("Failed to invoke git");
    assert!(status.success(), "git command failed: {:?}", args);
}

fn init_addon_repo(repo: &Path) -> String {
    init_repo_with(repo, &[("plugin.cfg", "[plugin]\nname=\"remote\"\n")])
}

fn init_repo_with(repo: &Path, files: &[(&str, &str)]) -> String {
    std::fs::create_dir_all(repo).unwrap();
    run_git(repo, &["init"]);
    run_git(repo, &["checkout", "-b", "main"]);
    run_git(repo, &["config", "user.email", "test@example.com"]);
    run_git(repo, &["config", "user.name", "Test User"]);
    run_git(repo, &["config", "commit.gpgsign", "false"]);
    for (path, content) in files {
        let path = repo.join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
    run_git(repo, &["add", "."]);
    run_git(repo, &["commit", "-m", "init"]);

    url::Url::from_directory_path(repo)
        .expect("repo root should convert to file URL")
        .to_string()
}

fn write_local_addon(dir: &Path) {
    std::fs::create_dir_all(dir.join("scenes")).unwrap();
    std::fs::create_dir_all(dir.join(".git")).unwrap();
    std::fs::write(dir.join("plugin.cfg"), "[plugin]\nname=\"local\"\n").unwrap();
    std::fs::write(dir.join("scenes").join("main.tscn"), "[gd_scene]\n").unwrap();
    std::fs::write(dir.join(".git").join("HEAD"), "ref: refs/heads/main\n").unwrap();
}

#[tokio::test]
async fn installs_git_and_local_dependencies() {
    let temp = TempDir::new().unwrap();
    let layout = ProjectLayout::new(temp.path().join("game"));
    let uri = init_addon_repo(&temp.path().join("remote"));
    write_local_addon(&temp.path().join("game").join("vendor").join("local"));

    let mut manifest = Manifest::new();
    manifest
        .add("remote", Spec::git(GitSource::new(&uri)), &Query::production())
        .unwrap();
    manifest
        .add("local", Spec::local("vendor/local"), &Query::development())
        .unwrap();
    manifest
        .add("store", Spec::asset(1234), &Query::production())
        .unwrap();

    let installed = Installer::new(layout.clone())
        .install(&manifest, &InstallOptions::default(), std::future::pending())
        .await
        .unwrap();

    assert_eq!(installed.len(), 3);
    assert!(layout.addon_dir("remote").join("plugin.cfg").exists());
    assert!(layout.addon_dir("local").join("scenes").join("main.tscn").exists());
    assert!(!layout.addon_dir("local").join(".git").exists());
    assert!(!layout.addon_dir("store").exists());

    let store = installed.iter().find(|a| a.name == "store").unwrap();
    assert!(matches!(store.outcome, InstallOutcome::Skipped { .. }));
    let remote = installed.iter().find(|a| a.name == "remote").unwrap();
    assert_eq!(
        remote.outcome,
        InstallOutcome::Cloned(CloneStrategy::Shallow { reference: None })
    );
}

#[tokio::test]
async fn production_only_skips_dev_dependencies() {
    let temp = TempDir::new().unwrap();
    let layout = ProjectLayout::new(temp.path());
    write_local_addon(&temp.path().join("tools"));

    let mut manifest = Manifest::new();
    manifest
        .add("tools", Spec::local("tools"), &Query::development())
        .unwrap();

    let options = InstallOptions {
        production_only: true,
        ..Default::default()
    };
    let installed = Installer::new(layout.clone())
        .install(&manifest, &options, std::future::pending())
        .await
        .unwrap();

    assert!(installed.is_empty());
    assert!(!layout.addon_dir("tools").exists());
}

#[tokio::test]
async fn target_overrides_are_installed() {
    let temp = TempDir::new().unwrap();
    let layout = ProjectLayout::new(temp.path());
    write_local_addon(&temp.path().join("generic"));
    write_local_addon(&temp.path().join("linux"));
    std::fs::write(temp.path().join("linux").join("LINUX"), "").unwrap();

    let mut manifest = Manifest::new();
    manifest
        .add("native", Spec::local("generic"), &Query::production())
        .unwrap();
    manifest
        .add(
            "native",
            Spec::local("linux"),
            &Query::production().with_target("linux"),
        )
        .unwrap();

    let options = InstallOptions {
        target: Some("linux".to_string()),
        ..Default::default()
    };
    Installer::new(layout.clone())
        .install(&manifest, &options, std::future::pending())
        .await
        .unwrap();

    assert!(layout.addon_dir("native").join("LINUX").exists());
}

#[tokio::test]
async fn existing_addon_requires_force() {
    let temp = TempDir::new().unwrap();
    let layout = ProjectLayout::new(temp.path());
    write_local_addon(&temp.path().join("src-addon"));
    std::fs::create_dir_all(layout.addon_dir("addon")).unwrap();
    std::fs::write(layout.addon_dir("addon").join("stale.txt"), "old").unwrap();

    let mut manifest = Manifest::new();
    manifest
        .add("addon", Spec::local("src-addon"), &Query::production())
        .unwrap();

    let installer = Installer::new(layout.clone());
    let err = installer
        .install(&manifest, &InstallOptions::default(), std::future::pending())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Failed to install addon 'addon'"));
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::AlreadyExists { .. })
    ));

    let options = InstallOptions {
        force: true,
        ..Default::default()
    };
    installer
        .install(&manifest, &options, std::future::pending())
        .await
        .unwrap();

    assert!(!layout.addon_dir("addon").join("stale.txt").exists());
    assert!(layout.addon_dir("addon").join("plugin.cfg").exists());
}

#[tokio::test]
async fn missing_local_source_fails() {
    let temp = TempDir::new().unwrap();
    let layout = ProjectLayout::new(temp.path());

    let mut manifest = Manifest::new();
    manifest
        .add("ghost", Spec::local("does/not/exist"), &Query::production())
        .unwrap();

    let err = Installer::new(layout.clone())
        .install(&manifest, &InstallOptions::default(), std::future::pending())
        .await
        .unwrap_err();

    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Io { .. })));
    assert!(!layout.addon_dir("ghost").exists());
}

#[tokio::test]
async fn cancelled_install_reports_cancellation() {
    let temp = TempDir::new().unwrap();
    let layout = ProjectLayout::new(temp.path().join("game"));
    let uri = init_addon_repo(&temp.path().join("remote"));

    let mut manifest = Manifest::new();
    manifest
        .add("remote", Spec::git(GitSource::new(&uri)), &Query::production())
        .unwrap();

    let err = Installer::new(layout.clone())
        .install(&manifest, &InstallOptions::default(), std::future::ready(()))
        .await
        .unwrap_err();

    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Cancelled)));
    assert!(!layout.addon_dir("remote").exists());
    assert_eq!(std::fs::read_dir(layout.addons_dir()).unwrap().count(), 0);
}

#[tokio::test]
async fn failed_forced_reinstall_keeps_previous_addon() {
    let temp = TempDir::new().unwrap();
    let layout = ProjectLayout::new(temp.path().join("game"));
    let uri = init_addon_repo(&temp.path().join("remote"));
    std::fs::create_dir_all(layout.addon_dir("remote")).unwrap();
    std::fs::write(layout.addon_dir("remote").join("plugin.cfg"), "previous").unwrap();

    let mut manifest = Manifest::new();
    manifest
        .add(
            "remote",
            Spec::git(GitSource::new(&uri).with_rev("0000000000000000000000000000000000000000")),
            &Query::production(),
        )
        .unwrap();

    let options = InstallOptions {
        force: true,
        ..Default::default()
    };
    let err = Installer::new(layout.clone())
        .install(&manifest, &options, std::future::pending())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::ProcessFailure { .. })
    ));
    let kept = std::fs::read_to_string(layout.addon_dir("remote").join("plugin.cfg")).unwrap();
    assert_eq!(kept, "previous");
    assert_eq!(std::fs::read_dir(layout.addons_dir()).unwrap().count(), 1);
}

#[tokio::test]
async fn installs_addon_folder_of_project_repository() {
    let temp = TempDir::new().unwrap();
    let layout = ProjectLayout::new(temp.path().join("game"));
    let uri = init_repo_with(
        &temp.path().join("dialogue"),
        &[
            ("project.godot", "config_version=5\n"),
            ("gdpack.toml", ""),
            ("addons/dialogue/plugin.cfg", "[plugin]\nname=\"dialogue\"\n"),
            ("addons/dialogue/runtime.gd", "extends Node\n"),
            ("addons/dialogue/.gdignore", ""),
        ],
    );

    let mut manifest = Manifest::new();
    manifest
        .add("dialogue", Spec::git(GitSource::new(&uri)), &Query::production())
        .unwrap();

    Installer::new(layout.clone())
        .install(&manifest, &InstallOptions::default(), std::future::pending())
        .await
        .unwrap();

    let dest = layout.addon_dir("dialogue");
    assert!(dest.join("plugin.cfg").is_file());
    assert!(dest.join("runtime.gd").is_file());
    assert!(!dest.join("addons").exists());
    assert!(!dest.join("project.godot").exists());
    assert!(!dest.join(".gdignore").exists());
    assert!(!dest.join(".git").exists());
    assert_eq!(std::fs::read_dir(layout.addons_dir()).unwrap().count(), 1);
}

#[tokio::test]
async fn replacement_installs_in_place_of_original() {
    let temp = TempDir::new().unwrap();
    let layout = ProjectLayout::new(temp.path());
    write_local_addon(&temp.path().join("vendor").join("lib"));
    write_local_addon(&temp.path().join("vendor").join("lib-web"));

    let mut manifest = Manifest::new();
    manifest
        .add("lib", Spec::local("vendor/lib"), &Query::production())
        .unwrap();
    manifest
        .add(
            "lib-web",
            Spec::local("vendor/lib-web").replacing("lib"),
            &Query::production().with_target("web"),
        )
        .unwrap();

    let options = InstallOptions {
        target: Some("web".to_string()),
        ..Default::default()
    };
    let installed = Installer::new(layout.clone())
        .install(&manifest, &options, std::future::pending())
        .await
        .unwrap();

    let names: Vec<_> = installed.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["lib-web"]);
    assert!(!layout.addon_dir("lib").exists());
}

//! Integration tests that run the compiled `dockhand` binary

use assert_cmd::Command;
use dockhand_test_utils::TestTree;
use predicates::prelude::*;

/// Get a Command for the dockhand binary isolated from cloud and updates
fn dockhand_cmd(tree: &TestTree) -> Command {
    let mut cmd = Command::cargo_bin("dockhand").expect("Failed to find dockhand binary");
    cmd.current_dir(tree.root())
        .env_remove("DOCKHAND_LOG")
        .env_remove("DOCKHAND_CONFIG_LOCATION")
        .env_remove("DOCKHAND_CONFIG_FILES")
        .args(["--no-aws", "--no-update", "--no-user-config"]);
    cmd
}

// ============================================================================
// Help and keys
// ============================================================================

#[test]
fn test_help_lists_flags() {
    let tree = TestTree::new();
    dockhand_cmd(&tree)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config-dump"))
        .stdout(predicate::str::contains("--ps-path"));
}

#[test]
fn test_config_keys_lists_every_key() {
    let tree = TestTree::new();
    dockhand_cmd(&tree)
        .arg("--config-keys")
        .assert()
        .success()
        .stdout(predicate::str::contains("docker-image-build-folder"))
        .stdout(predicate::str::contains("auto-update-delay"))
        .stdout(predicate::str::contains("alias"));
}

// ============================================================================
// Resolution output
// ============================================================================

#[test]
fn test_config_dump_prints_merged_configuration() {
    let tree = TestTree::new();
    tree.write(".dockhand.config", "docker-image: acme/tools\ndocker-image-version: \"1.4\"\n");
    tree.write("live/.dockhand.config", "environment:\n  STAGE: live\n");

    dockhand_cmd(&tree)
        .current_dir(tree.path("live"))
        .arg("--config-dump")
        .assert()
        .success()
        .stdout(predicate::str::contains("docker-image: acme/tools"))
        .stdout(predicate::str::contains("STAGE: live"));
}

#[test]
fn test_launch_plan_expands_aliases() {
    let tree = TestTree::new();
    tree.write(".dockhand.config", "alias:\n  deploy: apply -auto-approve\n");

    dockhand_cmd(&tree)
        .args(["deploy", "-var", "x=1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("entry-point: terragrunt"))
        .stdout(predicate::str::contains("- apply"))
        .stdout(predicate::str::contains("-auto-approve"))
        .stdout(predicate::str::contains("x=1"));
}

#[test]
fn test_command_line_overrides_win() {
    let tree = TestTree::new();
    tree.write(".dockhand.config", "docker-image: acme/tools\nentry-point: terraform\n");

    dockhand_cmd(&tree)
        .args(["--image-version", "2.1", "-t", "k8s", "--entrypoint", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("image: acme/tools:2.1-k8s"))
        .stdout(predicate::str::contains("entry-point: bash"));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_required_version_mismatch_fails() {
    let tree = TestTree::new();
    tree.write(
        ".dockhand.config",
        "docker-image-version: \"1.1\"\nrequired-image-version: \">=1.2.0 <2.0.0\"\n",
    );

    dockhand_cmd(&tree)
        .arg("plan")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("required version range"));
}

#[test]
fn test_forced_image_version_downgrades_mismatch() {
    let tree = TestTree::new();
    tree.write(".dockhand.config", "required-image-version: \">=1.2.0 <2.0.0\"\n");

    dockhand_cmd(&tree)
        .args(["--image-version", "1.1", "plan"])
        .assert()
        .success();
}

#[test]
fn test_malformed_range_fails() {
    let tree = TestTree::new();
    tree.write(
        ".dockhand.config",
        "docker-image-version: \"1.4\"\nrequired-image-version: not-a-range\n",
    );

    dockhand_cmd(&tree)
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid version range"));
}

#[test]
fn test_alias_cycle_fails() {
    let tree = TestTree::new();
    tree.write(".dockhand.config", "alias:\n  a: b\n  b: a\n");

    dockhand_cmd(&tree)
        .arg("a")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Alias cycle detected: a -> b -> a"));
}

#[test]
fn test_broken_layer_is_skipped_with_warning() {
    let tree = TestTree::new();
    tree.write(".dockhand.config", "docker-image: [unterminated\n");

    dockhand_cmd(&tree)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("image: dockhand/toolbox"))
        .stderr(predicate::str::contains("Unable to parse configuration"));
}

// ============================================================================
// Logging
// ============================================================================

#[test]
fn test_configured_logging_level_applies() {
    let tree = TestTree::new();
    tree.write(".dockhand.config", "logging-level: debug\n");

    dockhand_cmd(&tree)
        .arg("plan")
        .assert()
        .success()
        .stderr(predicate::str::contains("Configuration resolved"));
}

#[test]
fn test_command_line_level_overrides_configuration() {
    let tree = TestTree::new();
    tree.write(".dockhand.config", "logging-level: debug\n");

    dockhand_cmd(&tree)
        .args(["--log-level", "error", "plan"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Configuration resolved").not());
}

#[test]
fn test_unknown_log_level_is_rejected() {
    let tree = TestTree::new();
    dockhand_cmd(&tree)
        .args(["--log-level", "loud"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown log level"));
}

//! End-to-end resolution across remote, parameter-store and local sources
//!
//! The cloud is replaced by an in-memory backend; everything else runs the
//! production code paths against temporary directory trees.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use dockhand_cloud::{
    CloudBackend, CloudContextGate, CloudEnvironment, CredentialSession, Credentials, Parameter,
    SessionManager,
};
use dockhand_core::{
    ConfigResolver, LaunchPlan, ResolveOptions, ResolvedConfig, ToolVersion, VersionFinding,
};
use dockhand_test_utils::TestTree;
use dockhand_update::{
    BinaryInstaller, ReleaseSource, UpdateCoordinator, UpdateRequest, UpdateStamp, UpdateState,
};

struct CloudShell;

impl CloudEnvironment for CloudShell {
    fn var(&self, key: &str) -> Option<String> {
        (key == "AWS_PROFILE").then(|| "ops".to_string())
    }
    fn on_path(&self, _program: &str) -> bool {
        false
    }
    fn home_dir(&self) -> Option<PathBuf> {
        None
    }
}

#[derive(Clone, Default)]
struct FakeCloud {
    parameters: Vec<(&'static str, String)>,
    unavailable: bool,
    parameter_reads: Arc<AtomicUsize>,
}

impl CloudBackend for FakeCloud {
    fn resolve(
        &self,
        profile: Option<&str>,
        _duration: Option<Duration>,
    ) -> dockhand_cloud::Result<CredentialSession> {
        if self.unavailable {
            return Err(dockhand_cloud::Error::NoCredentials {
                profile: profile.map(str::to_string),
            });
        }
        Ok(CredentialSession::new(
            Credentials {
                access_key_id: "AKIAINTEGRATION".into(),
                secret_access_key: "secret".into(),
                session_token: Some("token".into()),
                expires_at: None,
            },
            Some("us-east-1".into()),
        ))
    }

    fn caller_arn(&self, _session: &CredentialSession) -> dockhand_cloud::Result<String> {
        Ok("arn:aws:sts::1:assumed-role/deployer/session".into())
    }

    fn role_max_session_duration(
        &self,
        _session: &CredentialSession,
        _role_name: &str,
    ) -> dockhand_cloud::Result<Duration> {
        Ok(Duration::from_secs(4 * 3600))
    }

    fn parameters_by_path(
        &self,
        _session: &CredentialSession,
        path: &str,
    ) -> dockhand_cloud::Result<Vec<Parameter>> {
        self.parameter_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .parameters
            .iter()
            .map(|(key, value)| Parameter {
                name: format!("{path}/{key}"),
                value: value.clone(),
            })
            .collect())
    }
}

fn cloud_resolver(tree: &TestTree, cwd: &str, options: ResolveOptions, cloud: FakeCloud) -> ConfigResolver {
    let gate = CloudContextGate::with_environment(options.use_cloud, CloudShell);
    let sessions = SessionManager::new(cloud, None).without_env_export();
    ConfigResolver::with_cloud(tree.path(cwd), options, gate, sessions)
}

fn local_options() -> ResolveOptions {
    ResolveOptions {
        include_user_config: true,
        ..Default::default()
    }
}

mod precedence_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn remote_then_local_with_credentials_seeded() {
        let tree = TestTree::new();
        tree.write(
            "shared/DockhandConfig",
            "docker-image: acme/remote\nlogging-level: warning\nrun-after: remote\n",
        );
        tree.write("repo/.dockhand.config", "docker-image: acme/project\nrun-after: project\n");
        tree.write("repo/dockhand.user.config", "logging-level: debug\n");
        let options = ResolveOptions {
            config_location: Some(tree.path("shared").display().to_string()),
            ..local_options()
        };
        let cloud = FakeCloud {
            parameters: vec![("docker-image", "acme/parameter".into())],
            ..Default::default()
        };
        let reads = cloud.parameter_reads.clone();

        let config = cloud_resolver(&tree, "repo", options, cloud).resolve();

        assert_eq!(config.image, "acme/project");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.run_after, vec!["remote", "project"]);
        assert_eq!(config.environment["AWS_ACCESS_KEY_ID"], "AKIAINTEGRATION");
        assert_eq!(config.environment["AWS_REGION"], "us-east-1");
        assert_eq!(reads.load(Ordering::SeqCst), 0, "explicit location skips the parameter store");
    }

    #[test]
    fn parameter_store_fills_in_when_no_remote_files() {
        let tree = TestTree::new();
        tree.write("repo/.dockhand.config", "environment:\n  STAGE: dev\n");
        let cloud = FakeCloud {
            parameters: vec![
                ("docker-image", "acme/parameter".into()),
                ("docker-options", r#"["--rm", "--network=host"]"#.into()),
                ("environment", r#"{"STAGE": "shared", "TEAM": "infra"}"#.into()),
                ("auto-update", "false".into()),
            ],
            ..Default::default()
        };

        let config = cloud_resolver(&tree, "repo", local_options(), cloud).resolve();

        assert_eq!(config.image, "acme/parameter");
        assert_eq!(config.docker_options, vec!["--rm", "--network=host"]);
        assert_eq!(config.environment["STAGE"], "dev");
        assert_eq!(config.environment["TEAM"], "infra");
        assert!(!config.auto_update);
        assert_eq!(config.sources.first().map(String::as_str), Some("parameter-store:/default/dockhand"));
    }

    #[test]
    fn parameter_store_can_point_at_remote_configuration() {
        let tree = TestTree::new();
        tree.write("central/base.yml", "docker-image: acme/central\n");
        tree.write("central/extra.yml", "entry-point: terraform\n");
        tree.mkdir("repo");
        let cloud = FakeCloud {
            parameters: vec![
                ("config-location", tree.path("central").display().to_string()),
                ("config-paths", "base.yml:extra.yml".into()),
                ("docker-image", "acme/ignored".into()),
            ],
            ..Default::default()
        };

        let config = cloud_resolver(&tree, "repo", local_options(), cloud).resolve();

        assert_eq!(config.image, "acme/central");
        assert_eq!(config.entry_point, "terraform");
        assert_eq!(config.sources.len(), 2);
    }

    #[test]
    fn unavailable_cloud_degrades_to_local_files() {
        let tree = TestTree::new();
        tree.write("repo/.dockhand.config", "docker-image: acme/local\n");
        let cloud = FakeCloud {
            parameters: vec![("docker-image", "acme/parameter".into())],
            unavailable: true,
            ..Default::default()
        };
        let reads = cloud.parameter_reads.clone();

        let config = cloud_resolver(&tree, "repo", local_options(), cloud).resolve();

        assert_eq!(config.image, "acme/local");
        assert!(config.environment.is_empty());
        assert_eq!(reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn config_dump_keeps_credentials_out() {
        let tree = TestTree::new();
        tree.mkdir("repo");
        let options = ResolveOptions {
            config_dump: true,
            ..local_options()
        };

        let config = cloud_resolver(&tree, "repo", options, FakeCloud::default()).resolve();
        let yaml = config.to_yaml().unwrap();

        assert!(config.environment.is_empty());
        assert!(!yaml.contains("AKIAINTEGRATION"));
    }
}

mod validation_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn recommended_ranges_only_warn() {
        let tree = TestTree::new();
        tree.write(
            ".dockhand.config",
            "docker-image-version: \"1.1\"\nrecommended-image-version: \">=1.2\"\nrecommended-tool-version: \">=9.0.0\"\n",
        );
        let options = ResolveOptions {
            use_cloud: false,
            ..local_options()
        };
        let resolver = ConfigResolver::new(tree.root(), options);

        let findings = dockhand_core::version::validate(&resolver.resolve(), &ToolVersion::new("1.0.0"));

        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| matches!(f, VersionFinding::Warning(_))));
        assert!(resolver.resolve_validated(&ToolVersion::new("1.0.0")).is_ok());
    }

    #[test]
    fn required_range_mismatch_aborts_with_range() {
        let tree = TestTree::new();
        tree.write(
            ".dockhand.config",
            "docker-image-version: \"1.1\"\nrequired-image-version: \">=1.2.0 <2.0.0\"\n",
        );
        let options = ResolveOptions {
            use_cloud: false,
            ..local_options()
        };

        let err = ConfigResolver::new(tree.root(), options)
            .resolve_validated(&ToolVersion::local())
            .unwrap_err();

        assert!(err.to_string().contains(">=1.2.0 <2.0.0"));
    }
}

mod launch_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hooks_builds_and_aliases_flow_into_the_plan() {
        let tree = TestTree::new();
        tree.write(
            ".dockhand.config",
            "run-before: echo root\nrun-after: echo root-after\ndocker-image-build: RUN apk add git\nalias:\n  up: apply -auto-approve\n",
        );
        tree.write(
            "stack/.dockhand.config",
            "run-before: echo stack\nrun-after: echo stack-after\ndocker-image-build: RUN apk add jq\n",
        );
        let options = ResolveOptions {
            use_cloud: false,
            ..local_options()
        };
        let config = ConfigResolver::new(tree.path("stack"), options).resolve();

        let plan = LaunchPlan::new(&config, &["up".to_string(), "-lock=false".to_string()]).unwrap();

        assert_eq!(plan.run_before, vec!["echo stack", "echo root"]);
        assert_eq!(plan.run_after, vec!["echo root-after", "echo stack-after"]);
        assert_eq!(plan.args, vec!["apply", "-auto-approve", "-lock=false"]);
        assert_eq!(plan.builds.len(), 2);
        assert_eq!(plan.builds[0].instructions, "RUN apk add git");
        assert_eq!(plan.builds[1].from, plan.builds[0].image);
        assert_eq!(plan.image, plan.builds[1].image);
    }

    #[test]
    fn unchanged_context_reuses_the_build_tag() {
        let tree = TestTree::new();
        tree.write("ctx/script.sh", "echo hi");
        tree.write(
            ".dockhand.config",
            "docker-image-build: COPY script.sh /\ndocker-image-build-folder: ctx\n",
        );
        let options = ResolveOptions {
            use_cloud: false,
            ..local_options()
        };
        let resolver = ConfigResolver::new(tree.root(), options);

        let first = LaunchPlan::new(&resolver.resolve(), &[]).unwrap();
        let second = LaunchPlan::new(&resolver.resolve(), &[]).unwrap();

        assert_eq!(first.builds[0].tag, second.builds[0].tag);
    }
}

mod update_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn coordinator(tree: &TestTree) -> UpdateCoordinator {
        UpdateCoordinator::new(
            ToolVersion::new("1.0.0"),
            ReleaseSource {
                api_url: "http://127.0.0.1:9/unreachable".into(),
                download_url: "http://127.0.0.1:9/unreachable".into(),
            },
            UpdateStamp::new(tree.path("cache/last-update-check")),
            BinaryInstaller::new(tree.write("bin/dockhand", "binary")),
        )
    }

    fn resolve(tree: &TestTree) -> ResolvedConfig {
        let options = ResolveOptions {
            use_cloud: false,
            ..local_options()
        };
        ConfigResolver::new(tree.root(), options).resolve()
    }

    #[test]
    fn configured_delay_controls_eligibility() {
        let tree = TestTree::new();
        tree.write(".dockhand.config", "auto-update-delay: 30m\n");
        let config = resolve(&tree);
        let coordinator = coordinator(&tree);
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();

        coordinator.stamp().touch(now - chrono::Duration::minutes(20)).unwrap();
        assert_eq!(coordinator.evaluate(&config, UpdateRequest::Auto, now), UpdateState::Skip);

        coordinator.stamp().touch(now - chrono::Duration::minutes(45)).unwrap();
        assert_eq!(
            coordinator.evaluate(&config, UpdateRequest::Auto, now),
            UpdateState::DueForCheck
        );
    }

    #[test]
    fn disabled_in_config_but_forced_on_command_line() {
        let tree = TestTree::new();
        tree.write(".dockhand.config", "auto-update: false\n");
        let config = resolve(&tree);
        let coordinator = coordinator(&tree);
        let now = Utc::now();

        assert_eq!(coordinator.evaluate(&config, UpdateRequest::Auto, now), UpdateState::Skip);
        assert_eq!(
            coordinator.evaluate(&config, UpdateRequest::Force, now),
            UpdateState::DueForCheck
        );
    }
}

//! [`CloudBackend`] implementation driving the `aws` command-line tool
//!
//! Every call is a subprocess whose JSON output is parsed into session types.
//! Credentials of an existing session are handed to the subprocess through
//! its environment, never through arguments.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::gate::CLOUD_CLI;
use crate::{CloudBackend, CredentialSession, Credentials, Error, Parameter, Result};

/// Session name used when assuming a role with an explicit duration.
const ROLE_SESSION_NAME: &str = "dockhand";

/// Backend shelling out to the `aws` CLI.
#[derive(Debug, Clone)]
pub struct AwsCliBackend {
    program: PathBuf,
}

impl Default for AwsCliBackend {
    fn default() -> Self {
        Self {
            program: PathBuf::from(CLOUD_CLI),
        }
    }
}

impl AwsCliBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn command(&self, session: Option<&CredentialSession>, profile: Option<&str>, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        if let Some(profile) = profile {
            cmd.arg("--profile").arg(profile);
        }
        if let Some(session) = session {
            cmd.env_remove("AWS_PROFILE").env_remove("AWS_DEFAULT_PROFILE");
            for (key, value) in session.env_vars() {
                cmd.env(key, value);
            }
        }
        cmd
    }

    fn run(&self, session: Option<&CredentialSession>, profile: Option<&str>, args: &[&str]) -> Result<String> {
        let command = format!("{} {}", self.program.display(), args.join(" "));
        tracing::trace!(%command, "Running cloud CLI");

        let output = self
            .command(session, profile, args)
            .output()
            .map_err(|source| Error::Spawn {
                command: command.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(Error::CommandFailed {
                command,
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    /// Read a single setting from the shared config; unset values are `None`.
    fn config_value(&self, profile: Option<&str>, key: &str) -> Option<String> {
        self.run(None, profile, &["configure", "get", key])
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn region(&self, profile: Option<&str>) -> Option<String> {
        self.config_value(profile, "region").or_else(|| {
            ["AWS_REGION", "AWS_DEFAULT_REGION"]
                .iter()
                .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
        })
    }

    fn assume_role(&self, profile: Option<&str>, role_arn: &str, duration: Duration) -> Result<Credentials> {
        let source_profile = self.config_value(profile, "source_profile");
        let seconds = duration.as_secs().to_string();
        let session_name = format!("{ROLE_SESSION_NAME}-{}", std::process::id());
        let stdout = self.run(
            None,
            source_profile.as_deref(),
            &[
                "sts",
                "assume-role",
                "--role-arn",
                role_arn,
                "--role-session-name",
                &session_name,
                "--duration-seconds",
                &seconds,
                "--output",
                "json",
            ],
        )?;
        parse_assume_role(&stdout)
    }
}

impl CloudBackend for AwsCliBackend {
    fn resolve(&self, profile: Option<&str>, duration: Option<Duration>) -> Result<CredentialSession> {
        let region = self.region(profile);

        if let Some(duration) = duration {
            if let Some(role_arn) = self.config_value(profile, "role_arn") {
                tracing::debug!(%role_arn, seconds = duration.as_secs(), "Assuming role with explicit duration");
                let credentials = self.assume_role(profile, &role_arn, duration)?;
                return Ok(CredentialSession::new(credentials, region));
            }
            tracing::debug!("Profile has no role_arn, duration cannot be requested");
        }

        let stdout = self
            .run(None, profile, &["configure", "export-credentials", "--format", "process"])
            .map_err(|e| match e {
                Error::CommandFailed { .. } => Error::NoCredentials {
                    profile: profile.map(str::to_string),
                },
                other => other,
            })?;
        let credentials = parse_process_credentials(&stdout)?;
        Ok(CredentialSession::new(credentials, region))
    }

    fn caller_arn(&self, session: &CredentialSession) -> Result<String> {
        let stdout = self.run(Some(session), None, &["sts", "get-caller-identity", "--output", "json"])?;
        let identity: CallerIdentity = parse_json("sts get-caller-identity", &stdout)?;
        Ok(identity.arn)
    }

    fn role_max_session_duration(&self, session: &CredentialSession, role_name: &str) -> Result<Duration> {
        let stdout = self.run(
            Some(session),
            None,
            &["iam", "get-role", "--role-name", role_name, "--output", "json"],
        )?;
        let response: GetRole = parse_json("iam get-role", &stdout)?;
        tracing::debug!(arn = %response.role.arn, seconds = response.role.max_session_duration, "Role maximum duration");
        Ok(Duration::from_secs(response.role.max_session_duration))
    }

    fn parameters_by_path(&self, session: &CredentialSession, path: &str) -> Result<Vec<Parameter>> {
        let stdout = self.run(
            Some(session),
            None,
            &[
                "ssm",
                "get-parameters-by-path",
                "--path",
                path,
                "--recursive",
                "--with-decryption",
                "--output",
                "json",
            ],
        )?;
        let response: ParametersByPath = parse_json("ssm get-parameters-by-path", &stdout)?;
        Ok(response
            .parameters
            .into_iter()
            .map(|p| Parameter {
                name: p.name,
                value: p.value,
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProcessCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
    expiration: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleResponse {
    credentials: ProcessCredentials,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CallerIdentity {
    arn: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetRole {
    role: Role,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Role {
    arn: String,
    max_session_duration: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParametersByPath {
    #[serde(default)]
    parameters: Vec<RawParameter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawParameter {
    name: String,
    value: String,
}

fn parse_json<T: serde::de::DeserializeOwned>(what: &str, stdout: &str) -> Result<T> {
    serde_json::from_str(stdout).map_err(|e| Error::Response {
        what: what.to_string(),
        message: e.to_string(),
    })
}

fn into_credentials(raw: ProcessCredentials) -> Result<Credentials> {
    let expires_at = raw
        .expiration
        .as_deref()
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| Error::Response {
                    what: "credential expiration".into(),
                    message: format!("{s}: {e}"),
                })
        })
        .transpose()?;

    Ok(Credentials {
        access_key_id: raw.access_key_id,
        secret_access_key: raw.secret_access_key,
        session_token: raw.session_token.filter(|t| !t.is_empty()),
        expires_at,
    })
}

/// Parse `aws configure export-credentials --format process` output.
fn parse_process_credentials(stdout: &str) -> Result<Credentials> {
    into_credentials(parse_json("configure export-credentials", stdout)?)
}

/// Parse `aws sts assume-role` output.
fn parse_assume_role(stdout: &str) -> Result<Credentials> {
    let response: AssumeRoleResponse = parse_json("sts assume-role", stdout)?;
    into_credentials(response.credentials)
}

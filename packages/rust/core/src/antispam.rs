//! Heuristic "is this issue/PR suspicious" check.
//!
//! The caller fetches the author profile and activity from GitHub and hands
//! them in as [`AntispamInput`]; this module only scores them and plans the
//! moderation actions to take.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use doctools_shared::{AntispamConfig, DocToolsError, Result};

/// Event name of manual workflow runs; these never trigger actions.
const MANUAL_EVENT: &str = "workflow_dispatch";

/// Label applied to flagged issues/PRs.
pub const SUSPICIOUS_LABEL: &str = "suspicious";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Author profile, as returned by `GET /users/{username}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub blog: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    #[serde(default)]
    pub public_repos: u64,
    #[serde(default)]
    pub public_gists: u64,
}

/// Title and body of the issue or pull request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueSummary {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// Webhook payload subset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub issue: Option<IssueSummary>,
    #[serde(default)]
    pub pull_request: Option<IssueSummary>,
}

/// Workflow run context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventContext {
    pub event_name: String,
    pub actor: String,
    #[serde(default)]
    pub payload: EventPayload,
}

/// Everything the checks look at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntispamInput {
    pub user: GitHubUser,
    pub context: EventContext,
    /// Public events listed for the author (zero means no activity at all).
    #[serde(default)]
    pub recent_event_count: usize,
}

impl AntispamInput {
    /// Parse the JSON document handed over by the workflow.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| DocToolsError::parse(format!("invalid antispam input: {e}")))
    }

    fn is_manual(&self) -> bool {
        self.context.event_name == MANUAL_EVENT
    }

    /// Issue fields win over pull request fields when both are present.
    fn title_and_body(&self) -> (&str, &str) {
        let issue = self.context.payload.issue.as_ref();
        let pr = self.context.payload.pull_request.as_ref();

        let title = first_non_empty([
            issue.and_then(|i| i.title.as_ref()),
            pr.and_then(|p| p.title.as_ref()),
        ]);
        let body = first_non_empty([
            issue.and_then(|i| i.body.as_ref()),
            pr.and_then(|p| p.body.as_ref()),
        ]);
        (title, body)
    }
}

fn first_non_empty<'a>(values: impl IntoIterator<Item = Option<&'a String>>) -> &'a str {
    values
        .into_iter()
        .flatten()
        .map(String::as_str)
        .find(|s| !s.is_empty())
        .unwrap_or("")
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Outcome of one heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub reason: String,
    pub passed: bool,
}

/// A moderation step for the caller to carry out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ModerationAction {
    Comment { issue_number: u64, body: String },
    Label { issue_number: u64, labels: Vec<String> },
    Close { issue_number: u64 },
}

/// Result of [`evaluate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub checks: Vec<CheckResult>,
    pub passed: usize,
    pub failed: usize,
    pub suspicious: bool,
    pub actions: Vec<ModerationAction>,
    /// Author summary, only for suspicious submissions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_report: Option<String>,
}

impl Verdict {
    pub fn failed_checks(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Run every check and plan the moderation actions.
#[instrument(skip_all, fields(actor = %input.context.actor, event = %input.context.event_name))]
pub fn evaluate(
    input: &AntispamInput,
    config: &AntispamConfig,
    now: DateTime<Utc>,
) -> Result<Verdict> {
    let user = &input.user;
    let mut checks = Vec::new();

    if config.check_account_age {
        let threshold = TimeDelta::try_hours(config.recent_account_hours)
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| {
                DocToolsError::config(format!(
                    "recent_account_hours out of range: {}",
                    config.recent_account_hours
                ))
            })?;
        checks.push(check(
            "Author account was recently created",
            user.created_at < threshold,
        ));
    }

    checks.push(check(
        "Author first contribution to any GitHub project",
        input.recent_event_count > 0,
    ));
    checks.push(check(
        "Author has no relationships",
        user.followers != 0 && user.following != 0,
    ));
    checks.push(check(
        "Author has no public repo/gist",
        user.public_repos != 0 && user.public_gists != 0,
    ));

    let too_short = if input.is_manual() {
        false
    } else {
        let (title, body) = input.title_and_body();
        // Lengths are in UTF-16 code units, as GitHub reports them.
        title.encode_utf16().count() < config.min_text_length
            || body.encode_utf16().count() < config.min_text_length
    };
    checks.push(check("Issue/PR title or body too short", !too_short));

    let failed = checks.iter().filter(|c| !c.passed).count();
    let passed = checks.len() - failed;
    let suspicious = failed > config.suspicious_criteria_tolerated;

    info!(passed, failed, suspicious, "antispam checks evaluated");

    let mut verdict = Verdict {
        checks,
        passed,
        failed,
        suspicious,
        actions: Vec::new(),
        author_report: None,
    };

    if suspicious {
        verdict.actions = plan_actions(input, config, &verdict);
        verdict.author_report = Some(author_report(user));
    }

    Ok(verdict)
}

fn check(reason: &str, passed: bool) -> CheckResult {
    let result = if passed { "PASSED" } else { "FAILED" };
    debug!(result, reason, "check");
    CheckResult {
        reason: reason.to_string(),
        passed,
    }
}

fn plan_actions(
    input: &AntispamInput,
    config: &AntispamConfig,
    verdict: &Verdict,
) -> Vec<ModerationAction> {
    if input.is_manual() {
        debug!("manual run, no actions taken");
        return Vec::new();
    }

    let Some(issue_number) = input.context.payload.number else {
        warn!("suspicious submission has no issue/PR number, no actions taken");
        return Vec::new();
    };

    let mut actions = Vec::new();
    if config.comment_if_suspicious {
        let failed: Vec<&CheckResult> = verdict.failed_checks().collect();
        actions.push(ModerationAction::Comment {
            issue_number,
            body: comment_body(&failed),
        });
    }
    if config.label_if_suspicious {
        actions.push(ModerationAction::Label {
            issue_number,
            labels: vec![SUSPICIOUS_LABEL.to_string()],
        });
    }
    if config.close_if_suspicious {
        actions.push(ModerationAction::Close { issue_number });
    }
    actions
}

// ---------------------------------------------------------------------------
// Message rendering
// ---------------------------------------------------------------------------

/// Warning comment listing the failed checks.
pub fn comment_body(failed: &[&CheckResult]) -> String {
    let reasons = failed
        .iter()
        .map(|c| format!("> - {}", c.reason))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "> [!WARNING] This issue/PR has been automatically flagged as [suspicious] as it might not meet contribution requirements.\n\
         > Please read our contribution guide before submitting.\n\
         > \n\
         > Reason(s):\n\
         > \n\
         {reasons}\n"
    )
}

/// Markdown table describing the author.
pub fn author_report(user: &GitHubUser) -> String {
    let field = |v: &Option<String>| v.clone().unwrap_or_default();

    format!(
        "> [!WARNING] About the author:\n\
         > \n\
         > | information | value |\n\
         > | ----------- | ----- |\n\
         > | email       | {} |\n\
         > | login       | {} |\n\
         > | name        | {} |\n\
         > | location    | {} |\n\
         > | blog        | {} |\n",
        field(&user.email),
        user.login,
        field(&user.name),
        field(&user.location),
        field(&user.blog),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

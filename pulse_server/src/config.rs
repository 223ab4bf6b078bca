//! Webhook service configuration — loaded once from environment variables
//! at startup and injected into the router state.

#[derive(Clone, Debug)]
pub struct WebhookConfig {
    /// Shared secret for GitHub HMAC signature validation (tokenless route).
    pub github_webhook_secret: String,
    /// Shared secret compared against the x-gitlab-token header.
    pub gitlab_webhook_secret: String,
    /// Shared secret compared against the x-jenkins-token header or `token`
    /// query parameter.
    pub jenkins_webhook_secret: String,
}

impl WebhookConfig {
    pub fn from_env() -> Self {
        let github_webhook_secret = std::env::var("PULSE_GITHUB_WEBHOOK_SECRET").unwrap_or_default();
        let gitlab_webhook_secret = std::env::var("PULSE_GITLAB_WEBHOOK_SECRET").unwrap_or_default();
        let jenkins_webhook_secret =
            std::env::var("PULSE_JENKINS_WEBHOOK_SECRET").unwrap_or_default();

        if github_webhook_secret.is_empty() {
            tracing::warn!(
                "PULSE_GITHUB_WEBHOOK_SECRET not set -- signature-mode GitHub requests will be rejected"
            );
        }
        if gitlab_webhook_secret.is_empty() {
            tracing::warn!("PULSE_GITLAB_WEBHOOK_SECRET not set -- GitLab requests will be rejected");
        }
        if jenkins_webhook_secret.is_empty() {
            tracing::warn!(
                "PULSE_JENKINS_WEBHOOK_SECRET not set -- Jenkins requests will be rejected"
            );
        }

        Self {
            github_webhook_secret,
            gitlab_webhook_secret,
            jenkins_webhook_secret,
        }
    }
}

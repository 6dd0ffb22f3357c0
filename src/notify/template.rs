use handlebars::Handlebars;
use serde::Serialize;

use crate::error::NotifyError;
use crate::types::FailedServiceRecord;

const ALERT_TEMPLATE_NAME: &str = "health_alert";

/// Renders the HTML body of a health alert.
pub struct AlertRenderer {
    handlebars: Handlebars<'static>,
    cluster_name: Option<String>,
    operations_mailbox: String,
}

#[derive(Serialize)]
struct AlertView<'a> {
    name: &'a str,
    namespace: &'a str,
    owner_email: &'a str,
    owner_dl_email: &'a str,
    detected_at: String,
    year: String,
    reason: &'a str,
    log_excerpt: &'a str,
    cluster_name: Option<&'a str>,
    operations_mailbox: &'a str,
}

pub fn alert_subject(record: &FailedServiceRecord) -> String {
    format!(
        "[URGENT] Service Health Alert: {}/{} is DOWN",
        record.workload.namespace, record.workload.name
    )
}

impl AlertRenderer {
    pub fn new(cluster_name: Option<String>, operations_mailbox: impl Into<String>) -> Result<Self, handlebars::TemplateError> {
        let mut handlebars = Handlebars::new();
        handlebars.register_template_string(ALERT_TEMPLATE_NAME, ALERT_TEMPLATE)?;
        Ok(Self {
            handlebars,
            cluster_name,
            operations_mailbox: operations_mailbox.into(),
        })
    }

    pub fn render(&self, record: &FailedServiceRecord) -> Result<String, NotifyError> {
        let view = AlertView {
            name: &record.workload.name,
            namespace: &record.workload.namespace,
            owner_email: &record.workload.owner_email,
            owner_dl_email: &record.workload.owner_dl_email,
            detected_at: record.detected_at.format("%a, %d %b %Y %H:%M:%S UTC").to_string(),
            year: record.detected_at.format("%Y").to_string(),
            reason: &record.reason,
            log_excerpt: &record.log_excerpt,
            cluster_name: self.cluster_name.as_deref(),
            operations_mailbox: &self.operations_mailbox,
        };
        Ok(self.handlebars.render(ALERT_TEMPLATE_NAME, &view)?)
    }
}

const ALERT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        body { font-family: 'Segoe UI', Arial, sans-serif; line-height: 1.6; color: #333; }
        .container { max-width: 800px; margin: 0 auto; padding: 20px; }
        .header { background: #0066cc; color: white; padding: 24px; border-radius: 8px 8px 0 0; text-align: center; }
        .header h1 { margin: 0; font-size: 22px; }
        .content { background: #f8f9fa; padding: 24px; border: 1px solid #dee2e6; border-top: none; border-radius: 0 0 8px 8px; }
        .alert-box { background: #fff3cd; border-left: 5px solid #f39c12; padding: 12px; margin: 16px 0; }
        .info-box { background: #d1ecf1; padding: 12px; margin: 16px 0; }
        .details-table { width: 100%; border-collapse: collapse; background: white; }
        .details-table th, .details-table td { padding: 10px 12px; text-align: left; border-bottom: 1px solid #dee2e6; }
        .status-badge { padding: 4px 12px; border-radius: 20px; font-size: 12px; font-weight: 600; background: #dc3545; color: white; }
        .logs-box { background: #1e1e1e; color: #d4d4d4; padding: 12px; font-family: Consolas, monospace; font-size: 12px; overflow: auto; max-height: 300px; }
        .footer { text-align: center; margin-top: 24px; color: #6c757d; font-size: 12px; }
    </style>
</head>
<body>
<div class="container">
    <div class="header">
        <h1>Kubernetes Service Health Alert</h1>
        {{#if cluster_name}}<div>Cluster: {{cluster_name}}</div>{{/if}}
    </div>
    <div class="content">
        <div class="alert-box">
            <strong>CRITICAL:</strong> One of your services has failed health checks and requires immediate attention.
        </div>

        <h2>Service Details</h2>
        <table class="details-table">
            <tr><th width="30%">Service Name</th><td><strong>{{name}}</strong></td></tr>
            <tr><th>Namespace</th><td>{{namespace}}</td></tr>
            <tr><th>Owner</th><td>{{owner_email}}</td></tr>
            <tr><th>Team DL</th><td>{{owner_dl_email}}</td></tr>
            <tr><th>Status</th><td><span class="status-badge">CRITICAL - SERVICE DOWN</span></td></tr>
            <tr><th>Detection Time</th><td>{{detected_at}}</td></tr>
        </table>

        <h2>Failure Analysis</h2>
        <div class="info-box">
            <strong>Root Cause:</strong> {{reason}}
        </div>

        {{#if log_excerpt}}
        <h2>Recent Logs</h2>
        <div class="logs-box"><pre>{{log_excerpt}}</pre></div>
        {{/if}}

        <h2>Required Actions</h2>
        <ol>
            <li>Check pod status: <code>kubectl get pods -n {{namespace}} -l app={{name}}</code></li>
            <li>Review recent deployments or configuration changes</li>
            <li>Check resource utilization (CPU/Memory)</li>
            <li>Verify network connectivity and dependencies</li>
        </ol>

        <div class="info-box">
            <strong>Support:</strong> contact <a href="mailto:{{operations_mailbox}}">{{operations_mailbox}}</a>.
        </div>
    </div>
    <div class="footer">
        This is an automated alert from the Kubernetes health sweep.<br>
        Environment: {{namespace}} &middot; {{year}}
    </div>
</div>
</body>
</html>
"#;

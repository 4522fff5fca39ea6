//! Render use cases.

use bastion_audit_types::CheckReport;

pub fn render_markdown(report: &CheckReport) -> String {
    bastion_audit_render::render_markdown(report)
}

//! The `explain` use case: look up reason code documentation.

use bastion_audit_types::explain::{self, Explanation};

/// Output from the explain use case.
#[derive(Clone, Debug)]
pub enum ExplainOutput {
    /// Found an explanation for the identifier.
    Found(Explanation),
    /// Unknown identifier; includes the available codes.
    NotFound {
        identifier: String,
        available_codes: &'static [&'static str],
    },
}

/// Look up an explanation for a reason code.
pub fn run_explain(identifier: &str) -> ExplainOutput {
    match explain::lookup_explanation(identifier) {
        Some(exp) => ExplainOutput::Found(exp),
        None => ExplainOutput::NotFound {
            identifier: identifier.to_string(),
            available_codes: explain::all_codes(),
        },
    }
}

/// Format an explanation for terminal display.
pub fn format_explanation(exp: &Explanation) -> String {
    let mut out = String::new();

    out.push_str(exp.title);
    out.push('\n');
    out.push_str(&"=".repeat(exp.title.chars().count()));
    out.push_str("\n\n");
    out.push_str(exp.description);
    out.push_str("\n\n");
    out.push_str("Remediation\n");
    out.push_str("-----------\n");
    out.push_str(exp.remediation);
    out.push('\n');

    out
}

/// Format the "not found" error message for terminal display.
pub fn format_not_found(identifier: &str, codes: &[&'static str]) -> String {
    let mut out = String::new();

    out.push_str(&format!("Unknown reason code: {}\n\n", identifier));
    out.push_str("Available codes:\n");
    for code in codes {
        out.push_str(&format!("  - {}\n", code));
    }

    out
}

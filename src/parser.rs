//! Reply parser
//!
//! Model replies are free-form text carrying two layers of structure: a
//! plan body with optional acceptance-criteria sections, and single-line
//! directives (`COMMAND:`, `NEED:`, ...) that drive the execution state
//! machine. Parsing is plain prefix matching; anything unrecognized is
//! opaque success text.

use crate::types::Step;

/// Raw-line-index cap for plan parsing: lines past this index never become
/// steps, as a safety rail against runaway plans.
pub const PLAN_LINE_CAP: usize = 10;

/// Parse a planning reply into steps and acceptance criteria.
///
/// Non-empty lines are scanned in order. `PLAN:` switches to plan-body
/// mode, `ACCEPTANCE`/`ACCEPT:`/`CRITERIA` switches to acceptance mode
/// (text after the header colon becomes the first criterion). Acceptance
/// lines lose a leading `- ` bullet; plan lines are collected verbatim.
/// Empty input yields empty sequences.
pub fn parse_plan(plan: &str) -> (Vec<Step>, Vec<String>) {
    parse_plan_with_limit(plan, PLAN_LINE_CAP)
}

/// [`parse_plan`] with an explicit line cap, for callers that tolerate
/// longer plans.
pub fn parse_plan_with_limit(plan: &str, line_cap: usize) -> (Vec<Step>, Vec<String>) {
    let mut steps = Vec::new();
    let mut acceptance = Vec::new();
    let mut in_acceptance = false;

    for (i, line) in plan.lines().enumerate() {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if starts_with_ci(text, "PLAN:") {
            in_acceptance = false;
            continue;
        }
        if starts_with_ci(text, "ACCEPTANCE")
            || starts_with_ci(text, "ACCEPT:")
            || starts_with_ci(text, "CRITERIA")
        {
            in_acceptance = true;
            if let Some((_, rest)) = text.split_once(':') {
                let rest = rest.trim();
                if !rest.is_empty() {
                    acceptance.push(rest.to_string());
                }
            }
            continue;
        }
        if in_acceptance {
            acceptance.push(text.strip_prefix("- ").unwrap_or(text).to_string());
            continue;
        }
        if i > line_cap {
            break;
        }
        steps.push(Step::new(steps.len() + 1, text));
    }

    (steps, acceptance)
}

/// Structured directive extracted from an execution or verification reply
///
/// Prefix matching is case-insensitive; payloads keep their original
/// casing, trimmed. Replies with no recognized prefix are [`Opaque`] and
/// are treated as success text by the executor.
///
/// [`Opaque`]: Directive::Opaque
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `COMMAND: <cmd>` — a shell command proposal
    Command(String),
    /// `NEED: <info>` — missing information
    Need(String),
    /// `DEPENDENCY: <dep>` — something must be installed or prepared
    Dependency(String),
    Blocked,
    Error,
    Pass,
    Success,
    Fail,
    Opaque,
}

impl Directive {
    /// Classify a model reply.
    pub fn parse(reply: &str) -> Self {
        let text = reply.trim();
        if let Some(rest) = strip_prefix_ci(text, "COMMAND:") {
            return Directive::Command(rest.trim().to_string());
        }
        if let Some(rest) = strip_prefix_ci(text, "NEED:") {
            return Directive::Need(rest.trim().to_string());
        }
        if let Some(rest) = strip_prefix_ci(text, "DEPENDENCY:") {
            return Directive::Dependency(rest.trim().to_string());
        }
        if starts_with_ci(text, "BLOCKED") {
            return Directive::Blocked;
        }
        if starts_with_ci(text, "ERROR") {
            return Directive::Error;
        }
        if starts_with_ci(text, "PASS") {
            return Directive::Pass;
        }
        if starts_with_ci(text, "SUCCESS") {
            return Directive::Success;
        }
        if starts_with_ci(text, "FAIL") {
            return Directive::Fail;
        }
        Directive::Opaque
    }
}

fn starts_with_ci(text: &str, prefix: &str) -> bool {
    strip_prefix_ci(text, prefix).is_some()
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if text.len() < prefix.len() || !text.is_char_boundary(prefix.len()) {
        return None;
    }
    let (head, rest) = text.split_at(prefix.len());
    if head.eq_ignore_ascii_case(prefix) {
        Some(rest)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StepStatus;

    #[test]
    fn test_parse_plan_numbered_lines() {
        let (steps, acceptance) = parse_plan("1) first\n2) second\n3) third");
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].id, "step-1");
        assert_eq!(steps[0].title, "1) first");
        assert_eq!(steps[2].id, "step-3");
        assert_eq!(steps[0].status, StepStatus::Pending);
        assert!(acceptance.is_empty());
    }

    #[test]
    fn test_parse_plan_skips_blank_lines_and_plan_header() {
        let (steps, acceptance) = parse_plan("PLAN:\n\n1) only step\n");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].title, "1) only step");
        assert!(acceptance.is_empty());
    }

    #[test]
    fn test_parse_plan_accept_header_with_inline_criterion() {
        let (steps, acceptance) = parse_plan("1) build it\nACCEPT: tests pass");
        assert_eq!(steps.len(), 1);
        assert_eq!(acceptance, vec!["tests pass".to_string()]);
    }

    #[test]
    fn test_parse_plan_acceptance_block_strips_bullets() {
        let input = "1) build\nACCEPTANCE CRITERIA:\n- binary compiles\n- tests pass\nextra criterion";
        let (steps, acceptance) = parse_plan(input);
        assert_eq!(steps.len(), 1);
        assert_eq!(
            acceptance,
            vec![
                "binary compiles".to_string(),
                "tests pass".to_string(),
                "extra criterion".to_string()
            ]
        );
    }

    #[test]
    fn test_parse_plan_bare_acceptance_header_adds_nothing() {
        let (_, acceptance) = parse_plan("1) build\nACCEPTANCE:\n- done");
        assert_eq!(acceptance, vec!["done".to_string()]);
    }

    #[test]
    fn test_parse_plan_plan_header_exits_acceptance_mode() {
        let input = "ACCEPT: early criterion\nPLAN:\n1) late step";
        let (steps, acceptance) = parse_plan(input);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].title, "1) late step");
        assert_eq!(acceptance, vec!["early criterion".to_string()]);
    }

    #[test]
    fn test_parse_plan_case_insensitive_headers() {
        let (steps, acceptance) = parse_plan("plan:\n1) a\naccept: b");
        assert_eq!(steps.len(), 1);
        assert_eq!(acceptance, vec!["b".to_string()]);
    }

    #[test]
    fn test_parse_plan_caps_at_raw_line_index() {
        let lines: Vec<String> = (0..20).map(|i| format!("{}) step", i + 1)).collect();
        let (steps, _) = parse_plan(&lines.join("\n"));
        // Only raw lines 0..=10 become steps.
        assert_eq!(steps.len(), 11);
        assert_eq!(steps.last().unwrap().id, "step-11");
    }

    #[test]
    fn test_parse_plan_with_limit_knob() {
        let lines: Vec<String> = (0..20).map(|i| format!("{}) step", i + 1)).collect();
        let (steps, _) = parse_plan_with_limit(&lines.join("\n"), 2);
        assert_eq!(steps.len(), 3);
    }

    #[test]
    fn test_parse_plan_empty_input() {
        let (steps, acceptance) = parse_plan("");
        assert!(steps.is_empty());
        assert!(acceptance.is_empty());
    }

    #[test]
    fn test_directive_command_payload_keeps_casing() {
        assert_eq!(
            Directive::parse("COMMAND: echo Hello"),
            Directive::Command("echo Hello".to_string())
        );
        assert_eq!(
            Directive::parse("  command: ls -la  "),
            Directive::Command("ls -la".to_string())
        );
    }

    #[test]
    fn test_directive_need_and_dependency() {
        assert_eq!(
            Directive::parse("NEED: Which OS?"),
            Directive::Need("Which OS?".to_string())
        );
        assert_eq!(
            Directive::parse("Dependency: docker must be installed"),
            Directive::Dependency("docker must be installed".to_string())
        );
    }

    #[test]
    fn test_directive_bare_prefixes() {
        assert_eq!(Directive::parse("BLOCKED: missing creds"), Directive::Blocked);
        assert_eq!(Directive::parse("error while reading"), Directive::Error);
        assert_eq!(Directive::parse("PASS: all good"), Directive::Pass);
        assert_eq!(Directive::parse("SUCCESS: done"), Directive::Success);
        assert_eq!(Directive::parse("FAIL: missing output"), Directive::Fail);
    }

    #[test]
    fn test_directive_opaque_for_plain_text() {
        assert_eq!(Directive::parse("All wrapped up."), Directive::Opaque);
        assert_eq!(Directive::parse(""), Directive::Opaque);
    }

    #[test]
    fn test_directive_command_requires_colon() {
        // "COMMAND echo hi" has no colon, so it falls through to opaque.
        assert_eq!(Directive::parse("COMMAND echo hi"), Directive::Opaque);
    }

    #[test]
    fn test_directive_handles_multibyte_text() {
        assert_eq!(Directive::parse("día perfecto"), Directive::Opaque);
        assert_eq!(Directive::parse("ñ"), Directive::Opaque);
    }
}

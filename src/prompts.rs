//! Prompt templates
//!
//! Model prompts are rendered from five named minijinja templates loaded
//! from a directory at startup (`plan`, `execute_step`, `propose_command`,
//! `unblock`, `verify`). A missing or unparsable template is a startup
//! error. Rendering is a pure function of the template and its context.

use crate::error::Result;
use anyhow::Context;
use minijinja::{context, Environment};
use std::fs;
use std::path::Path;

/// The template files that must exist in the prompts directory.
pub const TEMPLATE_NAMES: [&str; 5] = [
    "plan",
    "execute_step",
    "propose_command",
    "unblock",
    "verify",
];

/// Compiled prompt templates for the orchestrator
#[derive(Debug)]
pub struct PromptSet {
    env: Environment<'static>,
}

impl PromptSet {
    /// Load all templates from `dir`.
    ///
    /// # Errors
    ///
    /// Fails if any of the five template files is missing or does not
    /// parse. Callers treat this as fatal at startup.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut env = Environment::new();
        for name in TEMPLATE_NAMES {
            let path = dir.join(name);
            let source = fs::read_to_string(&path)
                .with_context(|| format!("read prompt template {}", path.display()))?;
            env.add_template_owned(name.to_string(), source)
                .with_context(|| format!("parse prompt template {}", path.display()))?;
        }
        Ok(Self { env })
    }

    /// The compiled-in copies of the shipped templates.
    ///
    /// Used by tests and by embedders that do not carry a prompts
    /// directory.
    pub fn builtin() -> Self {
        let sources = [
            ("plan", include_str!("../prompts/plan")),
            ("execute_step", include_str!("../prompts/execute_step")),
            ("propose_command", include_str!("../prompts/propose_command")),
            ("unblock", include_str!("../prompts/unblock")),
            ("verify", include_str!("../prompts/verify")),
        ];
        let mut env = Environment::new();
        for (name, source) in sources {
            env.add_template(name, source)
                .expect("invalid builtin prompt template");
        }
        Self { env }
    }

    /// Seed prompt asking for a numbered plan plus `ACCEPT:` lines
    pub fn plan(&self, prompt: &str) -> Result<String> {
        self.render("plan", context! { prompt })
    }

    /// Step-execution prompt; the reply must carry one directive
    pub fn execute_step(
        &self,
        prompt: &str,
        plan_text: &str,
        acceptance_criteria: &str,
        recent_context: &str,
        step_title: &str,
    ) -> Result<String> {
        self.render(
            "execute_step",
            context! { prompt, plan_text, acceptance_criteria, recent_context, step_title },
        )
    }

    /// Discovery prompt requesting a single `COMMAND:` with no prose;
    /// `kind` is `info` or `dependency`
    pub fn propose_command(
        &self,
        prompt: &str,
        need: &str,
        plan_text: &str,
        recent_context: &str,
        kind: &str,
    ) -> Result<String> {
        self.render(
            "propose_command",
            context! { prompt, need, plan_text, recent_context, kind },
        )
    }

    /// Replanning prompt after a blocked step or failed verification
    pub fn unblock(
        &self,
        prompt: &str,
        step_title: &str,
        reason: &str,
        plan_text: &str,
    ) -> Result<String> {
        self.render("unblock", context! { prompt, step_title, reason, plan_text })
    }

    /// Acceptance verification prompt expecting `PASS:` or `FAIL:`
    pub fn verify(&self, prompt: &str, checklist: &str, recent_context: &str) -> Result<String> {
        self.render("verify", context! { prompt, checklist, recent_context })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        let template = self.env.get_template(name)?;
        let rendered = template
            .render(ctx)
            .with_context(|| format!("render prompt template {}", name))?;
        Ok(rendered)
    }
}

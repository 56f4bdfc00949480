//! Conversation orchestrator
//!
//! Owns the conversation state machine: planning, plan approval, the
//! step-advancement loop, discovery sub-calls for missing info and
//! dependencies, command approval gates, acceptance verification, and
//! replanning after blocks. Every model invocation is recorded in the
//! conversation's `model_calls` ledger and every command output becomes an
//! artifact. State is persisted to the store after each transition and
//! observability events are published to the broker.
//!
//! Advancement is strictly one gated step per orchestrator call: the
//! advance loop returns as soon as the conversation leaves `executing`.
//! There is no per-conversation lock; two clients driving the same session
//! concurrently serialize only on individual store operations.

use crate::error::{Result, TillerError};
use crate::model::{ModelDriver, ModelReply};
use crate::obs::{Broker, Event, EventKind};
use crate::parser::{parse_plan, Directive};
use crate::prompts::PromptSet;
use crate::shell::ShellExecutor;
use crate::store::ConversationStore;
use crate::types::{
    Artifact, Conversation, ConversationState, InboxItem, Message, ModelCall, StepStatus,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use ulid::Ulid;

/// Log-entry window for step-execution context
const EXEC_CONTEXT_LOGS: usize = 5;
/// Log-entry window for acceptance verification context
const VERIFY_CONTEXT_LOGS: usize = 8;

/// The orchestration service
pub struct Service {
    store: Arc<dyn ConversationStore>,
    model: Arc<dyn ModelDriver>,
    shell: Arc<dyn ShellExecutor>,
    broker: Option<Arc<Broker>>,
    prompts: PromptSet,
}

impl Service {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        model: Arc<dyn ModelDriver>,
        shell: Arc<dyn ShellExecutor>,
        broker: Option<Arc<Broker>>,
        prompts: PromptSet,
    ) -> Self {
        Self {
            store,
            model,
            shell,
            broker,
            prompts,
        }
    }

    /// Legacy placeholder for old clients; conversations are created by
    /// [`Service::create_conversation`] or the free-chat send path.
    pub fn start(&self) -> Result<String> {
        Ok(String::new())
    }

    /// Seed a plan from the model and park the conversation in
    /// `awaiting_plan_approval`.
    ///
    /// A model failure aborts the call; nothing is persisted.
    pub async fn create_conversation(&self, prompt: &str) -> Result<Conversation> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(TillerError::Validation("prompt is required".to_string()).into());
        }
        let plan_prompt = self.prompts.plan(prompt)?;
        let reply = self.model.send("", &plan_prompt).await?;
        let (steps, acceptance) = parse_plan(&reply.reply);

        let conv = Conversation {
            session_id: reply.session_id.clone(),
            prompt: prompt.to_string(),
            state: ConversationState::AwaitingPlanApproval,
            plan_version: 1,
            plan_text: reply.reply.clone(),
            acceptance_criteria: acceptance,
            awaiting_reason: "Awaiting plan approval".to_string(),
            steps,
            model_calls: vec![model_call(&plan_prompt, &reply)],
            ..Default::default()
        };
        self.store.save(&conv)?;
        info!(session = %conv.session_id, steps = conv.steps.len(), "plan created");

        let mut event = Event::new(EventKind::Plan, &conv.session_id);
        event.prompt = conv.prompt.clone();
        event.model_prompt = plan_prompt;
        event.plan_text = conv.plan_text.clone();
        event.raw_output = reply.raw_output;
        self.emit(event);
        Ok(conv)
    }

    /// Release an approved plan into execution.
    pub async fn approve_plan(&self, session_id: &str) -> Result<Conversation> {
        let mut conv = self.store.get(session_id)?;
        if conv.state != ConversationState::AwaitingPlanApproval {
            return Err(
                TillerError::State("conversation not awaiting plan approval".to_string()).into(),
            );
        }
        conv.state = ConversationState::Executing;
        conv.awaiting_reason.clear();
        self.store.save(&conv)?;
        self.advance_execution(conv).await
    }

    /// Move a waiting conversation back into execution.
    ///
    /// A no-op (returning the current record) unless the state is one of
    /// the resumable waiting states.
    pub async fn resume(&self, session_id: &str) -> Result<Conversation> {
        let mut conv = self.store.get(session_id)?;
        if !conv.state.is_resumable() {
            return Ok(conv);
        }
        conv.state = ConversationState::Executing;
        conv.awaiting_reason.clear();
        self.store.save(&conv)?;
        self.advance_execution(conv).await
    }

    /// Free-chat and info-unblock dual-use send.
    ///
    /// For a conversation in `awaiting_info`, the message is treated as the
    /// operator-supplied answer: it is logged as `USER_INFO`, the pending
    /// gate clears, and execution resumes; the returned call is the newest
    /// model call of the advanced conversation. Any other target (or an
    /// empty id, which creates a chat-only record) is plain chat.
    pub async fn send(&self, session_id: &str, message: &str) -> Result<ModelCall> {
        let message = message.trim();
        if message.is_empty() {
            return Err(TillerError::Validation("message is required".to_string()).into());
        }
        let mut conv = if session_id.is_empty() {
            Conversation::default()
        } else {
            self.store.get(session_id)?
        };

        if conv.state == ConversationState::AwaitingInfo {
            return self.provide_info(conv, message).await;
        }

        conv.messages.push(Message::user(message));
        let reply = self.model.send(&conv.session_id, message).await?;
        let call = model_call(message, &reply);
        conv.session_id = reply.session_id.clone();
        conv.messages.push(Message::assistant(&reply.reply));
        conv.model_calls.push(call.clone());
        self.store.save(&conv)?;

        let mut event = Event::new(EventKind::Chat, &conv.session_id);
        event.prompt = message.to_string();
        event.model_prompt = message.to_string();
        event.reply = reply.reply;
        event.raw_output = reply.raw_output;
        self.emit(event);
        Ok(call)
    }

    /// All stored session ids
    pub fn list(&self) -> Result<Vec<String>> {
        self.store.list_ids()
    }

    /// Fetch a conversation snapshot
    pub fn get(&self, session_id: &str) -> Result<Conversation> {
        self.store.get(session_id)
    }

    /// Delete a conversation; unknown ids are ignored
    pub fn close(&self, session_id: &str) -> Result<()> {
        self.store.delete(session_id)
    }

    /// Execute the pending command of a step after operator approval.
    ///
    /// The combined output is logged after an `EXEC:` marker and captured
    /// as an artifact in every case. On success the step completes and
    /// execution re-advances; on failure the conversation parks in
    /// `blocked` and is still returned without error.
    pub async fn approve_command(&self, session_id: &str, step_id: &str) -> Result<Conversation> {
        let mut conv = self.store.get(session_id)?;
        let Some(idx) = conv.steps.iter().position(|s| s.id == step_id) else {
            return Err(TillerError::Validation(format!("step {} not found", step_id)).into());
        };
        if conv.steps[idx].pending_command.is_empty() {
            return Err(TillerError::Validation(format!(
                "no pending command for step {}",
                step_id
            ))
            .into());
        }
        let pending = conv.steps[idx].pending_command.clone();

        let run = self.shell.run(&pending).await;
        let (output, failure) = match run {
            Ok(out) if out.success() => (out.output, None),
            Ok(out) => {
                let desc = out.exit_description();
                (out.output, Some(desc))
            }
            Err(e) => (String::new(), Some(e.to_string())),
        };

        {
            let step = &mut conv.steps[idx];
            step.logs.push(format!("EXEC: {}", pending));
            step.logs.push(output.clone());
            step.pending_command.clear();
        }
        let artifact_id = self.add_artifact(
            &mut conv,
            "Command output",
            &format!("Output for `{}`", pending),
            &output,
            &pending,
        );

        let mut event = Event::new(EventKind::Command, &conv.session_id);
        event.step_id = conv.steps[idx].id.clone();
        event.step_title = conv.steps[idx].title.clone();
        event.command = pending.clone();
        event.raw_output = output;
        event.artifact_id = artifact_id;

        if let Some(failure) = failure {
            warn!(session = %conv.session_id, step = %step_id, %failure, "approved command failed");
            conv.steps[idx].status = StepStatus::Blocked;
            conv.state = ConversationState::Blocked;
            conv.awaiting_reason = format!("Command failed: {}", failure);
            let _ = self.store.save(&conv);
            event.note = format!("ERROR: {}", failure);
            self.emit(event);
            return Ok(conv);
        }

        info!(session = %conv.session_id, step = %step_id, command = %pending, "approved command succeeded");
        conv.steps[idx].status = StepStatus::Done;
        conv.steps[idx].completed_at = Some(Utc::now());
        conv.state = ConversationState::Executing;
        conv.awaiting_reason.clear();
        self.store.save(&conv)?;
        event.note = "SUCCESS".to_string();
        self.emit(event);
        self.advance_execution(conv).await
    }

    /// One-shot convenience: plan, auto-approve, and run to a terminal or
    /// waiting state.
    pub async fn plan_and_execute(&self, prompt: &str) -> Result<String> {
        let mut conv = self.create_conversation(prompt).await?;
        conv.state = ConversationState::Executing;
        conv.awaiting_reason.clear();
        self.store.save(&conv)?;
        let conv = self.advance_execution(conv).await?;
        Ok(format!(
            "Conversation {} completed with state {}",
            conv.session_id, conv.state
        ))
    }

    /// Project every conversation needing operator attention.
    ///
    /// Waiting conversations surface with their gating step and pending
    /// field; completed conversations surface for audit while they carry a
    /// completion message.
    pub fn list_inbox(&self) -> Result<Vec<InboxItem>> {
        let ids = self.store.list_ids()?;
        let mut inbox = Vec::new();
        for id in ids {
            let Ok(conv) = self.store.get(&id) else {
                continue;
            };
            let mut item = InboxItem {
                session_id: conv.session_id.clone(),
                state: conv.state,
                awaiting_reason: conv.awaiting_reason.clone(),
                prompt: conv.prompt.clone(),
                completed_message: conv.completed_message.clone(),
                completed_at: conv.completed_at,
                ..Default::default()
            };
            match conv.state {
                ConversationState::AwaitingPlanApproval
                | ConversationState::AwaitingStepApproval
                | ConversationState::Replanning => inbox.push(item),
                ConversationState::AwaitingCommand | ConversationState::Blocked => {
                    if let Some(step) =
                        conv.steps.iter().find(|s| !s.pending_command.is_empty())
                    {
                        item.step_id = step.id.clone();
                        item.step_title = step.title.clone();
                        item.pending_command = step.pending_command.clone();
                        inbox.push(item);
                    }
                }
                ConversationState::AwaitingInfo => {
                    if let Some(step) = conv
                        .steps
                        .iter()
                        .find(|s| !s.pending_info.is_empty() || !s.pending_dependency.is_empty())
                    {
                        item.step_id = step.id.clone();
                        item.step_title = step.title.clone();
                        item.pending_info = step.pending_info.clone();
                        item.pending_dependency = step.pending_dependency.clone();
                        inbox.push(item);
                    }
                }
                ConversationState::Completed => {
                    if !conv.completed_message.is_empty() {
                        inbox.push(item);
                    }
                }
                _ => {}
            }
        }
        Ok(inbox)
    }

    /// Walk the step list from the first unfinished step, one gate at a
    /// time, committing state after each transition. Returns as soon as
    /// the conversation leaves `executing`.
    async fn advance_execution(&self, mut conv: Conversation) -> Result<Conversation> {
        let mut idx = 0;
        while idx < conv.steps.len() {
            if conv.steps[idx].status == StepStatus::Done {
                idx += 1;
                continue;
            }
            if conv.steps[idx].requires_approval {
                conv.state = ConversationState::AwaitingStepApproval;
                conv.awaiting_reason =
                    format!("Awaiting manual approval for step {}", conv.steps[idx].title);
                self.store.save(&conv)?;
                return Ok(conv);
            }

            conv.steps[idx].status = StepStatus::InProgress;
            conv.steps[idx].started_at = Some(Utc::now());
            let recent = summarize_logs(&conv, EXEC_CONTEXT_LOGS);
            let exec_prompt = self.prompts.execute_step(
                &conv.prompt,
                &conv.plan_text,
                &conv.acceptance_criteria.join("; "),
                &recent,
                &conv.steps[idx].title,
            )?;

            let outcome = self.model.send(&conv.session_id, &exec_prompt).await;
            let (reply, send_err) = match outcome {
                Ok(reply) => {
                    conv.session_id = reply.session_id.clone();
                    conv.model_calls.push(model_call(&exec_prompt, &reply));
                    (reply, None)
                }
                Err(e) => {
                    // Failed invocations still enter the ledger.
                    conv.model_calls.push(ModelCall {
                        prompt: exec_prompt.clone(),
                        timestamp: Some(Utc::now()),
                        session_id: conv.session_id.clone(),
                        ..Default::default()
                    });
                    (
                        ModelReply {
                            reply: String::new(),
                            raw_output: String::new(),
                            session_id: conv.session_id.clone(),
                            duration_ms: 0,
                        },
                        Some(e),
                    )
                }
            };
            conv.steps[idx].logs.push(reply.reply.clone());
            conv.steps[idx].completed_at = Some(Utc::now());

            let mut event = Event::new(EventKind::Step, &conv.session_id);
            event.prompt = conv.prompt.clone();
            event.model_prompt = exec_prompt;
            event.step_id = conv.steps[idx].id.clone();
            event.step_title = conv.steps[idx].title.clone();
            event.raw_output = reply.raw_output.clone();
            event.reply = reply.reply.clone();

            let directive = Directive::parse(&reply.reply);
            match directive {
                Directive::Command(cmd) if send_err.is_none() => {
                    debug!(session = %conv.session_id, step = %conv.steps[idx].id, %cmd, "step proposed a command");
                    conv.steps[idx].pending_command = cmd.clone();
                    conv.steps[idx].status = StepStatus::Blocked;
                    conv.state = ConversationState::AwaitingCommand;
                    conv.awaiting_reason = format!("Awaiting approval to run: {}", cmd);
                    event.command = cmd;
                    event.note = "COMMAND_REQUEST".to_string();
                    self.emit(event);
                    self.store.save(&conv)?;
                    return Ok(conv);
                }
                Directive::Need(need) if send_err.is_none() => {
                    let (cmd, call) = self.propose_discovery_command(&conv, &need, "info").await?;
                    conv.model_calls.push(call);
                    if !cmd.is_empty() {
                        conv.steps[idx].pending_command = cmd.clone();
                        conv.steps[idx].status = StepStatus::Blocked;
                        conv.state = ConversationState::AwaitingCommand;
                        conv.awaiting_reason = format!("Awaiting approval to gather info: {}", need);
                        event.command = cmd;
                        event.note = "INFO_COMMAND_REQUEST".to_string();
                        self.emit(event);
                        self.store.save(&conv)?;
                        return Ok(conv);
                    }
                    conv.steps[idx].pending_info = need.clone();
                    conv.steps[idx].status = StepStatus::Blocked;
                    conv.state = ConversationState::AwaitingInfo;
                    conv.awaiting_reason = format!("Needs info: {}", need);
                    event.note = conv.awaiting_reason.clone();
                    self.emit(event);
                    self.store.save(&conv)?;
                    return Ok(conv);
                }
                Directive::Dependency(dep) if send_err.is_none() => {
                    let (cmd, call) =
                        self.propose_discovery_command(&conv, &dep, "dependency").await?;
                    conv.model_calls.push(call);
                    if !cmd.is_empty() {
                        conv.steps[idx].pending_command = cmd.clone();
                        conv.steps[idx].status = StepStatus::Blocked;
                        conv.state = ConversationState::AwaitingCommand;
                        conv.awaiting_reason =
                            format!("Awaiting approval to satisfy dependency: {}", dep);
                        event.command = cmd;
                        event.note = "DEPENDENCY_COMMAND_REQUEST".to_string();
                        self.emit(event);
                        self.store.save(&conv)?;
                        return Ok(conv);
                    }
                    conv.steps[idx].pending_dependency = dep.clone();
                    conv.steps[idx].status = StepStatus::Blocked;
                    conv.state = ConversationState::AwaitingInfo;
                    conv.awaiting_reason = format!("Dependency required: {}", dep);
                    event.note = conv.awaiting_reason.clone();
                    self.emit(event);
                    self.store.save(&conv)?;
                    return Ok(conv);
                }
                _ if send_err.is_some()
                    || matches!(directive, Directive::Blocked | Directive::Error) =>
                {
                    conv.steps[idx].status = StepStatus::Blocked;
                    conv.state = ConversationState::Replanning;
                    conv.awaiting_reason = match &send_err {
                        Some(e) => format!("Execution blocked: {}", e),
                        None => format!("Execution blocked: {}", reply.reply),
                    };
                    warn!(session = %conv.session_id, step = %conv.steps[idx].id, reason = %conv.awaiting_reason, "step blocked, replanning");
                    event.note = conv.awaiting_reason.clone();
                    self.emit(event);
                    self.store.save(&conv)?;
                    let reason = conv.awaiting_reason.clone();
                    let title = conv.steps[idx].title.clone();
                    self.resolve_block(&mut conv, &reason, &title).await?;
                    return Ok(conv);
                }
                _ => {
                    conv.steps[idx].status = StepStatus::Done;
                    conv.state = ConversationState::Executing;
                    conv.awaiting_reason.clear();
                    event.note = "SUCCESS".to_string();
                    self.emit(event);
                    self.store.save(&conv)?;
                }
            }
        }

        if conv.acceptance_criteria.is_empty() {
            return self.complete_conversation(conv);
        }
        conv.state = ConversationState::Verifying;
        conv.awaiting_reason = "Verifying acceptance criteria".to_string();
        self.store.save(&conv)?;
        self.verify_acceptance(conv).await
    }

    fn complete_conversation(&self, mut conv: Conversation) -> Result<Conversation> {
        conv.state = ConversationState::Completed;
        conv.awaiting_reason.clear();
        let mut final_reply = conv
            .model_calls
            .last()
            .map(|call| call.reply.clone())
            .unwrap_or_default();
        if final_reply.is_empty() {
            if let Some(log) = conv.steps.last().and_then(|s| s.logs.last()) {
                final_reply = log.clone();
            }
        }
        conv.completed_message = "Plan completed successfully.".to_string();
        if !final_reply.is_empty() {
            conv.completed_message
                .push_str(&format!(" Last response: {}", final_reply));
        }
        conv.completed_at = Some(Utc::now());
        self.store.save(&conv)?;
        info!(session = %conv.session_id, "conversation completed");
        Ok(conv)
    }

    /// Ask the model to judge the acceptance checklist against recent
    /// execution context; pass completes the conversation, anything else
    /// replans.
    async fn verify_acceptance(&self, mut conv: Conversation) -> Result<Conversation> {
        let checklist = checklist(&conv.acceptance_criteria);
        let recent = summarize_logs(&conv, VERIFY_CONTEXT_LOGS);
        let verify_prompt = self.prompts.verify(&conv.prompt, &checklist, &recent)?;

        let reply = match self.model.send(&conv.session_id, &verify_prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                conv.state = ConversationState::Blocked;
                conv.awaiting_reason = format!("Verification failed: {}", e);
                let _ = self.store.save(&conv);
                return Err(e);
            }
        };
        conv.session_id = reply.session_id.clone();
        conv.model_calls.push(model_call(&verify_prompt, &reply));

        match Directive::parse(&reply.reply) {
            Directive::Pass | Directive::Success => {
                info!(session = %conv.session_id, "acceptance criteria satisfied");
                conv.completed_message =
                    format!("Acceptance criteria satisfied. {}", reply.reply);
                conv.completed_at = Some(Utc::now());
                conv.state = ConversationState::Completed;
                conv.awaiting_reason.clear();
                self.store.save(&conv)?;
                Ok(conv)
            }
            _ => {
                warn!(session = %conv.session_id, reply = %reply.reply, "verification failed, replanning");
                conv.state = ConversationState::Replanning;
                conv.awaiting_reason = format!("Verification failed: {}", reply.reply);
                self.store.save(&conv)?;
                self.resolve_block(&mut conv, &reply.reply, "acceptance verification")
                    .await?;
                Ok(conv)
            }
        }
    }

    /// Auxiliary discovery call for NEED/DEPENDENCY directives.
    ///
    /// The call is recorded regardless of outcome; only a reply beginning
    /// `COMMAND:` yields a command. Attempted at most once per directive.
    async fn propose_discovery_command(
        &self,
        conv: &Conversation,
        need: &str,
        kind: &str,
    ) -> Result<(String, ModelCall)> {
        let recent = summarize_logs(conv, EXEC_CONTEXT_LOGS);
        let prompt = self
            .prompts
            .propose_command(&conv.prompt, need, &conv.plan_text, &recent, kind)?;
        match self.model.send(&conv.session_id, &prompt).await {
            Ok(reply) => {
                let call = model_call(&prompt, &reply);
                match Directive::parse(&reply.reply) {
                    Directive::Command(cmd) => Ok((cmd, call)),
                    _ => Ok((String::new(), call)),
                }
            }
            Err(e) => {
                debug!(session = %conv.session_id, error = %e, "discovery call failed");
                let call = ModelCall {
                    prompt,
                    timestamp: Some(Utc::now()),
                    session_id: conv.session_id.clone(),
                    ..Default::default()
                };
                Ok((String::new(), call))
            }
        }
    }

    /// Replan after a block: a fresh plan replaces the step set and
    /// acceptance criteria atomically with the version bump, and the user
    /// regains final authority over the new plan.
    async fn resolve_block(
        &self,
        conv: &mut Conversation,
        reason: &str,
        step_title: &str,
    ) -> Result<()> {
        let prompt = self
            .prompts
            .unblock(&conv.prompt, step_title, reason, &conv.plan_text)?;
        let reply = self.model.send(&conv.session_id, &prompt).await?;
        conv.session_id = reply.session_id.clone();
        conv.plan_text = reply.reply.clone();
        let (steps, acceptance) = parse_plan(&reply.reply);
        conv.steps = steps;
        conv.acceptance_criteria = acceptance;
        conv.plan_version += 1;
        conv.state = ConversationState::AwaitingPlanApproval;
        conv.awaiting_reason = "Awaiting plan approval after block".to_string();
        conv.model_calls.push(model_call(&prompt, &reply));
        self.store.save(conv)?;
        info!(session = %conv.session_id, version = conv.plan_version, "replanned after block");

        let mut event = Event::new(EventKind::Plan, &conv.session_id);
        event.prompt = conv.prompt.clone();
        event.model_prompt = prompt;
        event.plan_text = conv.plan_text.clone();
        event.raw_output = reply.raw_output;
        event.note = "Block resolution plan".to_string();
        self.emit(event);
        Ok(())
    }

    /// Operator answered an `awaiting_info` gate: log the answer, clear
    /// the gate, and resume execution.
    async fn provide_info(&self, mut conv: Conversation, message: &str) -> Result<ModelCall> {
        if let Some(step) = conv
            .steps
            .iter_mut()
            .find(|s| !s.pending_info.is_empty() || !s.pending_dependency.is_empty())
        {
            step.logs.push(format!("USER_INFO: {}", message));
            step.pending_info.clear();
            step.pending_dependency.clear();
        }
        conv.state = ConversationState::Executing;
        conv.awaiting_reason.clear();
        self.store.save(&conv)?;
        let conv = self.advance_execution(conv).await?;
        conv.model_calls
            .last()
            .cloned()
            .ok_or_else(|| TillerError::State("no model call after resume".to_string()).into())
    }

    fn add_artifact(
        &self,
        conv: &mut Conversation,
        title: &str,
        description: &str,
        content: &str,
        source: &str,
    ) -> String {
        let artifact = Artifact {
            id: format!("artifact-{}", Ulid::new()),
            title: title.to_string(),
            description: description.to_string(),
            content: content.to_string(),
            source: source.to_string(),
            created_at: Some(Utc::now()),
        };
        let id = artifact.id.clone();
        conv.artifacts.push(artifact);
        id
    }

    fn emit(&self, event: Event) {
        if let Some(broker) = &self.broker {
            broker.publish(event);
        }
    }
}

fn model_call(prompt: &str, reply: &ModelReply) -> ModelCall {
    ModelCall {
        prompt: prompt.to_string(),
        raw_output: reply.raw_output.clone(),
        reply: reply.reply.clone(),
        timestamp: Some(Utc::now()),
        duration_ms: reply.duration_ms,
        session_id: reply.session_id.clone(),
    }
}

/// Render the most recent `max` step-log entries, newest last, as
/// `<step_title>: <log>` lines; `"None"` when there is no context yet.
fn summarize_logs(conv: &Conversation, max: usize) -> String {
    let mut entries = Vec::new();
    'outer: for step in conv.steps.iter().rev() {
        for log in step.logs.iter().rev() {
            if entries.len() >= max {
                break 'outer;
            }
            entries.push(format!("{}: {}", step.title, log));
        }
    }
    if entries.is_empty() {
        return "None".to_string();
    }
    entries.reverse();
    entries.join("\n")
}

fn checklist(criteria: &[String]) -> String {
    if criteria.is_empty() {
        return "-".to_string();
    }
    format!("- {}", criteria.join("\n- "))
}

//! Interactive trigger installation.
//!
//! A `Session` walks the operator through every uncovered soft-delete
//! relation, one at a time. Decisions come from the pure `state::transition`
//! function; this module carries out the resulting effects against the
//! executor, and `run` pumps terminal lines into the session.

pub mod state;

use std::collections::VecDeque;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::config::{CascadeConfig, FilterConfig};
use crate::error::{CascadeError, Result};
use crate::interfaces::StatementExecutor;
use crate::introspect::{ForeignKeyRelation, Introspector};
use crate::trigger::TriggerBuilder;

pub use state::{transition, Choice, Effect, ReservedPolicy, SessionState};

/// Menu shown for `?`.
pub const MENU: &str = "\
c  - cascade: soft-delete dependent rows when the parent is soft-deleted
s  - skip this relation
na - no action (reserved, not implemented)
sn - set null (reserved, not implemented)
st - set default (reserved, not implemented)
?  - show this menu
q  - quit";

/// What happened to the relations offered in a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Dropped without prompting because their trigger already existed.
    pub covered: usize,
    /// Still queued when the session closed.
    pub pending: usize,
}

impl std::fmt::Display for SessionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} trigger(s) created, {} skipped, {} failed, {} already covered, {} left pending",
            self.created, self.skipped, self.failed, self.covered, self.pending
        )
    }
}

/// One interactive pass over a schema's soft-delete relations.
pub struct Session<E> {
    executor: E,
    builder: TriggerBuilder,
    filter: FilterConfig,
    state: SessionState,
    pending: VecDeque<ForeignKeyRelation>,
    report: SessionReport,
}

impl<E: StatementExecutor> Session<E> {
    /// The builder is scoped to the filter's schema, so triggers are created
    /// and looked up in the schema that was scanned.
    pub fn new(executor: E, builder: TriggerBuilder, filter: FilterConfig) -> Self {
        Self {
            executor,
            builder: builder.with_schema(filter.schema.clone()),
            filter,
            state: SessionState::AwaitingScanConfirmation,
            pending: VecDeque::new(),
            report: SessionReport::default(),
        }
    }

    /// Build a session from configuration.
    ///
    /// Fails on invalid filters before any statement reaches the executor.
    pub fn from_config(executor: E, config: &CascadeConfig) -> Result<Self> {
        let filter = config.filter()?;
        let builder = TriggerBuilder::new(
            config.connection.dialect,
            config.soft_delete_column.clone(),
        );
        Ok(Self::new(executor, builder, filter))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            pending: self.pending.len(),
            ..self.report
        }
    }

    /// Question for the operator in the current state, if any.
    pub fn prompt(&self) -> Option<String> {
        match self.state {
            SessionState::AwaitingScanConfirmation => Some(format!(
                "Scan schema {:?} for soft-delete relations? [y/n]",
                self.filter.schema
            )),
            SessionState::AwaitingDecision => self.pending.front().map(|relation| {
                format!(
                    "{child} references {parent} ({relation}). When a {parent} row is \
                     soft-deleted, what should happen to its {child} rows? [c/s/na/sn/st/?/q]",
                    child = relation.table_name,
                    parent = relation.referenced_table_name,
                )
            }),
            SessionState::Scanning | SessionState::Closed => None,
        }
    }

    /// Apply one line of input. Returns the lines to show the operator.
    ///
    /// Only fatal errors are returned; failed trigger installs and invalid
    /// input are reported in the output and the session continues.
    pub async fn handle(&mut self, input: &str) -> Result<Vec<String>> {
        let (next, effect) = transition(self.state, input);
        self.state = next;

        let mut output = Vec::new();
        match effect {
            Effect::Scan => {
                self.scan().await?;
                output.push(format!(
                    "Found {} relation(s) between soft-delete tables.",
                    self.pending.len()
                ));
                self.advance().await?;
            }
            Effect::CreateTrigger => {
                if let Some(relation) = self.pending.pop_front() {
                    output.push(self.create_trigger(relation).await);
                }
                self.advance().await?;
            }
            Effect::SkipHead => {
                if let Some(relation) = self.pending.pop_front() {
                    debug!(%relation, "skipped");
                    self.report.skipped += 1;
                    output.push(format!("Skipped {}.", relation));
                }
                self.advance().await?;
            }
            Effect::Reserved(policy) => {
                warn!(policy = policy.label(), "reserved policy selected");
                output.push(format!(
                    "'{}' is reserved and not implemented; choose another option.",
                    policy.label()
                ));
            }
            Effect::PrintMenu => output.push(MENU.to_string()),
            Effect::Reject(rejected) => output.push(self.reject(&rejected)),
            Effect::Close => {}
        }

        Ok(output)
    }

    fn reject(&self, input: &str) -> String {
        let err = CascadeError::InvalidInput(input.to_string());
        warn!(state = ?self.state, "{}", err);
        format!("{}. Type ? for the menu.", err)
    }

    async fn scan(&mut self) -> Result<()> {
        let introspector = Introspector::new(
            &self.executor,
            self.builder.dialect(),
            self.builder.soft_delete_column(),
        );
        let relations = introspector
            .discover(&self.filter)
            .await
            .map_err(CascadeError::Setup)?;

        info!(schema = %self.filter.schema, relations = relations.len(), "schema scanned");
        self.pending = relations.into();
        Ok(())
    }

    async fn create_trigger(&mut self, relation: ForeignKeyRelation) -> String {
        let sql = self.builder.create_trigger_statement(
            &relation.referenced_table_name,
            &relation.referenced_column_name,
            &relation.table_name,
            &relation.column_name,
        );
        debug!(%sql, "creating trigger");

        match self.executor.execute(&sql).await {
            Ok(()) => {
                info!(trigger = %relation.trigger_name(), %relation, "trigger created");
                self.report.created += 1;
                format!("Created trigger {}.", relation.trigger_name())
            }
            Err(source) => {
                let err = CascadeError::TriggerCreation { relation, source };
                error!("{}", err);
                self.report.failed += 1;
                err.to_string()
            }
        }
    }

    /// Drop covered relations from the head of the queue until one needs a
    /// decision, or close the session when none is left.
    async fn advance(&mut self) -> Result<()> {
        while let Some(head) = self.pending.front() {
            let sql = self
                .builder
                .exists_trigger_statement(&head.referenced_table_name, &head.table_name);
            let existing = self
                .executor
                .fetch_scalar(&sql)
                .await
                .map_err(CascadeError::Setup)?;

            if !is_truthy(existing.as_deref()) {
                self.state = SessionState::AwaitingDecision;
                return Ok(());
            }

            debug!(relation = %head, "already covered");
            self.report.covered += 1;
            self.pending.pop_front();
        }

        self.state = SessionState::Closed;
        Ok(())
    }
}

fn is_truthy(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !v.is_empty() && v != "0")
}

/// Pump lines from `input` into the session, writing prompts and reports to
/// `output`, until the session closes or input ends.
pub async fn run<E, R, W>(session: &mut Session<E>, input: R, output: &mut W) -> Result<SessionReport>
where
    E: StatementExecutor,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    while !session.is_closed() {
        if let Some(prompt) = session.prompt() {
            output.write_all(format!("{}\n", prompt).as_bytes()).await?;
            output.flush().await?;
        }

        let Some(line) = lines.next_line().await? else {
            debug!("input closed");
            break;
        };

        for message in session.handle(&line).await? {
            output.write_all(format!("{}\n", message).as_bytes()).await?;
        }
    }

    let report = session.report();
    output
        .write_all(format!("Session closed: {}.\n", report).as_bytes())
        .await?;
    output.flush().await?;
    Ok(report)
}

use std::fmt::{self, Display};

use derive_more::Display;
use serde::Serialize;

use crate::contracts::RegistryKind;
use crate::upserts::Upserted;

/// What a bootstrap step is acting on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[display("migrations")]
    Migrations,
    #[display("network")]
    Network,
    #[display("periodic task")]
    Schedule,
    #[display("master copy")]
    MasterCopy,
    #[display("proxy factory")]
    ProxyFactory,
}

impl From<RegistryKind> for Step {
    fn from(kind: RegistryKind) -> Self {
        match kind {
            RegistryKind::MasterCopy => Step::MasterCopy,
            RegistryKind::ProxyFactory => Step::ProxyFactory,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    Created,
    AlreadyPresent,
    Reconciled,
    Warning(String),
    Failed(String),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Outcome::Warning(_))
    }

    fn status(&self) -> &'static str {
        match self {
            Outcome::Created => "created",
            Outcome::AlreadyPresent => "already present",
            Outcome::Reconciled => "reconciled",
            Outcome::Warning(_) => "warning",
            Outcome::Failed(_) => "failed",
        }
    }
}

impl<R> From<&Upserted<R>> for Outcome {
    fn from(upserted: &Upserted<R>) -> Self {
        match upserted {
            Upserted::Created(_) => Outcome::Created,
            Upserted::AlreadyPresent(_) => Outcome::AlreadyPresent,
            Upserted::Reconciled(_) => Outcome::Reconciled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub step: Step,
    pub subject: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ReportEntry {
    pub fn new(step: Step, subject: impl Display, outcome: Outcome) -> Self {
        Self {
            step,
            subject: subject.to_string(),
            outcome,
        }
    }
}

impl Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ReportEntry {
            step,
            subject,
            outcome,
        } = self;

        match outcome {
            Outcome::Warning(reason) | Outcome::Failed(reason) => {
                write!(f, "{}: {step} {subject}: {reason}", outcome.status())
            }
            _ => write!(f, "{}: {step} {subject}", outcome.status()),
        }
    }
}

/// Everything a bootstrap run did, in the order it happened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ReportEntry) {
        self.entries.push(entry);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = ReportEntry>) {
        self.entries.extend(entries);
    }

    pub fn entries_for(&self, step: Step) -> Vec<&ReportEntry> {
        self.entries.iter().filter(|e| e.step == step).collect()
    }

    pub fn failures(&self) -> Vec<&ReportEntry> {
        self.entries.iter().filter(|e| e.outcome.is_failure()).collect()
    }

    pub fn warnings(&self) -> Vec<&ReportEntry> {
        self.entries.iter().filter(|e| e.outcome.is_warning()).collect()
    }

    pub fn has_failures(&self) -> bool {
        self.entries.iter().any(|e| e.outcome.is_failure())
    }

    pub fn count(&self, outcome: &Outcome) -> usize {
        self.entries.iter().filter(|e| &e.outcome == outcome).count()
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in self.entries.iter() {
            writeln!(f, "{entry}")?;
        }

        Ok(())
    }
}

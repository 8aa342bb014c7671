//! 操作結果と警告

use std::fmt;
use tracing::warn;

/// 失敗しても操作全体は成功扱いとなるステップ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningStep {
    Fetch,
    SecretsCopy,
    Definition,
    Hook,
    RuntimeShutdown,
    HealthWait,
    ContainerIp,
    ContainerStatus,
    LinkCleanup,
    BranchDelete,
}

impl fmt::Display for WarningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WarningStep::Fetch => "fetch",
            WarningStep::SecretsCopy => "secrets",
            WarningStep::Definition => "definition",
            WarningStep::Hook => "hook",
            WarningStep::RuntimeShutdown => "shutdown",
            WarningStep::HealthWait => "health",
            WarningStep::ContainerIp => "address",
            WarningStep::ContainerStatus => "ps",
            WarningStep::LinkCleanup => "links",
            WarningStep::BranchDelete => "branch",
        };
        f.write_str(label)
    }
}

/// 致命的でない劣化
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub step: WarningStep,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.step, self.message)
    }
}

/// 値と警告の組
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl<T> Outcome<T> {
    pub fn new(value: T, warnings: Vec<Warning>) -> Self {
        Self { value, warnings }
    }

    pub fn clean(value: T) -> Self {
        Self::new(value, Vec::new())
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn has_warning(&self, step: WarningStep) -> bool {
        self.warnings.iter().any(|w| w.step == step)
    }
}

/// 警告を記録しつつログにも出す
#[derive(Debug, Default)]
pub(crate) struct Warnings(Vec<Warning>);

impl Warnings {
    pub(crate) fn push(&mut self, step: WarningStep, message: impl Into<String>) {
        let message = message.into();
        warn!(step = %step, "{}", message);
        self.0.push(Warning { step, message });
    }

    pub(crate) fn extend(&mut self, warnings: Vec<Warning>) {
        self.0.extend(warnings);
    }

    pub(crate) fn finish<T>(self, value: T) -> Outcome<T> {
        Outcome::new(value, self.0)
    }
}

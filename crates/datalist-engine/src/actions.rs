// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Row and batch actions with hide/disable guards.
//!
//! The engine only decides eligibility. Handlers are host code and run only
//! through `invoke`, which re-checks the guards first.

use std::fmt;
use std::sync::Arc;

use crate::error::EngineError;
use crate::ids::ActionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActionKind {
    #[default]
    Default,
    Primary,
    Destructive,
}

impl ActionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Primary => "primary",
            Self::Destructive => "destructive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "default" => Some(Self::Default),
            "primary" => Some(Self::Primary),
            "destructive" => Some(Self::Destructive),
            _ => None,
        }
    }
}

type Guard<R> = Arc<dyn Fn(&R) -> bool + Send + Sync>;
type Handler<R> = Arc<dyn Fn(&R) + Send + Sync>;
type BatchGuard<R> = Arc<dyn Fn(&[&R]) -> bool + Send + Sync>;
type BatchHandler<R> = Arc<dyn Fn(&[&R]) + Send + Sync>;

/// An action offered on a single row.
pub struct RowAction<R: ?Sized> {
    pub id: ActionId,
    pub label: String,
    pub kind: ActionKind,
    disabled: Option<Guard<R>>,
    hidden: Option<Guard<R>>,
    handler: Handler<R>,
}

impl<R: ?Sized> RowAction<R> {
    pub fn new(
        id: impl Into<ActionId>,
        label: impl Into<String>,
        handler: impl Fn(&R) + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: ActionKind::Default,
            disabled: None,
            hidden: None,
            handler: Arc::new(handler),
        }
    }

    pub fn kind(mut self, kind: ActionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn disabled_when(mut self, guard: impl Fn(&R) -> bool + Send + Sync + 'static) -> Self {
        self.disabled = Some(Arc::new(guard));
        self
    }

    pub fn hidden_when(mut self, guard: impl Fn(&R) -> bool + Send + Sync + 'static) -> Self {
        self.hidden = Some(Arc::new(guard));
        self
    }

    pub fn is_hidden(&self, row: &R) -> bool {
        self.hidden.as_ref().is_some_and(|guard| guard(row))
    }

    pub fn is_disabled(&self, row: &R) -> bool {
        self.disabled.as_ref().is_some_and(|guard| guard(row))
    }

    pub fn is_eligible(&self, row: &R) -> bool {
        !self.is_hidden(row) && !self.is_disabled(row)
    }

    pub fn invoke(&self, row: &R) -> Result<(), EngineError> {
        if !self.is_eligible(row) {
            let error = EngineError::ActionNotEligible(self.id.clone());
            tracing::debug!(%error, "refusing row action");
            return Err(error);
        }
        (self.handler)(row);
        Ok(())
    }
}

impl<R: ?Sized> Clone for RowAction<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            label: self.label.clone(),
            kind: self.kind,
            disabled: self.disabled.clone(),
            hidden: self.hidden.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<R: ?Sized> fmt::Debug for RowAction<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowAction")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// An action over the whole selection. Guards see every selected row at
/// once so they can judge the aggregate.
pub struct BatchAction<R: ?Sized> {
    pub id: ActionId,
    pub label: String,
    pub kind: ActionKind,
    disabled: Option<BatchGuard<R>>,
    hidden: Option<BatchGuard<R>>,
    handler: BatchHandler<R>,
}

impl<R: ?Sized> BatchAction<R> {
    pub fn new(
        id: impl Into<ActionId>,
        label: impl Into<String>,
        handler: impl Fn(&[&R]) + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: ActionKind::Default,
            disabled: None,
            hidden: None,
            handler: Arc::new(handler),
        }
    }

    pub fn kind(mut self, kind: ActionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn disabled_when(
        mut self,
        guard: impl Fn(&[&R]) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.disabled = Some(Arc::new(guard));
        self
    }

    pub fn hidden_when(mut self, guard: impl Fn(&[&R]) -> bool + Send + Sync + 'static) -> Self {
        self.hidden = Some(Arc::new(guard));
        self
    }

    pub fn is_hidden(&self, selected: &[&R]) -> bool {
        self.hidden.as_ref().is_some_and(|guard| guard(selected))
    }

    /// Always disabled for an empty selection.
    pub fn is_disabled(&self, selected: &[&R]) -> bool {
        selected.is_empty() || self.disabled.as_ref().is_some_and(|guard| guard(selected))
    }

    pub fn is_eligible(&self, selected: &[&R]) -> bool {
        !self.is_hidden(selected) && !self.is_disabled(selected)
    }

    pub fn invoke(&self, selected: &[&R]) -> Result<(), EngineError> {
        if !self.is_eligible(selected) {
            let error = EngineError::ActionNotEligible(self.id.clone());
            tracing::debug!(%error, selected = selected.len(), "refusing batch action");
            return Err(error);
        }
        (self.handler)(selected);
        Ok(())
    }
}

impl<R: ?Sized> Clone for BatchAction<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            label: self.label.clone(),
            kind: self.kind,
            disabled: self.disabled.clone(),
            hidden: self.hidden.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<R: ?Sized> fmt::Debug for BatchAction<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchAction")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

pub fn visible_actions<'a, R: ?Sized>(
    row: &R,
    actions: &'a [RowAction<R>],
) -> Vec<&'a RowAction<R>> {
    actions.iter().filter(|action| !action.is_hidden(row)).collect()
}

pub fn is_action_disabled<R: ?Sized>(row: &R, action: &RowAction<R>) -> bool {
    action.is_disabled(row)
}

/// Visible and enabled row actions, in declaration order.
pub fn eligible_actions<'a, R: ?Sized>(
    row: &R,
    actions: &'a [RowAction<R>],
) -> Vec<&'a RowAction<R>> {
    actions.iter().filter(|action| action.is_eligible(row)).collect()
}

pub fn visible_batch_actions<'a, R: ?Sized>(
    selected: &[&R],
    actions: &'a [BatchAction<R>],
) -> Vec<&'a BatchAction<R>> {
    actions
        .iter()
        .filter(|action| !action.is_hidden(selected))
        .collect()
}

pub fn eligible_batch_actions<'a, R: ?Sized>(
    selected: &[&R],
    actions: &'a [BatchAction<R>],
) -> Vec<&'a BatchAction<R>> {
    actions
        .iter()
        .filter(|action| action.is_eligible(selected))
        .collect()
}

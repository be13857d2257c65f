//! Browsing-context bookkeeping.
//!
//! The bridge retains exactly two designated context ids plus the id of the
//! intercept scoped to the top-level one. All transitions live here as
//! synchronous, total operations so the lifecycle rules can be tested without
//! a transport; the bridge serializes access around this struct and performs
//! the wire calls the returned outcomes ask for.

/// Read-only copy of the tracked ids.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ContextSnapshot {
    pub top_level_context_id: Option<String>,
    pub aut_context_id: Option<String>,
    pub intercept_id: Option<String>,
}

#[derive(Debug, Default)]
pub struct ContextState {
    top_level_context_id: Option<String>,
    aut_context_id: Option<String>,
    intercept_id: Option<String>,
}

/// What a `contextCreated` event amounted to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CreatedOutcome {
    /// Unrelated context, AUT already designated, or no top-level bound.
    Ignored,
    /// The first direct child of the tracked top-level context appeared and
    /// is now the AUT context. `needs_intercept` is set unless an intercept
    /// from an earlier designation is still live.
    AutAssigned {
        context: String,
        top_level: String,
        needs_intercept: bool,
    },
}

/// What a `contextDestroyed` event amounted to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DestroyedOutcome {
    Ignored,
    /// Only the AUT context died; the top-level context (and its intercept)
    /// survive for the next navigation.
    AutCleared { context: String },
    /// The top-level context died, taking every child with it. `intercept`
    /// carries the id to remove on the wire, already unrecorded here so a
    /// replayed event cannot remove it twice.
    TopLevelCleared {
        context: String,
        intercept: Option<String>,
    },
}

impl ContextState {
    /// Bind (or clear) the top-level context id. Set by the session
    /// bootstrap, never by protocol events. Rebinding leaves any designated
    /// AUT context and live intercept untouched.
    pub fn bind_top_level(&mut self, context: Option<String>) {
        self.top_level_context_id = context;
    }

    /// The AUT frame is the first direct child created under the tracked
    /// top-level context; everything else is tooling traffic.
    pub fn on_context_created(&mut self, context: &str, parent: Option<&str>) -> CreatedOutcome {
        if self.aut_context_id.is_some() {
            return CreatedOutcome::Ignored;
        }
        let top_level = match (&self.top_level_context_id, parent) {
            (Some(top_level), Some(parent)) if top_level == parent => top_level.clone(),
            _ => return CreatedOutcome::Ignored,
        };

        self.aut_context_id = Some(context.to_string());
        CreatedOutcome::AutAssigned {
            context: context.to_string(),
            top_level,
            needs_intercept: self.intercept_id.is_none(),
        }
    }

    pub fn on_context_destroyed(&mut self, context: &str) -> DestroyedOutcome {
        if self.top_level_context_id.as_deref() == Some(context) {
            // A destroyed top-level context implies its children are gone too.
            self.aut_context_id = None;
            self.top_level_context_id = None;
            return DestroyedOutcome::TopLevelCleared {
                context: context.to_string(),
                intercept: self.intercept_id.take(),
            };
        }

        if self.aut_context_id.as_deref() == Some(context) {
            self.aut_context_id = None;
            return DestroyedOutcome::AutCleared {
                context: context.to_string(),
            };
        }

        DestroyedOutcome::Ignored
    }

    /// Record an intercept installed for `scope`. Returns the id back when
    /// the scope is no longer the bound top-level context (or an intercept
    /// was recorded in the meantime): the caller must remove that orphan on
    /// the wire instead of reinstating cleared state.
    pub fn record_intercept(&mut self, scope: &str, intercept: String) -> Option<String> {
        if self.top_level_context_id.as_deref() == Some(scope) && self.intercept_id.is_none() {
            self.intercept_id = Some(intercept);
            None
        } else {
            Some(intercept)
        }
    }

    pub fn is_aut_context(&self, context: Option<&str>) -> bool {
        context.is_some() && self.aut_context_id.as_deref() == context
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            top_level_context_id: self.top_level_context_id.clone(),
            aut_context_id: self.aut_context_id.clone(),
            intercept_id: self.intercept_id.clone(),
        }
    }
}

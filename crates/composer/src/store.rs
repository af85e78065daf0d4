//! In-memory form session store backed by DashMap.
//!
//! One [`SegmentForm`] per session, keyed by UUID. The store is the seam
//! between the presentation layer and the form controller: handlers call
//! in with a session id, the store applies the operation and hands back a
//! serializable snapshot.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use segment_core::error::{StudioError, StudioResult};
use segment_core::segment::{Catalog, SegmentPayload, TraitSchema};

use crate::form::{FormPhase, SegmentForm};

/// Serializable snapshot of one form session, as read by the presentation
/// layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormView {
    pub id: Uuid,
    pub phase: FormPhase,
    pub name: String,
    pub selected: Vec<TraitSchema>,
    pub available: Vec<TraitSchema>,
    pub validation: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl FormView {
    fn of(id: Uuid, form: &SegmentForm) -> Self {
        Self {
            id,
            phase: form.phase(),
            name: form.name().to_string(),
            selected: form.selected().to_vec(),
            available: form.available().into_iter().cloned().collect(),
            validation: form.validation().map(str::to_string),
            updated_at: form.updated_at(),
        }
    }
}

/// Result of a submit attempt routed through the store.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// Validation passed; the form was reset and the payload is ready to
    /// dispatch.
    Accepted {
        payload: SegmentPayload,
        form: FormView,
    },
    /// Validation rejected the draft; the message is on the view.
    Rejected { form: FormView },
}

/// Thread-safe store of active form sessions.
pub struct FormStore {
    catalog: Catalog,
    forms: DashMap<Uuid, SegmentForm>,
}

impl FormStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            forms: DashMap::new(),
        }
    }

    /// Create a fresh session. The dialog starts closed; the caller opens
    /// it when the user asks for it.
    pub fn create_form(&self) -> FormView {
        let id = Uuid::new_v4();
        let form = SegmentForm::new(self.catalog.clone());
        let view = FormView::of(id, &form);
        self.forms.insert(id, form);
        info!(form_id = %id, "Created form session");
        view
    }

    pub fn snapshot(&self, id: Uuid) -> StudioResult<FormView> {
        let entry = self.forms.get(&id).ok_or(StudioError::FormNotFound(id))?;
        Ok(FormView::of(id, entry.value()))
    }

    pub fn list_forms(&self) -> Vec<FormView> {
        let mut views: Vec<FormView> = self
            .forms
            .iter()
            .map(|entry| FormView::of(*entry.key(), entry.value()))
            .collect();
        views.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        views
    }

    pub fn open_form(&self, id: Uuid) -> StudioResult<FormView> {
        self.with_form(id, |form| {
            form.open();
            Ok(())
        })
    }

    pub fn cancel_form(&self, id: Uuid) -> StudioResult<FormView> {
        self.with_form(id, |form| {
            form.cancel();
            Ok(())
        })
    }

    pub fn set_name(&self, id: Uuid, name: &str) -> StudioResult<FormView> {
        self.with_form(id, |form| {
            form.set_name(name);
            Ok(())
        })
    }

    pub fn add_schema(&self, id: Uuid, key: &str) -> StudioResult<FormView> {
        self.with_form(id, |form| form.add_schema(key))
    }

    pub fn change_schema_at(&self, id: Uuid, index: usize, key: &str) -> StudioResult<FormView> {
        self.with_form(id, |form| form.change_schema_at(index, key))
    }

    pub fn remove_schema_at(&self, id: Uuid, index: usize) -> StudioResult<FormView> {
        self.with_form(id, |form| form.remove_schema_at(index).map(|_| ()))
    }

    /// Run validation and, on success, reset the session and return the
    /// payload for dispatch.
    pub fn submit_form(&self, id: Uuid) -> StudioResult<SubmitOutcome> {
        let mut entry = self.forms.get_mut(&id).ok_or(StudioError::FormNotFound(id))?;
        let form = entry.value_mut();
        match form.submit() {
            Some(payload) => {
                info!(
                    form_id = %id,
                    segment_name = %payload.segment_name,
                    schemas = payload.schema.len(),
                    "Form submitted"
                );
                Ok(SubmitOutcome::Accepted {
                    payload,
                    form: FormView::of(id, form),
                })
            }
            None => Ok(SubmitOutcome::Rejected {
                form: FormView::of(id, form),
            }),
        }
    }

    /// Drop a session entirely. Returns false if it was already gone.
    pub fn remove_form(&self, id: Uuid) -> bool {
        let removed = self.forms.remove(&id).is_some();
        if removed {
            info!(form_id = %id, "Removed form session");
        }
        removed
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn with_form(
        &self,
        id: Uuid,
        op: impl FnOnce(&mut SegmentForm) -> StudioResult<()>,
    ) -> StudioResult<FormView> {
        let mut entry = self.forms.get_mut(&id).ok_or(StudioError::FormNotFound(id))?;
        let form = entry.value_mut();
        op(form)?;
        Ok(FormView::of(id, form))
    }
}

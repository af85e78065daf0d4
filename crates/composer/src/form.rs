//! Segment form controller — the state machine behind the "save segment"
//! dialog. Owns the draft name, the ordered list of selected schemas, the
//! transient validation message, and the dialog phase.
//!
//! Only the selected list is stored; the available pool is computed as the
//! catalog minus the selection, so the two can never drift apart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use segment_core::error::{StudioError, StudioResult};
use segment_core::segment::{Catalog, SegmentPayload, TraitSchema};

/// Validation message shown when "add" is pressed with nothing chosen.
pub const MSG_CHOOSE_SCHEMA: &str = "Please select a schema to add.";
/// Validation message shown when the segment name is empty or whitespace.
pub const MSG_NAME_REQUIRED: &str = "Segment name is required.";
/// Validation message shown when submitting with no schemas selected.
pub const MSG_SCHEMA_REQUIRED: &str = "At least one schema must be added.";

/// Dialog visibility phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormPhase {
    Closed,
    Open,
}

/// One segment-builder session.
///
/// Closing the form with [`SegmentForm::cancel`] keeps the draft so the
/// user can pick up where they left off; only a successful
/// [`SegmentForm::submit`] resets it.
#[derive(Debug, Clone)]
pub struct SegmentForm {
    catalog: Catalog,
    name: String,
    selected: Vec<TraitSchema>,
    validation: Option<String>,
    phase: FormPhase,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SegmentForm {
    pub fn new(catalog: Catalog) -> Self {
        let now = Utc::now();
        Self {
            catalog,
            name: String::new(),
            selected: Vec::new(),
            validation: None,
            phase: FormPhase::Closed,
            created_at: now,
            updated_at: now,
        }
    }

    /// Open the dialog. Clears any stale validation message; the draft
    /// itself is untouched.
    pub fn open(&mut self) {
        self.phase = FormPhase::Open;
        self.validation = None;
        self.touch();
    }

    /// Close the dialog without discarding the draft.
    pub fn cancel(&mut self) {
        self.phase = FormPhase::Closed;
        self.touch();
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    /// Append the trait identified by `key` to the selection.
    ///
    /// An empty `key` means nothing was chosen in the dropdown: the
    /// validation message is set and the selection is left alone. A key
    /// that is not currently available (unknown, or already selected) is a
    /// stale reference from the caller and reports [`StudioError::UnknownTrait`]
    /// without changing state.
    pub fn add_schema(&mut self, key: &str) -> StudioResult<()> {
        if key.is_empty() {
            self.validation = Some(MSG_CHOOSE_SCHEMA.to_string());
            self.touch();
            return Ok(());
        }
        let schema = self.available_schema(key)?.clone();
        self.selected.push(schema);
        self.validation = None;
        self.touch();
        Ok(())
    }

    /// Replace the selection at `index` with the trait identified by `key`.
    ///
    /// Replacing an entry with itself is a no-op; otherwise `key` must be
    /// available. The displaced trait returns to the available pool by
    /// virtue of no longer being selected.
    pub fn change_schema_at(&mut self, index: usize, key: &str) -> StudioResult<()> {
        let len = self.selected.len();
        if index >= len {
            return Err(StudioError::PositionOutOfRange { index, len });
        }
        if self.selected[index].key == key {
            return Ok(());
        }
        let schema = self.available_schema(key)?.clone();
        self.selected[index] = schema;
        self.touch();
        Ok(())
    }

    /// Remove the selection at `index`, shifting later entries left.
    pub fn remove_schema_at(&mut self, index: usize) -> StudioResult<TraitSchema> {
        let len = self.selected.len();
        if index >= len {
            return Err(StudioError::PositionOutOfRange { index, len });
        }
        let removed = self.selected.remove(index);
        self.touch();
        Ok(removed)
    }

    /// Validate the draft and, if it passes, produce the submission payload
    /// and reset the form. Returns `None` when validation rejects the
    /// draft; the message is readable via [`SegmentForm::validation`].
    ///
    /// The reset happens here, before the payload is anywhere near the
    /// network, and is never rolled back.
    pub fn submit(&mut self) -> Option<SegmentPayload> {
        if self.name.trim().is_empty() {
            self.validation = Some(MSG_NAME_REQUIRED.to_string());
            self.touch();
            return None;
        }
        if self.selected.is_empty() {
            self.validation = Some(MSG_SCHEMA_REQUIRED.to_string());
            self.touch();
            return None;
        }

        let payload = SegmentPayload::new(self.name.clone(), std::mem::take(&mut self.selected));
        self.name.clear();
        self.validation = None;
        self.phase = FormPhase::Closed;
        self.touch();
        Some(payload)
    }

    /// Traits not currently selected, in catalog order.
    pub fn available(&self) -> Vec<&TraitSchema> {
        self.catalog
            .iter()
            .filter(|t| !self.is_selected(&t.key))
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn selected(&self) -> &[TraitSchema] {
        &self.selected
    }

    pub fn validation(&self) -> Option<&str> {
        self.validation.as_deref()
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn is_selected(&self, key: &str) -> bool {
        self.selected.iter().any(|t| t.key == key)
    }

    fn available_schema(&self, key: &str) -> StudioResult<&TraitSchema> {
        if self.is_selected(key) {
            return Err(StudioError::UnknownTrait(key.to_string()));
        }
        self.catalog
            .get(key)
            .ok_or_else(|| StudioError::UnknownTrait(key.to_string()))
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segment_core::segment::TraitKind;

    fn open_form() -> SegmentForm {
        let mut form = SegmentForm::new(Catalog::standard());
        form.open();
        form
    }

    fn selected_keys(form: &SegmentForm) -> Vec<&str> {
        form.selected().iter().map(|t| t.key.as_str()).collect()
    }

    fn available_keys(form: &SegmentForm) -> Vec<&str> {
        form.available().iter().map(|t| t.key.as_str()).collect()
    }

    /// Selected and available must partition the catalog: nothing lost,
    /// nothing duplicated.
    fn assert_pools_partition(form: &SegmentForm) {
        let mut keys: Vec<&str> = selected_keys(form);
        keys.extend(available_keys(form));
        assert_eq!(keys.len(), form.catalog().len());

        let unique: std::collections::HashSet<&str> = keys.iter().copied().collect();
        assert_eq!(unique.len(), keys.len());
        for key in keys {
            assert!(form.catalog().contains(key));
        }
    }

    #[test]
    fn test_add_schema_moves_trait_out_of_available() {
        let mut form = open_form();
        form.add_schema("first_name").unwrap();

        assert_eq!(selected_keys(&form), vec!["first_name"]);
        assert_eq!(form.available().len(), 6);
        assert!(!available_keys(&form).contains(&"first_name"));
        assert!(form.validation().is_none());
        assert_pools_partition(&form);
    }

    #[test]
    fn test_add_schema_appends_in_order() {
        let mut form = open_form();
        form.add_schema("city").unwrap();
        form.add_schema("first_name").unwrap();
        form.add_schema("age").unwrap();

        assert_eq!(selected_keys(&form), vec!["city", "first_name", "age"]);
        assert_pools_partition(&form);
    }

    #[test]
    fn test_add_schema_with_nothing_chosen_sets_message() {
        let mut form = open_form();
        form.add_schema("gender").unwrap();

        form.add_schema("").unwrap();
        assert_eq!(form.validation(), Some(MSG_CHOOSE_SCHEMA));
        assert_eq!(selected_keys(&form), vec!["gender"]);
        assert_pools_partition(&form);

        // A successful add clears the message again.
        form.add_schema("age").unwrap();
        assert!(form.validation().is_none());
    }

    #[test]
    fn test_add_schema_rejects_stale_key() {
        let mut form = open_form();
        form.add_schema("city").unwrap();

        // Unknown key
        let err = form.add_schema("shoe_size").unwrap_err();
        assert!(matches!(err, StudioError::UnknownTrait(_)));

        // Already-selected key offered again by a stale dropdown
        let err = form.add_schema("city").unwrap_err();
        assert!(matches!(err, StudioError::UnknownTrait(_)));

        assert_eq!(selected_keys(&form), vec!["city"]);
        assert_pools_partition(&form);
    }

    #[test]
    fn test_change_schema_swaps_pools() {
        let mut form = open_form();
        form.add_schema("first_name").unwrap();
        form.add_schema("city").unwrap();

        form.change_schema_at(0, "age").unwrap();

        assert_eq!(selected_keys(&form), vec!["age", "city"]);
        assert!(available_keys(&form).contains(&"first_name"));
        assert!(!available_keys(&form).contains(&"age"));
        assert_pools_partition(&form);
    }

    #[test]
    fn test_change_schema_self_replace_is_noop() {
        let mut form = open_form();
        form.add_schema("first_name").unwrap();
        form.add_schema("city").unwrap();

        let before_selected: Vec<String> =
            selected_keys(&form).iter().map(|s| s.to_string()).collect();
        let before_available: Vec<String> =
            available_keys(&form).iter().map(|s| s.to_string()).collect();

        form.change_schema_at(1, "city").unwrap();

        assert_eq!(selected_keys(&form), before_selected);
        assert_eq!(available_keys(&form), before_available);
        assert_pools_partition(&form);
    }

    #[test]
    fn test_change_schema_out_of_range() {
        let mut form = open_form();
        form.add_schema("first_name").unwrap();

        let err = form.change_schema_at(3, "city").unwrap_err();
        assert!(matches!(
            err,
            StudioError::PositionOutOfRange { index: 3, len: 1 }
        ));
        assert_eq!(selected_keys(&form), vec!["first_name"]);
    }

    #[test]
    fn test_change_schema_rejects_selected_key() {
        let mut form = open_form();
        form.add_schema("first_name").unwrap();
        form.add_schema("city").unwrap();

        let err = form.change_schema_at(0, "city").unwrap_err();
        assert!(matches!(err, StudioError::UnknownTrait(_)));
        assert_eq!(selected_keys(&form), vec!["first_name", "city"]);
        assert_pools_partition(&form);
    }

    #[test]
    fn test_remove_schema_returns_trait_to_pool() {
        let mut form = open_form();
        form.add_schema("first_name").unwrap();
        assert_eq!(form.available().len(), 6);

        let removed = form.remove_schema_at(0).unwrap();
        assert_eq!(removed.key, "first_name");
        assert!(form.selected().is_empty());
        assert_eq!(form.available().len(), 7);
        assert_pools_partition(&form);
    }

    #[test]
    fn test_remove_schema_preserves_order() {
        let mut form = open_form();
        form.add_schema("first_name").unwrap();
        form.add_schema("city").unwrap();
        form.add_schema("age").unwrap();

        form.remove_schema_at(1).unwrap();
        assert_eq!(selected_keys(&form), vec!["first_name", "age"]);

        let err = form.remove_schema_at(5).unwrap_err();
        assert!(matches!(err, StudioError::PositionOutOfRange { .. }));
        assert_pools_partition(&form);
    }

    #[test]
    fn test_submit_requires_name() {
        let mut form = open_form();
        form.add_schema("first_name").unwrap();

        assert!(form.submit().is_none());
        assert_eq!(form.validation(), Some(MSG_NAME_REQUIRED));

        // Whitespace-only names are rejected the same way.
        form.set_name("   ");
        assert!(form.submit().is_none());
        assert_eq!(form.validation(), Some(MSG_NAME_REQUIRED));

        // Nothing was reset by the failed attempts.
        assert_eq!(selected_keys(&form), vec!["first_name"]);
        assert_eq!(form.phase(), FormPhase::Open);
    }

    #[test]
    fn test_submit_requires_schemas() {
        let mut form = open_form();
        form.set_name("Churn Risk");

        assert!(form.submit().is_none());
        assert_eq!(form.validation(), Some(MSG_SCHEMA_REQUIRED));
        assert_eq!(form.phase(), FormPhase::Open);
    }

    #[test]
    fn test_submit_builds_payload_and_resets() {
        let mut form = open_form();
        form.set_name("VIP Users");
        form.add_schema("first_name").unwrap();
        form.add_schema("city").unwrap();

        let payload = form.submit().unwrap();
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "segment_name": "VIP Users",
                "schema": [
                    { "first_name": "First Name" },
                    { "city": "City" }
                ]
            })
        );

        // Reset happened synchronously with the submit.
        assert_eq!(form.phase(), FormPhase::Closed);
        assert!(form.name().is_empty());
        assert!(form.selected().is_empty());
        assert!(form.validation().is_none());
        assert_eq!(form.available().len(), 7);
        assert_pools_partition(&form);
    }

    #[test]
    fn test_cancel_preserves_draft() {
        let mut form = open_form();
        form.set_name("Power Users");
        form.add_schema("age").unwrap();

        form.cancel();
        assert_eq!(form.phase(), FormPhase::Closed);
        assert_eq!(form.name(), "Power Users");
        assert_eq!(selected_keys(&form), vec!["age"]);

        // Reopening clears only the validation message.
        form.add_schema("").unwrap();
        assert_eq!(form.validation(), Some(MSG_CHOOSE_SCHEMA));
        form.open();
        assert_eq!(form.phase(), FormPhase::Open);
        assert!(form.validation().is_none());
        assert_eq!(form.name(), "Power Users");
        assert_eq!(selected_keys(&form), vec!["age"]);
    }

    #[test]
    fn test_invariant_across_mixed_sequence() {
        let mut form = open_form();
        form.add_schema("first_name").unwrap();
        assert_pools_partition(&form);
        form.add_schema("account_name").unwrap();
        assert_pools_partition(&form);
        form.change_schema_at(0, "gender").unwrap();
        assert_pools_partition(&form);
        form.change_schema_at(0, "gender").unwrap();
        assert_pools_partition(&form);
        form.remove_schema_at(1).unwrap();
        assert_pools_partition(&form);
        form.add_schema("state").unwrap();
        assert_pools_partition(&form);

        assert_eq!(selected_keys(&form), vec!["gender", "state"]);
    }

    #[test]
    fn test_selection_survives_kind_boundaries() {
        // User and group traits mix freely in one segment.
        let mut form = open_form();
        form.add_schema("age").unwrap();
        form.add_schema("account_name").unwrap();

        let kinds: Vec<TraitKind> = form.selected().iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TraitKind::User, TraitKind::Group]);
    }
}

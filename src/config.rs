//! Document configuration.

// ---------------------------------------------------------------------------
// DocumentConfig
// ---------------------------------------------------------------------------

/// Tunables for a [`Document`](crate::dom::Document).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentConfig {
    /// Tag of the default container the selector builder opens for the seed
    /// node, nesting markers and child markers.
    pub container_tag: String,
    /// Event kind that triggers property write-back.
    pub change_event: String,
    /// Properties copied from the event target into the store on
    /// `change_event`.
    pub form_properties: Vec<String>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            container_tag: "div".to_owned(),
            change_event: "change".to_owned(),
            form_properties: ["value", "valueAsNumber", "checked"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }
}

impl DocumentConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the container tag (builder).
    pub fn with_container_tag(mut self, tag: impl Into<String>) -> Self {
        self.container_tag = tag.into();
        self
    }

    /// Set the write-back event kind (builder).
    pub fn with_change_event(mut self, kind: impl Into<String>) -> Self {
        self.change_event = kind.into();
        self
    }

    /// Replace the written-back property list (builder).
    pub fn with_form_properties(
        mut self,
        properties: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.form_properties = properties.into_iter().map(Into::into).collect();
        self
    }
}

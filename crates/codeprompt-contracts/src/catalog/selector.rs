use super::targets::{TargetCatalog, TargetKind, TargetSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSelection {
    pub target: TargetSpec,
    pub requested: Option<String>,
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TargetSelector {
    pub catalog: TargetCatalog,
}

impl TargetSelector {
    pub fn new(catalog: Option<TargetCatalog>) -> Self {
        Self {
            catalog: catalog.unwrap_or_default(),
        }
    }

    pub fn select(
        &self,
        requested: Option<&str>,
        kind: TargetKind,
    ) -> Result<TargetSelection, String> {
        let requested = requested.map(str::trim).filter(|value| !value.is_empty());
        let (fallback_reason, requested_text) = if let Some(requested_value) = requested {
            if let Some(target) = self.catalog.ensure(requested_value, kind) {
                return Ok(TargetSelection {
                    target,
                    requested: Some(requested_value.to_string()),
                    fallback_reason: None,
                });
            }
            (
                Some(format!(
                    "Requested target '{requested_value}' unavailable for '{}'.",
                    kind.as_str()
                )),
                Some(requested_value.to_string()),
            )
        } else {
            (Some("No target specified; using default.".to_string()), None)
        };

        let candidates = self.catalog.by_kind(kind);
        let Some(target) = candidates.first().cloned() else {
            return Err(format!("No targets available for '{}'.", kind.as_str()));
        };
        Ok(TargetSelection {
            target,
            requested: requested_text,
            fallback_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::super::targets::{TargetCatalog, TargetKind, TargetSpec};
    use super::TargetSelector;

    #[test]
    fn selector_keeps_requested_target_when_kind_matches() {
        let selection = TargetSelector::default()
            .select(Some("Flow VEO"), TargetKind::Video)
            .unwrap();
        assert_eq!(selection.target.id, "Flow VEO");
        assert_eq!(selection.fallback_reason, None);
    }

    #[test]
    fn selector_falls_back_when_requested_target_has_other_kind() {
        let selection = TargetSelector::default()
            .select(Some("midjourney"), TargetKind::Text)
            .unwrap();
        assert_eq!(selection.target.id, "geral-texto");
        assert_eq!(selection.requested.as_deref(), Some("midjourney"));
        assert_eq!(
            selection.fallback_reason.as_deref(),
            Some("Requested target 'midjourney' unavailable for 'text'.")
        );
    }

    #[test]
    fn selector_blank_request_uses_default_with_explanation() {
        let selection = TargetSelector::default()
            .select(Some("   "), TargetKind::ImageEdit)
            .unwrap();
        assert_eq!(selection.target.id, "nano-banana-edit");
        assert_eq!(
            selection.fallback_reason.as_deref(),
            Some("No target specified; using default.")
        );
    }

    #[test]
    fn selector_errors_when_kind_is_empty() {
        let mut targets = IndexMap::new();
        targets.insert(
            "only-text".to_string(),
            TargetSpec {
                id: "only-text".to_string(),
                name: "Only text".to_string(),
                kind: TargetKind::Text,
                description: String::new(),
                url: String::new(),
                multi_segment: false,
            },
        );
        let err = TargetSelector::new(Some(TargetCatalog::new(Some(targets))))
            .select(None, TargetKind::Video)
            .err()
            .unwrap_or_default();
        assert_eq!(err, "No targets available for 'video'.");
    }
}

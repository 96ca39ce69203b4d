use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    Text,
    Image,
    ImageEdit,
    Video,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::ImageEdit => "image-edit",
            Self::Video => "video",
        }
    }
}

/// A downstream tool the generated prompt is written for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub id: String,
    pub name: String,
    pub kind: TargetKind,
    pub description: String,
    pub url: String,
    /// Accepts a sequence of 8-second segment prompts for one longer video.
    pub multi_segment: bool,
}

#[derive(Debug, Clone)]
pub struct TargetCatalog {
    targets: IndexMap<String, TargetSpec>,
}

impl Default for TargetCatalog {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TargetCatalog {
    pub fn new(targets: Option<IndexMap<String, TargetSpec>>) -> Self {
        Self {
            targets: targets.unwrap_or_else(default_targets),
        }
    }

    pub fn get(&self, id: &str) -> Option<&TargetSpec> {
        self.targets.get(id)
    }

    pub fn list(&self) -> impl Iterator<Item = &TargetSpec> {
        self.targets.values()
    }

    pub fn by_kind(&self, kind: TargetKind) -> Vec<TargetSpec> {
        self.targets
            .values()
            .filter(|target| target.kind == kind)
            .cloned()
            .collect()
    }

    pub fn ensure(&self, id: &str, kind: TargetKind) -> Option<TargetSpec> {
        let target = self.get(id)?;
        if target.kind == kind {
            return Some(target.clone());
        }
        None
    }

    pub fn supports_segments(&self, id: &str) -> bool {
        self.get(id).map(|target| target.multi_segment).unwrap_or(false)
    }
}

fn default_targets() -> IndexMap<String, TargetSpec> {
    let mut map = IndexMap::new();

    let mut insert = |id: &str,
                      name: &str,
                      kind: TargetKind,
                      description: &str,
                      url: &str,
                      multi_segment: bool| {
        map.insert(
            id.to_string(),
            TargetSpec {
                id: id.to_string(),
                name: name.to_string(),
                kind,
                description: description.to_string(),
                url: url.to_string(),
                multi_segment,
            },
        );
    };

    insert(
        "geral-texto",
        "General / Default",
        TargetKind::Text,
        "A well-structured text prompt that works with most assistants.",
        "https://gemini.google.com/",
        false,
    );
    insert(
        "ChatGPT (GPT-4)",
        "ChatGPT (GPT-4)",
        TargetKind::Text,
        "Complex conversations, reasoning and long-form writing.",
        "https://chat.openai.com/",
        false,
    );
    insert(
        "Google Gemini",
        "Google Gemini",
        TargetKind::Text,
        "Multimodal tasks and creative writing.",
        "https://gemini.google.com/",
        false,
    );
    insert(
        "geral-imagem",
        "General / Default",
        TargetKind::Image,
        "A well-structured image prompt that works with most generators.",
        "https://www.bing.com/images/create",
        false,
    );
    insert(
        "midjourney",
        "Midjourney",
        TargetKind::Image,
        "Artistic, stylized high-quality images.",
        "https://www.midjourney.com/imagine",
        false,
    );
    insert(
        "dall-e-3",
        "DALL-E 3",
        TargetKind::Image,
        "Creative images that follow text instructions closely.",
        "https://chat.openai.com/",
        false,
    );
    insert(
        "google-imagen-3",
        "Google Imagen 3",
        TargetKind::Image,
        "Photorealistic high-quality images.",
        "https://aistudio.google.com/app/imagefx",
        false,
    );
    insert(
        "nano-banana",
        "Nano Banana",
        TargetKind::Image,
        "Creative, detailed image generation.",
        "https://nanobanana.com/",
        false,
    );
    insert(
        "stable-diffusion",
        "Stable Diffusion",
        TargetKind::Image,
        "Highly tunable, parameter-driven generation.",
        "https://dreamstudio.ai/",
        false,
    );
    insert(
        "nano-banana-edit",
        "Nano Banana (Edit)",
        TargetKind::ImageEdit,
        "Edits an existing image from a text prompt.",
        "https://nanobanana.com/",
        false,
    );
    insert(
        "adobe-firefly",
        "Adobe Firefly (Generative Fill)",
        TargetKind::ImageEdit,
        "Generative fill and editing.",
        "https://firefly.adobe.com/",
        false,
    );
    insert(
        "canva-magic-edit",
        "Canva (Magic Edit)",
        TargetKind::ImageEdit,
        "Image editing inside the Canva ecosystem.",
        "https://www.canva.com/magic-edit/",
        false,
    );
    insert(
        "playground-ai",
        "Playground AI (Inpainting)",
        TargetKind::ImageEdit,
        "Versatile inpainting platform.",
        "https://playground.com/",
        false,
    );
    insert(
        "fotor-ai-editor",
        "Fotor (AI Image Editor)",
        TargetKind::ImageEdit,
        "Online photo editor with AI tools.",
        "https://www.fotor.com/features/ai-image-editor",
        false,
    );
    insert(
        "Google VEO",
        "Google VEO",
        TargetKind::Video,
        "High-quality 8 second clips with cinematic understanding.",
        "https://deepmind.google/technologies/veo/",
        false,
    );
    insert(
        "Flow VEO",
        "Flow VEO",
        TargetKind::Video,
        "Fluid, continuous sequences built from 8 second segments.",
        "https://deepmind.google/technologies/veo/",
        true,
    );
    insert(
        "Sora (OpenAI)",
        "Sora (OpenAI)",
        TargetKind::Video,
        "Longer realistic videos with complex narratives.",
        "https://openai.com/sora",
        false,
    );
    insert(
        "Runway Gen-2",
        "Runway Gen-2",
        TargetKind::Video,
        "Generate and edit videos.",
        "https://runwayml.com/",
        false,
    );
    insert(
        "Pika",
        "Pika",
        TargetKind::Video,
        "Short expressive videos with an artistic touch.",
        "https://pika.art/",
        false,
    );
    insert(
        "Stable Video Diffusion",
        "Stable Video Diffusion",
        TargetKind::Video,
        "Open model for short clips from text or images.",
        "https://stability.ai/stable-video",
        false,
    );

    map
}

#[cfg(test)]
mod tests {
    use super::{TargetCatalog, TargetKind};

    #[test]
    fn default_catalog_groups_targets_by_kind() {
        let catalog = TargetCatalog::default();
        assert_eq!(catalog.by_kind(TargetKind::Text).len(), 3);
        assert_eq!(catalog.by_kind(TargetKind::Image).len(), 6);
        assert_eq!(catalog.by_kind(TargetKind::ImageEdit).len(), 5);
        assert_eq!(catalog.by_kind(TargetKind::Video).len(), 6);
        assert_eq!(
            catalog.by_kind(TargetKind::Text).first().map(|t| t.id.as_str()),
            Some("geral-texto")
        );
    }

    #[test]
    fn only_flow_veo_supports_segments() {
        let catalog = TargetCatalog::default();
        let segmented: Vec<String> = catalog
            .list()
            .filter(|target| target.multi_segment)
            .map(|target| target.id.clone())
            .collect();
        assert_eq!(segmented, vec!["Flow VEO"]);
        assert!(!catalog.supports_segments("Google VEO"));
        assert!(!catalog.supports_segments("unknown"));
    }

    #[test]
    fn ensure_checks_kind() {
        let catalog = TargetCatalog::default();
        assert!(catalog.ensure("midjourney", TargetKind::Image).is_some());
        assert!(catalog.ensure("midjourney", TargetKind::Video).is_none());
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Visual theme applied to a generated infographic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfographicStyle {
    #[default]
    Modern,
    Minimal,
    Corporate,
    Creative,
    Dark,
    Colorful,
}

impl InfographicStyle {
    pub const ALL: [InfographicStyle; 6] = [
        InfographicStyle::Modern,
        InfographicStyle::Minimal,
        InfographicStyle::Corporate,
        InfographicStyle::Creative,
        InfographicStyle::Dark,
        InfographicStyle::Colorful,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InfographicStyle::Modern => "modern",
            InfographicStyle::Minimal => "minimal",
            InfographicStyle::Corporate => "corporate",
            InfographicStyle::Creative => "creative",
            InfographicStyle::Dark => "dark",
            InfographicStyle::Colorful => "colorful",
        }
    }

    /// Look up a style by name, falling back to `Modern` for anything unknown
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(name))
            .unwrap_or_else(|| {
                tracing::debug!("Unknown style {:?}, using modern", name);
                InfographicStyle::Modern
            })
    }

    /// Style fragment prepended to the image prompt
    pub fn description(&self) -> &'static str {
        match self {
            InfographicStyle::Modern => {
                "Create a modern, clean infographic with a contemporary design. Use a balanced color palette with blues, teals and subtle gradients, sans-serif typography, rounded shapes, flat icons and generous white space."
            }
            InfographicStyle::Minimal => {
                "Create a minimalist infographic with a very restrained design. Use a monochrome or two-color palette, thin lines, simple geometric shapes, lots of negative space and only the essential information."
            }
            InfographicStyle::Corporate => {
                "Create a professional corporate infographic suitable for a business presentation. Use navy, gray and one accent color, structured grid layouts, clear charts and data visualizations, and a formal, trustworthy tone."
            }
            InfographicStyle::Creative => {
                "Create a creative, artistic infographic with an original visual concept. Use hand-drawn or illustrated elements, playful typography, unexpected compositions and expressive visual metaphors."
            }
            InfographicStyle::Dark => {
                "Create a dark-themed infographic with a dark charcoal or black background. Use bright neon or high-contrast accent colors, glowing highlights, light text and a sleek, tech-inspired aesthetic."
            }
            InfographicStyle::Colorful => {
                "Create a vibrant, colorful infographic full of energy. Use a bold rainbow palette, bright contrasting sections, lively icons and illustrations, and an eye-catching, fun composition."
            }
        }
    }
}

impl fmt::Display for InfographicStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

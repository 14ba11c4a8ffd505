//! # Modality Configuration
//!
//! Per-modality settings for a project's annotation interface, keyed by the
//! `modality` tag so each variant carries its own typed payload.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modality", rename_all = "snake_case")]
pub enum ModalityConfig {
    Text {
        min_length: u32,
        max_length: u32,
        allow_markdown: bool,
    },
    Image {
        file_formats: Vec<String>,
        max_resolution: String,
        annotation_tools: Vec<String>,
    },
    Video {
        file_formats: Vec<String>,
        max_duration_seconds: u32,
        speed_control: bool,
        frame_stepping: bool,
    },
    Multimodal {
        channels: Vec<String>,
        supports_file_upload: bool,
        #[serde(default)]
        allow_reference_assets: bool,
    },
}

impl ModalityConfig {
    pub fn name(&self) -> &'static str {
        match self {
            ModalityConfig::Text { .. } => "text",
            ModalityConfig::Image { .. } => "image",
            ModalityConfig::Video { .. } => "video",
            ModalityConfig::Multimodal { .. } => "multimodal",
        }
    }

    /// Check that a text submission fits the configured bounds.
    /// Non-text modalities accept any length.
    pub fn accepts_text_length(&self, length: usize) -> bool {
        match self {
            ModalityConfig::Text {
                min_length,
                max_length,
                ..
            } => length >= *min_length as usize && length <= *max_length as usize,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnInputType {
    Text,
    Textarea,
    Select,
    Radio,
    Rating,
    Number,
}

/// One column of a project's task sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub id: String,
    pub name: String,
    pub kind: ColumnKind,
    #[serde(default)]
    pub input_type: Option<ColumnInputType>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub hidden: bool,
}

impl ColumnConfig {
    /// Columns a worker must fill before submitting
    pub fn is_required_input(&self) -> bool {
        self.kind == ColumnKind::Write && self.required && !self.hidden
    }
}

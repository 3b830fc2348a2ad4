//! Per-modality presentation strategy.
//!
//! Listening, reading and writing sessions share one engine; they differ only
//! in the screen areas the candidate sees and in how question widgets are
//! rendered. Widgets report back exclusively through the uniform
//! `(question_id, value)` change handler.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModalityKind {
    Listening,
    Reading,
    Writing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutArea {
    AudioPlayer,
    Passage,
    TaskPrompt,
    QuestionPanel,
    ResponseEditor,
    QuestionNavigator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionRenderer {
    /// Question groups follow the audio track section by section.
    AudioSections,
    /// Question groups sit beside the passage they refer to.
    PassageSplit,
    /// One long-form response per task.
    LongForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Exam,
    Edit,
}

pub trait Modality: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> ModalityKind;
    fn layout(&self) -> &'static [LayoutArea];
    fn question_renderer(&self) -> QuestionRenderer;
}

#[derive(Debug)]
pub struct Listening;

#[derive(Debug)]
pub struct Reading;

#[derive(Debug)]
pub struct Writing;

impl Modality for Listening {
    fn kind(&self) -> ModalityKind {
        ModalityKind::Listening
    }

    fn layout(&self) -> &'static [LayoutArea] {
        &[
            LayoutArea::AudioPlayer,
            LayoutArea::QuestionPanel,
            LayoutArea::QuestionNavigator,
        ]
    }

    fn question_renderer(&self) -> QuestionRenderer {
        QuestionRenderer::AudioSections
    }
}

impl Modality for Reading {
    fn kind(&self) -> ModalityKind {
        ModalityKind::Reading
    }

    fn layout(&self) -> &'static [LayoutArea] {
        &[
            LayoutArea::Passage,
            LayoutArea::QuestionPanel,
            LayoutArea::QuestionNavigator,
        ]
    }

    fn question_renderer(&self) -> QuestionRenderer {
        QuestionRenderer::PassageSplit
    }
}

impl Modality for Writing {
    fn kind(&self) -> ModalityKind {
        ModalityKind::Writing
    }

    fn layout(&self) -> &'static [LayoutArea] {
        &[
            LayoutArea::TaskPrompt,
            LayoutArea::ResponseEditor,
            LayoutArea::QuestionNavigator,
        ]
    }

    fn question_renderer(&self) -> QuestionRenderer {
        QuestionRenderer::LongForm
    }
}

impl ModalityKind {
    pub fn strategy(self) -> Arc<dyn Modality> {
        match self {
            ModalityKind::Listening => Arc::new(Listening),
            ModalityKind::Reading => Arc::new(Reading),
            ModalityKind::Writing => Arc::new(Writing),
        }
    }
}

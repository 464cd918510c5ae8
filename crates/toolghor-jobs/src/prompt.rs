// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Parameter acquisition seam. Asking suspends only the run that asked.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use toolghor_core::error::Result;

use crate::operations::ParameterSpec;

/// What the user is asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub label: String,
    /// Pre-filled answer.
    pub default: String,
}

impl From<&ParameterSpec> for PromptRequest {
    fn from(spec: &ParameterSpec) -> Self {
        Self {
            label: spec.label.to_string(),
            default: spec.default.to_string(),
        }
    }
}

/// What the user answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResponse {
    Provided(String),
    Cancelled,
}

/// Something that can ask the user for a parameter value.
#[async_trait]
pub trait ParameterPrompt: Send + Sync {
    /// `Err` only when the prompt channel itself broke; a user who declines
    /// to answer is `Ok(Cancelled)`.
    async fn ask(&self, request: &PromptRequest) -> Result<PromptResponse>;
}

/// Answers prompts from a fixed list, in order. Once the list runs out every
/// further prompt is cancelled.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<String>>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
        }
    }

    /// Answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl ParameterPrompt for ScriptedPrompt {
    async fn ask(&self, _request: &PromptRequest) -> Result<PromptResponse> {
        let next = self
            .answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        Ok(next.map_or(PromptResponse::Cancelled, PromptResponse::Provided))
    }
}

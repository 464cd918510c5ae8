// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// toolghor-jobs — The file queue and job orchestration layer.
//
// A `QueueStore` holds the files the user has loaded and a `ProgressReporter`
// carries the single (percent, message) status signal. The `Dispatcher` turns
// an `OperationId` into a validated, parameterised run over the matching
// files, driving the engines from `toolghor-core` one file at a time and
// handing every produced artifact to an `ArtifactSink`.

pub mod dispatcher;
pub mod operations;
pub mod params;
pub mod progress;
pub mod prompt;
pub mod queue;
pub mod runner;
pub mod sink;

pub use dispatcher::{Dispatcher, RunOutcome};
pub use operations::{DeliveryMode, OperationDescriptor, OperationId, ProgressRange, Selection};
pub use progress::ProgressReporter;
pub use prompt::{ParameterPrompt, PromptRequest, PromptResponse, ScriptedPrompt};
pub use queue::{AddOutcome, QueueEntryView, QueueStore, QueueView, RawFile};
pub use sink::{ArtifactSink, DirectorySink, MemorySink};

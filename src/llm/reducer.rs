// ABOUTME: Streaming tool-call reducer assembling validated objects from provider-neutral events
// ABOUTME: Per-stream state machine keyed by invocation id with skip-and-continue on malformed calls
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

//! # Tool-Call Reducer
//!
//! The reducer consumes one [`EventStream`] and turns every completed call of
//! the declared tool into a value of shape `T`. Each reducer owns its own map
//! of in-flight accumulators, so independent streams never share state.
//!
//! ```text
//! Idle --first event--> Active --StreamEnd / cap--> Done
//!                          \----StreamError-------> Failed
//! ```
//!
//! A call whose arguments fail to parse or validate is skipped and logged;
//! items already delivered are never retracted.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::ops::ControlFlow;

use tokio_stream::{Stream, StreamExt};
use tracing::{debug, trace, warn};

use super::{EventStream, StreamEvent};
use crate::errors::{AppError, AppResult};
use crate::validation::Shape;

/// Reducer lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReducerState {
    /// No event seen yet
    Idle,
    /// Processing events
    Active,
    /// Stream ended normally, was cancelled or reached the item cap
    Done,
    /// Stream ended with an error
    Failed,
}

impl ReducerState {
    /// Whether no further events will be processed
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Outcome of applying one event
#[derive(Debug)]
pub enum Step<T> {
    /// Nothing to deliver yet
    Continue,
    /// A tool call completed and validated
    Item(T),
    /// The stream ended normally
    Done,
    /// The stream failed; prior items stay delivered
    Failed(AppError),
}

/// Counters returned by [`ToolCallReducer::drive`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReduceSummary {
    /// Items handed to the consumer
    pub delivered: usize,
    /// Completed calls rejected by validation
    pub skipped: usize,
    /// The consumer stopped early
    pub cancelled: bool,
}

/// Arguments accumulated for one in-flight invocation
#[derive(Debug, Default)]
struct PendingToolCall {
    buffer: String,
    fragments: usize,
}

/// Incremental structured-object accumulator for one stream
#[derive(Debug)]
pub struct ToolCallReducer<T: Shape> {
    tool_name: String,
    state: ReducerState,
    pending: HashMap<String, PendingToolCall>,
    max_items: Option<usize>,
    delivered: usize,
    skipped: usize,
    _shape: PhantomData<fn() -> T>,
}

impl<T: Shape> ToolCallReducer<T> {
    /// Create a reducer accepting calls to `tool_name`
    #[must_use]
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            state: ReducerState::Idle,
            pending: HashMap::new(),
            max_items: None,
            delivered: 0,
            skipped: 0,
            _shape: PhantomData,
        }
    }

    /// Stop after `max_items` deliveries
    ///
    /// A cap of zero finishes the reducer before any event is read.
    #[must_use]
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        if self.cap_reached() {
            self.finish(ReducerState::Done);
        }
        self
    }

    fn cap_reached(&self) -> bool {
        self.max_items.is_some_and(|cap| self.delivered >= cap)
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> ReducerState {
        self.state
    }

    /// Items delivered so far
    #[must_use]
    pub const fn delivered(&self) -> usize {
        self.delivered
    }

    /// Malformed calls skipped so far
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    /// Invocations started but not yet completed
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn summary(&self, cancelled: bool) -> ReduceSummary {
        ReduceSummary {
            delivered: self.delivered,
            skipped: self.skipped,
            cancelled,
        }
    }

    fn finish(&mut self, state: ReducerState) {
        if !self.pending.is_empty() {
            debug!(
                discarded = self.pending.len(),
                "Discarding tool calls that never completed"
            );
        }
        self.pending.clear();
        self.state = state;
    }

    /// Apply one event
    ///
    /// Events arriving after a terminal state are ignored.
    pub fn apply(&mut self, event: StreamEvent) -> Step<T> {
        match self.state {
            ReducerState::Done | ReducerState::Failed => {
                trace!(?event, "Ignoring event after terminal state");
                return Step::Continue;
            }
            ReducerState::Idle => self.state = ReducerState::Active,
            ReducerState::Active => {}
        }

        match event {
            StreamEvent::TextDelta { text } => {
                trace!(len = text.len(), "Ignoring prose delta");
                Step::Continue
            }
            StreamEvent::ToolCallStart { id, name } => {
                if name != self.tool_name {
                    debug!(tool_call_id = %id, tool = %name, "Ignoring call to undeclared tool");
                } else if self.pending.insert(id.clone(), PendingToolCall::default()).is_some() {
                    debug!(tool_call_id = %id, "Tool call restarted, discarding earlier fragments");
                }
                Step::Continue
            }
            StreamEvent::ToolCallArgsDelta { id, fragment } => {
                if let Some(call) = self.pending.get_mut(&id) {
                    call.buffer.push_str(&fragment);
                    call.fragments += 1;
                } else {
                    debug!(tool_call_id = %id, "Dropping argument fragment for unknown call");
                }
                Step::Continue
            }
            StreamEvent::ToolCallComplete { id } => self.complete(&id),
            StreamEvent::StreamEnd => {
                self.finish(ReducerState::Done);
                Step::Done
            }
            StreamEvent::StreamError { kind, message } => {
                self.finish(ReducerState::Failed);
                Step::Failed(AppError::new(kind, message))
            }
        }
    }

    fn complete(&mut self, id: &str) -> Step<T> {
        let Some(call) = self.pending.remove(id) else {
            debug!(tool_call_id = %id, "Completion for unknown call");
            return Step::Continue;
        };

        match T::from_model_text(&call.buffer) {
            Ok(item) => {
                self.delivered += 1;
                if self.cap_reached() {
                    debug!(delivered = self.delivered, "Item cap reached");
                    self.finish(ReducerState::Done);
                }
                Step::Item(item)
            }
            Err(error) => {
                self.skipped += 1;
                warn!(
                    tool_call_id = %id,
                    fragments = call.fragments,
                    shape = T::NAME,
                    "Skipping malformed tool call: {}",
                    error.message
                );
                Step::Continue
            }
        }
    }

    /// Drive `stream` to completion, handing each item to `on_item`
    ///
    /// Returning [`ControlFlow::Break`] from `on_item` cancels: the stream is
    /// dropped at once and no further items are delivered. Cancellation and
    /// reaching the item cap are not errors.
    ///
    /// # Errors
    ///
    /// Returns the stream's terminal error after every item that preceded it
    /// has been delivered
    pub async fn drive<F>(&mut self, mut stream: EventStream, mut on_item: F) -> AppResult<ReduceSummary>
    where
        F: FnMut(T) -> ControlFlow<()>,
    {
        let mut cancelled = false;
        if self.state.is_terminal() {
            debug!("Reducer already finished, releasing stream unread");
            drop(stream);
            return Ok(self.summary(cancelled));
        }
        while let Some(event) = stream.next().await {
            match self.apply(event) {
                Step::Continue => {}
                Step::Item(item) => {
                    if on_item(item).is_break() {
                        debug!(delivered = self.delivered, "Consumer cancelled the stream");
                        cancelled = true;
                        self.finish(ReducerState::Done);
                    }
                }
                Step::Done => {}
                Step::Failed(error) => return Err(error),
            }
            if self.state.is_terminal() {
                break;
            }
        }
        drop(stream);

        if !self.state.is_terminal() {
            debug!("Event stream closed without a terminal event");
            self.finish(ReducerState::Done);
        }
        Ok(self.summary(cancelled))
    }

    /// Expose the reducer as a stream of validated items
    ///
    /// Dropping the returned stream cancels and releases `events`. A terminal
    /// error is yielded once as the final item.
    pub fn into_stream(mut self, mut events: EventStream) -> impl Stream<Item = AppResult<T>> + Send {
        async_stream::stream! {
            while !self.state.is_terminal() {
                let Some(event) = events.next().await else {
                    break;
                };
                match self.apply(event) {
                    Step::Continue | Step::Done => {}
                    Step::Item(item) => yield Ok(item),
                    Step::Failed(error) => {
                        yield Err(error);
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Recipe;

    const RECIPE_JSON: &str = r#"{"name":"Omelette","ingredients":"eggs","instructions":"Whisk.\nFry.","youtubeSearchQuery":"omelette"}"#;

    #[test]
    fn test_fragments_assemble_across_deltas() {
        let mut reducer = ToolCallReducer::<Recipe>::new("recipe");
        let (head, tail) = RECIPE_JSON.split_at(20);
        assert!(matches!(reducer.apply(StreamEvent::tool_start("a", "recipe")), Step::Continue));
        assert_eq!(reducer.state(), ReducerState::Active);
        reducer.apply(StreamEvent::tool_args("a", head));
        reducer.apply(StreamEvent::tool_args("a", tail));
        assert_eq!(reducer.pending_count(), 1);
        match reducer.apply(StreamEvent::tool_complete("a")) {
            Step::Item(recipe) => assert_eq!(recipe.name, "Omelette"),
            other => unreachable!("expected an item, got {other:?}"),
        }
        assert_eq!(reducer.pending_count(), 0);
    }

    #[test]
    fn test_restart_discards_earlier_fragments() {
        let mut reducer = ToolCallReducer::<Recipe>::new("recipe");
        reducer.apply(StreamEvent::tool_start("a", "recipe"));
        reducer.apply(StreamEvent::tool_args("a", "{garbage"));
        reducer.apply(StreamEvent::tool_start("a", "recipe"));
        reducer.apply(StreamEvent::tool_args("a", RECIPE_JSON));
        assert!(matches!(reducer.apply(StreamEvent::tool_complete("a")), Step::Item(_)));
    }

    #[test]
    fn test_events_after_end_are_ignored() {
        let mut reducer = ToolCallReducer::<Recipe>::new("recipe");
        reducer.apply(StreamEvent::tool_start("a", "recipe"));
        assert!(matches!(reducer.apply(StreamEvent::StreamEnd), Step::Done));
        assert_eq!(reducer.pending_count(), 0);
        reducer.apply(StreamEvent::tool_start("b", "recipe"));
        reducer.apply(StreamEvent::tool_args("b", RECIPE_JSON));
        assert!(matches!(reducer.apply(StreamEvent::tool_complete("b")), Step::Continue));
        assert_eq!(reducer.delivered(), 0);
    }
}

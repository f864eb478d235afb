// ABOUTME: Criterion benchmarks for streamed tool-call assembly
// ABOUTME: Measures SSE line buffering and reducer throughput for fragmented recipe streams
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

//! Criterion benchmarks for the streaming path.
//!
//! Measures SSE line buffering on chunked provider bodies and the tool call
//! reducer on recipe streams with increasingly fine argument fragmentation.

#![allow(
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    missing_docs
)]

use std::ops::ControlFlow;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fridge_chef::llm::sse_parser::SseLineBuffer;
use fridge_chef::llm::{EventStream, StreamEvent, ToolCallReducer};
use fridge_chef::models::Recipe;
use serde_json::json;
use tokio::runtime::Runtime;

const RECIPES: usize = 3;

fn recipe_arguments(index: usize) -> String {
    json!({
        "name": format!("Recipe {index}"),
        "ingredients": "eggs, spinach, cheddar cheese, butter",
        "instructions": "Whisk the eggs.\nWilt the spinach in butter.\nFold in the cheese and serve.",
        "youtubeSearchQuery": format!("quick recipe {index}"),
    })
    .to_string()
}

/// Recipe stream with each argument string split into fragments of `fragment_len` chars
fn recipe_events(fragment_len: usize) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    for index in 0..RECIPES {
        let id = format!("call-{index}");
        let arguments: Vec<char> = recipe_arguments(index).chars().collect();
        events.push(StreamEvent::tool_start(&id, "recipe"));
        for fragment in arguments.chunks(fragment_len) {
            events.push(StreamEvent::tool_args(&id, fragment.iter().collect::<String>()));
        }
        events.push(StreamEvent::tool_complete(id));
    }
    events.push(StreamEvent::StreamEnd);
    events
}

/// OpenAI-style SSE body split into TCP-sized chunks
fn sse_body(chunk_len: usize) -> Vec<Vec<u8>> {
    let mut body = String::new();
    for index in 0..RECIPES {
        for piece in recipe_arguments(index).as_bytes().chunks(16) {
            let fragment = String::from_utf8_lossy(piece);
            let line = json!({
                "choices": [{ "delta": { "tool_calls": [{ "index": index, "function": { "arguments": fragment } }] } }]
            });
            body.push_str(&format!("data: {line}\n\n"));
        }
    }
    body.push_str("data: [DONE]\n\n");
    body.as_bytes().chunks(chunk_len).map(<[u8]>::to_vec).collect()
}

fn bench_sse_line_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("sse_line_buffer");

    for chunk_len in [64_usize, 512, 4096] {
        let chunks = sse_body(chunk_len);
        let total: usize = chunks.iter().map(Vec::len).sum();
        group.throughput(Throughput::Bytes(total as u64));
        group.bench_with_input(BenchmarkId::new("feed", chunk_len), &chunks, |b, chunks| {
            b.iter(|| {
                let mut parser = SseLineBuffer::new();
                let mut count = 0_usize;
                for chunk in chunks {
                    count += parser.feed(black_box(chunk)).len();
                }
                count
            });
        });
    }

    group.finish();
}

fn bench_reducer_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("reducer_apply");

    for fragment_len in [1_usize, 8, 64] {
        let events = recipe_events(fragment_len);
        group.throughput(Throughput::Elements(events.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("fragment_len", fragment_len),
            &events,
            |b, events| {
                b.iter(|| {
                    let mut reducer = ToolCallReducer::<Recipe>::new("recipe");
                    for event in events {
                        black_box(reducer.apply(event.clone()));
                    }
                    reducer.delivered()
                });
            },
        );
    }

    group.finish();
}

fn bench_reducer_drive(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("reducer_drive");
    let events = recipe_events(8);
    group.throughput(Throughput::Elements(RECIPES as u64));

    group.bench_function("three_recipes", |b| {
        b.iter(|| {
            rt.block_on(async {
                let stream: EventStream = Box::pin(tokio_stream::iter(events.clone()));
                let mut reducer = ToolCallReducer::<Recipe>::new("recipe");
                reducer
                    .drive(stream, |recipe| {
                        black_box(recipe);
                        ControlFlow::Continue(())
                    })
                    .await
                    .unwrap()
            })
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_sse_line_buffer,
    bench_reducer_apply,
    bench_reducer_drive,
);
criterion_main!(benches);

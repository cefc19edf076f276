// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::thread;

use super::{ComputeContext, ContextState};
use crate::config::{BackendType, ContextConfig};
use crate::errors::codes;
use crate::model::{ComputeBatch, ComputeLambda, ErrorClass};

const REVERSE: &str = "lcm:register(function (batch) return batch:reverse() end)";
const UPPER: &str = "lcm:register(function (batch) return batch:upper() end)";

fn lua_context() -> ComputeContext {
    ComputeContext::from_config(&ContextConfig::with_backend(BackendType::Lua)).unwrap()
}

#[test]
fn test_reverse_lambda_keeps_batch_ids() {
    let context = lua_context();
    context.register(&ComputeLambda::new(1, REVERSE)).unwrap();

    let output = context.process(&ComputeBatch::new(1, 7, vec![1u8, 2, 3])).unwrap();
    assert_eq!(output, ComputeBatch::new(1, 7, vec![3u8, 2, 1]));
}

#[test]
fn test_unregistered_lambda_fails_with_nonzero_code() {
    let context = lua_context();
    let error = context.process(&ComputeBatch::new(99, 1, vec![])).unwrap_err();

    assert_ne!(error.code(), codes::SUCCESS);
    assert_eq!(error.code(), codes::UNKNOWN_LAMBDA);
    assert_eq!(error.class(), ErrorClass::Execution);
}

#[test]
fn test_reregistering_replaces_program() {
    let context = lua_context();
    context.register(&ComputeLambda::new(1, REVERSE)).unwrap();
    context.register(&ComputeLambda::new(1, UPPER)).unwrap();

    let output = context.process(&ComputeBatch::new(1, 1, b"abc".to_vec())).unwrap();
    assert_eq!(output.data, b"ABC");
    assert_eq!(context.lambda_count(), 1);
}

#[test]
fn test_failed_registration_and_execution_leave_context_usable() {
    let context = lua_context();
    context.register(&ComputeLambda::new(1, REVERSE)).unwrap();

    let compile = context.register(&ComputeLambda::new(1, "Ã…^()[")).unwrap_err();
    assert_eq!(compile.class(), ErrorClass::Registration);

    context
        .register(&ComputeLambda::new(2, "lcm:register(function (b) error('bad batch') end)"))
        .unwrap();
    let fault = context.process(&ComputeBatch::new(2, 1, b"x".to_vec())).unwrap_err();
    assert_eq!(fault.code(), codes::RUNTIME_FAULT);
    assert!(fault.message().contains("bad batch"));

    let output = context.process(&ComputeBatch::new(1, 2, b"ab".to_vec())).unwrap();
    assert_eq!(output.data, b"ba");
}

#[test]
fn test_missing_output_is_an_error() {
    let context = lua_context();
    context
        .register(&ComputeLambda::new(3, "lcm:register(function (b) end)"))
        .unwrap();

    let error = context.process(&ComputeBatch::new(3, 1, b"x".to_vec())).unwrap_err();
    assert_eq!(error.code(), codes::NO_OUTPUT);
}

#[tokio::test]
async fn test_concurrent_subscriber_sees_entries_in_order() {
    let context = Arc::new(lua_context());
    context
        .register(&ComputeLambda::new(
            5,
            "lcm:register(function (b)\n  for i = 1, 50 do lcm:log('entry ' .. i) end\n  return b\nend)",
        ))
        .unwrap();

    let mut subscription = context.subscribe();
    let listener = tokio::spawn(async move {
        let mut entries = Vec::new();
        while let Some(entry) = subscription.recv().await {
            entries.push(entry);
        }
        entries
    });

    let worker = Arc::clone(&context);
    tokio::task::spawn_blocking(move || worker.process(&ComputeBatch::new(5, 55, vec![])))
        .await
        .unwrap()
        .unwrap();
    context.close();

    let entries = listener.await.unwrap();
    assert_eq!(entries.len(), 50);
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.message, format!("entry {}", i + 1));
        assert_eq!((entry.lambda_id, entry.batch_id), (5, 55));
    }
}

#[test]
fn test_threads_share_one_context() {
    let context = Arc::new(lua_context());
    context.register(&ComputeLambda::new(1, UPPER)).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let context = Arc::clone(&context);
            thread::spawn(move || {
                for i in 0..25 {
                    let batch_id = t * 100 + i;
                    let output = context
                        .process(&ComputeBatch::new(1, batch_id, b"shared".to_vec()))
                        .unwrap();
                    assert_eq!(output.batch_id, batch_id);
                    assert_eq!(output.data, b"SHARED");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_lifecycle_after_close() {
    let context = lua_context();
    context.register(&ComputeLambda::new(1, REVERSE)).unwrap();
    context.close();
    context.close();

    assert_eq!(context.state(), ContextState::Closed);
    let error = context.register(&ComputeLambda::new(1, REVERSE)).unwrap_err();
    assert_eq!(error.class(), ErrorClass::Lifecycle);
    let error = context.process(&ComputeBatch::new(1, 1, vec![])).unwrap_err();
    assert_eq!(error.class(), ErrorClass::Lifecycle);
}

#[test]
fn test_wasm_backend_context() {
    let context = ComputeContext::from_config(&ContextConfig::with_backend(BackendType::Wasm)).unwrap();
    assert_eq!(context.backend(), "wasm");

    let error = context.register(&ComputeLambda::new(1, "not wasm")).unwrap_err();
    assert_eq!(error.class(), ErrorClass::Registration);
}

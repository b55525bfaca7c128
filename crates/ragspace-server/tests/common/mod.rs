//! Test engines that count lifecycle calls and can be told to fail.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ragspace_protocol::HandlerResult;
use ragspace_server::{EngineHandle, WorkspaceConfig, WorkspaceContext};
use ragspace_services::{Engine, EngineError};
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeed,
    Fail,
    Panic,
}

pub struct MockEngine {
    namespace: &'static str,
    on_initialize: Outcome,
    on_finalize: Outcome,
    initialize_calls: AtomicUsize,
    finalize_calls: AtomicUsize,
}

impl MockEngine {
    pub fn new(namespace: &'static str) -> Self {
        Self {
            namespace,
            on_initialize: Outcome::Succeed,
            on_finalize: Outcome::Succeed,
            initialize_calls: AtomicUsize::new(0),
            finalize_calls: AtomicUsize::new(0),
        }
    }

    pub fn on_initialize(mut self, outcome: Outcome) -> Self {
        self.on_initialize = outcome;
        self
    }

    pub fn on_finalize(mut self, outcome: Outcome) -> Self {
        self.on_finalize = outcome;
        self
    }

    pub fn initialize_calls(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }

    pub fn finalize_calls(&self) -> usize {
        self.finalize_calls.load(Ordering::SeqCst)
    }
}

impl Engine for MockEngine {
    fn namespace(&self) -> &str {
        self.namespace
    }

    async fn handle(&self, method: &str, params: Option<Value>) -> HandlerResult {
        Ok(json!({ "engine": self.namespace, "method": method, "params": params }))
    }

    async fn initialize_storages(&self) -> Result<(), EngineError> {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
        match self.on_initialize {
            Outcome::Succeed => Ok(()),
            Outcome::Fail => Err(EngineError::Other("disk unavailable".into())),
            Outcome::Panic => panic!("initialize exploded"),
        }
    }

    async fn finalize_storages(&self) -> Result<(), EngineError> {
        self.finalize_calls.fetch_add(1, Ordering::SeqCst);
        match self.on_finalize {
            Outcome::Succeed => Ok(()),
            Outcome::Fail => Err(EngineError::Other("flush failed".into())),
            Outcome::Panic => panic!("finalize exploded"),
        }
    }
}

/// A context whose `rag` handle is the returned mock.
pub fn workspace_with(
    config: WorkspaceConfig,
    rag: MockEngine,
) -> (WorkspaceContext, Arc<MockEngine>) {
    let rag = Arc::new(rag);
    let context = WorkspaceContext::new(
        config,
        EngineHandle::from_arc(rag.clone()),
        EngineHandle::new(MockEngine::new("documents")),
    );
    (context, rag)
}

pub fn workspace(id: &str) -> (WorkspaceContext, Arc<MockEngine>) {
    workspace_with(WorkspaceConfig::new(id), MockEngine::new("rag"))
}

pub fn disabled(id: &str) -> (WorkspaceContext, Arc<MockEngine>) {
    workspace_with(WorkspaceConfig::new(id).with_enabled(false), MockEngine::new("rag"))
}

/// An initialized context, ready to be finalized at shutdown.
pub fn ready_workspace(id: &str, on_finalize: Outcome) -> (WorkspaceContext, Arc<MockEngine>) {
    let rag = MockEngine::new("rag").on_finalize(on_finalize);
    let (context, rag) = workspace_with(WorkspaceConfig::new(id), rag);
    context.mark_initialized();
    (context, rag)
}

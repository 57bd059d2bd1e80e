//! Shared test doubles for the host-interface traits.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::context::{ContextHandle, ContextProbe, CookieJar};

/// Scripted context probe: a fixed set of contexts per pattern, and a fixed
/// token (or none) per context ID. Counts extraction attempts.
#[derive(Default)]
pub struct FakeProbe {
    contexts: Vec<(String, Vec<ContextHandle>)>,
    tokens: Vec<(u64, Option<String>)>,
    pub probes: AtomicUsize,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(mut self, pattern: &str, id: u64, url: &str) -> Self {
        let handle = ContextHandle {
            id,
            url: url.to_string(),
        };
        if let Some((_, list)) = self.contexts.iter_mut().find(|(p, _)| p == pattern) {
            list.push(handle);
        } else {
            self.contexts.push((pattern.to_string(), vec![handle]));
        }
        self
    }

    pub fn with_token(mut self, id: u64, token: Option<&str>) -> Self {
        self.tokens.push((id, token.map(ToString::to_string)));
        self
    }
}

#[async_trait::async_trait]
impl ContextProbe for FakeProbe {
    async fn contexts_matching(&self, pattern: &str) -> Vec<ContextHandle> {
        self.contexts
            .iter()
            .find(|(p, _)| p == pattern)
            .map(|(_, list)| list.clone())
            .unwrap_or_default()
    }

    async fn extract_token(&self, context: &ContextHandle) -> Option<String> {
        let _ = self.probes.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .iter()
            .find(|(id, _)| *id == context.id)
            .and_then(|(_, token)| token.clone())
    }
}

/// Cookie jar returning a fixed header for every domain.
pub struct FakeJar(pub String);

#[async_trait::async_trait]
impl CookieJar for FakeJar {
    async fn cookie_header(&self, _domain: &str) -> String {
        self.0.clone()
    }
}

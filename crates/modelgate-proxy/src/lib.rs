// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider proxy dispatch for modelgate.
//!
//! Normalizes a resolved model plus conversation into each vendor's request
//! shape, issues the call (blocking or streaming), and normalizes the result
//! back into one canonical shape. Three wire adapters cover every provider:
//! the native messages dialect, the `generateContent` dialect, and the
//! Chat Completions dialect.

pub mod adapter;
pub mod anthropic;
pub mod dispatch;
pub mod gemini;
pub mod openai;
pub mod sse;
pub mod translate;
pub mod types;

pub use adapter::{CallContext, WireAdapter};
pub use dispatch::{Dispatcher, ProviderTarget};
pub use sse::{SseDecoder, SseEvent};
pub use translate::{
    translate_bytes, translate_stream, ChatCompletionChunk, StreamTranslator, TranslatedEvent,
    TranslatedStream,
};
pub use types::{Completion, ProxyRequest, ProxyResponse, StreamHandle, TokenUsage};

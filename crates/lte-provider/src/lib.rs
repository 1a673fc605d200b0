//! LTE Provider - content generation backends
//!
//! Implements [`lte_core::ContentProvider`] over the Gemini
//! `generateContent` REST endpoint. Request and response shaping lives in
//! [`wire`] so it can be tested without a network.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod gemini;
pub mod wire;

pub use config::{GeminiConfig, API_KEY_VARS};
pub use gemini::GeminiProvider;

//! Restructuring service backed by the Gemini `generateContent` API.

pub mod client;
pub mod instruction;

pub use client::{GeminiClient, DEFAULT_BASE_URL, DEFAULT_MODEL};

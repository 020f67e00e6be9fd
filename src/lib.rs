//! Email triage — classifies inbound messages as Produtivo / Improdutivo
//! and drafts a short reply.

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod pipeline;

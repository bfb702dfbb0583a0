// ABOUTME: One extraction strategy per SourceKind, each usable without the Client.
// ABOUTME: Web strategies take HTML, container strategies take raw document bytes.

pub mod article;
pub mod images;
pub mod office;
pub mod pdf;

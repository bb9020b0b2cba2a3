#![allow(async_fn_in_trait)]

pub mod api;
pub mod commands;
pub mod config;
pub mod context;
pub mod converters;
pub mod embeds;
pub mod ocr;
pub mod pogo;
pub mod scheduler;

// src/lib.rs — Library root for TalkArt

pub mod api;
pub mod art;
pub mod cli;
pub mod flow;
pub mod gallery;
pub mod infra;
pub mod kiosk;
pub mod session;
pub mod store;

//! # lintbridge_host
//!
//! The interface lintbridge consumes from the host language service.
//!
//! This crate provides:
//! - [`SourceDocument`] and [`HostProject`], how source files are obtained
//! - [`HostDiagnostic`] and [`CodeFixAction`], the host's result shapes
//! - [`ServiceOps`], the host's operation table that gets proxied
//! - [`ConfigHost`], file reads and file watches, with [`FsHost`] for std-fs

mod diagnostic;
mod document;
mod service;
mod watch;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use diagnostic::{
    CodeFixAction, DiagnosticCategory, FileTextChanges, HostDiagnostic, TextChange, TextSpan,
};
pub use document::{HostProject, SourceDocument};
pub use service::{
    CodeFixRequest, CodeFixesFn, DiagnosticsFn, LanguageService, OperationName, QuickInfo,
    QuickInfoFn, ServiceOps, SupportedCodeFixesFn,
};
pub use watch::{ConfigHost, FileWatchEvent, FileWatcher, FsHost, WatchCallback};

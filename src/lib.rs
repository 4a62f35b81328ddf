//! Cullmate core: scan a camera card, route files through a folder
//! template, hash-and-copy to one or two destinations, verify, triage,
//! and emit a JSON manifest plus an HTML proof that it is safe to format
//! the card.

pub mod constants;
pub mod error;
pub mod fsutil;
pub mod hash;
pub mod ingest;
pub mod manifest;
pub mod metadata;
pub mod model;
pub mod orchestrator;
pub mod progress;
pub mod report;

pub use error::{IngestError, Result};
pub use ingest::sidecar::XmpPatch;
pub use ingest::triage::{NullTriageEngine, TriageEngine};
pub use model::{
    FileEntry, FileStatus, FolderTemplate, HashAlgorithm, IngestManifest, RoutingRule, RuleMatch, ScannedFile,
    TokenContext, Totals, TriageFlag, TriageKind, TriageSummary, VerifyMode,
};
pub use orchestrator::{run_ingest, CancelToken, IngestParams};
pub use progress::{IngestEvent, ProgressCallback};

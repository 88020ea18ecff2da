//! Pipeline stages for room-video analysis.
//!
//! Each submodule implements exactly one step, so each can be tested on
//! its own and the remote service can be swapped for a double.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ stage ──▶ ingest ──────────▶ extract ──▶ contract
//! (bytes)   (scratch)  (upload + poll)    (prompt)    (JSON parse)
//! ```
//!
//! 1. [`input`]    — the uploaded media: bytes, MIME type, filename
//! 2. [`stage`]    — write it to a unique scratch file that is always removed
//! 3. [`ingest`]   — upload the scratch file and wait until the service has
//!    finished processing it; the only stage that loops
//! 4. [`extract`]  — one generation request pairing the file with the prompt
//! 5. [`contract`] — strip code fences and parse the answer into
//!    [`crate::output::ExtractionResult`], all or nothing

pub mod contract;
pub mod extract;
pub mod ingest;
pub mod input;
pub mod stage;

//! # PhotoFlow
//!
//! Batch photo processing: point it at a pile of images and/or ZIP archives
//! and get back a single downloadable ZIP, a per-file log, and summary
//! counters.
//!
//! # Architecture: One Run, Four Stages
//!
//! Every invocation is a *run* — one mode, one configuration, one result:
//!
//! ```text
//! 1. Collect    uploads   →  workspace/       (blobs → candidate files)
//! 2. Transform  candidates → outputs          (rename | convert | watermark)
//! 3. Archive    outputs   →  result.zip       (in-memory ZIP + log.txt)
//! 4. Result     archive + log + stats         (held by the caller)
//! ```
//!
//! Data flows strictly one way. Nothing persists between runs: the workspace
//! is an ephemeral temp directory torn down when the run returns, and the
//! caller replaces its previous [`run::RunResult`] wholesale.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`collect`] | Stage 1 — expands uploads into the workspace, filters by size and extension |
//! | [`rename`] | Transform — per-folder sequential photo numbering with collision skip |
//! | [`convert`] | Transform — decode, ICC carry-over, optional downscale, JPEG encode |
//! | [`watermark`] | Transform — scale/opacity/position alpha compositing |
//! | [`archive`] | Stage 3 — in-memory ZIP assembly, log-only fallback |
//! | [`run`] | Orchestration — wires the stages together and owns the failure policy |
//! | [`transfer`] | Optional delivery of a finished archive to an external endpoint |
//! | [`types`] | Shared types: `UploadedItem`, `CandidateFile`, `RunLog`, `RunStats` |
//!
//! # Design Decisions
//!
//! ## Per-File Failure, Never Per-Run
//!
//! A corrupt archive member, an undecodable photo, or an encode failure is
//! logged with its path, counted, and skipped; the run keeps going. Only two
//! things abort a run: a workspace that cannot be created, and a ZIP
//! container that cannot be opened at all. Even an archiving failure degrades
//! to a log-only archive, so the user always receives something.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resizing (Lanczos3), compositing, and JPEG encoding all come
//! from the `image` crate — no ImageMagick, no system libraries, a fully
//! self-contained binary. HEIC/HEIF uploads are accepted (renaming works on
//! them) but decode as per-file errors, since no pure-Rust decoder exists.
//!
//! ## Deterministic Reports From Parallel Work
//!
//! Convert and watermark fan per-file work out with rayon, then fold results
//! back in input order, so identical input always produces an identical log.
//! The renamer stays sequential: its numbering within a folder is ordered by
//! construction and must not race.

pub mod archive;
pub mod collect;
pub mod convert;
pub mod rename;
pub mod run;
pub mod transfer;
pub mod types;
pub mod watermark;

#[cfg(test)]
pub(crate) mod test_helpers;

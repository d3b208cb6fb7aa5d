//! Trance Revision - Reversion Engine and Entity Editor
//!
//! Reverts trance entities to earlier revisions, either as a full snapshot
//! restoration or scoped to one translation, and saves edits as new
//! revisions. Persistence goes through [`trance_storage::RevisionStore`].
//!
//! ```ignore
//! let reverter = RevisionReverter::new(store, TranceConfig::default())?;
//! let result = reverter
//!     .revert_translation(entity_id, old_revision, "en".into(), false, author_id)
//!     .await?;
//! println!("{}", result.summary(reverter.config()));
//! ```

pub mod editor;
pub mod merge;
pub mod messages;
pub mod reverter;

pub use editor::{EntityDraft, SaveOutcome, SaveStatus, TranceEditor};
pub use merge::{prepare_full_revert, prepare_translation_revert};
pub use messages::{format_date, revert_question, revert_summary, revision_log};
pub use reverter::{RevertPolicy, RevertRequest, ReversionResult, RevisionReverter};

//! Domain types for works, pages and linked metadata values.

pub mod linked;
pub mod page;
pub mod raw;
pub mod work;

pub use linked::{resolve_label, AuthoritySource, LinkedEntity, MetadataValue};
pub use page::{Comment, HistoryAction, HistoryEntry, Page, PageStatus, WorkStatus};
pub use work::{Creator, CreatorRole, WorkSummary};

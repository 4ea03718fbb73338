pub mod attachment;
pub mod message;

pub use attachment::{Attachment, AttachmentKind};
pub use message::HistoryEntry;

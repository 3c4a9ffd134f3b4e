pub mod cover_letter;
pub mod message_body;
pub mod resume;

pub use cover_letter::CoverLetter;
pub use message_body::MessageBody;
pub use resume::{RESUME_BUCKET, RESUME_MAX_BYTES, ResumeFile};

pub mod filename;
pub mod media;
pub mod quota;
pub mod storage;

pub use media::MediaKind;
pub use quota::{Admission, QuotaRejection, QuotaSnapshot};

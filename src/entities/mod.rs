// Entity Models - records handled by the office tools
// Survey samples are the immutable registry; updates and mail are mutable

pub mod mail;
pub mod sample;
pub mod update;

pub use mail::{
    format_long_date, Classification, DeliveryMethod, MailDraft, MailKind, MailRecord,
};
pub use sample::Sample;
pub use update::{UpdateDraft, UpdateRecord, UpdateStatus};

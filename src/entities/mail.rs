// ✉️ Mail Entity - incoming and outgoing correspondence log
//
// Each mail entry stands alone: no registry, no reconciliation.
// Classification and delivery method are stored as codes and rendered through
// closed lookup tables; an unknown code renders as "-" instead of failing.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// MAIL KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailKind {
    Incoming,
    Outgoing,
}

impl MailKind {
    pub const ALL: [MailKind; 2] = [MailKind::Incoming, MailKind::Outgoing];

    pub fn as_str(&self) -> &'static str {
        match self {
            MailKind::Incoming => "incoming",
            MailKind::Outgoing => "outgoing",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "incoming" | "masuk" => Some(MailKind::Incoming),
            "outgoing" | "keluar" => Some(MailKind::Outgoing),
            _ => None,
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            MailKind::Incoming => "incoming_mails",
            MailKind::Outgoing => "outgoing_mails",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            MailKind::Incoming => "Surat Masuk",
            MailKind::Outgoing => "Surat Keluar",
        }
    }

    /// File name prefix for spreadsheet exports
    pub fn export_prefix(&self) -> &'static str {
        match self {
            MailKind::Incoming => "surat-masuk",
            MailKind::Outgoing => "surat-keluar",
        }
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Letter classification codes used by the office archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Planning,
    Finance,
    Personnel,
    Supplies,
    PublicRelations,
    Administration,
    SocialStatistics,
    ProductionStatistics,
    DistributionStatistics,
    RegionalAccounts,
    DataProcessing,
}

impl Classification {
    pub const ALL: [Classification; 11] = [
        Classification::Planning,
        Classification::Finance,
        Classification::Personnel,
        Classification::Supplies,
        Classification::PublicRelations,
        Classification::Administration,
        Classification::SocialStatistics,
        Classification::ProductionStatistics,
        Classification::DistributionStatistics,
        Classification::RegionalAccounts,
        Classification::DataProcessing,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Classification::Planning => "PR",
            Classification::Finance => "KU",
            Classification::Personnel => "KP",
            Classification::Supplies => "PL",
            Classification::PublicRelations => "HM",
            Classification::Administration => "TU",
            Classification::SocialStatistics => "SS",
            Classification::ProductionStatistics => "SP",
            Classification::DistributionStatistics => "SD",
            Classification::RegionalAccounts => "NW",
            Classification::DataProcessing => "IP",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Classification::Planning => "Perencanaan",
            Classification::Finance => "Keuangan",
            Classification::Personnel => "Kepegawaian",
            Classification::Supplies => "Perlengkapan",
            Classification::PublicRelations => "Hubungan Masyarakat",
            Classification::Administration => "Ketatausahaan",
            Classification::SocialStatistics => "Statistik Sosial",
            Classification::ProductionStatistics => "Statistik Produksi",
            Classification::DistributionStatistics => "Statistik Distribusi",
            Classification::RegionalAccounts => "Neraca Wilayah",
            Classification::DataProcessing => "Integrasi Pengolahan Data",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    pub fn label_for(code: &str) -> &'static str {
        Self::from_code(code).map(|c| c.label()).unwrap_or("-")
    }
}

// ============================================================================
// DELIVERY METHOD
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryMethod {
    Email,
    Hardcopy,
    Srikandi,
    WhatsApp,
    Post,
}

impl DeliveryMethod {
    pub const ALL: [DeliveryMethod; 5] = [
        DeliveryMethod::Email,
        DeliveryMethod::Hardcopy,
        DeliveryMethod::Srikandi,
        DeliveryMethod::WhatsApp,
        DeliveryMethod::Post,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            DeliveryMethod::Email => "email",
            DeliveryMethod::Hardcopy => "hardcopy",
            DeliveryMethod::Srikandi => "srikandi",
            DeliveryMethod::WhatsApp => "whatsapp",
            DeliveryMethod::Post => "pos",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeliveryMethod::Email => "Email",
            DeliveryMethod::Hardcopy => "Hardcopy",
            DeliveryMethod::Srikandi => "Srikandi",
            DeliveryMethod::WhatsApp => "WhatsApp",
            DeliveryMethod::Post => "Pos",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.code() == code)
    }

    pub fn label_for(code: &str) -> &'static str {
        Self::from_code(code).map(|m| m.label()).unwrap_or("-")
    }
}

// ============================================================================
// MAIL RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailRecord {
    /// UUID minted by the store on insert
    pub id: String,
    pub kind: MailKind,

    /// Letter number as printed on the letter
    pub number: String,
    pub date: Option<NaiveDate>,
    pub origin: String,
    pub destination: String,

    /// Raw classification code (see [`Classification`])
    pub classification: String,
    pub description: String,

    /// Raw delivery method code (see [`DeliveryMethod`])
    pub delivery_method: String,
    pub is_reply_letter: bool,
    pub reference: String,

    /// Staff member who registered the letter
    pub employee_name: String,
    pub link: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl MailRecord {
    pub fn classification_label(&self) -> &'static str {
        Classification::label_for(&self.classification)
    }

    pub fn delivery_label(&self) -> &'static str {
        DeliveryMethod::label_for(&self.delivery_method)
    }

    pub fn reply_label(&self) -> &'static str {
        if self.is_reply_letter {
            "Ya"
        } else {
            "Tidak"
        }
    }

    pub fn date_label(&self) -> String {
        self.date
            .map(format_long_date)
            .unwrap_or_else(|| "-".to_string())
    }
}

// ============================================================================
// MAIL DRAFT (form payload)
// ============================================================================

/// Mail form payload; `id` present means edit in place.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MailDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub number: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub classification: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub delivery_method: String,
    #[serde(default)]
    pub is_reply_letter: bool,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub employee_name: String,
    #[serde(default)]
    pub link: Option<String>,
}

impl From<&MailRecord> for MailDraft {
    fn from(mail: &MailRecord) -> Self {
        MailDraft {
            id: Some(mail.id.clone()),
            number: mail.number.clone(),
            date: mail.date,
            origin: mail.origin.clone(),
            destination: mail.destination.clone(),
            classification: mail.classification.clone(),
            description: mail.description.clone(),
            delivery_method: mail.delivery_method.clone(),
            is_reply_letter: mail.is_reply_letter,
            reference: mail.reference.clone(),
            employee_name: mail.employee_name.clone(),
            link: mail.link.clone(),
        }
    }
}

// ============================================================================
// DATE RENDERING
// ============================================================================

const MONTHS_ID: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// "5 Januari 2025" - the long Indonesian date used in tables and exports
pub fn format_long_date(date: NaiveDate) -> String {
    format!(
        "{} {} {}",
        date.day(),
        MONTHS_ID[date.month0() as usize],
        date.year()
    )
}

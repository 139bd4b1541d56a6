use serde::{Deserialize, Serialize};

pub mod collections {
    pub const USERS: &str = "users";
    pub const CHATS: &str = "chats";
    pub const DOCUMENTS: &str = "documents";
    pub const LAWYERS: &str = "lawyers";
    pub const LAWYER_APPLICATIONS: &str = "lawyer_applications";
    pub const BOOKINGS: &str = "bookings";
    pub const PAYMENTS: &str = "payments";
    pub const WEBHOOK_EVENTS: &str = "webhook_events";
    pub const CASES: &str = "cases";
    pub const LAWS: &str = "laws";
    pub const WAITLIST: &str = "waitlist";
    pub const LAWYER_INTEREST: &str = "lawyer_interest";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Authorized,
    Confirmed,
    PaymentFailed,
}

impl BookingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::PaymentFailed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    DocumentsUploaded,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    RentAgreement,
    LegalNotice,
    Affidavit,
    ConsumerComplaint,
}

impl DocumentType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "rent_agreement" => Some(Self::RentAgreement),
            "legal_notice" => Some(Self::LegalNotice),
            "affidavit" => Some(Self::Affidavit),
            "consumer_complaint" => Some(Self::ConsumerComplaint),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RentAgreement => "rent_agreement",
            Self::LegalNotice => "legal_notice",
            Self::Affidavit => "affidavit",
            Self::ConsumerComplaint => "consumer_complaint",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::RentAgreement => "Rent Agreement",
            Self::LegalNotice => "Legal Notice",
            Self::Affidavit => "Affidavit",
            Self::ConsumerComplaint => "Consumer Complaint",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub city: String,
    pub state: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub updated_at: String,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_role() -> String {
    "user".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub session_id: String,
    pub user_id: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub storage_path: String,
    pub data: serde_json::Value,
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LawyerProfile {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<String>,
    pub name: String,
    pub bar_council_id: String,
    pub specialization: Vec<String>,
    pub languages: Vec<String>,
    pub city: String,
    pub state: String,
    pub experience: i64,
    pub price: i64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub reviews: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LawyerApplication {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub owner_user_id: String,
    pub name: String,
    pub bar_council_id: String,
    pub specialization: Vec<String>,
    pub languages: Vec<String>,
    pub city: String,
    pub state: String,
    pub experience: i64,
    pub price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub verification_status: VerificationStatus,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub verification_docs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lawyer_profile_id: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub user_id: String,
    pub lawyer_id: String,
    pub consultation_type: String,
    pub date: String,
    pub time_slot: String,
    pub duration: i64,
    pub amount: i64,
    pub status: BookingStatus,
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_id: String,
    pub order_id: String,
    pub event: String,
    pub recorded_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEventRecord {
    pub event_id: String,
    pub event_type: String,
    pub recorded_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseNote {
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hearing_date: Option<String>,
    #[serde(default = "default_case_status")]
    pub status: String,
    #[serde(default)]
    pub notes: Vec<CaseNote>,
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub updated_at: String,
}

fn default_case_status() -> String {
    "active".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Law {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    pub category: String,
    pub state: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub how_to_apply: Option<String>,
    #[serde(default)]
    pub required_docs: Vec<String>,
    #[serde(default)]
    pub key_points: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub name: String,
    pub email: String,
    pub city: String,
    pub user_type: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LawyerInterestEntry {
    pub name: String,
    pub email: String,
    pub city: String,
    pub practice_area: String,
    pub experience: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_at: String,
}

pub mod campaign_id;
pub mod campaign_status;
pub mod email;
pub mod send_status;
pub mod smtp_settings;

pub use campaign_id::CampaignId;
pub use campaign_status::CampaignStatus;
pub use email::Email;
pub use send_status::SendStatus;
pub use smtp_settings::{EncryptionMode, SmtpSettings};

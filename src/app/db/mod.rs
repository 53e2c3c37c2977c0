pub mod campaigns;
pub mod recipients;
pub mod send_logs;

pub use campaigns::{Campaign, CampaignContent};
pub use recipients::{NewRecipient, Recipient};
pub use send_logs::{NewSendLog, SendCounts, SendLogView};

//! Campaign dispatch: the background loop that drains Sending campaigns.
//!
//! Progress is re-derived from the send log on every batch (recipients with
//! no log row for the campaign), so a restart resumes where the last
//! persisted batch stopped. A crash between a successful SMTP send and the
//! batch's log write can send that recipient a second message on resume.

pub mod store;
pub mod worker;

pub use store::{CampaignStore, Finalized, SqliteCampaignStore};
pub use worker::{truncate_error, DispatchError, Dispatcher, Step};

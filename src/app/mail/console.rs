use async_trait::async_trait;

use super::{Addressing, DeliveryAdapter, DeliveryError};
use crate::app::db::{Campaign, Recipient};
use crate::app::domain::SmtpSettings;

/// Console delivery for local development.
/// Logs message details with tracing::info! instead of talking SMTP.
#[derive(Debug)]
pub struct ConsoleDelivery;

#[async_trait]
impl DeliveryAdapter for ConsoleDelivery {
    async fn send(
        &self,
        campaign: &Campaign,
        recipient: &Recipient,
        settings: &SmtpSettings,
        override_to: Option<&str>,
    ) -> Result<(), DeliveryError> {
        let addressing = Addressing::resolve(campaign, recipient, settings, override_to);
        tracing::info!(
            campaign_id = %campaign.id,
            to = %addressing.to,
            from = %addressing.from_address,
            subject = %campaign.subject,
            smtp_host = %settings.host,
            "Email sent (console)"
        );
        Ok(())
    }
}

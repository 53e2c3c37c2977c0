use async_trait::async_trait;
use lettre::{
    message::{Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};

use super::{Addressing, DeliveryAdapter, DeliveryError};
use crate::app::db::{Campaign, Recipient};
use crate::app::domain::{EncryptionMode, SmtpSettings};

/// SMTP delivery for production use.
///
/// Settings arrive per send session, so a transport is built for every
/// message rather than once at startup.
#[derive(Debug)]
pub struct SmtpDelivery;

impl SmtpDelivery {
    fn transport(settings: &SmtpSettings) -> Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryError> {
        let tls = match settings.encryption {
            EncryptionMode::None => Tls::None,
            EncryptionMode::Ssl => Tls::Wrapper(Self::tls_parameters(settings)?),
            EncryptionMode::StartTls => Tls::Required(Self::tls_parameters(settings)?),
        };

        let mut transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
            .port(settings.port)
            .tls(tls);

        // Authenticate only when a username is provided
        if let Some(user) = settings.username.as_deref().filter(|u| !u.trim().is_empty()) {
            let creds = Credentials::new(user.to_string(), settings.password.clone().unwrap_or_default());
            transport = transport.credentials(creds);
        }

        Ok(transport.build())
    }

    fn tls_parameters(settings: &SmtpSettings) -> Result<TlsParameters, DeliveryError> {
        TlsParameters::builder(settings.tls_domain().to_string())
            .dangerous_accept_invalid_certs(settings.allow_self_signed)
            .build()
            .map_err(|e| DeliveryError::Config(format!("TLS setup failed: {}", e)))
    }
}

/// Build the MIME message: html, plus a plain-text alternative when present.
pub(crate) fn compose(campaign: &Campaign, addressing: &Addressing) -> Result<Message, DeliveryError> {
    let from_address: Address = addressing
        .from_address
        .parse()
        .map_err(|e| DeliveryError::Address(format!("'{}': {}", addressing.from_address, e)))?;
    let from = Mailbox::new(Some(addressing.from_name.clone()), from_address);

    let to: Mailbox = addressing
        .to
        .parse()
        .map_err(|e| DeliveryError::Address(format!("'{}': {}", addressing.to, e)))?;

    let builder = Message::builder().from(from).to(to).subject(&campaign.subject);

    let text = campaign.text_body.as_deref().filter(|t| !t.trim().is_empty());
    let html = Some(campaign.html_body.as_str()).filter(|h| !h.trim().is_empty());

    let message = match (html, text) {
        (Some(html), Some(text)) => {
            builder.multipart(MultiPart::alternative_plain_html(text.to_string(), html.to_string()))
        }
        (Some(html), None) => builder.singlepart(SinglePart::html(html.to_string())),
        (None, Some(text)) => builder.singlepart(SinglePart::plain(text.to_string())),
        (None, None) => builder.singlepart(SinglePart::plain(String::new())),
    };

    message.map_err(|e| DeliveryError::Message(e.to_string()))
}

#[async_trait]
impl DeliveryAdapter for SmtpDelivery {
    async fn send(
        &self,
        campaign: &Campaign,
        recipient: &Recipient,
        settings: &SmtpSettings,
        override_to: Option<&str>,
    ) -> Result<(), DeliveryError> {
        let addressing = Addressing::resolve(campaign, recipient, settings, override_to);
        let message = compose(campaign, &addressing)?;
        let transport = Self::transport(settings)?;

        transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError::Smtp(e.to_string()))
    }
}

use async_trait::async_trait;

use super::{RequestHandler, Service};
use crate::repositories::email::EmailClient;

/// Email sends are fire-and-forget: there is no response channel, and a
/// failed send must never fail the request that triggered it.
pub enum EmailRequest {
    SendCoupon { recipient: String, subject: String },
}

#[derive(Clone)]
pub struct EmailRequestHandler {
    client: EmailClient,
}

impl EmailRequestHandler {
    pub fn new(api_url: String, sender: String, auth_token: String) -> Self {
        let client = EmailClient::new(api_url, sender, auth_token);

        EmailRequestHandler { client }
    }
}

#[async_trait]
impl RequestHandler<EmailRequest> for EmailRequestHandler {
    async fn handle_request(&self, request: EmailRequest) {
        match request {
            EmailRequest::SendCoupon { recipient, subject } => {
                match self.client.send_coupon(&recipient, &subject).await {
                    Ok(()) => log::info!("Coupon email sent to {}.", recipient),
                    Err(e) => log::error!("Failed to send coupon email to {}: {}", recipient, e),
                }
            }
        }
    }
}

pub struct EmailService;

impl EmailService {
    pub fn new() -> Self {
        EmailService {}
    }
}

#[async_trait]
impl Service<EmailRequest, EmailRequestHandler> for EmailService {}

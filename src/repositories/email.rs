use crate::utils;

use serde_json::json;

/// Client for the transactional email provider's JSON API.
#[derive(Clone)]
pub struct EmailClient {
    http_client: reqwest::Client,
    api_url: String,
    sender: String,
    auth_token: String,
}

impl EmailClient {
    pub fn new(api_url: String, sender: String, auth_token: String) -> Self {
        EmailClient {
            http_client: reqwest::Client::new(),
            api_url,
            sender,
            auth_token,
        }
    }

    pub async fn send_coupon(&self, recipient: &str, subject: &str) -> Result<(), anyhow::Error> {
        let coupon_code = utils::generate_coupon_code();
        let body = format!(
            "Dear Customer,\n\n\
             Congratulations on joining our pre-order waitlist!\n\n\
             As a token of our appreciation, here is your exclusive coupon code: {}\n\n\
             Use this coupon code to get a special discount on your purchase.\n\n\
             Thank you for being with us.",
            coupon_code
        );

        self.http_client
            .post(format!("{}/email", self.api_url))
            .bearer_auth(&self.auth_token)
            .json(&json!({
                "from": self.sender,
                "to": recipient,
                "subject": subject,
                "text_body": body,
            }))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

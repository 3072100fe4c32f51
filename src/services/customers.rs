use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::sync::{mpsc, oneshot};

use super::email::EmailRequest;
use super::{RequestHandler, Service, ServiceError};
use crate::models::customers::{
    NewCustomer, NewReferral, RankEntry, SignupConfirmation, TopReferrer,
};
use crate::repositories::customers::CustomerRepository;
use crate::utils;

const LEADERBOARD_SIZE: i64 = 10;

// Referrers who climb under this position get a coupon mailed to the
// person they referred.
const COUPON_POSITION_LIMIT: i64 = 99;

pub enum CustomerRequest {
    Signup {
        new_customer: NewCustomer,
        response: oneshot::Sender<Result<SignupConfirmation, ServiceError>>,
    },
    TopReferrers {
        response: oneshot::Sender<Result<Vec<TopReferrer>, ServiceError>>,
    },
    RecordReferral {
        referral: NewReferral,
        response: oneshot::Sender<Result<i64, ServiceError>>,
    },
    RankData {
        response: oneshot::Sender<Result<Vec<RankEntry>, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct CustomerRequestHandler {
    repository: CustomerRepository,
    email_channel: mpsc::Sender<EmailRequest>,
}

impl CustomerRequestHandler {
    pub fn new(sql_conn: SqlitePool, email_channel: mpsc::Sender<EmailRequest>) -> Self {
        let repository = CustomerRepository::new(sql_conn);

        CustomerRequestHandler {
            repository,
            email_channel,
        }
    }

    async fn signup(&self, new_customer: NewCustomer) -> Result<SignupConfirmation, ServiceError> {
        let name = new_customer.name.as_deref().unwrap_or("").trim();
        let email = new_customer.email.as_deref().unwrap_or("").trim();
        let phone = new_customer.phone.as_deref().unwrap_or("").trim();

        if name.is_empty() || email.is_empty() || phone.is_empty() {
            return Err(ServiceError::InvalidRequest(
                "Name, email, and phone are required".to_string(),
            ));
        }
        if !utils::is_valid_email(email) {
            return Err(ServiceError::InvalidRequest(
                "Invalid email format".to_string(),
            ));
        }
        if !utils::is_valid_phone(phone) {
            return Err(ServiceError::InvalidRequest(
                "Invalid phone number format".to_string(),
            ));
        }

        if self
            .repository
            .find_by_email(email)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?
            .is_some()
        {
            return Err(ServiceError::InvalidRequest(
                "Email already registered".to_string(),
            ));
        }

        if self
            .repository
            .find_by_phone(phone)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?
            .is_some()
        {
            return Err(ServiceError::InvalidRequest(
                "Phone number already registered".to_string(),
            ));
        }

        // The form posts an empty referralCode when the visitor left it
        // blank; treat that the same as absent.
        let referred_by = new_customer
            .referral_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty());

        if let Some(code) = referred_by {
            if self
                .repository
                .find_by_referral_code(code)
                .await
                .map_err(|e| ServiceError::Database(e.to_string()))?
                .is_none()
            {
                return Err(ServiceError::InvalidRequest(
                    "Invalid referral code".to_string(),
                ));
            }
        }

        let customer = self
            .repository
            .create_customer(name, email, phone, referred_by)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        Ok(SignupConfirmation {
            message: "Signup successful".to_string(),
            referral_code: customer.referral_code,
            position: customer.position,
        })
    }

    async fn top_referrers(&self) -> Result<Vec<TopReferrer>, ServiceError> {
        self.repository
            .top_referrers(LEADERBOARD_SIZE)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn record_referral(&self, referral: NewReferral) -> Result<i64, ServiceError> {
        let new_position = self
            .repository
            .apply_referral(&referral.referral_code, &referral.email)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?
            .ok_or_else(|| ServiceError::InvalidRequest("Invalid referral code".to_string()))?;

        if new_position < COUPON_POSITION_LIMIT {
            let request = EmailRequest::SendCoupon {
                recipient: referral.email,
                subject: "Your pre-order coupon code".to_string(),
            };

            // The caller never waits on the email; a full channel only
            // costs the coupon.
            if let Err(e) = self.email_channel.send(request).await {
                log::error!("Could not queue coupon email: {}", e);
            }
        }

        Ok(new_position)
    }

    async fn rank_data(&self) -> Result<Vec<RankEntry>, ServiceError> {
        self.repository
            .rank_data()
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }
}

#[async_trait]
impl RequestHandler<CustomerRequest> for CustomerRequestHandler {
    async fn handle_request(&self, request: CustomerRequest) {
        match request {
            CustomerRequest::Signup {
                new_customer,
                response,
            } => {
                let confirmation = self.signup(new_customer).await;
                let _ = response.send(confirmation);
            }
            CustomerRequest::TopReferrers { response } => {
                let top = self.top_referrers().await;
                let _ = response.send(top);
            }
            CustomerRequest::RecordReferral { referral, response } => {
                let result = self.record_referral(referral).await;
                let _ = response.send(result);
            }
            CustomerRequest::RankData { response } => {
                let entries = self.rank_data().await;
                let _ = response.send(entries);
            }
        }
    }
}

pub struct CustomerService;

impl CustomerService {
    pub fn new() -> Self {
        CustomerService {}
    }
}

#[async_trait]
impl Service<CustomerRequest, CustomerRequestHandler> for CustomerService {}

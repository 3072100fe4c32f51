use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::sync::mpsc;

use crate::settings::Settings;

pub mod customers;
pub mod email;
pub mod http;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Communication error: {0} - {1}")]
    Communication(String, String),
}

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}

pub async fn start_services(pool: SqlitePool, settings: Settings) -> Result<(), anyhow::Error> {
    let (customer_tx, mut customer_rx) = mpsc::channel(512);
    let (email_tx, mut email_rx) = mpsc::channel(512);

    let mut customer_service = customers::CustomerService::new();
    let mut email_service = email::EmailService::new();

    log::info!("Starting email service.");
    let email_settings = settings.email;
    tokio::spawn(async move {
        let handler = email::EmailRequestHandler::new(
            email_settings.api_url,
            email_settings.sender,
            email_settings.auth_token,
        );

        email_service.run(handler, &mut email_rx).await;
    });

    log::info!("Starting customer service.");
    let customer_pool_clone = pool.clone();
    let customer_email_tx = email_tx.clone();
    tokio::spawn(async move {
        customer_service
            .run(
                customers::CustomerRequestHandler::new(customer_pool_clone, customer_email_tx),
                &mut customer_rx,
            )
            .await;
    });

    log::info!("Starting HTTP server.");
    http::start_http_server(&settings.http.listen, &settings.http.static_dir, customer_tx).await
}

use axum::{
    body::Bytes,
    extract::{ws::WebSocketUpgrade, State as AxumState},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use commonware_codec::{DecodeExt, Encode};
use commonware_cryptography::ed25519::PublicKey;
use commonware_utils::from_hex;
use futures::{SinkExt, StreamExt};
use puglands_execution::Layer;
use puglands_types::{
    api::{Receipt, Update, UpdatesFilter},
    economy::{Land, RedemptionRequest, User},
    execution::{Account, Transaction},
    EconomyError,
};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::cors::{Any, CorsLayer};

pub mod clock;
mod config;
mod store;

#[cfg(test)]
mod tests;

pub use config::{Config, ConfigError, ValidatedConfig};
pub use store::Store;

/// The authoritative economy service. Owns the ledger store, serializes
/// every commit through its write lock, and publishes post-commit
/// snapshots to subscribers.
pub struct Service {
    admin: Option<PublicKey>,
    store: RwLock<Store>,
    update_tx: broadcast::Sender<Update>,
}

impl Service {
    pub fn new(admin: Option<PublicKey>, store: Store) -> Self {
        let (update_tx, _) = broadcast::channel(1024);
        Self {
            admin,
            store: RwLock::new(store),
            update_tx,
        }
    }

    /// Verify, execute, and durably commit one signed transaction. Commits
    /// are serialized by the store's write lock, so two racing acquisitions
    /// of the same cell resolve to exactly one owner and one
    /// `AlreadyOwned`.
    pub async fn submit(
        &self,
        transaction: Transaction,
        now_ms: u64,
    ) -> Result<Receipt, EconomyError> {
        if !transaction.verify() {
            return Err(EconomyError::NotAuthenticated);
        }

        let mut store = self.store.write().await;
        let mut layer = Layer::new(&*store, self.admin.clone(), now_ms);
        layer.prepare(&transaction).await?;
        let receipt = layer.apply(&transaction).await?;
        let changes = layer.commit();
        store.commit(changes)?;
        drop(store);

        self.publish(&receipt);
        Ok(receipt)
    }

    /// Canonical user snapshot with accrual applied. The fold commits, so
    /// polling is just another idempotent mutation: a second read at the
    /// same instant returns an identical balance.
    pub async fn get_user(&self, public: &PublicKey, now_ms: u64) -> Result<User, EconomyError> {
        let mut store = self.store.write().await;
        let mut layer = Layer::new(&*store, self.admin.clone(), now_ms);
        let user = layer.touch(public).await?;
        let changes = layer.commit();
        store.commit(changes)?;
        drop(store);

        self.send_update(Update::User {
            uid: public.clone(),
            user: user.clone(),
        });
        Ok(user)
    }

    pub async fn all_lands(&self) -> Vec<Land> {
        self.store.read().await.lands()
    }

    pub async fn user_lands(&self, owner: &PublicKey) -> Vec<Land> {
        self.store.read().await.lands_of(owner)
    }

    pub async fn account(&self, public: &PublicKey) -> Account {
        self.store.read().await.account(public)
    }

    pub async fn redemption(&self, public: &PublicKey) -> Option<RedemptionRequest> {
        self.store.read().await.redemption(public)
    }

    pub fn update_subscriber(&self) -> broadcast::Receiver<Update> {
        self.update_tx.subscribe()
    }

    // Publishing happens after commit and is best-effort: it never affects
    // whether the operation succeeded.
    fn publish(&self, receipt: &Receipt) {
        self.send_update(Update::User {
            uid: receipt.uid.clone(),
            user: receipt.user.clone(),
        });
        if !receipt.lands.is_empty() {
            self.send_update(Update::Lands {
                lands: receipt.lands.clone(),
            });
        }
    }

    fn send_update(&self, update: Update) {
        if let Err(err) = self.update_tx.send(update) {
            tracing::debug!("no update subscribers: {}", err);
        }
    }
}

pub struct Api {
    service: Arc<Service>,
}

impl Api {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }

    pub fn router(&self) -> Router {
        // Configure CORS
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]);

        // Configure rate limiting
        let governor_conf = Arc::new(
            GovernorConfigBuilder::default()
                .per_second(50)
                .burst_size(200)
                .key_extractor(SmartIpKeyExtractor)
                .finish()
                .unwrap(),
        );

        Router::new()
            .route("/submit", post(submit))
            .route("/user/:key", get(get_user))
            .route("/lands", get(all_lands))
            .route("/lands/:key", get(user_lands))
            .route("/account/:key", get(get_account))
            .route("/redemption/:key", get(get_redemption))
            .route("/updates/:filter", get(updates_ws))
            .layer(cors)
            .layer(GovernorLayer {
                config: governor_conf,
            })
            .with_state(self.service.clone())
    }
}

fn decode_public_key(hex: &str) -> Option<PublicKey> {
    let raw = from_hex(hex)?;
    PublicKey::decode(raw.as_ref()).ok()
}

/// The boundary translation of the error taxonomy: a status code plus the
/// short human-readable message, nothing internal.
fn error_response(err: EconomyError) -> Response {
    let status = match &err {
        EconomyError::NotAuthenticated | EconomyError::PermissionDenied => {
            StatusCode::UNAUTHORIZED
        }
        EconomyError::NotFound => StatusCode::NOT_FOUND,
        EconomyError::AlreadyRegistered
        | EconomyError::AlreadyOwned { .. }
        | EconomyError::InsufficientFunds
        | EconomyError::InsufficientVouchers
        | EconomyError::CooldownActive { .. }
        | EconomyError::PendingRequestExists
        | EconomyError::Conflict { .. } => StatusCode::CONFLICT,
        EconomyError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        EconomyError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string()).into_response()
}

async fn submit(AxumState(service): AxumState<Arc<Service>>, body: Bytes) -> Response {
    let transaction = match Transaction::decode(body.as_ref()) {
        Ok(transaction) => transaction,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };

    match service.submit(transaction, clock::now_ms()).await {
        Ok(receipt) => (StatusCode::OK, receipt.encode().to_vec()).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_user(
    AxumState(service): AxumState<Arc<Service>>,
    axum::extract::Path(key): axum::extract::Path<String>,
) -> Response {
    let Some(public) = decode_public_key(&key) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    match service.get_user(&public, clock::now_ms()).await {
        Ok(user) => (StatusCode::OK, user.encode().to_vec()).into_response(),
        Err(err) => error_response(err),
    }
}

async fn all_lands(AxumState(service): AxumState<Arc<Service>>) -> Response {
    let lands = service.all_lands().await;
    (StatusCode::OK, lands.encode().to_vec()).into_response()
}

async fn user_lands(
    AxumState(service): AxumState<Arc<Service>>,
    axum::extract::Path(key): axum::extract::Path<String>,
) -> Response {
    let Some(public) = decode_public_key(&key) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let lands = service.user_lands(&public).await;
    (StatusCode::OK, lands.encode().to_vec()).into_response()
}

async fn get_account(
    AxumState(service): AxumState<Arc<Service>>,
    axum::extract::Path(key): axum::extract::Path<String>,
) -> Response {
    let Some(public) = decode_public_key(&key) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let account = service.account(&public).await;
    (StatusCode::OK, account.encode().to_vec()).into_response()
}

async fn get_redemption(
    AxumState(service): AxumState<Arc<Service>>,
    axum::extract::Path(key): axum::extract::Path<String>,
) -> Response {
    let Some(public) = decode_public_key(&key) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    match service.redemption(&public).await {
        Some(request) => (StatusCode::OK, request.encode().to_vec()).into_response(),
        None => (StatusCode::NOT_FOUND, Vec::new()).into_response(),
    }
}

async fn updates_ws(
    AxumState(service): AxumState<Arc<Service>>,
    axum::extract::Path(filter): axum::extract::Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_updates_ws(socket, service, filter))
}

async fn handle_updates_ws(
    socket: axum::extract::ws::WebSocket,
    service: Arc<Service>,
    filter: String,
) {
    tracing::info!("updates WebSocket connected, filter: {}", filter);
    let (mut sender, mut receiver) = socket.split();
    let mut updates = service.update_subscriber();

    let filter = match from_hex(&filter) {
        Some(filter) => filter,
        None => {
            tracing::warn!("failed to parse filter hex");
            let _ = sender.close().await;
            return;
        }
    };
    let subscription = match UpdatesFilter::decode(filter.as_ref()) {
        Ok(subscription) => subscription,
        Err(err) => {
            tracing::warn!("failed to decode UpdatesFilter: {:?}", err);
            let _ = sender.close().await;
            return;
        }
    };

    loop {
        tokio::select! {
            // Handle incoming WebSocket messages (ping/pong/close)
            msg = receiver.next() => {
                match msg {
                    Some(Ok(axum::extract::ws::Message::Close(_))) => {
                        tracing::info!("client closed WebSocket connection");
                        break;
                    }
                    Some(Ok(axum::extract::ws::Message::Ping(data))) => {
                        if sender.send(axum::extract::ws::Message::Pong(data)).await.is_err() {
                            tracing::warn!("failed to send pong, client disconnected");
                            break;
                        }
                    }
                    Some(Err(err)) => {
                        tracing::warn!("WebSocket error: {:?}", err);
                        break;
                    }
                    None => {
                        tracing::info!("WebSocket stream ended");
                        break;
                    }
                    _ => {} // Ignore other message types
                }
            }
            // Forward broadcast updates the subscription cares about
            update_result = updates.recv() => {
                match update_result {
                    Ok(update) => {
                        let relevant = match (&update, &subscription) {
                            (Update::User { uid, .. }, UpdatesFilter::User(key)) => uid == key,
                            _ => true,
                        };
                        if !relevant {
                            continue;
                        }

                        if sender
                            .send(axum::extract::ws::Message::Binary(update.encode().to_vec()))
                            .await
                            .is_err()
                        {
                            tracing::warn!("failed to send update, client disconnected");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "WebSocket client lagged behind, skipped {} updates",
                            skipped
                        );
                        // Keep receiving; the client reconciles from snapshots.
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("broadcast channel closed");
                        break;
                    }
                }
            }
        }
    }
    tracing::info!("updates WebSocket handler exiting");
    let _ = sender.close().await;
}

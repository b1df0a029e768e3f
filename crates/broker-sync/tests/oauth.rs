//! Integration tests for the OAuth authorization flow.

mod common;

use std::sync::Arc;

use common::{test_connection, InMemoryConnections};
use formue_broker_sync::auth::{OAuthStatus, SaxoAuthService};
use formue_broker_sync::{BrokerSyncConfig, BrokerSyncError, CredentialEncryptor};
use formue_core::connections::BrokerConnection;

const MASTER: &str = "an-adequately-long-master-secret-0123456789";

fn saxo_connection(encryptor: &CredentialEncryptor) -> BrokerConnection {
    let mut connection = test_connection("conn-oauth", "saxo");
    connection.app_key = Some("my-app-key".to_string());
    connection.app_secret = Some(
        encryptor
            .encrypt_to_string("my-app-secret", &connection.user_id)
            .unwrap(),
    );
    connection.redirect_uri = Some("http://localhost:5173/callback".to_string());
    connection
}

fn service(
    connection: &BrokerConnection,
) -> (Arc<SaxoAuthService>, Arc<InMemoryConnections>) {
    let connections = InMemoryConnections::with(connection.clone());
    let encryptor = Arc::new(CredentialEncryptor::new(MASTER).unwrap());
    let service = Arc::new(SaxoAuthService::new(
        BrokerSyncConfig::new(MASTER),
        encryptor,
        connections.clone(),
    ));
    (service, connections)
}

#[tokio::test]
async fn authorization_url_is_tracked_per_connection() {
    let encryptor = CredentialEncryptor::new(MASTER).unwrap();
    let connection = saxo_connection(&encryptor);
    let (service, _) = service(&connection);

    assert_eq!(service.status(&connection), OAuthStatus::None);
    assert!(service.authorize_url(&connection.id).is_none());

    let url = service.begin_authorization(&connection).unwrap();
    assert!(url.contains("client_id=my-app-key"));
    assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A5173%2Fcallback"));

    assert_eq!(service.status(&connection), OAuthStatus::Pending);
    assert_eq!(service.authorize_url(&connection.id).as_deref(), Some(url.as_str()));
}

#[tokio::test]
async fn stored_refresh_token_reads_as_authenticated() {
    let encryptor = CredentialEncryptor::new(MASTER).unwrap();
    let mut connection = saxo_connection(&encryptor);
    connection.refresh_token = Some(
        encryptor
            .encrypt_to_string("refresh-token", &connection.user_id)
            .unwrap(),
    );
    let (service, _) = service(&connection);

    assert_eq!(service.status(&connection), OAuthStatus::Authenticated);
}

#[tokio::test]
async fn completing_with_wrong_state_marks_the_exchange_failed() {
    let encryptor = CredentialEncryptor::new(MASTER).unwrap();
    let connection = saxo_connection(&encryptor);
    let (service, _) = service(&connection);

    service.begin_authorization(&connection).unwrap();
    let err = service
        .complete_authorization(&connection, "auth-code", "forged-state")
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerSyncError::AuthFailed(_)));
    assert_eq!(service.status(&connection), OAuthStatus::Failed);
}

#[tokio::test]
async fn completing_without_pending_exchange_is_rejected() {
    let encryptor = CredentialEncryptor::new(MASTER).unwrap();
    let connection = saxo_connection(&encryptor);
    let (service, _) = service(&connection);

    let err = service
        .complete_authorization(&connection, "auth-code", "any-state")
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerSyncError::AuthPending));
}

#[tokio::test]
async fn session_request_without_tokens_is_pending() {
    let encryptor = CredentialEncryptor::new(MASTER).unwrap();
    let connection = saxo_connection(&encryptor);
    let (service, _) = service(&connection);

    let err = service.get_session(&connection).await.unwrap_err();
    assert!(matches!(err, BrokerSyncError::AuthPending));
}

#[tokio::test]
async fn updating_app_credentials_invalidates_pending_exchange() {
    let encryptor = CredentialEncryptor::new(MASTER).unwrap();
    let connection = saxo_connection(&encryptor);
    let (service, connections) = service(&connection);

    service.begin_authorization(&connection).unwrap();
    assert_eq!(service.status(&connection), OAuthStatus::Pending);

    service
        .update_app_credentials(
            &connection.id,
            "rotated-app-key".to_string(),
            Some("rotated-secret".to_string()),
            "http://localhost:5173/callback".to_string(),
        )
        .await
        .unwrap();

    // Pending exchange is gone and the stored credentials changed.
    assert_eq!(service.status(&connection), OAuthStatus::None);
    assert!(service.authorize_url(&connection.id).is_none());
    let stored = connections.snapshot(&connection.id).unwrap();
    assert_eq!(stored.app_key.as_deref(), Some("rotated-app-key"));
    assert_ne!(stored.app_secret, connection.app_secret);
}

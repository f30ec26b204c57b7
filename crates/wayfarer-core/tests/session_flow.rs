//! End-to-end client flows over the redb credential store and a scripted
//! transport: login, silent token refresh, forced logout and journey upload.

use image::{GenericImageView, Rgb, RgbImage};
use serde_json::{json, Value};
use tempfile::TempDir;

use wayfarer_core::testing::ScriptedTransport;
use wayfarer_core::transport::{Method, RequestBody, UploadPart};
use wayfarer_core::{
    Api, ClientConfig, ClientError, Compositor, CredentialStore, JourneyDraft, LogoutReason,
    SessionEvent, Storage, Toast, TokenKind, Transform,
};

type FlowApi = Api<ScriptedTransport, Storage>;

fn open(dir: &TempDir) -> FlowApi {
    let config = ClientConfig::new("https://api.example.com/api/v1", dir.path()).unwrap();
    let storage = Storage::new(config.database_path()).unwrap();
    Api::new(ScriptedTransport::new(), storage, &config)
        .with_compositor(Compositor::new().with_canvas(108, 192).with_preview(36, 64))
}

fn envelope(attributes: Value) -> Value {
    json!({ "code": 200, "message": "ok", "data": { "attributes": attributes } })
}

fn post(id: &str) -> Value {
    json!({
        "id": id,
        "author": { "id": "u2", "name": "Bo Chen" },
        "content": "Sunrise over the Douro",
        "createdAt": "2026-03-01T06:30:00Z"
    })
}

fn login_response(access: &str, refresh: &str) -> Value {
    envelope(json!({
        "user": { "id": "u1", "firstName": "Ana", "lastName": "Lima", "email": "ana@example.com" },
        "accessToken": access,
        "refreshToken": refresh
    }))
}

fn rejected() -> Value {
    json!({ "code": 401, "message": "jwt expired" })
}

#[tokio::test]
async fn test_login_then_refresh_and_replay() {
    let dir = TempDir::new().unwrap();
    let api = open(&dir);
    let mut events = api.subscribe();
    let transport = api.client().transport();

    transport.push_json(200, login_response("acc-1", "ref-1"));
    let me = api.login("ana@example.com", "secret123").await.unwrap();
    assert_eq!(me.display_name(), "Ana Lima");
    assert!(matches!(events.recv().await.unwrap(), SessionEvent::LoggedIn));

    transport.push_json(401, rejected());
    transport.push_json(
        200,
        envelope(json!({ "accessToken": "acc-2", "refreshToken": "ref-2" })),
    );
    transport.push_json(200, envelope(json!([post("p1")])));

    let page = api.feed(1).await.unwrap();
    assert_eq!(page.items[0].id, "p1");
    assert!(matches!(
        events.recv().await.unwrap(),
        SessionEvent::TokensRefreshed
    ));

    let calls = transport.calls();
    let trail: Vec<(&str, Option<&str>)> = calls
        .iter()
        .map(|c| (c.path.as_str(), c.bearer.as_deref()))
        .collect();
    assert_eq!(
        trail,
        vec![
            ("auth/login", None),
            ("posts/feed", Some("acc-1")),
            ("auth/refresh-token", Some("ref-1")),
            ("posts/feed", Some("acc-2")),
        ]
    );

    // Rotated tokens survive a restart
    drop(events);
    drop(api);
    let storage = Storage::new(dir.path().join("wayfarer.redb")).unwrap();
    assert_eq!(storage.token(TokenKind::Access).unwrap().as_deref(), Some("acc-2"));
    assert_eq!(storage.token(TokenKind::Refresh).unwrap().as_deref(), Some("ref-2"));
}

#[tokio::test]
async fn test_rejected_refresh_logs_out() {
    let dir = TempDir::new().unwrap();
    let api = open(&dir);
    let transport = api.client().transport();

    transport.push_json(200, login_response("acc-1", "ref-1"));
    api.login("ana@example.com", "secret123").await.unwrap();
    let mut events = api.subscribe();

    transport.push_json(401, rejected());
    transport.push_json(401, json!({ "code": 401, "message": "refresh token revoked" }));

    let err = api.notifications(1).await.unwrap_err();
    assert!(err.is_auth_failure());
    assert_eq!(
        Toast::from_error(&err).message,
        wayfarer_core::feedback::SESSION_EXPIRED_MESSAGE
    );

    match events.recv().await.unwrap() {
        SessionEvent::LoggedOut {
            reason: LogoutReason::RefreshFailed(_),
            redirect_to,
        } => assert_eq!(redirect_to, "/login"),
        other => panic!("unexpected event {:?}", other),
    }
    assert!(!api.client().has_session().unwrap());
    // One refresh attempt, no second replay
    assert_eq!(transport.calls_to("notifications"), 1);
    assert_eq!(transport.calls_to("auth/refresh-token"), 1);
}

#[tokio::test]
async fn test_one_time_tokens_flow_through_storage() {
    let dir = TempDir::new().unwrap();
    let api = open(&dir);
    let transport = api.client().transport();

    transport.push_json(
        200,
        envelope(json!({ "resetPasswordToken": "reset-1" })),
    );
    api.forgot_password("ana@example.com").await.unwrap();
    assert_eq!(
        api.client().store().token(TokenKind::ResetPassword).unwrap().as_deref(),
        Some("reset-1")
    );

    transport.push_json(200, json!({ "code": 200, "message": "Password updated" }));
    let message = api
        .reset_password("123456", "newsecret1", "newsecret1")
        .await
        .unwrap();
    assert_eq!(message.as_deref(), Some("Password updated"));

    let call = transport.last_call().unwrap();
    assert_eq!((call.method, call.path.as_str()), (Method::Post, "auth/reset-password"));
    assert_eq!(call.bearer.as_deref(), Some("reset-1"));
    assert!(api
        .client()
        .store()
        .token(TokenKind::ResetPassword)
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_photo_journey_is_composited_before_upload() {
    let dir = TempDir::new().unwrap();
    let api = open(&dir);
    let transport = api.client().transport();
    transport.push_json(200, login_response("acc-1", "ref-1"));
    api.login("ana@example.com", "secret123").await.unwrap();

    let mut source = Vec::new();
    RgbImage::from_pixel(40, 30, Rgb([10, 120, 200]))
        .write_to(&mut std::io::Cursor::new(&mut source), image::ImageFormat::Png)
        .unwrap();

    transport.push_json(
        201,
        envelope(json!({
            "id": "j1",
            "author": { "id": "u1", "name": "Ana Lima" },
            "type": "image",
            "mediaUrl": "https://cdn.example.com/j1.jpg",
            "createdAt": "2026-03-01T07:00:00Z"
        })),
    );
    let draft = JourneyDraft::Photo {
        image: source.into(),
        transform: Transform {
            scale: 2.0,
            rotation_deg: 90.0,
            pan: (4.0, -4.0),
        },
        overlay: None,
    };
    let journey = api.create_journey(draft).await.unwrap();
    assert_eq!(journey.id, "j1");

    let call = transport.last_call().unwrap();
    assert_eq!(call.path, "stories");
    assert_eq!(call.bearer.as_deref(), Some("acc-1"));
    let RequestBody::Multipart(payload) = call.body else {
        panic!("expected multipart upload");
    };
    assert_eq!(payload.field_value("type"), Some("image"));
    let Some(UploadPart::File { file_name, mime, bytes, .. }) = payload.files().next() else {
        panic!("expected a media part");
    };
    assert_eq!(file_name, "journey.jpg");
    assert_eq!(mime, "image/jpeg");
    let uploaded = image::load_from_memory(bytes).unwrap();
    assert_eq!(uploaded.dimensions(), (108, 192));
}

#[tokio::test]
async fn test_logout_clears_disk_credentials() {
    let dir = TempDir::new().unwrap();
    let api = open(&dir);
    let transport = api.client().transport();
    transport.push_json(200, login_response("acc-1", "ref-1"));
    api.login("ana@example.com", "secret123").await.unwrap();

    transport.push_network_error("connection reset");
    api.logout().await.unwrap();
    assert!(!api.client().has_session().unwrap());

    transport.push_json(401, rejected());
    let err = api.feed(1).await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)));
    assert_eq!(transport.last_call().unwrap().bearer, None);
    assert_eq!(transport.calls_to("auth/refresh-token"), 0);
}

//! End-to-end conversations against a local mentor endpoint serving both
//! the WebSocket route and the chat fallback.

use axum::extract::ws::{Message as AxumMessage, WebSocket, WebSocketUpgrade};
use axum::extract::Path;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use mentor_client::{ClientError, ConversationClient, VOICE_MESSAGE_LABEL};
use mentor_transport::{HttpFallback, WsConfig, WsTransport};
use mentor_types::{Connectivity, ConversationIdentity, EntryKind, Speaker, TranscriptEntry};
use mentor_voice::FilePlayer;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

type Client = ConversationClient<WsTransport, HttpFallback>;

async fn ws_route(ws: WebSocketUpgrade, Path(_identity): Path<String>) -> impl IntoResponse {
    ws.on_upgrade(coach)
}

/// Answers text with a text reply. Answers voice with a transcription
/// followed by a spoken reply that replays the caller's audio.
async fn coach(mut socket: WebSocket) {
    while let Some(Ok(msg)) = socket.recv().await {
        let AxumMessage::Text(text) = msg else {
            continue;
        };
        let incoming: Value = serde_json::from_str(text.as_str()).unwrap();
        let user_id = incoming["user_id"].clone();

        let replies = match incoming["type"].as_str() {
            Some("voice") => vec![
                json!({"type": "transcribed_text", "content": "how do I hold B site", "user_id": user_id}),
                json!({
                    "type": "voice_response",
                    "content": "Play close to the car.",
                    "user_id": user_id,
                    "audio_data": incoming["audio_data"],
                    "text_content": "Play close to the car.",
                }),
            ],
            _ => vec![json!({
                "type": "text_response",
                "content": format!("coach: {}", incoming["content"].as_str().unwrap_or_default()),
                "user_id": user_id,
            })],
        };

        for reply in replies {
            socket
                .send(AxumMessage::Text(reply.to_string().into()))
                .await
                .unwrap();
        }
    }
}

async fn chat(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "response": format!("offline: {}", body["content"].as_str().unwrap_or_default())
    }))
}

async fn spawn_mentor() -> SocketAddr {
    let app = Router::new()
        .route("/ws/{identity}", get(ws_route))
        .route("/chat/", post(chat));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

fn client_for(ws: SocketAddr, http: SocketAddr) -> Client {
    let mut ws_config = WsConfig::new(format!("ws://{}", ws));
    ws_config.connect_timeout = Duration::from_secs(2);
    ConversationClient::new(
        ConversationIdentity::from(1),
        WsTransport::new(ws_config),
        HttpFallback::new(&format!("http://{}", http), Duration::from_secs(5)).unwrap(),
    )
}

async fn wait_for_entries(client: &Client, count: usize) -> Vec<TranscriptEntry> {
    for _ in 0..100 {
        let entries = client.transcript();
        if entries.len() >= count {
            return entries;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!(
        "transcript never reached {} entries: {:?}",
        count,
        client.transcript()
    );
}

#[tokio::test]
async fn test_live_text_conversation() {
    let addr = spawn_mentor().await;
    let client = client_for(addr, addr);

    assert_eq!(client.start().await, Connectivity::Live);
    client.send_text("Best spots on Dust2").await.unwrap();
    client.send_text("Smoke lineups").await.unwrap();

    let texts: Vec<_> = wait_for_entries(&client, 4)
        .await
        .into_iter()
        .filter(|e| e.speaker == Speaker::Assistant)
        .map(|e| e.text)
        .collect();
    assert_eq!(
        texts,
        vec![
            "coach: Best spots on Dust2".to_string(),
            "coach: Smoke lineups".to_string(),
        ]
    );

    client.shutdown();
    assert_eq!(client.connectivity(), Connectivity::Degraded);
}

#[tokio::test]
async fn test_live_voice_conversation_and_playback() {
    let addr = spawn_mentor().await;
    let client = client_for(addr, addr);
    let capture = b"ID3\x03\x00 captured question".to_vec();

    assert_eq!(client.start().await, Connectivity::Live);
    client.send_voice(&capture).await.unwrap();

    let entries = wait_for_entries(&client, 3).await;
    assert_eq!(entries[0].text, VOICE_MESSAGE_LABEL);
    assert_eq!(entries[1].speaker, Speaker::User);
    assert_eq!(entries[1].kind, EntryKind::Voice);
    assert_eq!(entries[1].text, "how do I hold B site");
    assert_eq!(entries[2].speaker, Speaker::Assistant);
    assert_eq!(entries[2].kind, EntryKind::Voice);
    assert_eq!(entries[2].text, "Play close to the car.");

    let dir = tempfile::tempdir().unwrap();
    let player = FilePlayer::new(dir.path());
    client.play(2, &player).await.unwrap();

    assert_eq!(player.played(), 1);
    let written = std::fs::read(dir.path().join("reply-1.mp3")).unwrap();
    assert_eq!(written, capture);

    client.shutdown();
}

#[tokio::test]
async fn test_degraded_conversation_uses_chat_route() {
    let http = spawn_mentor().await;
    let client = client_for(unused_addr().await, http);

    assert_eq!(client.start().await, Connectivity::Degraded);
    client.send_text("hi").await.unwrap();

    let entries = client.transcript();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].text, "hi");
    assert_eq!(entries[1].speaker, Speaker::Assistant);
    assert_eq!(entries[1].text, "offline: hi");

    assert!(matches!(
        client.send_voice(b"capture").await,
        Err(ClientError::DegradedModeUnsupported)
    ));
    assert_eq!(client.transcript().len(), 4);
}

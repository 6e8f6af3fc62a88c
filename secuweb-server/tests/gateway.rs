use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use secuweb_core::WsMessage;
use secuweb_server::gateway::{Gateway, SEARCH_FAILED, SEND_FAILED};
use secuweb_server::repository::MessageRepository;
use secuweb_server::seed::seed_test_data;
use secuweb_server::store::{FindOptions, MemoryStore, MessageStore, StoreError};
use tokio::sync::mpsc::UnboundedReceiver;

// Store che fallisce sempre, per verificare gli eventi di errore
struct BrokenStore;

#[async_trait]
impl MessageStore for BrokenStore {
    async fn find(&self, _: Document, _: FindOptions) -> Result<Vec<Document>, StoreError> {
        Err(StoreError::BadQuery("store offline".into()))
    }
    async fn insert_one(&self, _: Document) -> Result<Bson, StoreError> {
        Err(StoreError::BadQuery("store offline".into()))
    }
    async fn insert_many(&self, _: Vec<Document>) -> Result<usize, StoreError> {
        Err(StoreError::BadQuery("store offline".into()))
    }
    async fn delete_one(&self, _: Document) -> Result<u64, StoreError> {
        Err(StoreError::BadQuery("store offline".into()))
    }
    async fn count(&self) -> Result<u64, StoreError> {
        Err(StoreError::BadQuery("store offline".into()))
    }
    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::BadQuery("store offline".into()))
    }
}

fn gateway_with(store: Arc<dyn MessageStore>) -> Gateway {
    Gateway::new(MessageRepository::new(store))
}

// Legge il prossimo evento già consegnato, se c'è
fn next_event(rx: &mut UnboundedReceiver<String>) -> Option<WsMessage> {
    rx.try_recv()
        .ok()
        .map(|text| serde_json::from_str(&text).expect("valid event"))
}

fn frame(json: serde_json::Value) -> String {
    json.to_string()
}

// Un messaggio in "general" arriva a tutti i membri di general (mittente incluso) e a nessun altro
#[tokio::test]
async fn send_message_broadcasts_to_room_members_only() {
    let store = Arc::new(MemoryStore::new());
    let gw = gateway_with(store.clone());

    let (a, mut rx_a) = gw.connect();
    let (b, mut rx_b) = gw.connect();
    let (c, mut rx_c) = gw.connect();
    gw.handle_text(&a, &frame(serde_json::json!({ "type": "join-room", "payload": "general" }))).await;
    gw.handle_text(&b, &frame(serde_json::json!({ "type": "join-room", "payload": "general" }))).await;
    gw.handle_text(&c, &frame(serde_json::json!({ "type": "join-room", "payload": "tech" }))).await;

    let send = serde_json::json!({
        "type": "send-message",
        "payload": { "content": "hi", "username": "alice", "room": "general" }
    });
    gw.handle_text(&a, &frame(send)).await;

    for rx in [&mut rx_a, &mut rx_b] {
        match next_event(rx) {
            Some(WsMessage::NewMessage(m)) => {
                assert_eq!(m.content, "hi");
                assert_eq!(m.username, "alice");
                assert_eq!(m.room.as_deref(), Some("general"));
                assert!(m.id.is_some());
            }
            other => panic!("expected new-message, got {other:?}"),
        }
    }
    assert!(next_event(&mut rx_c).is_none());
    assert_eq!(store.count().await.unwrap(), 1);
}

// Il percorso WS non valida i campi: un content vuoto viene comunque salvato
#[tokio::test]
async fn realtime_path_persists_empty_content() {
    let store = Arc::new(MemoryStore::new());
    let gw = gateway_with(store.clone());
    let (a, mut rx) = gw.connect();
    gw.join(&a, "general");

    gw.handle_text(&a, r#"{"type":"send-message","payload":{"room":"general"}}"#).await;

    match next_event(&mut rx) {
        Some(WsMessage::NewMessage(m)) => {
            assert_eq!(m.content, "");
            assert_eq!(m.username, "");
        }
        other => panic!("expected new-message, got {other:?}"),
    }
    assert_eq!(store.count().await.unwrap(), 1);
}

// Senza stanza il messaggio va in "general" e lì viene trasmesso
#[tokio::test]
async fn message_without_room_goes_to_general() {
    let gw = gateway_with(Arc::new(MemoryStore::new()));
    let (a, mut rx) = gw.connect();
    gw.join(&a, "general");

    gw.handle_text(&a, r#"{"type":"send-message","payload":{"content":"x","username":"y"}}"#).await;
    assert!(matches!(next_event(&mut rx), Some(WsMessage::NewMessage(_))));
}

// I risultati della ricerca arrivano solo a chi ha cercato
#[tokio::test]
async fn search_results_are_private() {
    let store = Arc::new(MemoryStore::new());
    seed_test_data(store.as_ref()).await.unwrap();
    let gw = gateway_with(store);

    let (a, mut rx_a) = gw.connect();
    let (b, mut rx_b) = gw.connect();
    gw.join(&a, "general");
    gw.join(&b, "general");

    let search = r#"{"type":"search-messages","payload":{"type":"username","value":"{\"$ne\": null}"}}"#;
    gw.handle_text(&a, search).await;

    match next_event(&mut rx_a) {
        Some(WsMessage::SearchResults(found)) => assert_eq!(found.len(), 10),
        other => panic!("expected search-results, got {other:?}"),
    }
    assert!(next_event(&mut rx_b).is_none());
}

// La ricerca non è limitata alla stanza corrente
#[tokio::test]
async fn search_ignores_joined_room() {
    let store = Arc::new(MemoryStore::new());
    seed_test_data(store.as_ref()).await.unwrap();
    let gw = gateway_with(store);
    let (a, mut rx) = gw.connect();
    gw.join(&a, "general");

    gw.handle_text(&a, r#"{"type":"search-messages","payload":{"type":"content","value":"parfait"}}"#).await;
    match next_event(&mut rx) {
        Some(WsMessage::SearchResults(found)) => {
            assert_eq!(found.len(), 2);
            assert!(found.iter().all(|m| m.room.as_deref() != Some("general")));
        }
        other => panic!("expected search-results, got {other:?}"),
    }

    gw.handle_text(&a, r#"{"type":"search-messages","payload":{"type":"room","value":"testing"}}"#).await;
    assert!(matches!(next_event(&mut rx), Some(WsMessage::SearchResults(found)) if found.len() == 3));
}

// Tipo sconosciuto: lista vuota, nessun errore
#[tokio::test]
async fn unknown_search_type_yields_empty_results() {
    let store = Arc::new(MemoryStore::new());
    seed_test_data(store.as_ref()).await.unwrap();
    let gw = gateway_with(store);
    let (a, mut rx) = gw.connect();

    gw.handle_text(&a, r#"{"type":"search-messages","payload":{"type":"email","value":"alice"}}"#).await;
    assert_eq!(next_event(&mut rx), Some(WsMessage::SearchResults(vec![])));
}

// Errori dello store: evento "error" solo al mittente, nessun broadcast
#[tokio::test]
async fn store_failures_emit_error_to_sender_only() {
    let gw = gateway_with(Arc::new(BrokenStore));
    let (a, mut rx_a) = gw.connect();
    let (b, mut rx_b) = gw.connect();
    gw.join(&a, "general");
    gw.join(&b, "general");

    gw.handle_text(&a, r#"{"type":"send-message","payload":{"content":"x","username":"y","room":"general"}}"#).await;
    assert_eq!(next_event(&mut rx_a), Some(WsMessage::Error(SEND_FAILED.to_string())));
    assert!(next_event(&mut rx_b).is_none());

    gw.handle_text(&a, r#"{"type":"search-messages","payload":{"type":"room","value":"general"}}"#).await;
    assert_eq!(next_event(&mut rx_a), Some(WsMessage::Error(SEARCH_FAILED.to_string())));
}

// Una regex non valida arriva allo store e torna come errore generico
#[tokio::test]
async fn invalid_pattern_is_reported_as_search_failure() {
    let gw = gateway_with(Arc::new(MemoryStore::new()));
    let (a, mut rx) = gw.connect();

    gw.handle_text(&a, r#"{"type":"search-messages","payload":{"type":"content","value":"(["}}"#).await;
    assert_eq!(next_event(&mut rx), Some(WsMessage::Error(SEARCH_FAILED.to_string())));
}

// join idempotente, più stanze per connessione, disconnect rimuove da tutte
#[tokio::test]
async fn join_is_idempotent_and_disconnect_leaves_every_room() {
    let gw = gateway_with(Arc::new(MemoryStore::new()));
    let (a, mut rx) = gw.connect();
    let (b, _rx_b) = gw.connect();

    gw.join(&a, "general");
    gw.join(&a, "general");
    gw.join(&a, "tech");
    gw.join(&b, "tech");
    assert_eq!(gw.members("general"), vec![a.clone()]);
    let mut rooms = gw.rooms_of(&a);
    rooms.sort();
    assert_eq!(rooms, vec!["general".to_string(), "tech".to_string()]);

    gw.disconnect(&a);
    assert!(!gw.is_connected(&a));
    assert!(gw.members("general").is_empty());
    assert_eq!(gw.members("tech"), vec![b.clone()]);
    assert!(gw.rooms_of(&a).is_empty());

    // il canale si chiude: il task di inoltro termina
    assert!(rx.recv().await.is_none());
}

// Un client disconnesso non riceve nulla e non c'è replay
#[tokio::test]
async fn disconnected_clients_miss_broadcasts() {
    let gw = gateway_with(Arc::new(MemoryStore::new()));
    let (a, _rx_a) = gw.connect();
    let (b, rx_b) = gw.connect();
    gw.join(&a, "general");
    gw.join(&b, "general");
    gw.disconnect(&b);
    drop(rx_b);

    gw.handle_text(&a, r#"{"type":"send-message","payload":{"content":"late","username":"a","room":"general"}}"#).await;
    assert_eq!(gw.members("general"), vec![a]);
}

// Frame non validi ed eventi server->client ricevuti dal client vengono ignorati
#[tokio::test]
async fn malformed_frames_are_ignored() {
    let store = Arc::new(MemoryStore::new());
    let gw = gateway_with(store.clone());
    let (a, mut rx) = gw.connect();

    gw.handle_text(&a, "not json").await;
    gw.handle_text(&a, r#"{"type":"shout","payload":1}"#).await;
    gw.handle_text(&a, r#"{"type":"search-results","payload":[]}"#).await;

    assert!(next_event(&mut rx).is_none());
    assert_eq!(store.count().await.unwrap(), 0);
}

// L'ordine dei broadcast in una stanza è quello di elaborazione
#[tokio::test]
async fn broadcast_order_follows_processing_order() {
    let gw = gateway_with(Arc::new(MemoryStore::new()));
    let (a, mut rx_a) = gw.connect();
    let (b, mut rx_b) = gw.connect();
    gw.join(&a, "general");
    gw.join(&b, "general");

    for i in 0..5 {
        let text = format!(r#"{{"type":"send-message","payload":{{"content":"{i}","username":"a","room":"general"}}}}"#);
        gw.handle_text(if i % 2 == 0 { &a } else { &b }, &text).await;
    }

    for rx in [&mut rx_a, &mut rx_b] {
        let order: Vec<String> = std::iter::from_fn(|| next_event(&mut *rx))
            .filter_map(|e| match e {
                WsMessage::NewMessage(m) => Some(m.content),
                _ => None,
            })
            .collect();
        assert_eq!(order, vec!["0", "1", "2", "3", "4"]);
    }
}

// Un value già strutturato (oggetto JSON, non stringa) arriva allo store come criterio
#[tokio::test]
async fn object_search_value_is_used_as_criterion() {
    let store = Arc::new(MemoryStore::new());
    seed_test_data(store.as_ref()).await.unwrap();
    let gw = gateway_with(store);
    let (a, mut rx) = gw.connect();

    let search = serde_json::json!({
        "type": "search-messages",
        "payload": { "type": "username", "value": { "$ne": null } }
    });
    gw.handle_text(&a, &frame(search)).await;
    match next_event(&mut rx) {
        Some(WsMessage::SearchResults(found)) => assert_eq!(found.len(), 10),
        other => panic!("expected search-results, got {other:?}"),
    }

    let search = serde_json::json!({
        "type": "search-messages",
        "payload": { "type": "room", "value": { "$in": ["tech", "testing"] } }
    });
    gw.handle_text(&a, &frame(search)).await;
    assert!(matches!(next_event(&mut rx), Some(WsMessage::SearchResults(found)) if found.len() == 6));
}

// content numerico: errore generico al mittente, niente broadcast e niente salvataggio
#[tokio::test]
async fn non_text_send_fields_fail_without_persisting() {
    let store = Arc::new(MemoryStore::new());
    let gw = gateway_with(store.clone());
    let (a, mut rx_a) = gw.connect();
    let (b, mut rx_b) = gw.connect();
    gw.join(&a, "general");
    gw.join(&b, "general");

    gw.handle_text(&a, r#"{"type":"send-message","payload":{"content":5,"username":"a","room":"general"}}"#).await;
    assert_eq!(next_event(&mut rx_a), Some(WsMessage::Error(SEND_FAILED.to_string())));
    assert!(next_event(&mut rx_b).is_none());

    gw.handle_text(&a, r#"{"type":"send-message","payload":{"content":"x","username":"a","room":7}}"#).await;
    assert_eq!(next_event(&mut rx_a), Some(WsMessage::Error(SEND_FAILED.to_string())));
    assert_eq!(store.count().await.unwrap(), 0);
}

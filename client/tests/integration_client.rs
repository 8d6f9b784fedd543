//! Integration-Tests fuer den Client (simulierter Server ueber echtes TCP)

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use raumwart_client::{config::ClientConfig, exit_code, Client};
use raumwart_core::TerminalReason;
use raumwart_crypto::{seal_for_recipient, CipherProvider, CipherRegistry};
use raumwart_protocol::{tags, FrameCodec};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;

const SERVER_ID: &str = "SRV-TCP";

type Leitung = Framed<TcpStream, FrameCodec>;

async fn lesen(leitung: &mut Leitung) -> Bytes {
    leitung
        .next()
        .await
        .expect("Verbindung geschlossen")
        .expect("Frame-Fehler")
}

async fn senden(leitung: &mut Leitung, cipher: &dyn CipherProvider, token: &str) {
    let verschluesselt = cipher.encrypt(token.as_bytes()).unwrap();
    leitung.send(Bytes::from(verschluesselt)).await.unwrap();
}

async fn lesen_klar(leitung: &mut Leitung, cipher: &dyn CipherProvider) -> String {
    let roh = lesen(leitung).await;
    String::from_utf8(cipher.decrypt(&roh).unwrap()).unwrap()
}

/// Server: Handshake, eine Raumabfrage beantworten, dann trennen
async fn server_ablauf(listener: TcpListener) -> Vec<String> {
    let (stream, _) = listener.accept().await.unwrap();
    let mut leitung = Framed::new(stream, FrameCodec::default());

    let tag = lesen(&mut leitung).await;
    assert_eq!(&tag[..], tags::CLIENT_PUBLIC_KEY.as_bytes());
    let key = String::from_utf8(lesen(&mut leitung).await.to_vec()).unwrap();

    for token in [tags::SERVER_SESSION_KEY.as_bytes(), b"schluessel"] {
        let versiegelt = seal_for_recipient(&key, token).unwrap();
        leitung.send(Bytes::from(versiegelt)).await.unwrap();
    }
    let mut cipher = CipherRegistry::mit_standard()
        .resolve_or_fallback("chacha20poly1305")
        .cipher;
    cipher.rekey(b"schluessel").unwrap();

    let mut userdata = Vec::new();
    for _ in 0..4 {
        userdata.push(lesen_klar(&mut leitung, cipher.as_ref()).await);
    }

    senden(&mut leitung, cipher.as_ref(), tags::SERVER_SESSION_CREATED).await;
    senden(&mut leitung, cipher.as_ref(), SERVER_ID).await;

    let anfrage = lesen_klar(&mut leitung, cipher.as_ref()).await;
    assert_eq!(anfrage, tags::CLIENT_ROOMS_REQUEST);
    for token in [tags::SERVER_ROOMS, "Raum 101", "Physik", tags::SERVER_ROOMS_FINISHED] {
        senden(&mut leitung, cipher.as_ref(), token).await;
    }

    senden(&mut leitung, cipher.as_ref(), tags::SERVER_DISCONNECT).await;
    // Verbindung offen halten bis der Client geschlossen hat
    while let Some(Ok(_)) = leitung.next().await {}
    userdata
}

fn config(port: u16) -> ClientConfig {
    let mut config = ClientConfig::aus_toml(&format!(
        r#"
            [verbindung]
            server = "127.0.0.1"
            port = {port}

            [sicherheit]
            cipher = "chacha20poly1305"

            [identitaet]
            hostname = "pc-raum-101"
            username = "frau.meier"
            server_id = "{SERVER_ID}"
        "#
    ))
    .unwrap();
    config.zeitlimits.handshake_timeout_sek = 5;
    config
}

#[tokio::test]
async fn sitzung_ueber_tcp_bis_server_trennt() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(server_ablauf(listener));

    let grund = Client::neu(config(port)).starten().await.unwrap();
    assert_eq!(grund, TerminalReason::ServerGetrennt);
    assert_eq!(exit_code(&grund), 2);

    let userdata = server.await.unwrap();
    assert_eq!(
        userdata,
        vec![
            tags::CLIENT_USERDATA.to_string(),
            "pc-raum-101".into(),
            "frau.meier".into(),
            "RW-CLIENT".into(),
        ]
    );
}

#[tokio::test]
async fn verbindungsfehler_wird_gemeldet() {
    // Port reservieren und wieder freigeben, danach lauscht dort niemand
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let fehler = Client::neu(config(port)).starten().await.unwrap_err();
    assert!(fehler.to_string().contains("fehlgeschlagen"));
}

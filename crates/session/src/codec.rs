//! MessageCodec und UnitSender
//!
//! Der Codec kodiert Tokens mit dem Cipher, der zum Zeitpunkt des Aufrufs
//! aktiv ist. Ein Cipher-Wechsel verarbeitet bereits gepufferte Daten nicht
//! erneut.
//!
//! Der `UnitSender` serialisiert alle Sendungen ueber einen gemeinsamen
//! Mutex, damit eine mehrteilige Unit nie mit einer anderen verschraenkt
//! wird (z.B. Heartbeat-Antwort mitten in einem Sperr-Befehl).

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use raumwart_crypto::{CipherProvider, NoCipher};
use raumwart_protocol::Token;

use crate::error::SessionResult;
use crate::transport::Transport;

// ---------------------------------------------------------------------------
// MessageCodec
// ---------------------------------------------------------------------------

/// Kodiert und dekodiert Tokens ueber den aktiven Cipher
pub struct MessageCodec {
    aktiv: RwLock<Box<dyn CipherProvider>>,
}

impl MessageCodec {
    /// Codec mit `NoCipher`
    pub fn neu() -> Self {
        Self {
            aktiv: RwLock::new(Box::new(NoCipher)),
        }
    }

    /// Ersetzt den aktiven Cipher
    pub fn wechseln(&self, cipher: Box<dyn CipherProvider>) {
        let mut aktiv = self.aktiv.write();
        tracing::debug!(von = aktiv.name(), nach = cipher.name(), "Cipher gewechselt");
        *aktiv = cipher;
    }

    /// Name des aktiven Ciphers
    pub fn cipher_name(&self) -> String {
        self.aktiv.read().name().to_string()
    }

    /// UTF-8-Text verschluesseln
    pub fn encode(&self, token: &str) -> SessionResult<Bytes> {
        let verschluesselt = self.aktiv.read().encrypt(token.as_bytes())?;
        tracing::debug!(len = verschluesselt.len(), "Nachricht kodiert");
        Ok(Bytes::from(verschluesselt))
    }

    /// Rohe Transport-Nachricht entschluesseln
    pub fn decode(&self, roh: &[u8]) -> SessionResult<Token> {
        let klartext = self.aktiv.read().decrypt(roh)?;
        tracing::debug!(len = klartext.len(), "Nachricht empfangen");
        Ok(Token::neu(klartext))
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// UnitSender
// ---------------------------------------------------------------------------

/// Sendet Units atomar bezueglich anderer Sender
pub struct UnitSender {
    codec: Arc<MessageCodec>,
    transport: Arc<dyn Transport>,
    sperre: tokio::sync::Mutex<()>,
}

impl UnitSender {
    pub fn neu(codec: Arc<MessageCodec>, transport: Arc<dyn Transport>) -> Self {
        Self {
            codec,
            transport,
            sperre: tokio::sync::Mutex::new(()),
        }
    }

    /// Sendet alle Tokens einer Unit unter dem aktiven Cipher
    pub async fn send_unit(&self, unit: &[String]) -> SessionResult<()> {
        let _sperre = self.sperre.lock().await;
        for token in unit {
            let nachricht = self.codec.encode(token)?;
            self.transport.send(nachricht).await?;
        }
        Ok(())
    }

    /// Sendet eine Unit unverschluesselt (nur fuer den Public Key)
    pub async fn send_unit_plain(&self, unit: &[String]) -> SessionResult<()> {
        let _sperre = self.sperre.lock().await;
        for token in unit {
            let nachricht = NoCipher.encrypt(token.as_bytes())?;
            self.transport.send(Bytes::from(nachricht)).await?;
        }
        Ok(())
    }

    /// Schliesst den Transport, sobald keine Unit mehr gesendet wird
    pub async fn close(&self) {
        let _sperre = self.sperre.lock().await;
        self.transport.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use raumwart_crypto::{SymmetricAlgorithm, SymmetricCipher};

    fn unit(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn codec_startet_ohne_verschluesselung() {
        let codec = MessageCodec::neu();
        assert_eq!(codec.cipher_name(), "none");
        assert_eq!(&codec.encode("abc").unwrap()[..], b"abc");
        assert_eq!(codec.decode(b"abc").unwrap().text(), "abc");
    }

    #[test]
    fn wechsel_gilt_ab_dem_naechsten_aufruf() {
        let codec = MessageCodec::neu();
        let klar = codec.encode("vorher").unwrap();

        let mut cipher = SymmetricCipher::neu(SymmetricAlgorithm::Aes256Gcm);
        cipher.rekey(b"k").unwrap();
        codec.wechseln(Box::new(cipher));

        assert_eq!(codec.cipher_name(), "aes256gcm");
        assert_ne!(&codec.encode("vorher").unwrap()[..], &klar[..]);
        assert!(codec.decode(&klar).is_err());
    }

    #[tokio::test]
    async fn unit_wird_token_fuer_token_gesendet() {
        let (transport, _rx, mut gegenstelle) = MemoryTransport::verbinden();
        let sender = UnitSender::neu(Arc::new(MessageCodec::neu()), transport.clone());

        sender.send_unit(&unit(&["a", "b", "c"])).await.unwrap();
        for erwartet in ["a", "b", "c"] {
            assert_eq!(&gegenstelle.empfangen().await.unwrap()[..], erwartet.as_bytes());
        }
    }

    #[tokio::test]
    async fn plain_ignoriert_aktiven_cipher() {
        let (transport, _rx, mut gegenstelle) = MemoryTransport::verbinden();
        let codec = Arc::new(MessageCodec::neu());
        let mut cipher = SymmetricCipher::neu(SymmetricAlgorithm::ChaCha20Poly1305);
        cipher.rekey(b"k").unwrap();
        codec.wechseln(Box::new(cipher));

        let sender = UnitSender::neu(codec, transport.clone());
        sender.send_unit_plain(&unit(&["klartext"])).await.unwrap();
        assert_eq!(&gegenstelle.empfangen().await.unwrap()[..], b"klartext");
    }

    #[tokio::test]
    async fn parallele_units_werden_nicht_verschraenkt() {
        let (transport, _rx, _gegenstelle) = MemoryTransport::verbinden();
        let sender = Arc::new(UnitSender::neu(Arc::new(MessageCodec::neu()), transport.clone()));

        let mut tasks = Vec::new();
        for n in 0..8 {
            let sender = Arc::clone(&sender);
            tasks.push(tokio::spawn(async move {
                let tokens: Vec<String> = (0..20).map(|i| format!("{}-{}", n, i)).collect();
                sender.send_unit(&tokens).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let gesendet = transport.gesendet();
        assert_eq!(gesendet.len(), 160);
        for block in gesendet.chunks(20) {
            let praefix = String::from_utf8_lossy(&block[0]).split('-').next().unwrap().to_string();
            for (i, nachricht) in block.iter().enumerate() {
                assert_eq!(String::from_utf8_lossy(nachricht), format!("{}-{}", praefix, i));
            }
        }
    }
}

//! Emisión de códigos de seguimiento
//!
//! Formato `ENV-XXXX-XXXX` sobre un alfabeto sin caracteres ambiguos
//! (sin 0/O, 1/I/L). Cada código se registra en el store antes de
//! entregarse; el registro del store es la única fuente de verdad, así que
//! un código nunca se repite aunque el proceso se reinicie.

use std::sync::Arc;

use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use tokio::sync::Mutex;

use crate::repositories::Store;
use crate::utils::errors::{AppError, AppResult};

pub const TRACKING_PREFIX: &str = "ENV";
const ALPHABET: &[u8] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";
const GROUP_LEN: usize = 4;
const MAX_ATTEMPTS: usize = 16;

lazy_static! {
    static ref TRACKING_CODE_RE: Regex = Regex::new(r"^ENV-[2-9A-HJKMNP-Z]{4}-[2-9A-HJKMNP-Z]{4}$").unwrap();
}

/// El código tiene el formato emitido por este servicio
pub fn is_valid_tracking_code(code: &str) -> bool {
    TRACKING_CODE_RE.is_match(code)
}

fn random_group(rng: &mut impl Rng) -> String {
    (0..GROUP_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

fn random_code() -> String {
    let mut rng = rand::thread_rng();
    format!("{}-{}-{}", TRACKING_PREFIX, random_group(&mut rng), random_group(&mut rng))
}

pub struct TrackingCodeIssuer {
    store: Arc<dyn Store>,
    issue_lock: Mutex<()>,
}

impl TrackingCodeIssuer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            issue_lock: Mutex::new(()),
        }
    }

    /// Emite un código nuevo. Las emisiones concurrentes se serializan y la
    /// reserva en el store descarta cualquier colisión con el histórico.
    pub async fn generate(&self) -> AppResult<String> {
        let _guard = self.issue_lock.lock().await;

        for attempt in 1..=MAX_ATTEMPTS {
            let code = random_code();
            if self.store.reserve_tracking_code(&code).await? {
                log::debug!("🏷️ Código emitido {} (intento {})", code, attempt);
                return Ok(code);
            }
            log::warn!("🔁 Colisión de código {}, reintentando", code);
        }

        Err(AppError::Internal(format!(
            "could not issue a unique tracking code after {} attempts",
            MAX_ATTEMPTS
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryStore;
    use std::collections::HashSet;

    #[test]
    fn test_format() {
        for _ in 0..200 {
            let code = random_code();
            assert!(is_valid_tracking_code(&code), "{}", code);
            assert!(!code[4..].contains(['0', 'O', '1', 'I', 'L']));
        }
        assert!(!is_valid_tracking_code("ENV-0000-AAAA"));
        assert!(!is_valid_tracking_code("env-AAAA-AAAA"));
    }

    #[tokio::test]
    async fn test_sequential_codes_are_distinct() {
        let issuer = TrackingCodeIssuer::new(Arc::new(InMemoryStore::new()));
        let mut seen = HashSet::new();
        for _ in 0..500 {
            assert!(seen.insert(issuer.generate().await.unwrap()));
        }
    }

    #[tokio::test]
    async fn test_concurrent_codes_are_distinct() {
        let issuer = Arc::new(TrackingCodeIssuer::new(Arc::new(InMemoryStore::new())));
        let handles: Vec<_> = (0..64)
            .map(|_| {
                let issuer = issuer.clone();
                tokio::spawn(async move { issuer.generate().await.unwrap() })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            assert!(seen.insert(handle.await.unwrap()));
        }
        assert_eq!(seen.len(), 64);
    }

    #[tokio::test]
    async fn test_skips_codes_already_issued() {
        let store = Arc::new(InMemoryStore::new());
        let issuer = TrackingCodeIssuer::new(store.clone());
        let first = issuer.generate().await.unwrap();
        assert!(!store.reserve_tracking_code(&first).await.unwrap());
    }
}

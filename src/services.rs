use std::sync::Mutex;

/// Translation string lookup.
#[cfg_attr(test, mockall::automock)]
pub trait Translator: Send + Sync {
    /// Translated text of `key` in `locale`; the key itself when unknown.
    fn translate(&self, key: &str, locale: &str) -> String;
}

/// Records which article uuids were already rendered during one request.
#[cfg_attr(test, mockall::automock)]
pub trait ReferenceStore: Send + Sync {
    fn add(&self, uuid: &str);

    fn all(&self) -> Vec<String>;
}

/// Request scoped [`ReferenceStore`].
#[derive(Debug, Default)]
pub struct RequestReferenceStore {
    uuids: Mutex<Vec<String>>,
}

impl RequestReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReferenceStore for RequestReferenceStore {
    fn add(&self, uuid: &str) {
        if let Ok(mut uuids) = self.uuids.lock() {
            if !uuids.iter().any(|u| u == uuid) {
                uuids.push(uuid.to_string());
            }
        }
    }

    fn all(&self) -> Vec<String> {
        self.uuids
            .lock()
            .map(|uuids| uuids.clone())
            .unwrap_or_default()
    }
}

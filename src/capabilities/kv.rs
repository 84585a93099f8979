use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_KEY_LENGTH: usize = 256;
pub const MAX_VALUE_SIZE: usize = 512 * 1024;

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum KvError {
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("value too large: {size} bytes exceeds maximum of {max} bytes")]
    ValueTooLarge { size: usize, max: usize },

    #[error("storage error: {message}")]
    Storage { message: String },
}

fn validate_key(key: &str) -> Result<(), KvError> {
    if key.is_empty() {
        return Err(KvError::InvalidKey {
            key: String::new(),
            reason: "key cannot be empty".to_string(),
        });
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(KvError::InvalidKey {
            key: format!("{}...", &key[..32]),
            reason: format!("key exceeds maximum length of {MAX_KEY_LENGTH} bytes"),
        });
    }
    if key.chars().any(char::is_control) {
        return Err(KvError::InvalidKey {
            key: key.to_string(),
            reason: "key contains control characters".to_string(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KvOperation {
    Get { key: String },
    Set { key: String, value: Vec<u8> },
    Delete { key: String },
}

/// Shell-side storage result. `Value(None)` means the key was absent, which
/// is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KvOutput {
    Value(Option<Vec<u8>>),
    Done,
}

pub type KvResult = Result<KvOutput, KvError>;

impl Operation for KvOperation {
    type Output = KvResult;
}

pub struct KeyValue<Ev> {
    context: CapabilityContext<KvOperation, Ev>,
}

impl<Ev> Capability<Ev> for KeyValue<Ev> {
    type Operation = KvOperation;
    type MappedSelf<MappedEv> = KeyValue<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        KeyValue::new(self.context.map_event(f))
    }
}

impl<Ev> KeyValue<Ev>
where
    Ev: Send + 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<KvOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn get<F>(&self, key: impl Into<String>, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        self.execute(|key| KvOperation::Get { key }, key.into(), make_event);
    }

    pub fn set<F>(&self, key: impl Into<String>, value: Vec<u8>, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        let key = key.into();
        if value.len() > MAX_VALUE_SIZE {
            let err = KvError::ValueTooLarge {
                size: value.len(),
                max: MAX_VALUE_SIZE,
            };
            let context = self.context.clone();
            self.context.spawn(async move {
                context.update_app(make_event(Err(err)));
            });
            return;
        }
        self.execute(move |key| KvOperation::Set { key, value }, key, make_event);
    }

    pub fn delete<F>(&self, key: impl Into<String>, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        self.execute(|key| KvOperation::Delete { key }, key.into(), make_event);
    }

    fn execute<B, F>(&self, build: B, key: String, make_event: F)
    where
        B: FnOnce(String) -> KvOperation + Send + 'static,
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = match validate_key(&key) {
                Ok(()) => context.request_from_shell(build(key)).await,
                Err(err) => Err(err),
            };
            context.update_app(make_event(result));
        });
    }
}

//! Capabilities are the only channel between the core and the shell. Every
//! operation and output here is serializable so requests can cross an FFI
//! boundary.

pub mod http;
pub mod kv;
pub mod timer;

pub use http::{Http, HttpError, HttpMethod, HttpRequest, HttpResponse, HttpResult, ValidatedUrl};
pub use kv::{KeyValue, KvError, KvOperation, KvOutput, KvResult};

/// Alias so the `Effect` derive names the variant `Kv` (it uses the type's
/// identifier, not the field name).
pub type Kv<Ev> = KeyValue<Ev>;
pub use timer::{Timer, TimerOperation, TimerOutput};

use crux_core::render::Render;

use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub kv: Kv<Event>,
    pub timer: Timer<Event>,
}

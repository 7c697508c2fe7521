// Discord layer - event adapters for the greeting pipeline.

#[path = "greeter/dispatcher.rs"]
pub mod dispatcher;

#[path = "greeter/events.rs"]
pub mod events;

pub mod reactions;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::config::BotConfig;
use crate::core::greeting::GreetingService;
use crate::infra::archive::FileArchive;
use crate::infra::presence::JsonPresenceStore;
use crate::infra::weather::WeatherGovClient;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Shared state handed to every event handler. Built once in main and never
/// mutated afterwards, except for the policy-mute ledger.
pub struct Data {
    pub config: Arc<BotConfig>,
    pub greeter: Arc<GreetingService<JsonPresenceStore, WeatherGovClient, FileArchive>>,
    /// Members this bot server-muted on join. Only these get unmuted on
    /// leave; anyone muted by another mechanism is left alone.
    pub muted_by_policy: Arc<Mutex<HashSet<u64>>>,
}

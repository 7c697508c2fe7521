pub mod composer;
pub mod models;
pub mod random;
pub mod schedule;
pub mod service;

pub use composer::{days_since, should_greet, GreetingComposer};
pub use models::{DevFlags, GreetingOptions, GreetingPayload, GreetingRequest, MotdMessage};
pub use random::{RandomDraws, StdDraws};
pub use schedule::{build_plan, DispatchPlan, PlannedSend, SendAction};
pub use service::GreetingService;

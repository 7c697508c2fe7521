// This is the entry point of the greeter bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (files, HTTP APIs)
// - `discord/` = Discord-specific adapters (events, sends)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;
mod health;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use poise::serenity_prelude as serenity;

use crate::config::BotConfig;
use crate::core::greeting::{GreetingComposer, GreetingService};
use crate::core::presence::PresenceTracker;
use crate::discord::{events, reactions, Data, Error};
use crate::infra::archive::FileArchive;
use crate::infra::presence::JsonPresenceStore;
use crate::infra::weather::WeatherGovClient;

/// Event handler for non-command Discord events. Voice-state updates drive
/// the greeting pipeline; messages feed the reaction easter eggs.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            tracing::info!(name = %data_about_bot.user.name, "ready to greet");
        }
        serenity::FullEvent::VoiceStateUpdate { old, new } => {
            if let Err(err) =
                events::handle_voice_state_update(ctx, data, old.as_ref(), new).await
            {
                tracing::error!("error handling voice state update: {err}");
            }
        }
        serenity::FullEvent::Message { new_message } => {
            if let Err(err) = reactions::handle_message(ctx, data, new_message).await {
                tracing::error!("error handling message: {err}");
            }
        }
        _ => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Get Discord bot token from environment
    let token = std::env::var("DISCORD_TOKEN").expect(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    );

    // Anything wrong with the rest of the configuration is fatal here and
    // nowhere else.
    let config = Arc::new(BotConfig::from_env().expect("invalid configuration"));
    std::fs::create_dir_all(&config.data_dir).expect("Failed to create data directory");

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let store = Arc::new(JsonPresenceStore::new(config.state_file()));
    let tracker = Arc::new(PresenceTracker::load(store).await);
    let weather = Arc::new(WeatherGovClient::new().expect("Failed to create weather client"));
    let archive = Arc::new(FileArchive::new(&config.data_dir));
    let composer = GreetingComposer::new(weather, archive, config.greeting.clone());
    let greeter = Arc::new(GreetingService::new(tracker, composer, config.bot_time_zone));

    let data = Data {
        config: Arc::clone(&config),
        greeter,
        muted_by_policy: Arc::new(Mutex::new(HashSet::new())),
    };

    // Liveness endpoint for the hosting platform.
    let port = config.port;
    tokio::spawn(async move {
        if let Err(err) = health::serve(port).await {
            tracing::error!("health endpoint failed: {err}");
        }
    });

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_VOICE_STATES
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT; // Required to read the game bot's embeds

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|_ctx, _ready, _framework| {
            Box::pin(async move {
                tracing::info!("connected; watching for cameras");
                Ok(data)
            })
        })
        .build();

    // Create the client and start the bot
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}

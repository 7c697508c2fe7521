// Executes a dispatch plan against Discord. Every step runs on its own
// detached timer: a slow or failed send is logged and never holds up, or
// cancels, anything scheduled after it. There is no cancellation path at
// all; once a join is dispatched, its follow-ups fire regardless of what
// the member does next.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use poise::serenity_prelude::{self as serenity, Mentionable};

use crate::core::archive::{OnThisDayContent, OnThisDayDoc};
use crate::core::greeting::{DispatchPlan, SendAction};

/// Default embed dressing for on-this-day documents that don't override it.
const ON_THIS_DAY_TITLE: &str = ":calendar: On This Day! :sparkles:";
const ON_THIS_DAY_COLOR: u32 = 0xB024B1;

/// Mute applied after the main greeting lands. Carried separately from the
/// plan because it needs the guild, not just the announce channel.
pub struct MuteFollowup {
    pub guild_id: serenity::GuildId,
    pub user_id: serenity::UserId,
    pub muted_by_policy: Arc<Mutex<HashSet<u64>>>,
}

/// Spawn one timer per planned step. Returns immediately.
pub fn dispatch(
    http: Arc<serenity::Http>,
    channel_id: serenity::ChannelId,
    plan: DispatchPlan,
    mut mute: Option<MuteFollowup>,
) {
    for step in plan.steps {
        let http = Arc::clone(&http);
        // The mute follow-up rides along with the main greeting send.
        let followup = if matches!(step.action, SendAction::Greeting(_)) {
            mute.take()
        } else {
            None
        };

        tokio::spawn(async move {
            tokio::time::sleep(step.offset).await;
            match step.action {
                SendAction::Typing => {
                    if let Err(err) = channel_id.broadcast_typing(&http).await {
                        tracing::warn!("failed to send typing indicator: {err}");
                    }
                }
                SendAction::Greeting(text) => match channel_id.say(&http, text).await {
                    Ok(_) => {
                        tracing::info!("sent greeting");
                        if let Some(followup) = followup {
                            apply_mute(&http, channel_id, followup).await;
                        }
                    }
                    Err(err) => tracing::error!("failed to send greeting: {err}"),
                },
                SendAction::Motd(body) => {
                    if let Err(err) = channel_id.say(&http, body).await {
                        tracing::error!("failed to send message of the day: {err}");
                    }
                }
                SendAction::OnThisDay(content) => {
                    if let Err(err) = send_on_this_day(&http, channel_id, content).await {
                        tracing::error!("failed to send on-this-day message: {err}");
                    }
                }
            }
        });
    }
}

async fn apply_mute(
    http: &serenity::Http,
    channel_id: serenity::ChannelId,
    followup: MuteFollowup,
) {
    let result = followup
        .guild_id
        .edit_member(
            http,
            followup.user_id,
            serenity::EditMember::new().mute(true),
        )
        .await;

    match result {
        Ok(_) => {
            followup
                .muted_by_policy
                .lock()
                .unwrap()
                .insert(followup.user_id.get());
            let notice = format!(
                "I've server-muted you while your camera is on, {}. I'll undo it when you head out!",
                followup.user_id.mention()
            );
            if let Err(err) = channel_id.say(http, notice).await {
                tracing::warn!("failed to send mute notice: {err}");
            }
        }
        Err(err) => tracing::warn!(
            user_id = followup.user_id.get(),
            "failed to mute member on join: {err}"
        ),
    }
}

async fn send_on_this_day(
    http: &serenity::Http,
    channel_id: serenity::ChannelId,
    content: OnThisDayContent,
) -> Result<(), serenity::Error> {
    match content {
        OnThisDayContent::Plain(text) => {
            channel_id.say(http, text).await?;
        }
        OnThisDayContent::Structured(doc) => {
            channel_id
                .send_message(http, serenity::CreateMessage::new().embed(build_embed(doc)))
                .await?;
        }
    }
    Ok(())
}

fn build_embed(doc: OnThisDayDoc) -> serenity::CreateEmbed {
    let mut embed = serenity::CreateEmbed::new()
        .title(doc.title.unwrap_or_else(|| ON_THIS_DAY_TITLE.to_string()))
        .color(ON_THIS_DAY_COLOR);
    if let Some(description) = doc.description {
        embed = embed.description(description);
    }
    for field in doc.fields {
        embed = embed.field(field.name, field.value, field.inline);
    }
    if let Some(image) = doc.image {
        embed = embed.image(image);
    }
    embed
}

// Voice-state adapter: turns serenity's before/after pairs into core
// transitions and drives the greeting pipeline. Role grants, revokes and
// the policy unmute are fire-and-forget side effects here; a failure is a
// log line, never a retry.

use anyhow::Result;
use poise::serenity_prelude::{self as serenity, Context, Mentionable};

use crate::core::greeting::{build_plan, StdDraws};
use crate::core::presence::{classify, PresenceTransition, VoiceSnapshot};
use crate::discord::dispatcher::{self, MuteFollowup};
use crate::discord::Data;

pub async fn handle_voice_state_update(
    ctx: &Context,
    data: &Data,
    old: Option<&serenity::VoiceState>,
    new: &serenity::VoiceState,
) -> Result<()> {
    let guild_id = match new.guild_id {
        Some(id) => id,
        None => return Ok(()),
    };
    if new.member.as_ref().is_some_and(|m| m.user.bot) {
        return Ok(());
    }
    if let Some(expected) = data.config.guild_id {
        if guild_id.get() != expected {
            return Ok(());
        }
    }

    let before = old.map(snapshot).unwrap_or_default();
    let after = snapshot(new);

    match classify(data.config.watch_channel_id, &before, &after) {
        PresenceTransition::Joined => handle_join(ctx, data, guild_id, new).await,
        PresenceTransition::Left => {
            handle_leave(ctx, data, guild_id, new.user_id);
            Ok(())
        }
        PresenceTransition::None => Ok(()),
    }
}

fn snapshot(state: &serenity::VoiceState) -> VoiceSnapshot {
    VoiceSnapshot {
        channel_id: state.channel_id.map(|id| id.get()),
        video_on: state.self_video,
    }
}

async fn handle_join(
    ctx: &Context,
    data: &Data,
    guild_id: serenity::GuildId,
    state: &serenity::VoiceState,
) -> Result<()> {
    let user_id = state.user_id;

    if let Some(role_id) = data.config.presence_role_id {
        grant_presence_role(ctx, guild_id, user_id, role_id);
    }

    // Count everyone on camera in the watched channel, joiner included.
    // The cache reference must not live across an await, hence the block.
    let occupancy = {
        match ctx.cache.guild(guild_id) {
            Some(guild) => guild
                .voice_states
                .values()
                .filter(|vs| {
                    vs.channel_id.map(|id| id.get()) == Some(data.config.watch_channel_id)
                        && vs.self_video
                })
                .filter(|vs| {
                    guild
                        .members
                        .get(&vs.user_id)
                        .map(|m| !m.user.bot)
                        .unwrap_or(true)
                })
                .count(),
            None => {
                tracing::warn!(guild_id = guild_id.get(), "guild missing from cache");
                1
            }
        }
    };

    let mut rng = StdDraws::from_entropy();
    let payload = data
        .greeter
        .handle_join(
            user_id.get(),
            user_id.mention().to_string(),
            occupancy,
            chrono::Utc::now(),
            &mut rng,
        )
        .await;

    let payload = match payload {
        Some(payload) => payload,
        None => return Ok(()),
    };

    let plan = build_plan(
        &payload,
        data.config.typing_delay(),
        data.config.greeting.dev.always_first,
        &mut rng,
    );

    // Skip the mute when another mechanism already server-muted them before
    // joining; they are not ours to unmute later.
    let mute = if data.config.mute_on_join && !state.mute {
        Some(MuteFollowup {
            guild_id,
            user_id,
            muted_by_policy: std::sync::Arc::clone(&data.muted_by_policy),
        })
    } else {
        None
    };

    dispatcher::dispatch(
        ctx.http.clone(),
        serenity::ChannelId::new(data.config.announce_channel_id),
        plan,
        mute,
    );
    Ok(())
}

fn handle_leave(ctx: &Context, data: &Data, guild_id: serenity::GuildId, user_id: serenity::UserId) {
    if let Some(role_id) = data.config.presence_role_id {
        let http = ctx.http.clone();
        tokio::spawn(async move {
            if let Err(err) = http
                .remove_member_role(
                    guild_id,
                    user_id,
                    serenity::RoleId::new(role_id),
                    Some("left the watched channel"),
                )
                .await
            {
                tracing::warn!(
                    user_id = user_id.get(),
                    "failed to revoke presence role: {err}"
                );
            }
        });
    }

    let was_policy_muted = data.muted_by_policy.lock().unwrap().remove(&user_id.get());
    if was_policy_muted {
        let http = ctx.http.clone();
        tokio::spawn(async move {
            if let Err(err) = guild_id
                .edit_member(&http, user_id, serenity::EditMember::new().mute(false))
                .await
            {
                tracing::warn!(
                    user_id = user_id.get(),
                    "failed to unmute member on leave: {err}"
                );
            }
        });
    }
}

fn grant_presence_role(
    ctx: &Context,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    role_id: u64,
) {
    let http = ctx.http.clone();
    tokio::spawn(async move {
        if let Err(err) = http
            .add_member_role(
                guild_id,
                user_id,
                serenity::RoleId::new(role_id),
                Some("active in the watched channel"),
            )
            .await
        {
            tracing::warn!(
                user_id = user_id.get(),
                "failed to grant presence role: {err}"
            );
        }
    });
}

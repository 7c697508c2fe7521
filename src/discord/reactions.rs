// Reaction easter eggs for the snowball-fight game bot. When it announces a
// hit in our guild we either retaliate (if we were the target), laugh at
// the victim, or answer a "doot doot" with the trumpets of war. All sends
// use the same delayed-typing pacing as the greeter and are fire-and-forget.

use std::time::Duration;

use anyhow::Result;
use once_cell::sync::Lazy;
use poise::serenity_prelude::{self as serenity, Context, Mentionable};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use regex::Regex;

use crate::discord::Data;

const SNOWBALL_BOT_ID: u64 = 914971233379045406;
/// Embed color the game bot uses for hit announcements.
const HIT_EMBED_COLOR: u32 = 6356832;
const LAUGH_PROBABILITY: f64 = 0.2;

const TYPING_DELAY: Duration = Duration::from_secs(2);
const REPLY_DELAY: Duration = Duration::from_secs(5);

const RETALIATION_TITLES: [&str; 4] = [
    "vengeance :knife:",
    "doom :boom:",
    "your demise :skull:",
    "you poor fool :pensive:",
];

const RETALIATION_GIFS: [&str; 6] = [
    "https://media2.giphy.com/media/xUySTqYAa9n6awCiSk/giphy.gif",
    "https://c.tenor.com/DrU8PT2Qj2oAAAAC/kill-it-with-fire-fire.gif",
    "https://media1.giphy.com/media/9GIF5KfVkGEllkQyz9/giphy.gif",
    "https://media1.giphy.com/media/xUySTZhLpepqXCl5Dy/giphy.gif",
    "https://c.tenor.com/48IYu9PI9wMAAAAC/man-throw.gif",
    "https://media0.giphy.com/media/lF5bH6enH9F1m/giphy.gif",
];

const DOOT_DOOT_GIFS: [&str; 4] = [
    "https://c.tenor.com/HcnatKp3NkkAAAAC/trumpet-middlefinger.gif",
    "https://c.tenor.com/gYGHTkX9PX0AAAAd/louis-armstrong.gif",
    "https://c.tenor.com/6YLyrvVA5X4AAAAd/muppets-muppet-show.gif",
    "https://c.tenor.com/o9RZrhOOFj8AAAAC/spongebob-sweet-victory.gif",
];

static TARGET_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<@\d+>").expect("static mention pattern"));

pub async fn handle_message(ctx: &Context, data: &Data, msg: &serenity::Message) -> Result<()> {
    if msg.author.id.get() != SNOWBALL_BOT_ID {
        return Ok(());
    }
    if let Some(expected) = data.config.guild_id {
        if msg.guild_id.map(|id| id.get()) != Some(expected) {
            return Ok(());
        }
    }

    let embed = match msg.embeds.first() {
        Some(embed) => embed,
        None => return Ok(()),
    };
    if embed.colour.map(|c| c.0) != Some(HIT_EMBED_COLOR) {
        return Ok(());
    }
    let description = match &embed.description {
        Some(description) => description.clone(),
        None => return Ok(()),
    };
    let thrower = match &msg.interaction {
        Some(interaction) => interaction.user.mention().to_string(),
        None => return Ok(()),
    };

    let our_mention = format!("<@{}>", ctx.cache.current_user().id.get());
    if description.contains(&our_mention) {
        tracing::info!("snowball hit by {thrower}!");
        retaliate(ctx, msg.channel_id, &thrower);
        return Ok(());
    }

    let target = match TARGET_MENTION.find(&description) {
        Some(found) => found.as_str().to_string(),
        None => return Ok(()),
    };

    let mut rng = StdRng::from_entropy();
    if rng.gen::<f64>() < LAUGH_PROBABILITY {
        let taunts = [
            format!("Haha, {thrower} hit {target} with a snowball! :joy:"),
            format!("{target} totally had that coming. Good job {thrower}! :raised_hands:"),
            format!(
                "Bwahahaha! You can barely recognize {target} under all that snow! :joy:"
            ),
            format!("Oh snap! {thrower} totally _owned_ {target} with that one! :grin:"),
            format!("{target} looks much nicer covered in snow, don't you think? :bird:"),
        ];
        let taunt = taunts
            .choose(&mut rng)
            .cloned()
            .unwrap_or_else(|| taunts[0].clone());
        delayed_say(ctx, msg.channel_id, taunt);
        return Ok(());
    }

    if description.contains("doot doot") {
        let gif = pick(&mut rng, &DOOT_DOOT_GIFS);
        let embed = serenity::CreateEmbed::new()
            .title("The trumpets of war :trumpet:")
            .description("**DOOT DOOT!**")
            .color(0xFFD700)
            .image(gif);
        delayed_embed(ctx, msg.channel_id, embed);
    }

    Ok(())
}

fn retaliate(ctx: &Context, channel_id: serenity::ChannelId, thrower: &str) {
    let mut rng = StdRng::from_entropy();
    let title = pick(&mut rng, &RETALIATION_TITLES);
    let gif = pick(&mut rng, &RETALIATION_GIFS);
    let descriptions = [
        format!("{thrower}, prepare to be hit!"),
        format!("{thrower}, prepare to meet your doom!"),
        format!("{thrower}, prepare to be pelted into the infinite!"),
        format!("You're mine, {thrower}!"),
    ];
    let description = descriptions
        .choose(&mut rng)
        .cloned()
        .unwrap_or_else(|| descriptions[0].clone());

    let embed = serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(0xFF2A00)
        .image(gif);
    delayed_embed(ctx, channel_id, embed);
}

fn pick<'a>(rng: &mut StdRng, items: &'a [&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or(items[0])
}

fn delayed_say(ctx: &Context, channel_id: serenity::ChannelId, text: String) {
    let http = ctx.http.clone();
    tokio::spawn(async move {
        tokio::time::sleep(TYPING_DELAY).await;
        if let Err(err) = channel_id.broadcast_typing(&http).await {
            tracing::warn!("failed to send typing indicator: {err}");
        }
        tokio::time::sleep(REPLY_DELAY - TYPING_DELAY).await;
        if let Err(err) = channel_id.say(&http, text).await {
            tracing::warn!("failed to send snowball reply: {err}");
        }
    });
}

fn delayed_embed(ctx: &Context, channel_id: serenity::ChannelId, embed: serenity::CreateEmbed) {
    let http = ctx.http.clone();
    tokio::spawn(async move {
        tokio::time::sleep(TYPING_DELAY).await;
        if let Err(err) = channel_id.broadcast_typing(&http).await {
            tracing::warn!("failed to send typing indicator: {err}");
        }
        tokio::time::sleep(REPLY_DELAY - TYPING_DELAY).await;
        if let Err(err) = channel_id
            .send_message(&http, serenity::CreateMessage::new().embed(embed))
            .await
        {
            tracing::warn!("failed to send snowball embed: {err}");
        }
    });
}

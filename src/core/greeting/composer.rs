// The composition pipeline. Takes everything known about one qualifying
// join and produces the greeting text plus its side artifacts. Stages run
// in a fixed order; every randomized choice goes through the injected
// `RandomDraws` source so the whole pipeline is replayable in tests.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::core::archive::{MessageArchive, OnThisDayContent};
use crate::core::weather::WeatherProvider;

use super::models::{DevFlags, GreetingOptions, GreetingPayload, GreetingRequest, MotdMessage};
use super::random::RandomDraws;
use super::schedule::parse_delay_directive;

/// Channel occupancy that counts as a full group.
const FULL_GROUP: usize = 9;

const HYDRATION_PROBABILITY: f64 = 2.0 / 7.0;

const AWARD_DECORATIONS: [&str; 5] = [
    ":first_place:",
    ":trophy:",
    ":medal:",
    ":military_medal:",
    ":star2:",
];

const GIFT_CATALOG: [&str; 10] = [
    "a shiny pebble :gem:",
    "a fresh sunflower seed :sunflower:",
    "a perfectly curled feather :feather:",
    "a bottle cap I found :yellow_circle:",
    "a piece of sparkly string :sparkles:",
    "a warm cup of tea :tea:",
    "a tiny pinecone :evergreen_tree:",
    "a very good stick :herb:",
    "a smooth piece of sea glass :ocean:",
    "a dried cranberry :cherries:",
];

const AFFECTION_CLOSERS: [&str; 4] = [
    "You deserve it!",
    "Because you're wonderful!",
    "Just because!",
    "You've earned it!",
];

const WEEKEND_PROMPTS: [&str; 4] = [
    "How was your weekend?",
    "Did you get up to anything fun this weekend?",
    "I hope you had a lovely weekend!",
    "What was the best part of your weekend?",
];

/// Whole days elapsed between two instants.
pub fn days_since(now: DateTime<Utc>, then: DateTime<Utc>) -> i64 {
    (now - then).num_days()
}

/// Same-day dedup rule: a member already seen today (bot-local calendar) is
/// not greeted again unless the alwaysGreet dev flag is set. The store
/// update that recorded the sighting stands either way.
pub fn should_greet(previous_seen: Option<DateTime<Utc>>, now: &DateTime<Tz>, dev: &DevFlags) -> bool {
    if dev.always_greet {
        return true;
    }
    match previous_seen {
        None => true,
        Some(seen) => seen.with_timezone(&now.timezone()).date_naive() != now.date_naive(),
    }
}

pub struct GreetingComposer<W, A> {
    weather: Arc<W>,
    archive: Arc<A>,
    options: GreetingOptions,
}

impl<W: WeatherProvider, A: MessageArchive> GreetingComposer<W, A> {
    pub fn new(weather: Arc<W>, archive: Arc<A>, options: GreetingOptions) -> Self {
        Self {
            weather,
            archive,
            options,
        }
    }

    pub fn options(&self) -> &GreetingOptions {
        &self.options
    }

    /// Build the full greeting for one join.
    ///
    /// Draws are consumed in a fixed order: the first-one-here award, the
    /// gift chance / extra-gift chance / gift slots / affection closer, the
    /// weekend prompt, and finally the hydration chance.
    pub async fn compose(
        &self,
        request: &GreetingRequest,
        rng: &mut dyn RandomDraws,
    ) -> GreetingPayload {
        let mut text = salutation(request);

        if let Some(clause) = date_greeting(&request.now) {
            push_clause(&mut text, &clause);
        }
        if let Some(clause) = self.reunion_clause(request) {
            push_clause(&mut text, &clause);
        }
        if let Some(clause) = reengagement_clause(request) {
            push_clause(&mut text, &clause);
        }
        if let Some(clause) = occupancy_clause(request.occupancy) {
            push_clause(&mut text, &clause);
        }

        let mut motd_messages = Vec::new();
        let mut on_this_day = None;
        if self.first_greeting_of_day(request) {
            if request.occupancy == 1 || self.options.dev.always_first {
                let award = AWARD_DECORATIONS[rng.pick_index(AWARD_DECORATIONS.len())];
                push_clause(&mut text, &format!("You're the first one here! {award}"));
            }
            motd_messages = self.collect_motd().await;
            on_this_day = self.lookup_on_this_day(request).await;
        }

        if let Some(clause) = self.gift_clause(rng, &text) {
            push_clause(&mut text, &clause);
        }
        if let Some(paragraph) = self.weekend_prompt_paragraph(request, rng) {
            push_paragraph(&mut text, &paragraph);
        }
        if let Some(paragraph) = self.weather_paragraph(request).await {
            push_paragraph(&mut text, &paragraph);
        }
        if rng.chance(HYDRATION_PROBABILITY) {
            push_clause(&mut text, "Remember to drink some water! :potable_water:");
        }

        tracing::debug!(member_id = request.member_id, "composed greeting");
        GreetingPayload {
            text,
            motd_messages,
            on_this_day,
        }
    }

    fn reunion_clause(&self, request: &GreetingRequest) -> Option<String> {
        let last_seen = match request.last_seen {
            Some(last_seen) => last_seen,
            None => {
                return Some(
                    "I don't believe we've met before. I'm so happy to meet you!".to_string(),
                )
            }
        };

        let threshold = if self.options.dev.always_good_to_see_you {
            0
        } else {
            self.options.good_to_see_you_days
        };
        let days = days_since(request.now_utc(), last_seen);
        if days < threshold {
            return None;
        }

        let mut clause = String::from("It's so good to see you again!");
        if days >= 2 * threshold {
            clause.push_str(" I've missed you!");
        }
        Some(clause)
    }

    /// Open iff nothing has been greeted yet today (bot-local calendar), or
    /// the dev flag forces it. Keyed off the global last-greeting time, so
    /// only one member a day ever sees first-of-day content.
    fn first_greeting_of_day(&self, request: &GreetingRequest) -> bool {
        if self.options.dev.always_first {
            return true;
        }
        match request.latest_greeting {
            None => true,
            Some(latest) => {
                latest.with_timezone(&request.now.timezone()).date_naive()
                    != request.now.date_naive()
            }
        }
    }

    async fn collect_motd(&self) -> Vec<MotdMessage> {
        let entries = match self.archive.list_pending().await {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!("unable to list pending messages of the day: {err}");
                return Vec::new();
            }
        };

        let mut messages = Vec::new();
        for entry in entries {
            let (delay, body) = parse_delay_directive(&entry.body);
            if body.is_empty() {
                continue;
            }
            if !self.options.dev.always_first {
                if let Err(err) = self.archive.archive(&entry).await {
                    tracing::warn!(
                        entry = %entry.name,
                        "unable to archive consumed message of the day: {err}"
                    );
                }
            }
            messages.push(MotdMessage { body, delay });
        }
        messages
    }

    async fn lookup_on_this_day(&self, request: &GreetingRequest) -> Option<OnThisDayContent> {
        match self.archive.on_this_day(request.now.date_naive()).await {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("unable to read on-this-day content: {err}");
                None
            }
        }
    }

    fn gift_clause(&self, rng: &mut dyn RandomDraws, text_so_far: &str) -> Option<String> {
        let dev = &self.options.dev;
        let probability = if dev.always_gift {
            1.0
        } else {
            self.options.gift_probability
        };
        if !rng.chance(probability) {
            return None;
        }

        let extra = dev.always_extra_gift || rng.chance(self.options.extra_gift_probability);
        let wanted = if extra { 2 } else { 1 };

        let mut gifts: Vec<&str> = Vec::new();
        for _ in 0..wanted {
            // Bounded redraw: reject anything whose text already appears
            // verbatim in the greeting, including earlier gift slots. A slot
            // that cannot be filled uniquely is dropped, never duplicated.
            for _ in 0..GIFT_CATALOG.len() {
                let candidate = GIFT_CATALOG[rng.pick_index(GIFT_CATALOG.len())];
                if text_so_far.contains(candidate) || gifts.contains(&candidate) {
                    continue;
                }
                gifts.push(candidate);
                break;
            }
        }
        if gifts.is_empty() {
            return None;
        }

        let mut clause = format!("I brought you {}", gifts[0]);
        for gift in &gifts[1..] {
            clause.push_str(", and also ");
            clause.push_str(gift);
        }
        clause.push('!');
        if gifts.len() >= 2 {
            clause.push(' ');
            clause.push_str(AFFECTION_CLOSERS[rng.pick_index(AFFECTION_CLOSERS.len())]);
        }
        Some(clause)
    }

    fn weekend_prompt_paragraph(
        &self,
        request: &GreetingRequest,
        rng: &mut dyn RandomDraws,
    ) -> Option<String> {
        if request.now.weekday() != Weekday::Mon {
            return None;
        }
        let prompt = WEEKEND_PROMPTS[rng.pick_index(WEEKEND_PROMPTS.len())];
        let morning = (5..12).contains(&request.now.hour());
        match (&self.options.monday_morning_addendum, morning) {
            (Some(addendum), true) => Some(format!("{addendum} {prompt}")),
            _ => Some(prompt.to_string()),
        }
    }

    async fn weather_paragraph(&self, request: &GreetingRequest) -> Option<String> {
        let location = self.options.weather_location.as_deref()?;

        let stale = match request.latest_greeting {
            None => true,
            Some(latest) => {
                (request.now_utc() - latest).num_hours() >= self.options.weather_freshness_hours
            }
        };
        if !stale && !self.options.dev.always_weather {
            return None;
        }

        match self.weather.forecast(location).await {
            Ok(forecast) => Some(format!(
                "The forecast for {} is: {}",
                forecast.for_segment, forecast.text
            )),
            Err(err) => {
                tracing::warn!("unable to fetch weather forecast: {err}");
                None
            }
        }
    }
}

fn salutation(request: &GreetingRequest) -> String {
    let hour = request.now.hour();
    let mention = &request.member_mention;
    if hour < 5 {
        format!("You're burning the midnight oil, {mention}! :crescent_moon:")
    } else if hour < 8 {
        format!("Good morning, {mention}, you're up bright and early! :sunrise:")
    } else if hour < 12 {
        format!("Good morning, {mention}! :sun_with_face:")
    } else if hour < 17 {
        format!("Good afternoon, {mention}! :butterfly:")
    } else if hour < 20 {
        format!("Good evening, {mention}! :city_dusk:")
    } else {
        format!("Good evening, {mention}! :night_with_stars:")
    }
}

fn date_greeting(now: &DateTime<Tz>) -> Option<String> {
    let friday = now.weekday() == Weekday::Fri && now.hour() < 20;
    let first_of_month = now.day() == 1;
    match (friday, first_of_month) {
        (true, true) => Some(format!(
            "Happy Friday, and happy {}! :tada:",
            now.format("%B")
        )),
        (true, false) => Some("Happy Friday! :partying_face:".to_string()),
        (false, true) => Some(format!("Happy {}! :calendar_spiral:", now.format("%B"))),
        (false, false) => None,
    }
}

fn reengagement_clause(request: &GreetingRequest) -> Option<String> {
    let latest = request.latest_greeting?;
    if days_since(request.now_utc(), latest) >= 2 {
        Some("It's been a little quiet around here lately, so I'm extra glad you're here!".to_string())
    } else {
        None
    }
}

fn occupancy_clause(occupancy: usize) -> Option<String> {
    if occupancy == FULL_GROUP {
        Some("And now we have enough people here for a proper party! :tada:".to_string())
    } else if occupancy >= FULL_GROUP - 2 && occupancy < FULL_GROUP {
        let needed = FULL_GROUP - occupancy;
        Some(format!("Only {needed} more and we'll have a proper party going!"))
    } else if occupancy >= FULL_GROUP / 2 {
        Some("We're over halfway to a proper party!".to_string())
    } else {
        None
    }
}

fn push_clause(text: &mut String, clause: &str) {
    text.push(' ');
    text.push_str(clause);
}

fn push_paragraph(text: &mut String, paragraph: &str) {
    text.push_str("\n\n");
    text.push_str(paragraph);
}

// Lays out the full send sequence for one greeting as a task list of
// relative offsets. The discord layer runs each step on its own timer, so
// nothing here blocks and nothing here can cancel anything else.

use std::time::Duration;

use crate::core::archive::OnThisDayContent;

use super::models::GreetingPayload;
use super::random::RandomDraws;

/// Offset of the message-of-the-day typing indicator, past the main send.
const MOTD_BASE_OFFSET: Duration = Duration::from_secs(12);
/// Gap between the typing indicator and the first entry.
const MOTD_LEAD: Duration = Duration::from_secs(3);
/// Gap between entries that carry no explicit delay directive.
const MOTD_DEFAULT_DELAY: Duration = Duration::from_secs(20);

const ON_THIS_DAY_MIN_OFFSET: Duration = Duration::from_secs(90);
const ON_THIS_DAY_JITTER_SECS: u64 = 90;
const ON_THIS_DAY_QUICK_MIN_OFFSET: Duration = Duration::from_secs(5);
const ON_THIS_DAY_QUICK_JITTER_SECS: u64 = 5;
/// Gap between the on-this-day typing indicator and its send.
const ON_THIS_DAY_LEAD: Duration = Duration::from_secs(3);

/// One platform call the dispatcher will make, `offset` after dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSend {
    pub offset: Duration,
    pub action: SendAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendAction {
    Typing,
    Greeting(String),
    Motd(String),
    OnThisDay(OnThisDayContent),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchPlan {
    pub steps: Vec<PlannedSend>,
}

/// Strip a leading `delay: <seconds>` directive from an entry body.
pub fn parse_delay_directive(body: &str) -> (Option<Duration>, String) {
    let mut parts = body.splitn(2, '\n');
    let first = parts.next().unwrap_or_default();
    if let Some(raw) = first.trim().strip_prefix("delay:") {
        if let Ok(seconds) = raw.trim().parse::<u64>() {
            let remainder = parts.next().unwrap_or_default().trim().to_string();
            return (Some(Duration::from_secs(seconds)), remainder);
        }
    }
    (None, body.trim().to_string())
}

/// Build the send plan for one composed greeting: typing right away, the
/// greeting after the configured delay, then the side artifacts paced out
/// behind it.
pub fn build_plan(
    payload: &GreetingPayload,
    typing_delay: Duration,
    quick: bool,
    rng: &mut dyn RandomDraws,
) -> DispatchPlan {
    let mut steps = vec![
        PlannedSend {
            offset: Duration::ZERO,
            action: SendAction::Typing,
        },
        PlannedSend {
            offset: typing_delay,
            action: SendAction::Greeting(payload.text.clone()),
        },
    ];

    if !payload.motd_messages.is_empty() {
        let mut cursor = typing_delay + MOTD_BASE_OFFSET;
        steps.push(PlannedSend {
            offset: cursor,
            action: SendAction::Typing,
        });
        for (index, message) in payload.motd_messages.iter().enumerate() {
            let gap = message.delay.unwrap_or(if index == 0 {
                MOTD_LEAD
            } else {
                MOTD_DEFAULT_DELAY
            });
            if index > 0 {
                // A little typing partway through the gap keeps the pacing
                // from looking scripted.
                steps.push(PlannedSend {
                    offset: cursor + gap.mul_f64(0.6),
                    action: SendAction::Typing,
                });
            }
            cursor += gap;
            steps.push(PlannedSend {
                offset: cursor,
                action: SendAction::Motd(message.body.clone()),
            });
        }
    }

    if let Some(content) = &payload.on_this_day {
        let (minimum, jitter) = if quick {
            (ON_THIS_DAY_QUICK_MIN_OFFSET, ON_THIS_DAY_QUICK_JITTER_SECS)
        } else {
            (ON_THIS_DAY_MIN_OFFSET, ON_THIS_DAY_JITTER_SECS)
        };
        let offset = minimum + Duration::from_secs(rng.jitter(jitter));
        steps.push(PlannedSend {
            offset,
            action: SendAction::Typing,
        });
        steps.push(PlannedSend {
            offset: offset + ON_THIS_DAY_LEAD,
            action: SendAction::OnThisDay(content.clone()),
        });
    }

    DispatchPlan { steps }
}

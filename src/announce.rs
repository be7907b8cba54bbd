//! Announcement message payloads.
//!
//! Pure builders for the cards posted to the originating channel. The block
//! payloads follow the chat platform's layout vocabulary (sections, actions,
//! buttons) and are handed to the [`crate::channel::Channel`] collaborator
//! for rendering.
//!
//! Buttons carry an action id and nothing else. The one lookup key for a
//! click is the message id the channel reports at post time; keys are never
//! derived from row ids embedded in button values or from message text,
//! which changes on every transition.

use crate::types::{Entitlement, Priority, Request, SkillGroup, SupportTier};
use serde_json::{Value, json};

/// Action id for the Resolve button on an announcement.
pub const ACTION_RESOLVE: &str = "resolve_request";
/// Action id for the Discard button on an announcement.
pub const ACTION_DISCARD: &str = "discard_request";
/// Action id for the Re-Open button on a resolved/discarded card.
pub const ACTION_REOPEN: &str = "reopen_request";
/// Action id for the acknowledgement button on a reminder.
pub const ACTION_STILL_NEED_HELP: &str = "still_need_help";

/// A renderable message: plain-text fallback plus structured blocks.
#[derive(Debug, Clone)]
pub struct Message {
    pub text: String,
    pub blocks: Value,
}

fn section(block_id: &str, text: String) -> Value {
    json!({
        "type": "section",
        "block_id": block_id,
        "text": { "type": "mrkdwn", "text": text }
    })
}

fn button(action_id: &str, label: &str, style: Option<&str>) -> Value {
    let mut b = json!({
        "type": "button",
        "text": { "type": "plain_text", "text": label },
        "action_id": action_id
    });
    if let Some(style) = style {
        b["style"] = json!(style);
    }
    b
}

fn actions(block_id: &str, elements: Vec<Value>) -> Value {
    json!({
        "type": "actions",
        "block_id": block_id,
        "elements": elements
    })
}

fn summary_text(request: &Request) -> String {
    format!(
        "*Swarm Request*\n\
         *Ticket:* {}\n\
         *Entitlement:* {}\n\
         *Skill Group:* {}\n\
         *Support Tier:* {}\n\
         *Priority:* {}\n\
         *Issue Description:* {}\n\
         *Help Required:* {}",
        request.ticket,
        request.entitlement.label(),
        request.skill_group.label(),
        request.support_tier.label(),
        request.priority.label(),
        request.issue_description,
        request.help_required,
    )
}

/// Card announcing a new request, with Resolve/Discard buttons.
pub fn request_card(request: &Request) -> Message {
    Message {
        text: format!("Swarm Request: {}", request.ticket),
        blocks: json!([
            section("request_summary", summary_text(request)),
            actions(
                "request_actions",
                vec![
                    button(ACTION_RESOLVE, "Resolve Swarm", Some("primary")),
                    button(ACTION_DISCARD, "Discard Swarm", Some("danger")),
                ]
            ),
        ]),
    }
}

/// Card shown after a request is resolved.
pub fn resolved_card(request: &Request) -> Message {
    Message {
        text: format!("Swarm Request Resolved: {}", request.ticket),
        blocks: json!([
            section(
                "resolved",
                format!(
                    "This swarm request has been resolved.\n*Ticket:* {}",
                    request.ticket
                )
            ),
            actions(
                "reopen_actions",
                vec![button(ACTION_REOPEN, "Re-Open Swarm", None)]
            ),
        ]),
    }
}

/// Card shown after a request is discarded.
pub fn discarded_card(request: &Request) -> Message {
    Message {
        text: format!("Swarm Request Discarded: {}", request.ticket),
        blocks: json!([
            section(
                "discarded",
                format!(
                    "This swarm request has been discarded.\n*Ticket:* {}",
                    request.ticket
                )
            ),
            actions(
                "reopen_actions",
                vec![button(ACTION_REOPEN, "Re-Open Swarm", None)]
            ),
        ]),
    }
}

/// Card shown after a request is reopened: the full summary again, with
/// the transition buttons restored so the request stays actionable.
pub fn reopened_card(request: &Request) -> Message {
    Message {
        text: format!("Swarm Request Reopened: {}", request.ticket),
        blocks: json!([
            section("reopened", "This swarm request has been reopened.".to_string()),
            section("request_summary", summary_text(request)),
            actions(
                "request_actions",
                vec![
                    button(ACTION_RESOLVE, "Resolve Swarm", Some("primary")),
                    button(ACTION_DISCARD, "Discard Swarm", Some("danger")),
                ]
            ),
        ]),
    }
}

/// The card matching a request's current status.
pub fn card_for(request: &Request) -> Message {
    match request.status {
        crate::types::RequestStatus::Open => request_card(request),
        crate::types::RequestStatus::Reopened => reopened_card(request),
        crate::types::RequestStatus::Resolved => resolved_card(request),
        crate::types::RequestStatus::Discarded => discarded_card(request),
    }
}

/// Reminder posted by the sweep for a request that has stayed active past
/// the configured threshold.
pub fn reminder_card(request: &Request) -> Message {
    Message {
        text: format!("Reminder: swarm request {} is unresolved", request.ticket),
        blocks: json!([
            section(
                "reminder",
                format!(
                    "Reminder: swarm request *{}* ({}) is unresolved and needs attention.",
                    request.ticket,
                    request.priority.label(),
                )
            ),
            actions(
                "reminder_actions",
                vec![button(ACTION_STILL_NEED_HELP, "Still Need Help?", None)]
            ),
        ]),
    }
}

fn select_input(block_id: &str, label: &str, options: Vec<(&str, &str)>) -> Value {
    let options: Vec<Value> = options
        .into_iter()
        .map(|(label, value)| {
            json!({
                "text": { "type": "plain_text", "text": label },
                "value": value
            })
        })
        .collect();
    json!({
        "type": "input",
        "block_id": block_id,
        "label": { "type": "plain_text", "text": label },
        "element": {
            "type": "static_select",
            "action_id": format!("{block_id}_select"),
            "options": options
        }
    })
}

fn text_input(block_id: &str, label: &str, multiline: bool) -> Value {
    json!({
        "type": "input",
        "block_id": block_id,
        "label": { "type": "plain_text", "text": label },
        "element": {
            "type": "plain_text_input",
            "action_id": format!("{block_id}_input"),
            "multiline": multiline
        }
    })
}

/// The intake form schema presented when a user starts a new request.
///
/// Select options are derived from the domain enums so the form and the
/// validator can never disagree about the allowed values.
pub fn intake_form() -> Value {
    json!({
        "type": "modal",
        "callback_id": "swarm_request_form",
        "title": { "type": "plain_text", "text": "Create Swarm Request" },
        "submit": { "type": "plain_text", "text": "Submit" },
        "close": { "type": "plain_text", "text": "Cancel" },
        "blocks": [
            text_input("ticket", "Ticket", false),
            select_input(
                "entitlement",
                "Entitlement",
                Entitlement::ALL.iter().map(|e| (e.label(), e.as_str())).collect()
            ),
            select_input(
                "skill_group",
                "Skill Group",
                SkillGroup::ALL.iter().map(|g| (g.label(), g.as_str())).collect()
            ),
            select_input(
                "support_tier",
                "Support Tier",
                SupportTier::ALL.iter().map(|t| (t.label(), t.as_str())).collect()
            ),
            select_input(
                "priority",
                "Priority",
                Priority::ALL.iter().map(|p| (p.label(), p.as_str())).collect()
            ),
            text_input("issue_description", "Issue Description", true),
            text_input("help_required", "Help Required", true),
        ]
    })
}

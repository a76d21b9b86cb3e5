//! Reply wording.
//!
//! Replies are English; tenants that need other wording supply it through
//! their knowledge base, which is language-filtered at retrieval time.

use crate::domain::knowledge::RetrievedSnippet;
use crate::domain::lead::{ConversationState, Lead};
use crate::ports::PropertySummary;

use super::contact::CONTACT_EXAMPLE;

pub fn welcome(agency_name: &str) -> String {
    format!("Welcome to {agency_name}! Please choose your language.")
}

pub fn choose_goal() -> String {
    "What brings you to the market: investing, a home to live in, or renting?".to_string()
}

pub fn ask_contact() -> String {
    "So we can send you matching options, please share your name and phone number \
     in international format, for example: "
        .to_string()
        + CONTACT_EXAMPLE
}

pub fn contact_invalid() -> String {
    format!(
        "I couldn't read that. Please send your name and phone number separated by a dash.\nExample: {CONTACT_EXAMPLE}"
    )
}

pub fn ask_budget() -> String {
    "What budget do you have in mind? Pick a range or type an amount like 500k or 1.2m.".to_string()
}

pub fn ask_property_type() -> String {
    "Which type of property are you looking for?".to_string()
}

fn format_price(price: u64) -> String {
    if price >= 1_000_000 {
        let millions = price as f64 / 1_000_000.0;
        format!("{}M", trim_decimal(millions))
    } else if price >= 1_000 {
        format!("{}K", trim_decimal(price as f64 / 1_000.0))
    } else {
        price.to_string()
    }
}

fn trim_decimal(value: f64) -> String {
    let text = format!("{value:.1}");
    text.strip_suffix(".0").map(str::to_string).unwrap_or(text)
}

/// The value-proposition message: matched listings plus one knowledge insight.
pub fn value_proposition(matches: &[PropertySummary], insight: Option<&RetrievedSnippet>) -> String {
    let mut text = if matches.is_empty() {
        "Nothing on our list matches exactly right now, but new units come up every week \
         and our agents see off-market options first."
            .to_string()
    } else {
        let mut text = String::from("Here is what matches your criteria:");
        for property in matches {
            text.push_str(&format!(
                "\n- {} in {} for {}",
                property.title,
                property.area,
                format_price(property.price)
            ));
        }
        text
    };

    if let Some(snippet) = insight {
        text.push_str("\n\n");
        text.push_str(&snippet.render());
    }
    text
}

pub fn hard_gate() -> String {
    "Prices and availability move quickly. Shall we book a short call with an agent to go through the options?"
        .to_string()
}

pub fn gate_deferred() -> String {
    "No problem. Whenever you're ready, just tap \"Book a call\".".to_string()
}

pub fn choose_slot(has_slots: bool) -> String {
    if has_slots {
        "Great! Which time suits you?".to_string()
    } else {
        "Great! When would suit you for a call?".to_string()
    }
}

pub fn booked(agency_name: &str, slot: &str) -> String {
    format!("You're booked for {slot}. An agent from {agency_name} will contact you then.")
}

/// Re-prompt used when a button or command does not fit the current step.
pub fn reprompt(state: ConversationState) -> String {
    match state {
        ConversationState::Start | ConversationState::LanguageSelect => {
            "Please choose your language.".to_string()
        }
        ConversationState::GoalSelect => choose_goal(),
        ConversationState::CaptureContact => contact_invalid(),
        ConversationState::Budget => ask_budget(),
        ConversationState::PropertyType => ask_property_type(),
        ConversationState::ValueProposition => "Would you like to see more options?".to_string(),
        ConversationState::HardGate => hard_gate(),
        ConversationState::BookingSlot => "Please pick one of the offered times.".to_string(),
        ConversationState::Booked => "Your viewing is booked. Ask me anything in the meantime.".to_string(),
    }
}

pub fn retry_later() -> String {
    "Sorry, something went wrong on our side. Please try again in a minute.".to_string()
}

/// System prompt for free-text answers, grounded in retrieved knowledge.
pub fn fallback_system_prompt(
    agency_name: &str,
    state: ConversationState,
    language: &str,
    snippets: &[RetrievedSnippet],
) -> String {
    let mut prompt = format!(
        "You are the concierge of {agency_name}, a real-estate agency. \
         Answer briefly and helpfully in language '{language}'. \
         The conversation is at step '{state}'; do not ask for information the next step will collect."
    );
    if !snippets.is_empty() {
        prompt.push_str("\n\nFacts you may rely on:");
        for snippet in snippets {
            prompt.push_str("\n- ");
            prompt.push_str(&snippet.render());
        }
    }
    prompt
}

pub fn fast_nudge(lead: &Lead) -> String {
    match lead.name.as_deref() {
        Some(name) => format!("Hi {name}, are you still there? I can share a few options whenever you're ready."),
        None => "Are you still there? I can share a few options whenever you're ready.".to_string(),
    }
}

pub fn value_nudge(lead: &Lead, insight: Option<&RetrievedSnippet>) -> String {
    let mut text = match lead.name.as_deref() {
        Some(name) => format!("{name}, one more thing worth knowing before you decide."),
        None => "One more thing worth knowing before you decide.".to_string(),
    };
    if let Some(snippet) = insight {
        text.push_str("\n\n");
        text.push_str(&snippet.render());
    }
    text.push_str("\n\nReply any time and we'll pick up where we left off.");
    text
}

/// Hot-lead alert for the agency's admin channel.
pub fn hot_lead_alert(lead: &Lead) -> String {
    let mut text = format!(
        "New hot lead: {} ({})",
        lead.name.as_deref().unwrap_or("unknown"),
        lead.phone.as_deref().unwrap_or("no phone")
    );
    if let Some(purpose) = lead.purpose {
        text.push_str(&format!("\nGoal: {purpose}"));
    }
    if let Some(tx) = lead.transaction_type {
        text.push_str(&format!(" / {tx}"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lead::PropertyType;
    use crate::domain::lead::TransactionType;

    #[test]
    fn prices_are_compact() {
        assert_eq!(format_price(1_200_000), "1.2M");
        assert_eq!(format_price(2_000_000), "2M");
        assert_eq!(format_price(850_000), "850K");
        assert_eq!(format_price(900), "900");
    }

    #[test]
    fn contact_prompts_carry_the_example() {
        assert!(ask_contact().contains(CONTACT_EXAMPLE));
        assert!(contact_invalid().contains(CONTACT_EXAMPLE));
    }

    #[test]
    fn value_proposition_lists_matches() {
        let matches = vec![PropertySummary {
            title: "Marina View 2BR".into(),
            area: "Dubai Marina".into(),
            price: 1_500_000,
            property_type: PropertyType::Apartment,
            transaction_type: TransactionType::Buy,
        }];
        let text = value_proposition(&matches, None);
        assert!(text.contains("Marina View 2BR in Dubai Marina for 1.5M"));
    }
}

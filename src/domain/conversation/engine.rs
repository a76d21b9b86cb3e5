//! Conversation engine.
//!
//! Pure with respect to storage and delivery: the engine reads a lead and its
//! tenant's configuration, consults read-only collaborators, and returns a
//! [`Response`] describing the next state, the field updates to commit and the
//! intents to execute. It never writes or sends anything itself.

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::foundation::StateMachine;
use crate::domain::knowledge::{KnowledgeRetriever, DEFAULT_LIMIT};
use crate::domain::lead::{ConversationState, Lead, LeadPatch, Purpose};
use crate::domain::tenant::TenantConfig;
use crate::ports::{
    CompletionError, CompletionRequest, CompletionService, MessageRole, PropertyCriteria,
    PropertyMatcher, RequestMetadata,
};

use super::contact::parse_contact;
use super::grammar::{self, GateChoice, ValueChoice};
use super::templates;
use super::{Button, Input, Intent, MessageKey, Response};

/// Urgency added by a value pass that found listings.
const MATCH_BUMP: u8 = 1;
/// Urgency added by a value pass that found nothing, to get an agent involved sooner.
const NO_MATCH_BUMP: u8 = 2;

/// Errors that abort a conversation step.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("completion service failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: ConversationState,
        to: ConversationState,
    },
}

/// Read-only collaborators the engine may consult.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub completion: &'a dyn CompletionService,
    pub properties: &'a dyn PropertyMatcher,
}

/// Tunables for the engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Knowledge snippets injected into a fallback prompt.
    pub knowledge_limit: usize,
    /// Listings shown in a value proposition.
    pub property_limit: usize,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            knowledge_limit: DEFAULT_LIMIT,
            property_limit: 3,
            max_tokens: 300,
            temperature: 0.4,
        }
    }
}

/// Drives one lead through the qualification funnel, one input at a time.
#[derive(Debug, Clone, Default)]
pub struct ConversationEngine {
    settings: EngineSettings,
}

impl ConversationEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    /// Computes the response to `input` for `lead`.
    ///
    /// Malformed input never errors; it either re-prompts or goes to the
    /// fallback. Only a failed completion call is fatal.
    pub async fn handle(
        &self,
        lead: &Lead,
        config: &TenantConfig,
        input: &Input,
        collaborators: &Collaborators<'_>,
    ) -> Result<Response, EngineError> {
        let current = lead.conversation_state;
        let response = self.step(lead, config, input, collaborators).await?;

        if response.next_state != current && !current.can_transition_to(&response.next_state) {
            return Err(EngineError::InvalidTransition {
                from: current,
                to: response.next_state,
            });
        }

        debug!(
            lead_id = %lead.id,
            from = %current,
            to = %response.next_state,
            fallback = response.is_fallback(),
            "conversation step"
        );
        Ok(response)
    }

    async fn step(
        &self,
        lead: &Lead,
        config: &TenantConfig,
        input: &Input,
        collaborators: &Collaborators<'_>,
    ) -> Result<Response, EngineError> {
        use ConversationState::*;

        let state = lead.conversation_state;

        if input.is_command("start") && !state.is_booked() {
            return Ok(welcome(config));
        }

        match state {
            Start => Ok(welcome(config)),

            LanguageSelect => match grammar::parse_language(input, config) {
                Some(language) => Ok(Response::structured(
                    MessageKey::ChooseGoal,
                    templates::choose_goal(),
                    grammar::goal_buttons(),
                    GoalSelect,
                )
                .with_updates(LeadPatch {
                    language: Some(language),
                    ..LeadPatch::default()
                })),
                None => self.unmatched(lead, config, input, collaborators).await,
            },

            GoalSelect => match grammar::parse_goal(input) {
                Some(goal) => Ok(Response::structured(
                    MessageKey::AskContact,
                    templates::ask_contact(),
                    Vec::new(),
                    CaptureContact,
                )
                .with_updates(LeadPatch {
                    purpose: Some(goal.purpose()),
                    transaction_type: Some(goal.transaction_type()),
                    ..LeadPatch::default()
                })),
                None => self.unmatched(lead, config, input, collaborators).await,
            },

            CaptureContact => Ok(capture_contact(lead, input)),

            Budget => match grammar::parse_budget(input) {
                Some(range) => {
                    let updates = LeadPatch {
                        budget: Some(range),
                        ..LeadPatch::default()
                    };
                    Ok(self.after_qualifier(lead, config, updates, collaborators).await)
                }
                None => self.unmatched(lead, config, input, collaborators).await,
            },

            PropertyType => match grammar::parse_property_type(input) {
                Some(kind) => {
                    let updates = LeadPatch {
                        property_type: Some(kind),
                        ..LeadPatch::default()
                    };
                    Ok(self.after_qualifier(lead, config, updates, collaborators).await)
                }
                None => self.unmatched(lead, config, input, collaborators).await,
            },

            ValueProposition => match grammar::parse_value_choice(input) {
                Some(ValueChoice::More) => Ok(self.value_pass(lead, config, collaborators).await),
                Some(ValueChoice::Interested) => Ok(Response::structured(
                    MessageKey::HardGate,
                    templates::hard_gate(),
                    grammar::gate_buttons(),
                    HardGate,
                )),
                None => self.unmatched(lead, config, input, collaborators).await,
            },

            HardGate => match grammar::parse_gate_choice(input) {
                Some(GateChoice::Book) => Ok(Response::structured(
                    MessageKey::ChooseSlot,
                    templates::choose_slot(!config.booking_slots.is_empty()),
                    grammar::slot_buttons(config),
                    BookingSlot,
                )),
                Some(GateChoice::Later) => Ok(Response::structured(
                    MessageKey::GateDeferred,
                    templates::gate_deferred(),
                    grammar::gate_buttons(),
                    HardGate,
                )),
                None => self.unmatched(lead, config, input, collaborators).await,
            },

            BookingSlot => match grammar::parse_slot(input, config) {
                Some(slot) => Ok(Response::structured(
                    MessageKey::Booked,
                    templates::booked(&config.agency_name, &slot),
                    Vec::new(),
                    Booked,
                )
                .with_updates(LeadPatch {
                    booking_slot: Some(slot),
                    ..LeadPatch::default()
                })),
                None => self.unmatched(lead, config, input, collaborators).await,
            },

            Booked => self.unmatched(lead, config, input, collaborators).await,
        }
    }

    /// After budget or property type: ask the other qualifier if it is
    /// missing, otherwise run a value pass.
    async fn after_qualifier(
        &self,
        lead: &Lead,
        config: &TenantConfig,
        updates: LeadPatch,
        collaborators: &Collaborators<'_>,
    ) -> Response {
        let mut projected = lead.clone();
        projected.apply(&updates);

        let response = if projected.stated_budget().is_none() {
            Response::structured(
                MessageKey::AskBudget,
                templates::ask_budget(),
                grammar::budget_buttons(),
                ConversationState::Budget,
            )
        } else if projected.property_type.is_none() {
            Response::structured(
                MessageKey::AskPropertyType,
                templates::ask_property_type(),
                grammar::property_type_buttons(),
                ConversationState::PropertyType,
            )
        } else {
            self.value_pass(&projected, config, collaborators).await
        };
        response.with_updates(updates)
    }

    /// Presents matching listings plus one knowledge insight and raises urgency.
    ///
    /// A failing property matcher is treated as "no match".
    async fn value_pass(
        &self,
        lead: &Lead,
        config: &TenantConfig,
        collaborators: &Collaborators<'_>,
    ) -> Response {
        let criteria = PropertyCriteria::for_lead(lead);
        let matches = match collaborators
            .properties
            .match_properties(&lead.tenant_id, &criteria, self.settings.property_limit)
            .await
        {
            Ok(matches) => matches,
            Err(e) => {
                warn!(lead_id = %lead.id, error = %e, "property matching failed, continuing without listings");
                Vec::new()
            }
        };

        let language = lead.language_or(&config.default_language);
        let query = lead.purpose.as_ref().map(Purpose::as_str).unwrap_or_default();
        let insight = KnowledgeRetriever::new(&config.knowledge_base).top(query, language);

        let bump = if matches.is_empty() { NO_MATCH_BUMP } else { MATCH_BUMP };

        Response::structured(
            MessageKey::ValueProposition,
            templates::value_proposition(&matches, insight.as_ref()),
            grammar::value_buttons(),
            ConversationState::ValueProposition,
        )
        .with_updates(LeadPatch {
            urgency_score: Some(lead.urgency_score.bumped(bump)),
            ..LeadPatch::default()
        })
    }

    /// Free text that does not fit the step goes to the completion fallback;
    /// unknown buttons and commands just re-prompt.
    async fn unmatched(
        &self,
        lead: &Lead,
        config: &TenantConfig,
        input: &Input,
        collaborators: &Collaborators<'_>,
    ) -> Result<Response, EngineError> {
        match input.as_text().map(str::trim).filter(|t| !t.is_empty()) {
            Some(text) => self.fallback(lead, config, text, collaborators).await,
            None => Ok(reprompt(lead.conversation_state, config)),
        }
    }

    async fn fallback(
        &self,
        lead: &Lead,
        config: &TenantConfig,
        text: &str,
        collaborators: &Collaborators<'_>,
    ) -> Result<Response, EngineError> {
        let state = lead.conversation_state;
        let language = lead.language_or(&config.default_language);
        let snippets = KnowledgeRetriever::new(&config.knowledge_base).retrieve(
            text,
            language,
            self.settings.knowledge_limit,
        );

        let request = CompletionRequest::new(RequestMetadata::new(
            lead.tenant_id,
            lead.id,
            Uuid::new_v4().to_string(),
        ))
        .with_system_prompt(templates::fallback_system_prompt(
            &config.agency_name,
            state,
            language.as_str(),
            &snippets,
        ))
        .with_message(MessageRole::User, text)
        .with_max_tokens(self.settings.max_tokens)
        .with_temperature(self.settings.temperature);

        let completion = collaborators.completion.complete(request).await?;
        let answer = completion.content.trim();
        let text = if answer.is_empty() {
            templates::reprompt(state)
        } else {
            answer.to_string()
        };

        Ok(Response::fallback(
            snippets.len(),
            text,
            buttons_for(state, config),
            state,
        ))
    }
}

fn welcome(config: &TenantConfig) -> Response {
    Response::structured(
        MessageKey::Welcome,
        templates::welcome(&config.agency_name),
        grammar::language_buttons(config),
        ConversationState::LanguageSelect,
    )
}

fn capture_contact(lead: &Lead, input: &Input) -> Response {
    let parsed = input.as_text().map(parse_contact);
    match parsed {
        Some(Ok(contact)) => {
            let (key, text, buttons, next) = match lead.purpose {
                Some(Purpose::Investment) => (
                    MessageKey::AskBudget,
                    templates::ask_budget(),
                    grammar::budget_buttons(),
                    ConversationState::Budget,
                ),
                _ => (
                    MessageKey::AskPropertyType,
                    templates::ask_property_type(),
                    grammar::property_type_buttons(),
                    ConversationState::PropertyType,
                ),
            };
            let intent = if lead.admin_alert_sent {
                Intent::Noop
            } else {
                Intent::NotifyAdmin
            };
            Response::structured(key, text, buttons, next)
                .with_updates(LeadPatch {
                    name: Some(contact.name),
                    phone: Some(contact.phone),
                    ..LeadPatch::default()
                })
                .with_intent(intent)
        }
        Some(Err(e)) => {
            debug!(lead_id = %lead.id, reason = %e, "contact rejected");
            contact_retry()
        }
        None => contact_retry(),
    }
}

fn contact_retry() -> Response {
    Response::structured(
        MessageKey::ContactInvalid,
        templates::contact_invalid(),
        Vec::new(),
        ConversationState::CaptureContact,
    )
}

fn reprompt(state: ConversationState, config: &TenantConfig) -> Response {
    Response::structured(
        MessageKey::Reprompt,
        templates::reprompt(state),
        buttons_for(state, config),
        state,
    )
}

/// Buttons the given step offers.
fn buttons_for(state: ConversationState, config: &TenantConfig) -> Vec<Button> {
    use ConversationState::*;
    match state {
        Start | LanguageSelect => grammar::language_buttons(config),
        GoalSelect => grammar::goal_buttons(),
        CaptureContact | Booked => Vec::new(),
        Budget => grammar::budget_buttons(),
        PropertyType => grammar::property_type_buttons(),
        ValueProposition => grammar::value_buttons(),
        HardGate => grammar::gate_buttons(),
        BookingSlot => grammar::slot_buttons(config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DomainError, ErrorCode, Language, TenantId, Timestamp};
    use crate::domain::lead::{GhostStage, PropertyType, TransactionType, UrgencyScore};
    use crate::domain::conversation::Outcome;
    use crate::domain::tenant::KnowledgeEntry;
    use crate::ports::{
        CompletionResponse, FinishReason, PropertySummary, ProviderInfo, TokenUsage,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct StubCompletion {
        reply: Result<String, CompletionError>,
        calls: AtomicUsize,
        last_system_prompt: Mutex<Option<String>>,
    }

    impl StubCompletion {
        fn answering(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
                last_system_prompt: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(CompletionError::unavailable("down")),
                calls: AtomicUsize::new(0),
                last_system_prompt: Mutex::new(None),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionService for StubCompletion {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_system_prompt.lock().unwrap() = request.system_prompt.clone();
            self.reply.clone().map(|content| CompletionResponse {
                content,
                usage: TokenUsage::new(10, 10),
                model: "stub".into(),
                finish_reason: FinishReason::Stop,
            })
        }

        fn provider_info(&self) -> ProviderInfo {
            ProviderInfo::new("stub", "stub")
        }
    }

    struct StubProperties {
        listings: Result<Vec<PropertySummary>, ()>,
    }

    #[async_trait]
    impl PropertyMatcher for StubProperties {
        async fn match_properties(
            &self,
            _tenant_id: &TenantId,
            criteria: &PropertyCriteria,
            limit: usize,
        ) -> Result<Vec<PropertySummary>, DomainError> {
            match &self.listings {
                Ok(listings) => Ok(listings
                    .iter()
                    .filter(|l| criteria.accepts(l))
                    .take(limit)
                    .cloned()
                    .collect()),
                Err(()) => Err(DomainError::new(ErrorCode::InternalError, "catalogue offline")),
            }
        }
    }

    fn no_properties() -> StubProperties {
        StubProperties { listings: Ok(vec![]) }
    }

    fn marina() -> PropertySummary {
        PropertySummary {
            title: "Marina View 2BR".into(),
            area: "Dubai Marina".into(),
            price: 900_000,
            property_type: PropertyType::Apartment,
            transaction_type: TransactionType::Buy,
        }
    }

    fn config() -> TenantConfig {
        TenantConfig::new("Acme Realty", Language::english())
            .with_booking_slots(vec!["Mon 10:00".into(), "Tue 15:00".into()])
            .with_knowledge(vec![
                KnowledgeEntry::new(
                    "Escrow protection",
                    "Payments are held in escrow.",
                    ["escrow", "safe", "investment"],
                    Language::english(),
                    90,
                )
                .unwrap(),
                KnowledgeEntry::new(
                    "Golden visa",
                    "Buyers above 2M qualify.",
                    ["visa"],
                    Language::english(),
                    95,
                )
                .unwrap(),
            ])
    }

    fn lead_in(state: ConversationState) -> Lead {
        let mut lead = Lead::new(TenantId::new(), "chat-1", Language::english(), Timestamp::now());
        lead.conversation_state = state;
        lead
    }

    async fn run(
        lead: &Lead,
        input: Input,
        completion: &StubCompletion,
        properties: &StubProperties,
    ) -> Result<Response, EngineError> {
        let collaborators = Collaborators {
            completion,
            properties,
        };
        ConversationEngine::default()
            .handle(lead, &config(), &input, &collaborators)
            .await
    }

    mod funnel {
        use super::*;

        #[tokio::test]
        async fn start_offers_languages() {
            let lead = lead_in(ConversationState::Start);
            let response = run(&lead, Input::text("hi"), &StubCompletion::answering(""), &no_properties())
                .await
                .unwrap();
            assert_eq!(response.next_state, ConversationState::LanguageSelect);
            assert_eq!(response.message_key(), Some(MessageKey::Welcome));
            assert_eq!(response.buttons[0].payload, "lang_en");
        }

        #[tokio::test]
        async fn language_then_goal() {
            let completion = StubCompletion::answering("");
            let lead = lead_in(ConversationState::LanguageSelect);
            let response = run(&lead, Input::button("lang_en"), &completion, &no_properties())
                .await
                .unwrap();
            assert_eq!(response.next_state, ConversationState::GoalSelect);
            assert_eq!(response.field_updates.language, Some(Language::english()));

            let lead = lead_in(ConversationState::GoalSelect);
            let response = run(&lead, Input::button("goal_invest"), &completion, &no_properties())
                .await
                .unwrap();
            assert_eq!(response.next_state, ConversationState::CaptureContact);
            assert_eq!(response.field_updates.purpose, Some(Purpose::Investment));
            assert_eq!(response.field_updates.transaction_type, Some(TransactionType::Buy));
            assert_eq!(completion.calls(), 0);
        }

        #[tokio::test]
        async fn new_budget_replaces_a_stale_lower_bound() {
            let mut lead = lead_in(ConversationState::Budget);
            lead.purpose = Some(Purpose::Investment);
            lead.budget_min = Some(3_000_000);

            let response = run(&lead, Input::button("budget_0"), &StubCompletion::answering(""), &no_properties())
                .await
                .unwrap();
            lead.apply(&response.field_updates);

            assert_eq!(lead.budget_min, None);
            assert_eq!(lead.budget_max, Some(500_000));
        }

        #[tokio::test]
        async fn budget_then_property_type_then_value() {
            let mut lead = lead_in(ConversationState::Budget);
            lead.purpose = Some(Purpose::Investment);
            let response = run(&lead, Input::text("up to 1m"), &StubCompletion::answering(""), &no_properties())
                .await
                .unwrap();
            assert_eq!(response.next_state, ConversationState::PropertyType);
            assert_eq!(response.field_updates.budget.and_then(|b| b.max), Some(1_000_000));

            lead.budget_max = Some(1_000_000);
            lead.conversation_state = ConversationState::PropertyType;
            let properties = StubProperties { listings: Ok(vec![marina()]) };
            let response = run(&lead, Input::button("ptype_apartment"), &StubCompletion::answering(""), &properties)
                .await
                .unwrap();
            assert_eq!(response.next_state, ConversationState::ValueProposition);
            assert_eq!(response.field_updates.property_type, Some(PropertyType::Apartment));
            assert!(response.text.contains("Marina View 2BR"));
            assert!(response.text.contains("Escrow protection"));
            assert_eq!(response.field_updates.urgency_score.map(|u| u.value()), Some(1));
        }

        #[tokio::test]
        async fn living_lead_asks_budget_after_property_type() {
            let mut lead = lead_in(ConversationState::PropertyType);
            lead.purpose = Some(Purpose::Living);
            let response = run(&lead, Input::text("a villa"), &StubCompletion::answering(""), &no_properties())
                .await
                .unwrap();
            assert_eq!(response.next_state, ConversationState::Budget);
        }

        #[tokio::test]
        async fn gate_and_booking() {
            let lead = lead_in(ConversationState::ValueProposition);
            let response = run(&lead, Input::button("vp_interested"), &StubCompletion::answering(""), &no_properties())
                .await
                .unwrap();
            assert_eq!(response.next_state, ConversationState::HardGate);

            let lead = lead_in(ConversationState::HardGate);
            let later = run(&lead, Input::button("gate_later"), &StubCompletion::answering(""), &no_properties())
                .await
                .unwrap();
            assert_eq!(later.next_state, ConversationState::HardGate);
            assert_eq!(later.message_key(), Some(MessageKey::GateDeferred));

            let book = run(&lead, Input::button("gate_book"), &StubCompletion::answering(""), &no_properties())
                .await
                .unwrap();
            assert_eq!(book.next_state, ConversationState::BookingSlot);
            assert_eq!(book.buttons.len(), 2);

            let lead = lead_in(ConversationState::BookingSlot);
            let booked = run(&lead, Input::button("slot_1"), &StubCompletion::answering(""), &no_properties())
                .await
                .unwrap();
            assert_eq!(booked.next_state, ConversationState::Booked);
            assert_eq!(booked.field_updates.booking_slot.as_deref(), Some("Tue 15:00"));
        }

        #[tokio::test]
        async fn start_command_restarts_live_conversation() {
            let lead = lead_in(ConversationState::HardGate);
            let response = run(&lead, Input::command("/start"), &StubCompletion::answering(""), &no_properties())
                .await
                .unwrap();
            assert_eq!(response.next_state, ConversationState::LanguageSelect);
        }

        #[tokio::test]
        async fn start_command_does_not_reopen_booked_lead() {
            let lead = lead_in(ConversationState::Booked);
            let response = run(&lead, Input::command("/start"), &StubCompletion::answering(""), &no_properties())
                .await
                .unwrap();
            assert_eq!(response.next_state, ConversationState::Booked);
        }
    }

    mod capture {
        use super::*;

        #[tokio::test]
        async fn valid_contact_for_investor_goes_to_budget_and_alerts() {
            let mut lead = lead_in(ConversationState::CaptureContact);
            lead.purpose = Some(Purpose::Investment);
            let response = run(
                &lead,
                Input::text("John Doe - +971501234567"),
                &StubCompletion::answering(""),
                &no_properties(),
            )
            .await
            .unwrap();

            assert_eq!(response.next_state, ConversationState::Budget);
            assert_eq!(response.field_updates.name.as_deref(), Some("John Doe"));
            assert_eq!(response.field_updates.phone.as_deref(), Some("+971501234567"));
            assert!(response.requests_admin_alert());
        }

        #[tokio::test]
        async fn valid_contact_for_living_goes_to_property_type() {
            let mut lead = lead_in(ConversationState::CaptureContact);
            lead.purpose = Some(Purpose::Living);
            let response = run(&lead, Input::text("Anna / +4915112345678"), &StubCompletion::answering(""), &no_properties())
                .await
                .unwrap();
            assert_eq!(response.next_state, ConversationState::PropertyType);
        }

        #[tokio::test]
        async fn already_alerted_lead_gets_no_second_alert() {
            let mut lead = lead_in(ConversationState::CaptureContact);
            lead.admin_alert_sent = true;
            let response = run(&lead, Input::text("John Doe - +971501234567"), &StubCompletion::answering(""), &no_properties())
                .await
                .unwrap();
            assert!(!response.requests_admin_alert());
        }

        #[tokio::test]
        async fn invalid_contact_reprompts_without_fallback() {
            let completion = StubCompletion::answering("should not be used");
            let lead = lead_in(ConversationState::CaptureContact);
            let response = run(&lead, Input::text("just text no dash"), &completion, &no_properties())
                .await
                .unwrap();

            assert_eq!(response.next_state, ConversationState::CaptureContact);
            assert!(response.field_updates.is_empty());
            assert!(response.text.contains("John Doe - +971501234567"));
            assert!(!response.requests_admin_alert());
            assert_eq!(completion.calls(), 0);
        }
    }

    mod value_pass {
        use super::*;

        #[tokio::test]
        async fn no_match_adds_two_and_caps_at_ten() {
            let mut lead = lead_in(ConversationState::ValueProposition);
            lead.purpose = Some(Purpose::Investment);
            lead.urgency_score = UrgencyScore::new(9).unwrap();
            let response = run(&lead, Input::button("vp_more"), &StubCompletion::answering(""), &no_properties())
                .await
                .unwrap();
            assert_eq!(response.next_state, ConversationState::ValueProposition);
            assert_eq!(response.field_updates.urgency_score.map(|u| u.value()), Some(10));
        }

        #[tokio::test]
        async fn repeated_passes_never_exceed_ten() {
            let mut lead = lead_in(ConversationState::ValueProposition);
            for _ in 0..8 {
                let response = run(&lead, Input::button("vp_more"), &StubCompletion::answering(""), &no_properties())
                    .await
                    .unwrap();
                lead.apply(&response.field_updates);
                assert!(lead.urgency_score.value() <= UrgencyScore::MAX);
            }
            assert_eq!(lead.urgency_score.value(), UrgencyScore::MAX);
        }

        #[tokio::test]
        async fn matcher_failure_counts_as_no_match() {
            let lead = lead_in(ConversationState::ValueProposition);
            let properties = StubProperties { listings: Err(()) };
            let response = run(&lead, Input::button("vp_more"), &StubCompletion::answering(""), &properties)
                .await
                .unwrap();
            assert_eq!(response.field_updates.urgency_score.map(|u| u.value()), Some(2));
        }
    }

    mod fallback {
        use super::*;

        #[tokio::test]
        async fn free_text_off_grammar_uses_completion_and_keeps_state() {
            let completion = StubCompletion::answering("Yes, payments are protected.");
            let lead = lead_in(ConversationState::Budget);
            let response = run(&lead, Input::text("is my money safe?"), &completion, &no_properties())
                .await
                .unwrap();

            assert_eq!(response.outcome, Outcome::Fallback { knowledge_hits: 1 });
            assert_eq!(response.next_state, ConversationState::Budget);
            assert_eq!(response.text, "Yes, payments are protected.");
            assert_eq!(response.buttons.len(), 4);
            assert!(response.field_updates.is_empty());
            let prompt = completion.last_system_prompt.lock().unwrap().clone().unwrap();
            assert!(prompt.contains("Escrow protection"));
        }

        #[tokio::test]
        async fn unknown_button_reprompts_without_completion() {
            let completion = StubCompletion::answering("unused");
            let lead = lead_in(ConversationState::GoalSelect);
            let response = run(&lead, Input::button("lang_en"), &completion, &no_properties())
                .await
                .unwrap();
            assert_eq!(response.message_key(), Some(MessageKey::Reprompt));
            assert_eq!(response.next_state, ConversationState::GoalSelect);
            assert_eq!(completion.calls(), 0);
        }

        #[tokio::test]
        async fn booked_lead_questions_are_answered() {
            let lead = lead_in(ConversationState::Booked);
            let response = run(&lead, Input::text("where is the office?"), &StubCompletion::answering("Downtown."), &no_properties())
                .await
                .unwrap();
            assert!(response.is_fallback());
            assert_eq!(response.next_state, ConversationState::Booked);
        }

        #[tokio::test]
        async fn completion_failure_is_fatal() {
            let lead = lead_in(ConversationState::Budget);
            let err = run(&lead, Input::text("tell me about the area"), &StubCompletion::failing(), &no_properties())
                .await
                .unwrap_err();
            assert!(matches!(err, EngineError::Completion(_)));
        }
    }

    #[tokio::test]
    async fn engine_never_touches_scheduler_or_alert_fields() {
        let mut lead = lead_in(ConversationState::CaptureContact);
        lead.ghost_stage = GhostStage::FastSent;
        let response = run(&lead, Input::text("John Doe - +971501234567"), &StubCompletion::answering(""), &no_properties())
            .await
            .unwrap();
        assert!(response.field_updates.ghost_stage.is_none());
        assert!(response.field_updates.admin_alert_sent.is_none());
    }
}

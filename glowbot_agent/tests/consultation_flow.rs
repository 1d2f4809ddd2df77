//! End-to-end orchestrator tests against scripted collaborators.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;

use glowbot_agent::{AgentConfig, ConsultationAgent, retrieve};
use glowbot_core::prompts::{GENERIC_APOLOGY, NO_INFORMATION_PREFIX, SEARCH_ERROR_TEXT, SUMMARY_PREFIX};
use glowbot_core::{
    ChatModel, DocumentIndex, PromptMessage, ScoredDocument, SessionState, SessionStore,
    ToolInvocation, ToolSpec, Turn,
};
use glowbot_knowledge::InMemorySessionStore;

/// Pops scripted replies in order; `Err` entries become provider errors.
#[derive(Default)]
struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, String>>>,
    tool_calls: Mutex<VecDeque<Result<ToolInvocation, String>>>,
    invokes: AtomicUsize,
    forced_invokes: AtomicUsize,
}

impl ScriptedModel {
    fn new() -> Self {
        Self::default()
    }

    fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    fn reply_err(self, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    fn tool_call(self, query: &str) -> Self {
        self.tool_calls.lock().unwrap().push_back(Ok(ToolInvocation {
            tool: "rag_search".to_string(),
            arguments: json!({"user_query": query}),
        }));
        self
    }

    fn invoke_count(&self) -> usize {
        self.invokes.load(Ordering::SeqCst)
    }

    fn forced_count(&self) -> usize {
        self.forced_invokes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn invoke(&self, _messages: &[PromptMessage]) -> anyhow::Result<String> {
        self.invokes.fetch_add(1, Ordering::SeqCst);
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Err(anyhow::anyhow!("script exhausted")),
        }
    }

    async fn invoke_with_forced_tool(
        &self,
        _messages: &[PromptMessage],
        _tool: &ToolSpec,
    ) -> anyhow::Result<ToolInvocation> {
        self.forced_invokes.fetch_add(1, Ordering::SeqCst);
        match self.tool_calls.lock().unwrap().pop_front() {
            Some(Ok(invocation)) => Ok(invocation),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Err(anyhow::anyhow!("tool script exhausted")),
        }
    }
}

/// Returns canned passages per query; records every query it sees.
#[derive(Default)]
struct MapIndex {
    docs: HashMap<String, Vec<ScoredDocument>>,
    queries: Mutex<Vec<String>>,
}

impl MapIndex {
    fn with_doc(mut self, query: &str, source: &str, content: &str) -> Self {
        self.docs.entry(query.to_string()).or_default().push(ScoredDocument {
            content: content.to_string(),
            source: source.to_string(),
            score: 0.9,
        });
        self
    }

    fn seen_queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentIndex for MapIndex {
    async fn search(&self, query: &str, _top_k: usize) -> anyhow::Result<Vec<ScoredDocument>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.docs.get(query).cloned().unwrap_or_default())
    }
}

struct FailingIndex;

#[async_trait]
impl DocumentIndex for FailingIndex {
    async fn search(&self, _query: &str, _top_k: usize) -> anyhow::Result<Vec<ScoredDocument>> {
        anyhow::bail!("vector backend unreachable")
    }
}

fn build_agent(
    model: Arc<ScriptedModel>,
    index: Arc<dyn DocumentIndex>,
    store: Arc<dyn SessionStore>,
) -> ConsultationAgent {
    ConsultationAgent::new(model, index, store, AgentConfig::default())
}

/// Store seeded with a session whose profile is already captured.
async fn store_with_known_profile(session_id: &str) -> Arc<InMemorySessionStore> {
    let store = Arc::new(InMemorySessionStore::new());
    let mut state = SessionState::new(session_id);
    state.caller_name = Some("Анна".to_string());
    state.caller_gender = Some("женский".to_string());
    store.save(&state).await.unwrap();
    store
}

#[tokio::test]
async fn first_contact_extracts_profile_and_ends_the_turn() {
    let model = Arc::new(ScriptedModel::new().reply(
        "{\"response\": \"Здравствуйте, Анна! Очень приятно.\", \"client_name\": \"Анна\", \"gender\": null}",
    ));
    let store = Arc::new(InMemorySessionStore::new());
    let agent = build_agent(model.clone(), Arc::new(MapIndex::default()), store.clone());

    let state = agent.handle_message("telegram:7", "Здравствуйте, я Анна").await;

    assert_eq!(state.caller_name.as_deref(), Some("Анна"));
    assert!(state.caller_gender.is_none());
    assert_eq!(state.history.len(), 2);
    assert!(state.history[1].is_assistant());
    // Neither the classifier nor the composer ran.
    assert_eq!(model.invoke_count(), 1);
    assert_eq!(model.forced_count(), 0);
    // The turn was persisted.
    assert!(store.load("telegram:7").await.unwrap().is_some());
}

#[tokio::test]
async fn clarifying_question_is_a_leaf_even_with_full_profile() {
    let model = Arc::new(ScriptedModel::new().reply(
        "{\"response\": \"Спасибо, Анна! А теперь расскажите, какая процедура вас интересует?\", \
         \"client_name\": \"Анна\", \"gender\": \"женский\"}",
    ));
    let agent = build_agent(
        model.clone(),
        Arc::new(MapIndex::default()),
        Arc::new(InMemorySessionStore::new()),
    );

    let state = agent.handle_message("telegram:7", "Я Анна").await;

    assert!(state.profile_complete());
    assert_eq!(model.invoke_count(), 1);
    assert_eq!(model.forced_count(), 0);
    assert_eq!(state.history.len(), 2);
}

#[tokio::test]
async fn unparsable_extraction_leaves_profile_unset() {
    let model = Arc::new(ScriptedModel::new().reply("Просто текст без какого-либо объекта"));
    let agent = build_agent(
        model.clone(),
        Arc::new(MapIndex::default()),
        Arc::new(InMemorySessionStore::new()),
    );

    let state = agent.handle_message("telegram:7", "привет").await;

    assert!(state.caller_name.is_none());
    assert!(state.caller_gender.is_none());
    // No reply this turn; the next user message retries extraction.
    assert_eq!(state.history.len(), 1);
    assert_eq!(model.invoke_count(), 1);
}

#[tokio::test]
async fn identify_failure_yields_apology_turn() {
    let model = Arc::new(ScriptedModel::new().reply_err("connect timeout"));
    let agent = build_agent(
        model.clone(),
        Arc::new(MapIndex::default()),
        Arc::new(InMemorySessionStore::new()),
    );

    let state = agent.handle_message("telegram:7", "привет").await;

    assert_eq!(state.last_assistant_text(), Some(GENERIC_APOLOGY));
    assert_eq!(model.invoke_count(), 1);
}

#[tokio::test]
async fn known_profile_runs_the_full_retrieval_loop() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply("YES")
            .tool_call("чистка лица")
            .reply(
                "Чистка лица занимает час и стоит 3500 рублей.\n\
                 query_classification_variables is_client_question_irrelevant_to_context=0 does_client_asks_human_support=0",
            ),
    );
    let index = Arc::new(MapIndex::default().with_doc(
        "чистка лица",
        "face.md",
        "Чистка лица: 60 минут, 3500 руб.",
    ));
    let store = store_with_known_profile("telegram:9").await;
    let agent = build_agent(model.clone(), index, store.clone());

    let state = agent.handle_message("telegram:9", "Расскажите про чистку лица").await;

    // user + tool invocation + tool result + final answer.
    assert_eq!(state.history.len(), 4);
    assert!(state.needs_retrieval);
    assert!(state.history[1].is_tool_invocation());
    assert!(matches!(
        &state.history[2],
        Turn::ToolResult { content } if content.contains("[Source: face.md]")
    ));
    assert_eq!(
        state.last_assistant_text(),
        Some("Чистка лица занимает час и стоит 3500 рублей.")
    );
    assert_eq!(model.invoke_count(), 2);
    assert_eq!(model.forced_count(), 1);

    // Persisted state matches the returned one.
    let saved = store.load("telegram:9").await.unwrap().unwrap();
    assert_eq!(saved.history, state.history);
}

#[tokio::test]
async fn no_retrieval_path_skips_the_tool_entirely() {
    let model = Arc::new(ScriptedModel::new().reply("NO").reply("Всегда рады помочь!"));
    let store = store_with_known_profile("telegram:9").await;
    let agent = build_agent(model.clone(), Arc::new(MapIndex::default()), store);

    let state = agent.handle_message("telegram:9", "Спасибо!").await;

    assert!(!state.needs_retrieval);
    assert_eq!(model.forced_count(), 0);
    assert_eq!(state.history.len(), 2);
    assert!(!state.history.iter().any(Turn::is_tool_invocation));
    assert_eq!(state.last_assistant_text(), Some("Всегда рады помочь!"));
}

#[tokio::test]
async fn classifier_failure_defaults_to_retrieval() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply_err("upstream 500")
            .tool_call("массаж")
            .reply("Ответ по массажу."),
    );
    let store = store_with_known_profile("telegram:9").await;
    let agent = build_agent(model.clone(), Arc::new(MapIndex::default()), store);

    let state = agent.handle_message("telegram:9", "Про массаж").await;

    assert!(state.needs_retrieval);
    assert_eq!(model.forced_count(), 1);
    // Empty index: the tool result is the no-information marker.
    assert!(matches!(
        &state.history[2],
        Turn::ToolResult { content } if content.starts_with(NO_INFORMATION_PREFIX)
    ));
    assert_eq!(state.last_assistant_text(), Some("Ответ по массажу."));
}

#[tokio::test]
async fn retrieval_backend_error_becomes_the_fallback_string() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply("YES")
            .tool_call("пилинг")
            .reply("Ответ несмотря на сбой поиска."),
    );
    let store = store_with_known_profile("telegram:9").await;
    let agent = build_agent(model.clone(), Arc::new(FailingIndex), store);

    let state = agent.handle_message("telegram:9", "Про пилинг").await;

    assert!(matches!(
        &state.history[2],
        Turn::ToolResult { content } if content == SEARCH_ERROR_TEXT
    ));
    // The turn still completes with a reply.
    assert_eq!(
        state.last_assistant_text(),
        Some("Ответ несмотря на сбой поиска.")
    );
}

#[tokio::test]
async fn operator_handoff_marker_sets_the_flag_and_is_stripped() {
    let model = Arc::new(ScriptedModel::new().reply("NO").reply(
        "Сейчас позову администратора.\n\
         query_classification_variables is_client_question_irrelevant_to_context=0 does_client_asks_human_support=1",
    ));
    let store = store_with_known_profile("telegram:9").await;
    let agent = build_agent(model, Arc::new(MapIndex::default()), store);

    let state = agent.handle_message("telegram:9", "Позовите человека").await;

    assert!(state.flags.wants_operator);
    assert!(!state.flags.irrelevant);
    assert_eq!(
        state.last_assistant_text(),
        Some("Сейчас позову администратора.")
    );
}

#[tokio::test]
async fn lifecycle_reset_replaces_history_with_summary_seed() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply("NO")
            .reply("Десятый ответ")
            .reply("Предыдущий диалог:\nКлиент обсуждал уход за кожей и записался на чистку."),
    );
    let store = Arc::new(InMemorySessionStore::new());
    let mut state = SessionState::new("telegram:10");
    state.caller_name = Some("Анна".to_string());
    state.caller_gender = Some("женский".to_string());
    for i in 0..9 {
        state.push(Turn::user(format!("вопрос {i}")));
        state.push(Turn::assistant(format!("ответ {i}")));
    }
    store.save(&state).await.unwrap();

    let agent = build_agent(model, Arc::new(MapIndex::default()), store.clone());
    let state = agent.handle_message("telegram:10", "десятый вопрос").await;

    assert_eq!(state.history.len(), 2);
    assert!(state.history[0].is_summary_seed());
    assert_eq!(state.last_assistant_text(), Some("Десятый ответ"));
    assert_eq!(state.caller_name.as_deref(), Some("Анна"));
    assert_eq!(state.caller_gender.as_deref(), Some("женский"));
    assert!(state.needs_retrieval);

    let saved = store.load("telegram:10").await.unwrap().unwrap();
    assert_eq!(saved.history.len(), 2);
}

#[tokio::test]
async fn summary_prefix_is_added_when_the_model_forgets_it() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply("NO")
            .reply("Десятый ответ")
            .reply("Клиент спрашивал про маникюр."),
    );
    let store = Arc::new(InMemorySessionStore::new());
    let mut state = SessionState::new("telegram:11");
    state.caller_name = Some("Анна".to_string());
    state.caller_gender = Some("женский".to_string());
    for i in 0..9 {
        state.push(Turn::user(format!("вопрос {i}")));
        state.push(Turn::assistant(format!("ответ {i}")));
    }
    store.save(&state).await.unwrap();

    let agent = build_agent(model, Arc::new(MapIndex::default()), store);
    let state = agent.handle_message("telegram:11", "десятый вопрос").await;

    assert!(state.history[0].is_summary_seed());
    assert!(matches!(
        &state.history[0],
        Turn::User { content } if content.starts_with(SUMMARY_PREFIX)
    ));
}

#[tokio::test]
async fn transition_cap_aborts_runaway_turns_with_an_apology() {
    let model = Arc::new(ScriptedModel::new().reply("YES"));
    let store = store_with_known_profile("telegram:12").await;
    let agent = ConsultationAgent::new(
        model,
        Arc::new(MapIndex::default()),
        store,
        AgentConfig {
            max_transitions: 2,
            ..AgentConfig::default()
        },
    );

    let state = agent.handle_message("telegram:12", "вопрос").await;

    assert_eq!(state.last_assistant_text(), Some(GENERIC_APOLOGY));
}

#[tokio::test]
async fn run_search_fans_out_over_subqueries() {
    let index = MapIndex::default().with_doc("маникюр", "price.md", "Маникюр: 1500 руб.");

    let result = retrieve::run_search(&index, "маникюр; педикюр; ", 5).await;

    assert_eq!(index.seen_queries(), vec!["маникюр", "педикюр"]);
    let blocks: Vec<&str> = result.split("\n\n").collect();
    assert_eq!(blocks.len(), 2);
    assert!(blocks[0].starts_with("[Source: price.md]"));
    assert_eq!(blocks[1], format!("{NO_INFORMATION_PREFIX} педикюр"));
}

#[tokio::test]
async fn run_search_error_is_the_literal_fallback() {
    let result = retrieve::run_search(&FailingIndex, "что угодно", 5).await;
    assert_eq!(result, SEARCH_ERROR_TEXT);
}

#[tokio::test]
async fn history_only_shrinks_at_lifecycle_reset() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply("NO")
            .reply("Первый ответ")
            .reply("NO")
            .reply("Второй ответ"),
    );
    let store = store_with_known_profile("telegram:13").await;
    let agent = build_agent(model, Arc::new(MapIndex::default()), store);

    let first = agent.handle_message("telegram:13", "раз").await;
    let after_first = first.history.len();
    let second = agent.handle_message("telegram:13", "два").await;

    assert!(second.history.len() > after_first);
}

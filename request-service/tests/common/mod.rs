//! In-process collaborators for driving the orchestrator in tests.

#![allow(dead_code)]

use async_trait::async_trait;
use request_service::{MemoryRequestStore, RequestService, RequestStore};
use shared::{
    AssistanceRequest, BillingClient, ChatClient, ChatMessage, Error, ExpertRating,
    NewAssistanceRequest, NewExpertRating, Result, Summarizer,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Ordered record of every collaborator call, shared by all fakes.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

pub struct FakeBilling {
    balances: Mutex<HashMap<Uuid, i32>>,
    pub unreachable: AtomicBool,
    log: CallLog,
}

impl FakeBilling {
    pub fn new(log: CallLog) -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
            unreachable: AtomicBool::new(false),
            log,
        }
    }

    pub fn set_balance(&self, user_id: Uuid, balance: i32) {
        self.balances.lock().unwrap().insert(user_id, balance);
    }

    pub fn balance(&self, user_id: Uuid) -> Option<i32> {
        self.balances.lock().unwrap().get(&user_id).copied()
    }
}

#[async_trait]
impl BillingClient for FakeBilling {
    async fn debit_token(&self, user_id: Uuid) -> Result<i32> {
        self.log.push("debit");
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(Error::Upstream {
                service: "billing",
                status: 503,
            });
        }
        let mut balances = self.balances.lock().unwrap();
        match balances.get_mut(&user_id) {
            Some(balance) if *balance > 0 => {
                *balance -= 1;
                Ok(*balance)
            }
            _ => Err(Error::InsufficientFunds),
        }
    }

    async fn credit_tokens(&self, user_id: Uuid, amount: i32) -> Result<i32> {
        self.log.push("credit");
        let mut balances = self.balances.lock().unwrap();
        let balance = balances
            .get_mut(&user_id)
            .ok_or_else(|| Error::NotFound(format!("user {}", user_id)))?;
        *balance += amount;
        Ok(*balance)
    }
}

pub struct FakeSummarizer {
    pub fail: AtomicBool,
    log: CallLog,
}

impl FakeSummarizer {
    pub fn new(log: CallLog) -> Self {
        Self {
            fail: AtomicBool::new(false),
            log,
        }
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(&self, chat_session_id: &str) -> Result<String> {
        self.log.push("summarize");
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Upstream {
                service: "llm",
                status: 500,
            });
        }
        Ok(format!("Summary of {}", chat_session_id))
    }
}

pub struct FakeChat {
    pub fail_add: AtomicBool,
    pub fail_remove: AtomicBool,
    participants: Mutex<HashMap<String, Vec<String>>>,
    log: CallLog,
}

impl FakeChat {
    pub fn new(log: CallLog) -> Self {
        Self {
            fail_add: AtomicBool::new(false),
            fail_remove: AtomicBool::new(false),
            participants: Mutex::new(HashMap::new()),
            log,
        }
    }

    pub fn participants(&self, chat_session_id: &str) -> Vec<String> {
        self.participants
            .lock()
            .unwrap()
            .get(chat_session_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatClient for FakeChat {
    async fn add_participant(&self, chat_session_id: &str, identity: &str) -> Result<()> {
        self.log.push(format!("add:{}", identity));
        if self.fail_add.load(Ordering::SeqCst) {
            return Err(Error::Upstream {
                service: "chat",
                status: 502,
            });
        }
        self.participants
            .lock()
            .unwrap()
            .entry(chat_session_id.to_string())
            .or_default()
            .push(identity.to_string());
        Ok(())
    }

    async fn remove_participant(&self, chat_session_id: &str, identity: &str) -> Result<()> {
        self.log.push(format!("remove:{}", identity));
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(Error::Upstream {
                service: "chat",
                status: 502,
            });
        }
        if let Some(members) = self.participants.lock().unwrap().get_mut(chat_session_id) {
            members.retain(|m| m != identity);
        }
        Ok(())
    }

    async fn history(&self, _chat_session_id: &str) -> Result<Vec<ChatMessage>> {
        Ok(Vec::new())
    }
}

/// Memory store whose inserts can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryRequestStore,
    pub fail_insert: AtomicBool,
}

#[async_trait]
impl RequestStore for FlakyStore {
    async fn insert_request(&self, new: NewAssistanceRequest) -> Result<AssistanceRequest> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(Error::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.insert_request(new).await
    }

    async fn get_request(&self, request_id: Uuid) -> Result<AssistanceRequest> {
        self.inner.get_request(request_id).await
    }

    async fn pending_requests(&self) -> Result<Vec<AssistanceRequest>> {
        self.inner.pending_requests().await
    }

    async fn mark_active(&self, request_id: Uuid, expert_id: Uuid) -> Result<bool> {
        self.inner.mark_active(request_id, expert_id).await
    }

    async fn mark_resolved(&self, request_id: Uuid, expert_id: Uuid) -> Result<bool> {
        self.inner.mark_resolved(request_id, expert_id).await
    }

    async fn release(&self, request_id: Uuid, expert_id: Uuid) -> Result<bool> {
        self.inner.release(request_id, expert_id).await
    }

    async fn insert_rating(&self, new: NewExpertRating) -> Result<ExpertRating> {
        self.inner.insert_rating(new).await
    }

    async fn rating_for_request(&self, request_id: Uuid) -> Result<Option<ExpertRating>> {
        self.inner.rating_for_request(request_id).await
    }
}

/// The orchestrator wired to an in-memory store and fakes, plus handles on each.
pub struct Harness {
    pub store: Arc<FlakyStore>,
    pub billing: Arc<FakeBilling>,
    pub summarizer: Arc<FakeSummarizer>,
    pub chat: Arc<FakeChat>,
    pub log: CallLog,
}

impl Harness {
    pub fn new() -> Self {
        let log = CallLog::default();
        Self {
            store: Arc::new(FlakyStore::default()),
            billing: Arc::new(FakeBilling::new(log.clone())),
            summarizer: Arc::new(FakeSummarizer::new(log.clone())),
            chat: Arc::new(FakeChat::new(log.clone())),
            log,
        }
    }

    pub fn service(&self) -> RequestService {
        RequestService::new(
            self.store.clone(),
            self.billing.clone(),
            self.summarizer.clone(),
            self.chat.clone(),
        )
    }
}

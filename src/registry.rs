//! Client registry
//!
//! Maps screen names to outbound channels. The registry itself is a
//! plain value with no interior locking; it is owned by the `ChatServer`
//! actor and every read or mutation goes through that actor's command
//! queue, which is what makes `try_register` atomic.

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::client::Client;
use crate::message::ServerMessage;
use crate::types::ClientId;

#[derive(Debug)]
struct Entry {
    /// Join sequence number, used to order snapshots
    seq: u64,
    client: Client,
}

/// Name → channel store with unique names
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<String, Entry>,
    next_seq: u64,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `name` if no entry holds it yet
    ///
    /// Returns false without mutating anything when the name is taken or
    /// empty.
    pub fn try_register(
        &mut self,
        id: ClientId,
        name: &str,
        sender: mpsc::Sender<ServerMessage>,
    ) -> bool {
        if name.is_empty() || self.entries.contains_key(name) {
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            name.to_string(),
            Entry {
                seq,
                client: Client::new(id, name.to_string(), sender),
            },
        );
        true
    }

    /// Remove the entry for `name`; no-op if absent
    pub fn remove(&mut self, name: &str) -> Option<Client> {
        self.entries.remove(name).map(|e| e.client)
    }

    /// Remove the entry for `name` only if connection `id` owns it
    pub fn remove_owned(&mut self, id: ClientId, name: &str) -> Option<Client> {
        match self.entries.get(name) {
            Some(entry) if entry.client.id == id => self.remove(name),
            _ => None,
        }
    }

    /// Channel registered under `name`
    pub fn lookup(&self, name: &str) -> Option<&Client> {
        self.entries.get(name).map(|e| &e.client)
    }

    /// All entries in join order
    pub fn snapshot(&self) -> Vec<Client> {
        let mut entries: Vec<&Entry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries.into_iter().map(|e| e.client.clone()).collect()
    }

    /// Registered names in join order
    pub fn names(&self) -> Vec<String> {
        self.snapshot().into_iter().map(|c| c.name).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

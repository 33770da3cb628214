//! Status registers, error queues and the error fan-out

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::component::Response;

/// Error key raised when a query matches nothing or a setter value is rejected
pub const COMMAND_ERROR: &str = "command_error";
/// Error key for query errors
pub const QUERY_ERROR: &str = "query_error";

/// Bitmask accumulator of error flags; reading it clears it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusRegister {
    value: i64,
    bits: HashMap<String, i64>,
}

impl StatusRegister {
    /// Create a register from (error key, bit value) pairs
    pub fn new<K: Into<String>>(bits: impl IntoIterator<Item = (K, i64)>) -> Self {
        Self {
            value: 0,
            bits: bits.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.bits.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.bits.keys().map(String::as_str)
    }

    /// OR in the bit mapped to `key`; unknown keys are ignored
    pub fn set(&mut self, key: &str) {
        if let Some(bit) = self.bits.get(key) {
            self.value |= bit;
        }
    }

    /// Current value without clearing
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Read the value and clear the register
    pub fn take_value(&mut self) -> i64 {
        std::mem::take(&mut self.value)
    }

    pub fn clear(&mut self) {
        self.value = 0;
    }
}

/// FIFO of pending error messages with a default when empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorQueue {
    queue: VecDeque<Vec<u8>>,
    messages: HashMap<String, Vec<u8>>,
    default: Vec<u8>,
}

impl ErrorQueue {
    /// Create a queue from (error key, message) pairs and the empty-queue message
    pub fn new<K: Into<String>>(
        messages: impl IntoIterator<Item = (K, Vec<u8>)>,
        default: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            queue: VecDeque::new(),
            messages: messages.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            default: default.into(),
        }
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.messages.contains_key(key)
    }

    /// Queue the message for `key`; unknown keys are ignored
    pub fn append(&mut self, key: &str) {
        if let Some(message) = self.messages.get(key) {
            self.queue.push_back(message.clone());
        }
    }

    /// Pop the oldest message, or return the default without consuming anything
    pub fn pop_value(&mut self) -> Vec<u8> {
        self.queue.pop_front().unwrap_or_else(|| self.default.clone())
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

/// Error responses of a device and the registers/queues they feed
#[derive(Debug, Clone, Default)]
pub struct ErrorHandler {
    responses: HashMap<String, Response>,
    registers: HashMap<Vec<u8>, StatusRegister>,
    queues: HashMap<Vec<u8>, ErrorQueue>,
}

impl ErrorHandler {
    /// Same text for command and query errors
    pub fn plain(response: Response) -> Self {
        let mut handler = Self::default();
        handler.responses.insert(COMMAND_ERROR.to_string(), response.clone());
        handler.responses.insert(QUERY_ERROR.to_string(), response);
        handler
    }

    /// Separate command/query error responses; absent ones send nothing
    pub fn with_responses(command_error: Option<Response>, query_error: Option<Response>) -> Self {
        let mut handler = Self::default();
        handler.responses.insert(
            COMMAND_ERROR.to_string(),
            command_error.unwrap_or(Response::NoResponse),
        );
        handler.responses.insert(
            QUERY_ERROR.to_string(),
            query_error.unwrap_or(Response::NoResponse),
        );
        handler
    }

    pub fn add_register(&mut self, query: impl Into<Vec<u8>>, register: StatusRegister) {
        self.registers.insert(query.into(), register);
    }

    pub fn add_queue(&mut self, query: impl Into<Vec<u8>>, queue: ErrorQueue) {
        self.queues.insert(query.into(), queue);
    }

    pub fn register(&self, query: &[u8]) -> Option<&StatusRegister> {
        self.registers.get(query)
    }

    pub fn queue(&self, query: &[u8]) -> Option<&ErrorQueue> {
        self.queues.get(query)
    }

    /// Raise `key`: flag it in every register and queue that knows it, then
    /// return the configured response text, if any
    pub fn error_response(&mut self, key: &str) -> Option<Response> {
        for register in self.registers.values_mut() {
            register.set(key);
        }
        for queue in self.queues.values_mut() {
            queue.append(key);
        }
        debug!(key, "raised device error");
        self.responses.get(key).cloned()
    }

    /// Read-and-clear the register bound to `query`
    pub fn match_register(&mut self, query: &[u8]) -> Option<Response> {
        let register = self.registers.get_mut(query)?;
        let value = register.take_value();
        debug!(value, "found response in status register");
        Some(Response::Data(value.to_string().into_bytes()))
    }

    /// Pop the queue bound to `query`
    pub fn match_queue(&mut self, query: &[u8]) -> Option<Response> {
        let queue = self.queues.get_mut(query)?;
        let message = queue.pop_value();
        debug!(message = %String::from_utf8_lossy(&message), "found response in error queue");
        Some(Response::Data(message))
    }
}

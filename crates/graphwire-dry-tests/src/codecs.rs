// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! [`RecordCodec`] doubles: one that counts calls, one that fails on a chosen call.

use std::cell::Cell;

use graphwire_core::{CborCodec, RecordCodec, RecordError};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Canonical CBOR codec that counts encode and decode calls.
///
/// Pass it by reference (`&codec`) so the counters stay readable after the session ends.
#[derive(Debug, Default)]
pub struct CountingCodec {
    encodes: Cell<usize>,
    decodes: Cell<usize>,
}

impl CountingCodec {
    /// Fresh counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records encoded so far.
    pub fn encodes(&self) -> usize {
        self.encodes.get()
    }

    /// Records decoded so far.
    pub fn decodes(&self) -> usize {
        self.decodes.get()
    }
}

impl RecordCodec for CountingCodec {
    fn name(&self) -> &'static str {
        "counting-cbor"
    }

    fn encode_record<R: Serialize>(&self, record: &R) -> Result<Vec<u8>, RecordError> {
        self.encodes.set(self.encodes.get() + 1);
        CborCodec.encode_record(record)
    }

    fn decode_record<R: DeserializeOwned>(&self, bytes: &[u8]) -> Result<R, RecordError> {
        self.decodes.set(self.decodes.get() + 1);
        CborCodec.decode_record(bytes)
    }
}

/// Canonical CBOR codec that fails the `n`th encode or decode (zero-based).
#[derive(Debug)]
pub struct FailingCodec {
    fail_encode_at: Option<usize>,
    fail_decode_at: Option<usize>,
    encodes: Cell<usize>,
    decodes: Cell<usize>,
}

impl FailingCodec {
    /// Fail the `n`th encode call.
    pub fn on_encode(n: usize) -> Self {
        Self {
            fail_encode_at: Some(n),
            fail_decode_at: None,
            encodes: Cell::new(0),
            decodes: Cell::new(0),
        }
    }

    /// Fail the `n`th decode call.
    pub fn on_decode(n: usize) -> Self {
        Self {
            fail_encode_at: None,
            fail_decode_at: Some(n),
            encodes: Cell::new(0),
            decodes: Cell::new(0),
        }
    }
}

impl RecordCodec for FailingCodec {
    fn name(&self) -> &'static str {
        "failing-cbor"
    }

    fn encode_record<R: Serialize>(&self, record: &R) -> Result<Vec<u8>, RecordError> {
        let call = self.encodes.get();
        self.encodes.set(call + 1);
        if self.fail_encode_at == Some(call) {
            return Err(RecordError::Other(format!("injected encode failure #{call}")));
        }
        CborCodec.encode_record(record)
    }

    fn decode_record<R: DeserializeOwned>(&self, bytes: &[u8]) -> Result<R, RecordError> {
        let call = self.decodes.get();
        self.decodes.set(call + 1);
        if self.fail_decode_at == Some(call) {
            return Err(RecordError::Other(format!("injected decode failure #{call}")));
        }
        CborCodec.decode_record(bytes)
    }
}

// In-process ledger stub
//
// Holds world state, emitted events and the caller identity for one session.
// Faults can be switched on to exercise the handler's failure paths.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::{CallerIdentity, LedgerError, LedgerStub};

/// Failure modes the in-memory stub can simulate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultMode {
    /// `get_state` fails with `ReadFailed`
    FailReads,
    /// `put_state` fails with `WriteFailed`
    FailWrites,
    /// `set_event` fails with `WriteFailed`
    FailEvents,
    /// `read_cert_attribute` fails with `ReadFailed`
    FailAttributes,
}

/// Event as recorded by the stub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedEvent {
    pub channel: String,
    pub payload: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: BTreeMap<String, Vec<u8>>,
    events: Vec<EmittedEvent>,
    identity: CallerIdentity,
    tx_time: Option<DateTime<Utc>>,
    faults: Vec<FaultMode>,
    write_count: usize,
}

impl MemoryLedger {
    pub fn new(identity: CallerIdentity) -> Self {
        Self {
            identity,
            ..Default::default()
        }
    }

    /// Switch the caller for subsequent invocations
    pub fn set_identity(&mut self, identity: CallerIdentity) {
        self.identity = identity;
    }

    /// Fix the host transaction timestamp
    pub fn set_tx_time(&mut self, time: DateTime<Utc>) {
        self.tx_time = Some(time);
    }

    pub fn inject_fault(&mut self, fault: FaultMode) {
        if !self.faults.contains(&fault) {
            self.faults.push(fault);
        }
    }

    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    fn has_fault(&self, fault: FaultMode) -> bool {
        self.faults.contains(&fault)
    }

    /// Raw state under `key`, bypassing faults
    pub fn state(&self, key: &str) -> Option<&[u8]> {
        self.state.get(key).map(|v| v.as_slice())
    }

    /// Seed state directly, bypassing the write counter
    pub fn seed(&mut self, key: &str, value: &[u8]) {
        self.state.insert(key.to_string(), value.to_vec());
    }

    pub fn events(&self) -> &[EmittedEvent] {
        &self.events
    }

    /// Number of successful `put_state` calls
    pub fn write_count(&self) -> usize {
        self.write_count
    }
}

impl LedgerStub for MemoryLedger {
    fn get_state(&self, key: &str) -> Result<Vec<u8>, LedgerError> {
        if self.has_fault(FaultMode::FailReads) {
            return Err(LedgerError::ReadFailed(format!(
                "injected read failure for key {}",
                key
            )));
        }

        match self.state.get(key) {
            Some(value) if !value.is_empty() => Ok(value.clone()),
            _ => Err(LedgerError::NotFound(key.to_string())),
        }
    }

    fn put_state(&mut self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        if self.has_fault(FaultMode::FailWrites) {
            return Err(LedgerError::WriteFailed(format!(
                "injected write failure for key {}",
                key
            )));
        }

        self.state.insert(key.to_string(), value.to_vec());
        self.write_count += 1;
        Ok(())
    }

    fn set_event(&mut self, channel: &str, payload: &[u8]) -> Result<(), LedgerError> {
        if self.has_fault(FaultMode::FailEvents) {
            return Err(LedgerError::WriteFailed(format!(
                "injected event failure on channel {}",
                channel
            )));
        }

        self.events.push(EmittedEvent {
            channel: channel.to_string(),
            payload: payload.to_vec(),
        });
        Ok(())
    }

    fn read_cert_attribute(&self, name: &str) -> Result<Vec<u8>, LedgerError> {
        if self.has_fault(FaultMode::FailAttributes) {
            return Err(LedgerError::ReadFailed("certificate unavailable".to_string()));
        }
        self.identity.lookup(name)
    }

    fn tx_timestamp(&self) -> Option<DateTime<Utc>> {
        self.tx_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_and_empty_keys_are_not_found() {
        let mut ledger = MemoryLedger::default();
        ledger.seed("empty", b"");

        assert_eq!(
            ledger.get_state("nope"),
            Err(LedgerError::NotFound("nope".to_string()))
        );
        assert_eq!(
            ledger.get_state("empty"),
            Err(LedgerError::NotFound("empty".to_string()))
        );
    }

    #[test]
    fn test_put_then_get() {
        let mut ledger = MemoryLedger::default();
        ledger.put_state("k", b"v").unwrap();

        assert_eq!(ledger.get_state("k").unwrap(), b"v".to_vec());
        assert_eq!(ledger.write_count(), 1);
    }

    #[test]
    fn test_injected_faults() {
        let mut ledger = MemoryLedger::new(CallerIdentity::with_role("bob", "x"));
        ledger.inject_fault(FaultMode::FailWrites);
        ledger.inject_fault(FaultMode::FailEvents);

        assert!(matches!(
            ledger.put_state("k", b"v"),
            Err(LedgerError::WriteFailed(_))
        ));
        assert!(matches!(
            ledger.set_event("evtSender", b"{}"),
            Err(LedgerError::WriteFailed(_))
        ));
        assert_eq!(ledger.write_count(), 0);
        assert!(ledger.events().is_empty());

        ledger.clear_faults();
        ledger.put_state("k", b"v").unwrap();
        assert_eq!(ledger.state("k"), Some(&b"v"[..]));
    }
}

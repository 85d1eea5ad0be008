#![allow(missing_docs)]

pub(crate) mod ledger;
pub(crate) mod store;

pub(crate) use ledger::FakeLedger;
pub(crate) use store::FakeNotificationStore;

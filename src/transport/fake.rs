//! In-memory transport for tests

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;

use super::{MediaTransport, PeerSession, SessionDescription, TransportError};
use crate::scene::CaptureSink;

/// Transport call that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FakeStep {
    CreateSession,
    AttachTrack,
    CreateOffer,
    SetLocal,
    SetRemote,
}

/// Records every call made through it
#[derive(Default, Clone)]
pub(crate) struct FakeTransport {
    pub(crate) fail_at: Option<FakeStep>,
    pub(crate) calls: Rc<RefCell<Vec<String>>>,
}

impl FakeTransport {
    pub(crate) fn failing_at(step: FakeStep) -> Self {
        Self {
            fail_at: Some(step),
            ..Default::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn check(&self, step: FakeStep, call: String) -> Result<(), TransportError> {
        self.calls.borrow_mut().push(call);
        if self.fail_at == Some(step) {
            return Err(TransportError::Session(format!("{:?} rejected", step)));
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl MediaTransport for FakeTransport {
    async fn create_peer_session(&self) -> Result<Box<dyn PeerSession>, TransportError> {
        self.check(FakeStep::CreateSession, "create_peer_session".into())?;
        Ok(Box::new(FakePeer {
            transport: self.clone(),
        }))
    }
}

struct FakePeer {
    transport: FakeTransport,
}

#[async_trait(?Send)]
impl PeerSession for FakePeer {
    async fn attach_track(&mut self, sink: &CaptureSink) -> Result<(), TransportError> {
        self.transport
            .check(FakeStep::AttachTrack, format!("attach_track:{}", sink.stream_id()))
    }

    async fn create_offer(&mut self) -> Result<SessionDescription, TransportError> {
        self.transport
            .check(FakeStep::CreateOffer, "create_offer".into())?;
        Ok(SessionDescription::offer("v=0\r\ns=fake-offer\r\n"))
    }

    async fn set_local_description(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), TransportError> {
        self.transport
            .check(FakeStep::SetLocal, format!("set_local:{:?}", description.kind))
    }

    async fn set_remote_description(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), TransportError> {
        self.transport.check(
            FakeStep::SetRemote,
            format!("set_remote:{:?}:{}", description.kind, description.sdp),
        )
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.transport.calls.borrow_mut().push("close".into());
        Ok(())
    }
}

//! Outstanding opponent request tracking.
//!
//! An opponent move runs on its own task and comes back through a channel as an
//! [`OpponentReply`]. The [`RequestSlot`] decides whether a reply is still
//! wanted: only the reply carrying the ticket of the armed request can be
//! redeemed, and cancelling both aborts the task and disarms the ticket, so a
//! reply that slipped out before the abort is still ignored.

use crate::service::{AiMoveOutcome, ServiceError};
use crate::tree::NodeId;
use derive_getters::Getters;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info};

/// Identifies one opponent request. Tickets increase monotonically per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    /// Raw ticket number.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Result of an opponent request, as delivered to the session's event loop.
#[derive(Debug, Getters)]
pub struct OpponentReply {
    /// Ticket of the request that produced this reply.
    #[getter(copy)]
    pub(super) ticket: Ticket,
    /// Position the opponent was asked to move from.
    #[getter(copy)]
    pub(super) origin: NodeId,
    #[getter(skip)]
    pub(super) result: Result<AiMoveOutcome, ServiceError>,
}

impl OpponentReply {
    pub(super) fn new(
        ticket: Ticket,
        origin: NodeId,
        result: Result<AiMoveOutcome, ServiceError>,
    ) -> Self {
        Self {
            ticket,
            origin,
            result,
        }
    }
}

/// Receiving end of a session's opponent replies.
pub type OpponentReplies = mpsc::UnboundedReceiver<OpponentReply>;

#[derive(Debug)]
struct Outstanding {
    ticket: Ticket,
    origin: NodeId,
    abort: AbortHandle,
}

/// Holds at most one outstanding opponent request.
#[derive(Debug, Default)]
pub(super) struct RequestSlot {
    issued: u64,
    outstanding: Option<Outstanding>,
}

impl RequestSlot {
    /// Allocates the next ticket.
    pub(super) fn next_ticket(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    /// Arms the slot with a freshly spawned request, cancelling any previous one.
    pub(super) fn arm(&mut self, ticket: Ticket, origin: NodeId, abort: AbortHandle) {
        self.cancel();
        self.outstanding = Some(Outstanding {
            ticket,
            origin,
            abort,
        });
    }

    /// Aborts and disarms the outstanding request. Returns `false` when there
    /// was nothing to cancel.
    pub(super) fn cancel(&mut self) -> bool {
        match self.outstanding.take() {
            Some(outstanding) => {
                outstanding.abort.abort();
                info!(ticket = outstanding.ticket.0, origin = %outstanding.origin, "Opponent request cancelled");
                true
            }
            None => false,
        }
    }

    /// Claims `reply` if it answers the armed request, disarming the slot.
    pub(super) fn redeem(&mut self, reply: &OpponentReply) -> bool {
        match &self.outstanding {
            Some(outstanding) if outstanding.ticket == reply.ticket => {
                self.outstanding = None;
                true
            }
            _ => {
                debug!(ticket = reply.ticket.0, "Reply does not match the armed request");
                false
            }
        }
    }

    /// Returns `true` while a request is outstanding.
    pub(super) fn is_pending(&self) -> bool {
        self.outstanding.is_some()
    }
}

//! The Room Service contract, as seen from a client.
//!
//! Two implementations ship in this workspace: the in-process
//! `RoomDirectory` (imposter-room) and the WebSocket `RemoteRoomService`
//! (imposter). Tests use hand-rolled mocks.

use imposter_protocol::{CreateRoom, JoinRoom, RoomChanged, RoomRequest, RoomView};
use tokio::sync::broadcast;

use crate::ServiceError;

/// Authoritative store for rooms.
///
/// Every call answers with the caller's own [`RoomView`]. The service
/// guarantees that `round` never decreases within a room and that
/// `next_round` is refused for anyone but the host.
pub trait RoomService: Send + Sync + 'static {
    /// Creates a room with the caller as host.
    fn create(
        &self,
        req: CreateRoom,
    ) -> impl Future<Output = Result<RoomView, ServiceError>> + Send;

    /// Adds the caller to an existing room. Fails if the room is unknown.
    fn join(&self, req: JoinRoom) -> impl Future<Output = Result<RoomView, ServiceError>> + Send;

    /// Deals a new round. Host only.
    fn next_round(
        &self,
        req: RoomRequest,
    ) -> impl Future<Output = Result<RoomView, ServiceError>> + Send;

    /// Read-only refresh. Succeeds even if nothing changed.
    fn sync(&self, req: RoomRequest)
    -> impl Future<Output = Result<RoomView, ServiceError>> + Send;

    /// Releases the caller's seat. Best effort; callers ignore the result.
    fn leave(&self, req: RoomRequest) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Push notices for room changes, if the service can deliver them.
    ///
    /// Each call returns a fresh receiver. The default has no push channel,
    /// which leaves clients on interval polling.
    fn notifications(&self) -> Option<broadcast::Receiver<RoomChanged>> {
        None
    }
}

/**
 * Room Registry
 *
 * Process-wide table mapping a media id to the set of live sessions
 * currently joined to it. The registry is an explicit, injectable service
 * handle rather than a module-level singleton, so tests can run several
 * independent registries side by side.
 *
 * # Concurrency
 *
 * Membership lives behind one std mutex. Every method takes the lock,
 * mutates or snapshots, and releases before doing anything slow - in
 * particular `broadcast` collects delivery handles under the lock and
 * sends after dropping it, so the lock is never held across an await or
 * a slow receiver.
 */

use crate::gateway::events::ServerEvent;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Delivery handle for one live session in a room.
#[derive(Debug, Clone)]
pub struct RoomMember {
    pub connection_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub sender: mpsc::UnboundedSender<ServerEvent>,
}

/// Cheaply clonable handle to the shared membership table.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<Mutex<HashMap<Uuid, HashMap<Uuid, RoomMember>>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session to a room. Joining twice is idempotent: a re-join
    /// replaces the prior membership for that connection, never duplicates.
    pub fn join(&self, media_id: Uuid, member: RoomMember) {
        let mut rooms = self.rooms.lock().unwrap();
        rooms
            .entry(media_id)
            .or_default()
            .insert(member.connection_id, member);
    }

    /// Remove a session from one room. Returns true if it was a member.
    pub fn leave(&self, media_id: Uuid, connection_id: Uuid) -> bool {
        let mut rooms = self.rooms.lock().unwrap();
        let Some(members) = rooms.get_mut(&media_id) else {
            return false;
        };
        let removed = members.remove(&connection_id).is_some();
        if members.is_empty() {
            rooms.remove(&media_id);
        }
        removed
    }

    /// Remove a connection from every room it is joined to and return the
    /// affected media ids. Called synchronously on disconnect so later
    /// broadcasts never attempt delivery to a dead connection.
    pub fn remove_connection(&self, connection_id: Uuid) -> Vec<Uuid> {
        let mut rooms = self.rooms.lock().unwrap();
        let mut left = Vec::new();
        rooms.retain(|media_id, members| {
            if members.remove(&connection_id).is_some() {
                left.push(*media_id);
            }
            !members.is_empty()
        });
        left
    }

    /// Snapshot of the current members of a room.
    pub fn members_of(&self, media_id: Uuid) -> Vec<RoomMember> {
        let rooms = self.rooms.lock().unwrap();
        rooms
            .get(&media_id)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn member_count(&self, media_id: Uuid) -> usize {
        let rooms = self.rooms.lock().unwrap();
        rooms.get(&media_id).map(|m| m.len()).unwrap_or(0)
    }

    /// Deliver an event to every member of a room, optionally excluding one
    /// connection. Returns the number of sessions the event was handed to.
    pub fn broadcast(
        &self,
        media_id: Uuid,
        event: ServerEvent,
        exclude: Option<Uuid>,
    ) -> usize {
        let senders: Vec<mpsc::UnboundedSender<ServerEvent>> = {
            let rooms = self.rooms.lock().unwrap();
            match rooms.get(&media_id) {
                Some(members) => members
                    .values()
                    .filter(|m| Some(m.connection_id) != exclude)
                    .map(|m| m.sender.clone())
                    .collect(),
                None => Vec::new(),
            }
        };

        let mut delivered = 0;
        for sender in senders {
            // A closed receiver only means the session is tearing down.
            if sender.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }
}

use std::sync::{Arc, Mutex};

use crate::domain::models::classroom::ClassRoom;

/// In-memory working set of classrooms, keyed by room number.
#[derive(Debug, Default)]
pub struct ClassRoomStore {
    rooms: Vec<ClassRoom>,
}

/// A classroom store shared between services behind a single writer lock.
pub type SharedClassRoomStore = Arc<Mutex<ClassRoomStore>>;

impl ClassRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedClassRoomStore {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Add a classroom. Returns `false` when the room number is taken.
    pub fn add(&mut self, room: ClassRoom) -> bool {
        if self.find_by_number(room.number()).is_some() {
            return false;
        }
        self.rooms.push(room);
        true
    }

    pub fn remove_by_number(&mut self, number: i32) -> Option<ClassRoom> {
        let index = self.rooms.iter().position(|r| r.number() == number)?;
        Some(self.rooms.remove(index))
    }

    pub fn find_by_number(&self, number: i32) -> Option<&ClassRoom> {
        self.rooms.iter().find(|r| r.number() == number)
    }

    pub fn find_by_number_mut(&mut self, number: i32) -> Option<&mut ClassRoom> {
        self.rooms.iter_mut().find(|r| r.number() == number)
    }

    pub fn find_by<P>(&self, predicate: P) -> Vec<ClassRoom>
    where
        P: Fn(&ClassRoom) -> bool,
    {
        self.rooms
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }

    pub fn find_all(&self) -> Vec<ClassRoom> {
        self.rooms.clone()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

use crate::ecs::EntityId;

/// Source of entity identities.
///
/// The only requirement is uniqueness for the life of the process.
pub trait IdGenerator {
    fn next_id(&mut self) -> EntityId;
}

/// Monotonic ids starting at 1.
#[derive(Debug)]
pub struct SequentialIds {
    next: EntityId,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: EntityId) -> Self {
        Self { next: first }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> EntityId {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl<F> IdGenerator for F
where
    F: FnMut() -> EntityId,
{
    fn next_id(&mut self) -> EntityId {
        self()
    }
}

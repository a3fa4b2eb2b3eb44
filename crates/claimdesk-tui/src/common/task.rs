use claimdesk_core::workflow::DocumentRole;
use enum_map::{Enum, EnumMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

#[derive(Debug, Default)]
pub struct TaskSeq {
    next: u64,
}

impl TaskSeq {
    pub fn next_id(&mut self) -> TaskId {
        let id = TaskId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }

    /// The id the next call to `next_id` will return.
    pub fn peek(&self) -> TaskId {
        TaskId(self.next)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
pub enum TaskKind {
    SessionRestore,
    AuthSubmit,
    Analyze,
    History,
    LoadPolicy,
    LoadClaim,
    LoadBills,
    LoadDoctorNotes,
}

impl TaskKind {
    /// Reads are tracked per slot: a newer pick for the same row wins.
    pub fn load_document(role: DocumentRole) -> Self {
        match role {
            DocumentRole::Policy => TaskKind::LoadPolicy,
            DocumentRole::Claim => TaskKind::LoadClaim,
            DocumentRole::Bills => TaskKind::LoadBills,
            DocumentRole::DoctorNotes => TaskKind::LoadDoctorNotes,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TaskStarted {
    pub id: TaskId,
}

#[derive(Debug)]
pub struct TaskCompleted<E> {
    pub id: TaskId,
    pub result: E,
}

/// Task lifecycle state (stored in `AppState`, mutated only by the reducer).
#[derive(Debug, Default, Clone)]
pub struct TaskState {
    pub active: Option<TaskId>,
}

impl TaskState {
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn on_started(&mut self, started: &TaskStarted) {
        self.active = Some(started.id);
    }

    /// Returns true when `id` is the active task; the task is then cleared.
    /// Completions of superseded tasks return false and must be dropped.
    pub fn finish_if_active(&mut self, id: TaskId) -> bool {
        let ok = self.active == Some(id);
        if ok {
            self.active = None;
        }
        ok
    }

    pub fn clear(&mut self) {
        self.active = None;
    }
}

#[derive(Debug, Default, Clone)]
pub struct Tasks {
    states: EnumMap<TaskKind, TaskState>,
    /// Ids below this were issued before the last reset.
    floor: u64,
}

impl Tasks {
    pub fn state(&self, kind: TaskKind) -> &TaskState {
        &self.states[kind]
    }

    pub fn state_mut(&mut self, kind: TaskKind) -> &mut TaskState {
        &mut self.states[kind]
    }

    /// Records a started task. Tasks issued before the last reset are ignored.
    pub fn on_started(&mut self, kind: TaskKind, started: &TaskStarted) -> bool {
        if started.id.0 < self.floor {
            return false;
        }
        self.states[kind].on_started(started);
        true
    }

    pub fn is_any_running(&self) -> bool {
        self.states.values().any(TaskState::is_running)
    }

    /// Forgets every task issued so far, including ones not yet started.
    pub fn reset(&mut self, seq: &TaskSeq) {
        for state in self.states.values_mut() {
            state.clear();
        }
        self.floor = seq.peek().0;
    }
}

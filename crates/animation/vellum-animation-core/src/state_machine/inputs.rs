use super::{InputKind, StateMachineInput};

/// Runtime value of a state machine input. Setters record that the value
/// changed so the owning machine knows it needs another advance.
#[derive(Clone, Debug, PartialEq)]
pub enum SmiInput {
    Bool(SmiBool),
    Number(SmiNumber),
    Trigger(SmiTrigger),
}

impl SmiInput {
    pub(crate) fn from_definition(def: &StateMachineInput) -> Self {
        let name = def.name.clone();
        match def.kind {
            InputKind::Bool { value } => SmiInput::Bool(SmiBool {
                name,
                value,
                changed: false,
            }),
            InputKind::Number { value } => SmiInput::Number(SmiNumber {
                name,
                value,
                changed: false,
            }),
            InputKind::Trigger => SmiInput::Trigger(SmiTrigger {
                name,
                fired: false,
                changed: false,
            }),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SmiInput::Bool(i) => &i.name,
            SmiInput::Number(i) => &i.name,
            SmiInput::Trigger(i) => &i.name,
        }
    }

    pub(crate) fn take_changed(&mut self) -> bool {
        let flag = match self {
            SmiInput::Bool(i) => &mut i.changed,
            SmiInput::Number(i) => &mut i.changed,
            SmiInput::Trigger(i) => &mut i.changed,
        };
        std::mem::take(flag)
    }

    pub(crate) fn changed(&self) -> bool {
        match self {
            SmiInput::Bool(i) => i.changed,
            SmiInput::Number(i) => i.changed,
            SmiInput::Trigger(i) => i.changed,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SmiInput::Bool(i) => Some(i.value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            SmiInput::Number(i) => Some(i.value),
            _ => None,
        }
    }

    pub fn did_fire(&self) -> bool {
        matches!(self, SmiInput::Trigger(t) if t.fired)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SmiBool {
    name: String,
    value: bool,
    changed: bool,
}

impl SmiBool {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> bool {
        self.value
    }

    pub fn set_value(&mut self, value: bool) {
        if self.value != value {
            self.value = value;
            self.changed = true;
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SmiNumber {
    name: String,
    value: f32,
    changed: bool,
}

impl SmiNumber {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn set_value(&mut self, value: f32) {
        if self.value != value {
            self.value = value;
            self.changed = true;
        }
    }
}

/// A one-frame signal. `fire` raises it; the machine retires it at the end of
/// the next advance.
#[derive(Clone, Debug, PartialEq)]
pub struct SmiTrigger {
    name: String,
    fired: bool,
    changed: bool,
}

impl SmiTrigger {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fire(&mut self) {
        self.fired = true;
        self.changed = true;
    }

    pub fn did_fire(&self) -> bool {
        self.fired
    }

    pub(crate) fn retire(&mut self) {
        self.fired = false;
    }
}

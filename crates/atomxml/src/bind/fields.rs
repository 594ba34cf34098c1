//! The decode accumulator
//!
//! Decoding is a chain of stages, most-derived type first, each stage
//! contributing the fields it recognizes to one shared [`FieldSet`]. The
//! most-derived `build` then takes its typed fields back out before
//! delegating to the stage below it, so a name claimed by a subtype never
//! reaches the base construction. Values are type-erased in between
//! because the dispatch table decides the concrete type at runtime.

use std::any::{type_name, Any};

use indexmap::IndexMap;

enum Slot {
    One(Box<dyn Any>),
    Many(Vec<Box<dyn Any>>),
}

/// Named, type-erased field slots collected while decoding one element
#[derive(Default)]
pub struct FieldSet {
    slots: IndexMap<&'static str, Slot>,
}

impl std::fmt::Debug for FieldSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSet")
            .field("slots", &self.slots.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a single-valued field, replacing any previous value
    pub fn set<T: Any>(&mut self, name: &'static str, value: T) {
        self.set_boxed(name, Box::new(value));
    }

    /// Store an already-erased single value
    pub fn set_boxed(&mut self, name: &'static str, value: Box<dyn Any>) {
        self.slots.insert(name, Slot::One(value));
    }

    /// Append to a list-valued field, creating the list on first use
    pub fn push<T: Any>(&mut self, name: &'static str, value: T) {
        self.push_boxed(name, Box::new(value));
    }

    /// Append an already-erased value to a list-valued field
    #[allow(clippy::panic)]
    pub fn push_boxed(&mut self, name: &'static str, value: Box<dyn Any>) {
        match self
            .slots
            .entry(name)
            .or_insert_with(|| Slot::Many(Vec::new()))
        {
            Slot::Many(items) => items.push(value),
            Slot::One(_) => panic!("field `{name}` is not a list"),
        }
    }

    /// Take a single-valued field. Absent fields are `None`; a value of
    /// the wrong type is a wiring defect in a vocabulary module.
    ///
    /// # Panics
    ///
    /// If the slot holds a list or a value of a different type.
    #[allow(clippy::panic)]
    pub fn take<T: Any>(&mut self, name: &'static str) -> Option<T> {
        match self.slots.shift_remove(name)? {
            Slot::One(value) => Some(downcast(name, value)),
            Slot::Many(_) => panic!("field `{name}` is a list"),
        }
    }

    /// Take a list-valued field; absent means empty.
    ///
    /// # Panics
    ///
    /// If the slot holds a single value or elements of a different type.
    #[allow(clippy::panic)]
    pub fn take_vec<T: Any>(&mut self, name: &'static str) -> Vec<T> {
        match self.slots.shift_remove(name) {
            None => Vec::new(),
            Some(Slot::Many(items)) => items
                .into_iter()
                .map(|item| downcast(name, item))
                .collect(),
            Some(Slot::One(_)) => panic!("field `{name}` is not a list"),
        }
    }
}

#[allow(clippy::panic)]
fn downcast<T: Any>(name: &'static str, value: Box<dyn Any>) -> T {
    match value.downcast::<T>() {
        Ok(value) => *value,
        Err(_) => panic!(
            "field `{name}` does not hold a {} (vocabulary wiring error)",
            type_name::<T>()
        ),
    }
}

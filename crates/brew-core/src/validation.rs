use crate::component::{Component, ComponentState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

pub const LEVEL_MIN: i32 = 0;
pub const LEVEL_MAX: i32 = 100;

#[derive(Debug, Clone, Copy)]
pub struct Unvalidated;

#[derive(Debug, Clone, Copy)]
pub struct Validated;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reservoir {
    Water,
    Coffee,
}

impl fmt::Display for Reservoir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reservoir::Water => f.write_str("water"),
            Reservoir::Coffee => f.write_str("coffee"),
        }
    }
}

/// An out-of-domain request the hardware ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("{component} does not accept {requested:?}")]
    OutOfDomain {
        component: Component,
        requested: ComponentState,
    },
    #[error("{reservoir} level {requested} outside 0..=100")]
    LevelOutOfRange { reservoir: Reservoir, requested: i32 },
}

/// Reservoir level request. Only a `Level<Validated>` can reach the hardware.
#[derive(Debug, Clone, Copy)]
pub struct Level<State = Unvalidated> {
    value: i32,
    _state: PhantomData<State>,
}

impl Level<Unvalidated> {
    pub fn new(value: i32) -> Self {
        Self {
            value,
            _state: PhantomData,
        }
    }

    pub fn validate(self, reservoir: Reservoir) -> Result<Level<Validated>, Rejection> {
        if !(LEVEL_MIN..=LEVEL_MAX).contains(&self.value) {
            return Err(Rejection::LevelOutOfRange {
                reservoir,
                requested: self.value,
            });
        }

        Ok(Level {
            value: self.value,
            _state: PhantomData,
        })
    }
}

impl Level<Validated> {
    pub fn value(&self) -> u8 {
        // In 0..=100 after validation.
        self.value as u8
    }
}

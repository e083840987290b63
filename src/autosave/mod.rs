mod config;
mod controller;

pub(crate) use config::{AutosaveConfig, RetryPolicy};
pub(crate) use controller::{
    AutosaveAction, AutosaveController, NoteField, NoteFields, SaveStatus, TimerId,
};

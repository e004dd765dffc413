pub(crate) mod actors;
pub(crate) mod bootstrap;
pub(crate) mod dialogue;
pub(crate) mod loop_runner;
pub(crate) mod scenes;

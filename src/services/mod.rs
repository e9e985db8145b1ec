pub(crate) mod content;
pub(crate) mod scope;
pub(crate) mod storage;
pub(crate) mod workflow;
